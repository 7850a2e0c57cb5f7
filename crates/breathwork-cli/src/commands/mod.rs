pub mod breathe;
pub mod config;
pub mod pattern;
pub mod session;

/// Print one event as a JSON line.
pub(crate) fn emit(event: &breathwork_core::Event) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}

use breathwork_core::{
    Access, Config, Database, Paywall, SessionCounter, SessionStore, StaticSubscription,
};
use clap::Subcommand;
use serde_json::json;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Show the free-session count and whether a new session may start
    Status,
    /// Zero the stored session count
    Reset,
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = SessionStore::new(Database::open()?, config.session.free_session_limit);

    match action {
        SessionAction::Status => {
            let subscription = StaticSubscription(config.session.subscribed);
            let gate = store.gate()?;
            let access = match Paywall::check(&store, &subscription)? {
                Access::Granted => "granted",
                Access::Paywalled { .. } => "paywalled",
            };
            let json = json!({
                "gate": gate,
                "subscribed": config.session.subscribed,
                "access": access,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        SessionAction::Reset => {
            store.database().reset_session_count()?;
            println!("session count reset");
        }
    }
    Ok(())
}

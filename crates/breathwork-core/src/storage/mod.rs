mod config;
pub mod database;

pub use config::{Config, EngineConfig, PatternConfig, SessionConfig};
pub use database::{Database, SessionStore};

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/breathwork[-dev]/` based on BREATHWORK_ENV.
///
/// Set BREATHWORK_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("BREATHWORK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("breathwork-dev")
    } else {
        base_dir.join("breathwork")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

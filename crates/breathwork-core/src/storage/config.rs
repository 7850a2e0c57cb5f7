//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - The breath pattern (a named preset or explicit durations)
//! - Engine settings (frame interval, overshoot handling)
//! - Free-session limit and subscription status
//!
//! Configuration is stored at `~/.config/breathwork/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::breath::{preset, BreathPattern, OvershootPolicy};
use crate::error::{ConfigError, CoreError, Result};
use crate::paywall::DEFAULT_FREE_SESSION_LIMIT;

/// Breath pattern configuration.
///
/// Durations are signed so that a negative value written by hand is reported
/// as an error instead of failing to parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Preset slug; overrides the explicit durations when set.
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default = "default_breath_ms")]
    pub inhale_ms: i64,
    #[serde(default)]
    pub hold_after_inhale_ms: i64,
    #[serde(default = "default_breath_ms")]
    pub exhale_ms: i64,
    #[serde(default)]
    pub hold_after_exhale_ms: i64,
}

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default)]
    pub overshoot: OvershootPolicy,
}

/// Session gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_free_session_limit")]
    pub free_session_limit: u64,
    #[serde(default)]
    pub subscribed: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/breathwork/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pattern: PatternConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

// Default functions
fn default_breath_ms() -> i64 {
    4000
}
fn default_frame_interval_ms() -> u64 {
    16
}
fn default_free_session_limit() -> u64 {
    DEFAULT_FREE_SESSION_LIMIT
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            preset: None,
            inhale_ms: default_breath_ms(),
            hold_after_inhale_ms: 0,
            exhale_ms: default_breath_ms(),
            hold_after_exhale_ms: 0,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            overshoot: OvershootPolicy::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            free_session_limit: default_free_session_limit(),
            subscribed: false,
        }
    }
}

impl PatternConfig {
    /// Resolve to a validated pattern.
    ///
    /// # Errors
    /// Returns an error for an unknown preset, a negative duration, or a
    /// pattern whose durations are all zero.
    pub fn resolve(&self) -> Result<BreathPattern, ConfigError> {
        let pattern = match self.preset.as_deref() {
            Some(slug) if !slug.is_empty() => preset(slug)?.pattern,
            _ => BreathPattern::from_signed(
                self.inhale_ms,
                self.hold_after_inhale_ms,
                self.exhale_ms,
                self.hold_after_exhale_ms,
            )?,
        };
        pattern.validate()?;
        Ok(pattern)
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        if key.is_empty() {
            return Err(unknown());
        }
        let mut parts = key.split('.').peekable();

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        serde_json::Value::Number(n.into())
                    } else if let Ok(n) = value.parse::<i64>() {
                        serde_json::Value::Number(n.into())
                    } else {
                        return Err(invalid(format!("cannot parse '{value}' as integer")));
                    }
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                serde_json::Value::Null if value.is_empty() => serde_json::Value::Null,
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default config cannot be written.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str::<Self>(&content).map_err(|e| {
                CoreError::Config(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(CoreError::Io(e)),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    ///
    /// An unset optional value reads as an empty string.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::Null => Some(String::new()),
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Update a value in memory by dot-separated key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field's type.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }

    /// The configured breath pattern.
    ///
    /// # Errors
    /// See [`PatternConfig::resolve`].
    pub fn breath_pattern(&self) -> Result<BreathPattern, ConfigError> {
        self.pattern.resolve()
    }
}

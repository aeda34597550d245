//! Service settings
//!
//! Loaded with the `config` crate from built-in defaults overlaid by
//! `USERS_*` environment variables.

use ::config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// `tracing` filter directive, e.g. `info` or `users=debug`
    pub log_level: String,
    /// Create the users collection and its unique indexes at startup
    pub sync_indexes: bool,
}

impl Settings {
    /// Load settings from the environment
    ///
    /// # Environment Variables
    /// - `USERS_LOG_LEVEL` (default: "info")
    /// - `USERS_SYNC_INDEXES` (default: true)
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("log_level", "info")?
            .set_default("sync_indexes", true)?
            .add_source(Environment::with_prefix("USERS").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}

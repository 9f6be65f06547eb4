use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::domain::error::{AppError, Result};

/// Runtime configuration, merged from defaults, `salescope.toml` (if present)
/// and `SALESCOPE_`-prefixed environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bind address for the HTTP server.
    pub host: String,
    pub port: u16,

    /// Path of the SQLite database file.
    pub database_path: String,

    /// How many reports the history listing returns.
    pub history_limit: u32,

    /// Chart canvas size in pixels.
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            database_path: "salescope.db".to_string(),
            history_limit: 5,
            chart_width: 1000,
            chart_height: 500,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file("salescope.toml"))
            .merge(Env::prefixed("SALESCOPE_"))
            .extract()
            .map_err(|e| AppError::ValidationError(format!("Invalid configuration: {}", e)))
    }
}

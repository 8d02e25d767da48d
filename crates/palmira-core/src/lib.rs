//! Shared types for the Palmira business-record pipeline: the common
//! [`Business`] schema, the zone registry, and application configuration.

mod app_config;
mod business;
mod config;
mod zones;

pub use app_config::{AppConfig, Environment};
pub use business::{Business, BusinessStatus};
pub use config::{load_app_config, load_app_config_from_env};
pub use zones::{load_zones, Zone, ZoneRegistry};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read zones file {path}: {source}")]
    ZonesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse zones file: {0}")]
    ZonesFileParse(#[from] serde_yaml::Error),

    #[error("zones validation error: {0}")]
    Validation(String),
}

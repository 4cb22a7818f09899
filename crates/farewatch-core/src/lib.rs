//! Shared domain types, configuration loading, and threshold evaluation for
//! the fare monitor.

pub mod app_config;
pub mod booking;
pub mod config;
pub mod evaluate;
pub mod types;

pub use app_config::{AppConfig, EmailConfig, FlightTarget, SourceKind, TelegramConfig};
pub use booking::{booking_url, display_date};
pub use config::{load_app_config, load_app_config_from_env, load_config_file, ConfigOrigin};
pub use evaluate::{evaluate, lowest_overall};
pub use types::{AlertResult, FlightDetails, FlightQuery, Observation, PriceHistoryEntry};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read config file {path}: {source}")]
    ConfigFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON config file {path}: {source}")]
    ConfigFileJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse YAML config file {path}: {source}")]
    ConfigFileYaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unknown price source '{0}'; expected one of dom, search, api, reminder")]
    UnknownSource(String),
}

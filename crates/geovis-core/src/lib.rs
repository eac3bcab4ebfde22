//! Shared configuration and domain types for geovis.
//!
//! Holds the application config loader, the brand/competitor entities file,
//! [`AliasSet`] normalization, and the collector-result status machine.

pub mod app_config;
pub mod config;
pub mod entities;
pub mod status;

use thiserror::Error;

pub use app_config::{AppConfig, ProviderConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use entities::{
    load_entities, normalize_form, parse_entities, AliasSet, EntitiesFile, EntityConfig,
};
pub use status::{
    has_payload, plan_transition, status_history, CollectorResultStatus, TransitionEntry,
    TransitionPlan, STATUS_HISTORY_KEY,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read entities file {path}: {source}")]
    EntitiesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse entities file: {0}")]
    EntitiesFileParse(#[from] serde_yaml::Error),

    #[error("entities validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid collector result status: {0}")]
    InvalidStatus(String),
}

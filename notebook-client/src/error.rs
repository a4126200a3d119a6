//! Process-level errors for the Notebook client.

use crate::config::ConfigError;
use crate::persistence::PersistenceError;
use notebook_core::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Storage error: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

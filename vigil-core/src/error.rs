use thiserror::Error;

/// Unified error type for Vigil.
#[derive(Error, Debug)]
pub enum VigilError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Internal: {0}")]
    Internal(String),
}

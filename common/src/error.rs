//! Error types for RateKeeper.

use thiserror::Error;

/// Main error type for cache and model operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateKeeperError {
    /// A caller passed an argument that violates the API contract.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        message: String,
        field: Option<String>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RateKeeperError {
    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        RateKeeperError::InvalidArgument {
            message: message.into(),
            field: None,
        }
    }

    /// Create an invalid argument error naming the offending field.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        RateKeeperError::InvalidArgument {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Check if this is a contract violation by the caller.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, RateKeeperError::InvalidArgument { .. })
    }

    /// Get a stable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            RateKeeperError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            RateKeeperError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }
}

/// Result type alias for RateKeeper operations.
pub type Result<T> = std::result::Result<T, RateKeeperError>;

/// Reject an empty key.
pub fn require_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(RateKeeperError::invalid_field("key", "key must not be empty"));
    }
    Ok(())
}

//! Provider error records and registration errors

use thiserror::Error;

/// Provider code: the host denied location access
pub const PERMISSION_DENIED: u16 = 1;
/// Provider code: no fix could be obtained
pub const POSITION_UNAVAILABLE: u16 = 2;
/// Provider code: no fix within the requested timeout
pub const TIMEOUT: u16 = 3;

/// Failure reported by the provider through its failure callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub code: u16,
    pub message: String,
}

impl ErrorRecord {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn permission_denied() -> Self {
        Self::new(PERMISSION_DENIED, "permission denied")
    }

    pub fn position_unavailable() -> Self {
        Self::new(POSITION_UNAVAILABLE, "position unavailable")
    }

    pub fn timeout() -> Self {
        Self::new(TIMEOUT, "timeout expired")
    }
}

/// Synchronous refusal of a watch registration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("invalid option {option}: {reason}")]
    InvalidOptions { option: String, reason: String },
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Result type for provider registration calls
pub type ProviderResult<T> = Result<T, ProviderError>;

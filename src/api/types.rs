//! Common API error types

use crate::provider::ProviderError;
use std::time::Duration;
use thiserror::Error;

/// Closed taxonomy of location failures, as seen by `error` listeners
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The permission gate blocked the call locally
    #[error("location access has not been allowed")]
    NotAllowed,
    /// The host refused the provider access
    #[error("location permission denied by the host")]
    PermissionDenied,
    /// The provider could not determine a position
    #[error("position unavailable")]
    PositionUnavailable,
    /// No fix within the configured timeout
    #[error("no position within {timeout:?}")]
    Timeout { timeout: Duration },
}

impl LocationError {
    /// Stable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            LocationError::NotAllowed => "not-allowed",
            LocationError::PermissionDenied => "permission-denied",
            LocationError::PositionUnavailable => "position-unavailable",
            LocationError::Timeout { .. } => "timeout",
        }
    }
}

/// Why a completion handle was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    #[error(transparent)]
    Location(#[from] LocationError),
    /// The provider refused to register the watch
    #[error("watch registration refused: {0}")]
    Registration(#[from] ProviderError),
    /// The request was dropped before producing a result
    #[error("request abandoned before completion")]
    Abandoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(LocationError::NotAllowed.kind(), "not-allowed");
        assert_eq!(LocationError::PermissionDenied.kind(), "permission-denied");
        assert_eq!(LocationError::PositionUnavailable.kind(), "position-unavailable");
        let timeout = LocationError::Timeout {
            timeout: Duration::from_millis(1500),
        };
        assert_eq!(timeout.kind(), "timeout");
        assert_eq!(timeout.to_string(), "no position within 1.5s");
    }

    #[test]
    fn test_acquisition_error_wraps_location_error() {
        let error: AcquisitionError = LocationError::NotAllowed.into();
        assert_eq!(error, AcquisitionError::Location(LocationError::NotAllowed));
        assert_eq!(error.to_string(), "location access has not been allowed");
    }
}

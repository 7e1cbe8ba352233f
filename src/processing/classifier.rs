//! Provider failure classification

use crate::api::types::LocationError;
use crate::provider::{error, AcquisitionOptions, ErrorRecord};
use tracing::warn;

/// Map a provider failure onto the location error taxonomy
///
/// Timeouts carry the timeout currently configured in `options`. Codes the
/// provider should never send are treated as an unavailable position.
pub fn classify(record: &ErrorRecord, options: &AcquisitionOptions) -> LocationError {
    match record.code {
        error::PERMISSION_DENIED => LocationError::PermissionDenied,
        error::POSITION_UNAVAILABLE => LocationError::PositionUnavailable,
        error::TIMEOUT => LocationError::Timeout {
            timeout: options.timeout(),
        },
        code => {
            warn!(code, message = %record.message, "unknown provider error code");
            LocationError::PositionUnavailable
        }
    }
}

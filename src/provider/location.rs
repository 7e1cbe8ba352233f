//! Location provider trait and acquisition options

use crate::core::{PositionSample, DEFAULT_TIMEOUT_MS};
use crate::provider::{ErrorRecord, ProviderResult};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use std::time::Duration;

/// Invoked with every reading the provider produces
pub type SuccessCallback = Box<dyn FnMut(Rc<PositionSample>)>;

/// Invoked with every failure the provider reports
pub type FailureCallback = Box<dyn FnMut(ErrorRecord)>;

/// Identifier of a continuous watch registered with a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(u32);

impl WatchId {
    pub fn new(id: u32) -> Self {
        WatchId(id)
    }

    pub fn id(&self) -> u32 {
        self.0
    }
}

/// Options handed to the provider with every acquisition call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionOptions {
    /// Ask for the most precise fix the hardware can give
    pub enable_high_accuracy: bool,
    /// Maximum time the provider may take per fix (milliseconds)
    pub timeout_ms: u64,
}

impl Default for AcquisitionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl AcquisitionOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Whole milliseconds for `timeout`, rounding any sub-millisecond part up
    pub fn timeout_ms_from(timeout: Duration) -> u64 {
        u64::try_from(timeout.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX)
    }
}

/// Asynchronous positioning service wrapped by [`crate::Geolocation`]
///
/// Callbacks may fire zero or more times on a later turn of the caller's
/// loop: at most once for [`get_current_position`](Self::get_current_position),
/// any number of times for a watch. Implementations must never invoke a
/// callback from inside the registering call itself.
pub trait LocationProvider {
    /// Request a single reading
    fn get_current_position(
        &mut self,
        options: &AcquisitionOptions,
        on_success: SuccessCallback,
        on_failure: FailureCallback,
    );

    /// Register a continuous watch
    /// Returns Err(error) if the provider refuses the registration
    fn watch_position(
        &mut self,
        options: &AcquisitionOptions,
        on_success: SuccessCallback,
        on_failure: FailureCallback,
    ) -> ProviderResult<WatchId>;

    /// Unregister a watch. Unknown ids are ignored.
    fn clear_watch(&mut self, id: WatchId);

    /// Current value of a provider-specific setting, if explicitly set
    fn setting(&self, name: &str) -> Option<String>;

    /// Set a provider-specific setting
    fn set_setting(&mut self, name: &str, value: &str);
}

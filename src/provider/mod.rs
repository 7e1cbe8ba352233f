//! Provider abstraction layer
//!
//! This module describes the asynchronous positioning service the crate
//! wraps, the revision adapter that papers over its two result formats, and
//! a simulated implementation used by tests and the demo binary.

pub mod location;
pub mod revision;
pub mod simulated;
pub mod error;

pub use location::{
    AcquisitionOptions, FailureCallback, LocationProvider, SuccessCallback, WatchId,
};
pub use revision::{ProviderAdapter, ProviderRevision};
pub use simulated::SimulatedProvider;
pub use error::{ErrorRecord, ProviderError, ProviderResult};

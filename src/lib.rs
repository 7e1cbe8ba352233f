//! Permission-gated position source
//!
//! Wraps an asynchronous location provider behind a persisted permission
//! flag and exposes its readings as one-shot completions and typed
//! continuous notifications.

pub mod core;
pub mod provider;
pub mod processing;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use crate::core::{Address, Coordinates, PositionSample, DEFAULT_PREFERENCE_KEY, DEFAULT_TIMEOUT_MS};
pub use crate::provider::{
    AcquisitionOptions, ErrorRecord, LocationProvider, ProviderAdapter, ProviderError,
    ProviderRevision, SimulatedProvider, WatchId,
};
pub use crate::utils::{ConfigError, GeolocationConfig, JsonFileStore, MemoryStore, PreferenceError, PreferenceStore};
pub use crate::api::{
    AcquisitionError, Completion, CompletionResult, Geolocation, ListenerHandle, LocationError,
};

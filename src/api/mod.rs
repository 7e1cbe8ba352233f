//! Public API of the position source
//!
//! [`Geolocation`] is the entry point. Acquisition calls return a
//! [`Completion`]; continuous notifications are delivered to listeners
//! registered per channel.

pub mod callback;
pub mod completion;
pub mod geolocation;
pub mod types;

// Re-export commonly used API types
pub use callback::{ListenerHandle, Notifier};
pub use completion::{Completion, CompletionResult};
pub use geolocation::Geolocation;
pub use types::{AcquisitionError, LocationError};

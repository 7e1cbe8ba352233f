//! Utility modules for configuration and preference storage

pub mod config;
pub mod preferences;

pub use config::{ConfigError, GeolocationConfig};
pub use preferences::{JsonFileStore, MemoryStore, PreferenceError, PreferenceStore};

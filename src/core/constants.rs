//! Defaults and provider compatibility table

/// Default acquisition timeout (milliseconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// Preference key the permission flag is stored under
pub const DEFAULT_PREFERENCE_KEY: &str = "geolocation.allowed";

/// Last platform major version that ships the legacy provider
pub const LAST_LEGACY_MAJOR_VERSION: u32 = 1;

/// Provider settings applied once to legacy providers, unless already set
pub const LEGACY_PROVIDER_DEFAULTS: &[(&str, &str)] = &[
    ("purpose", "Determine the current location"),
    ("preferredProvider", "gps"),
    ("accuracy", "best"),
];

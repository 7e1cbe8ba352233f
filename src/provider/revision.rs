//! Provider revision detection and compatibility handling

use crate::core::{Address, PositionSample, LAST_LEGACY_MAJOR_VERSION, LEGACY_PROVIDER_DEFAULTS};
use crate::provider::LocationProvider;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which generation of the provider result format is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderRevision {
    /// Resolves an address alongside the coordinates
    Legacy,
    /// Coordinates only
    #[default]
    Modern,
}

impl ProviderRevision {
    /// Derive the revision from the host platform's major version
    pub fn from_platform_major(major: u32) -> Self {
        if major <= LAST_LEGACY_MAJOR_VERSION {
            ProviderRevision::Legacy
        } else {
            ProviderRevision::Modern
        }
    }
}

/// Capabilities of the active provider, resolved once at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderAdapter {
    revision: ProviderRevision,
    address_capable: bool,
}

impl ProviderAdapter {
    /// Resolve the adapter and prepare the provider for the given revision
    ///
    /// Legacy providers receive the compatibility defaults; settings the
    /// provider already carries are left untouched.
    pub fn resolve(revision: ProviderRevision, provider: &mut dyn LocationProvider) -> Self {
        match revision {
            ProviderRevision::Legacy => {
                for (name, value) in LEGACY_PROVIDER_DEFAULTS {
                    if provider.setting(name).is_none() {
                        debug!(setting = name, value, "applying legacy provider default");
                        provider.set_setting(name, value);
                    }
                }
                Self {
                    revision,
                    address_capable: true,
                }
            }
            ProviderRevision::Modern => Self {
                revision,
                address_capable: false,
            },
        }
    }

    pub fn revision(&self) -> ProviderRevision {
        self.revision
    }

    pub fn is_address_capable(&self) -> bool {
        self.address_capable
    }

    /// The address of a sample, if this provider produces addresses
    pub fn address_of<'a>(&self, sample: &'a PositionSample) -> Option<&'a Address> {
        if self.address_capable {
            sample.address.as_ref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Coordinates;
    use crate::provider::SimulatedProvider;

    #[test]
    fn test_revision_from_platform_major() {
        assert_eq!(ProviderRevision::from_platform_major(0), ProviderRevision::Legacy);
        assert_eq!(ProviderRevision::from_platform_major(1), ProviderRevision::Legacy);
        assert_eq!(ProviderRevision::from_platform_major(2), ProviderRevision::Modern);
        assert_eq!(ProviderRevision::default(), ProviderRevision::Modern);
    }

    #[test]
    fn test_legacy_defaults_keep_explicit_settings() {
        let mut provider = SimulatedProvider::new().with_setting("accuracy", "low");
        let adapter = ProviderAdapter::resolve(ProviderRevision::Legacy, &mut provider);

        assert!(adapter.is_address_capable());
        assert_eq!(provider.setting("accuracy").as_deref(), Some("low"));
        assert_eq!(provider.setting("preferredProvider").as_deref(), Some("gps"));
        assert!(provider.setting("purpose").is_some());
    }

    #[test]
    fn test_modern_skips_compatibility() {
        let mut provider = SimulatedProvider::new();
        let adapter = ProviderAdapter::resolve(ProviderRevision::Modern, &mut provider);

        assert!(!adapter.is_address_capable());
        assert_eq!(adapter.revision(), ProviderRevision::Modern);
        for (name, _) in LEGACY_PROVIDER_DEFAULTS {
            assert_eq!(provider.setting(name), None);
        }
    }

    #[test]
    fn test_address_hidden_when_not_capable() {
        let sample = PositionSample::new(0, Coordinates::new(1.0, 2.0, 3.0))
            .with_address(Address::new().with("city", "Oslo"));

        let mut provider = SimulatedProvider::new();
        let modern = ProviderAdapter::resolve(ProviderRevision::Modern, &mut provider);
        let legacy = ProviderAdapter::resolve(ProviderRevision::Legacy, &mut provider);

        assert_eq!(modern.address_of(&sample), None);
        assert_eq!(legacy.address_of(&sample).and_then(|a| a.get("city")), Some("Oslo"));
    }
}

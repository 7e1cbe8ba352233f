//! Change detection against the last cached reading

use crate::core::{Address, Coordinates, PositionSample};
use crate::provider::ProviderAdapter;
use std::rc::Rc;

/// What listeners should hear about after a new reading
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub coords: Coordinates,
    /// Only set when the provider is address-capable and sent one
    pub address: Option<Address>,
}

/// Holds the last reading and decides whether a new one differs
///
/// A reading counts as new when it is a different allocation from the
/// cached one. Field values are never compared.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last: Option<Rc<PositionSample>>,
    address: Option<Address>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `sample`, returning the change to announce if it is new
    pub fn observe(&mut self, sample: &Rc<PositionSample>, adapter: &ProviderAdapter) -> Option<Change> {
        if let Some(last) = &self.last {
            if Rc::ptr_eq(last, sample) {
                return None;
            }
        }

        self.last = Some(sample.clone());
        self.address = adapter.address_of(sample).cloned();

        Some(Change {
            coords: sample.coords.clone(),
            address: self.address.clone(),
        })
    }

    pub fn last(&self) -> Option<&Rc<PositionSample>> {
        self.last.as_ref()
    }

    pub fn address(&self) -> Option<&Address> {
        self.address.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ProviderRevision, SimulatedProvider};

    fn adapter(revision: ProviderRevision) -> ProviderAdapter {
        ProviderAdapter::resolve(revision, &mut SimulatedProvider::new())
    }

    fn sample(lat: f64, lon: f64) -> Rc<PositionSample> {
        Rc::new(
            PositionSample::new(0, Coordinates::new(lat, lon, 10.0))
                .with_address(Address::new().with("city", "Quito")),
        )
    }

    #[test]
    fn test_identical_values_are_still_new() {
        let mut detector = ChangeDetector::new();
        let adapter = adapter(ProviderRevision::Modern);

        assert!(detector.observe(&sample(10.0, 20.0), &adapter).is_some());
        assert!(detector.observe(&sample(10.0, 20.0), &adapter).is_some());
    }

    #[test]
    fn test_same_sample_is_not_new() {
        let mut detector = ChangeDetector::new();
        let adapter = adapter(ProviderRevision::Modern);
        let reading = sample(10.0, 20.0);

        let change = detector.observe(&reading, &adapter).unwrap();
        assert_eq!(change.coords.latitude, 10.0);
        assert!(detector.observe(&reading, &adapter).is_none());
        assert!(Rc::ptr_eq(detector.last().unwrap(), &reading));
    }

    #[test]
    fn test_address_follows_capability() {
        let mut modern = ChangeDetector::new();
        let change = modern.observe(&sample(1.0, 2.0), &adapter(ProviderRevision::Modern)).unwrap();
        assert_eq!(change.address, None);
        assert_eq!(modern.address(), None);

        let mut legacy = ChangeDetector::new();
        let change = legacy.observe(&sample(1.0, 2.0), &adapter(ProviderRevision::Legacy)).unwrap();
        assert_eq!(change.address.as_ref().and_then(|a| a.get("city")), Some("Quito"));
        assert!(legacy.address().is_some());

        let bare = Rc::new(PositionSample::new(0, Coordinates::new(1.0, 2.0, 3.0)));
        let change = legacy.observe(&bare, &adapter(ProviderRevision::Legacy)).unwrap();
        assert_eq!(change.address, None);
        assert_eq!(legacy.address(), None);
    }
}

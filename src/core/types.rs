//! Core data types for the position source

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single coordinate fix as reported by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Horizontal accuracy (meters)
    pub accuracy: f64,
    /// Altitude above the ellipsoid (meters)
    pub altitude: Option<f64>,
    /// Vertical accuracy (meters)
    pub altitude_accuracy: Option<f64>,
    /// Degrees clockwise from true north, NaN while stationary
    pub heading: Option<f64>,
    /// Ground speed (meters per second)
    pub speed: Option<f64>,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64, accuracy: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
            altitude: None,
            altitude_accuracy: None,
            heading: None,
            speed: None,
        }
    }

    pub fn with_altitude(mut self, altitude: f64, altitude_accuracy: f64) -> Self {
        self.altitude = Some(altitude);
        self.altitude_accuracy = Some(altitude_accuracy);
        self
    }

    /// Set the motion fields. A zero speed forces the heading to NaN.
    pub fn with_motion(mut self, heading: f64, speed: f64) -> Self {
        self.speed = Some(speed);
        self.heading = Some(if speed == 0.0 { f64::NAN } else { heading });
        self
    }
}

/// Resolved street address, component name to value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address(BTreeMap<String, String>);

impl Address {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, component: &str, value: &str) -> Self {
        self.0.insert(component.to_string(), value.to_string());
        self
    }

    pub fn get(&self, component: &str) -> Option<&str> {
        self.0.get(component).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// One reading delivered by the provider
///
/// Samples are handed around as `Rc<PositionSample>` and compared by
/// allocation, so two readings with equal fields are still distinct samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: u64,
    pub coords: Coordinates,
    /// Only filled in by legacy providers
    pub address: Option<Address>,
}

impl PositionSample {
    pub fn new(timestamp_ms: u64, coords: Coordinates) -> Self {
        Self {
            timestamp_ms,
            coords,
            address: None,
        }
    }

    pub fn with_address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }
}

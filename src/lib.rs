//! # Landscape Estimator
//!
//! Turns a polygon drawn over satellite imagery into a landscaping cost range.
//!
//! This library provides:
//! - Area derivation: coordinate ring → validated simple polygon → square feet
//! - Estimate calculation: square feet + property conditions → (low, high) dollars
//! - An explicit application controller that recomputes on every change
//! - Optional SQLite persistence for saved estimates
//!
//! ## Features
//!
//! - **`persistence`** - Enable the SQLite estimate store
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use landscape_estimator::{calculate_estimate, derive_area, Coordinate, PropertyConditions};
//!
//! // A backyard in Austin, TX drawn as (longitude, latitude) pairs
//! let ring = vec![
//!     Coordinate::new(-97.7431, 30.2672),
//!     Coordinate::new(-97.7429, 30.2672),
//!     Coordinate::new(-97.7429, 30.2674),
//!     Coordinate::new(-97.7431, 30.2674),
//! ];
//!
//! let area = derive_area(&ring).expect("simple polygon");
//! let outcome = calculate_estimate(area, &PropertyConditions::default());
//!
//! if let Some(estimate) = outcome.estimate() {
//!     println!("{} sq ft: ${} - ${}", area, estimate.low, estimate.high);
//! }
//! ```

use std::fmt;

use geo::Coord;
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{
    EstimatorError, GeometryError, GeometryIssue, ParseLevelError, Result, MIN_RING_VERTICES,
};

// Ring normalization and simple-polygon validation
pub mod ring;
pub use ring::CoordinateRing;

// Area derivation (ring -> square feet)
pub mod area;
pub use area::{
    derive_area, derive_area_square_meters, ring_area, ring_area_square_meters,
    SQUARE_FEET_PER_SQUARE_METER,
};

// Property condition levels and multipliers
pub mod conditions;
pub use conditions::{
    Access, ConditionCategory, ConditionsUpdate, GrassLength, Obstacles, PropertyConditions,
    Severity, Slope,
};

// Estimate calculation and pricing configuration
pub mod estimate;
pub use estimate::{
    calculate_estimate, calculate_estimate_with, estimate_for_ring, round_half_up, Estimate,
    EstimateOutcome, PricingConfig,
};

// Persisted record shape
pub mod record;
pub use record::{generate_estimate_id, EstimateRecord, NewEstimateRecord};

// Application state owner (address, ring, conditions, results, saves)
pub mod controller;
pub use controller::{
    CollaboratorError, EstimateSink, EstimateView, EstimatorController, Geocoder, MapFocus,
    SaveStatus,
};

// SQLite estimate store
#[cfg(feature = "persistence")]
pub mod persistence;
#[cfg(feature = "persistence")]
pub use persistence::EstimateStore;

// FFI bindings for mobile platforms (iOS/Android)
#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
pub(crate) fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("LandscapeEstimatorRust"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
pub(crate) fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A map coordinate in (longitude, latitude) order, the order drawing tools
/// and GeoJSON emit.
///
/// Serialized as a `[lng, lat]` pair so a ring is a plain `number[][]`.
///
/// # Example
/// ```
/// use landscape_estimator::Coordinate;
/// let point = Coordinate::new(-98.5795, 39.8283); // center of the US
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    /// Create a new coordinate.
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Check if the coordinate is finite and within geographic range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    pub(crate) fn to_coord(self) -> Coord {
        Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([longitude, latitude]: [f64; 2]) -> Self {
        Self::new(longitude, latitude)
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.longitude, c.latitude]
    }
}

/// Bounding box of a ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from coordinates.
    pub fn from_coordinates(points: &[Coordinate]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self::around(*first);
        for p in rest {
            bounds.include(*p);
        }
        Some(bounds)
    }

    /// Zero-size bounds at a single point.
    pub fn around(point: Coordinate) -> Self {
        Self {
            min_lat: point.latitude,
            max_lat: point.latitude,
            min_lng: point.longitude,
            max_lng: point.longitude,
        }
    }

    /// Grow to contain a point.
    pub fn include(&mut self, point: Coordinate) {
        self.min_lat = self.min_lat.min(point.latitude);
        self.max_lat = self.max_lat.max(point.latitude);
        self.min_lng = self.min_lng.min(point.longitude);
        self.max_lng = self.max_lng.max(point.longitude);
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_lng + self.max_lng) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }
}

/// Usable area in whole square feet.
///
/// Zero means "no region selected"; it is a valid state, not an error.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SquareFeet(pub u64);

impl SquareFeet {
    pub const ZERO: SquareFeet = SquareFeet(0);

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for SquareFeet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SquareFeet {
    fn from(value: u64) -> Self {
        SquareFeet(value)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ring() -> Vec<Coordinate> {
        vec![
            Coordinate::new(-97.7431, 30.2672),
            Coordinate::new(-97.7429, 30.2672),
            Coordinate::new(-97.7429, 30.2674),
            Coordinate::new(-97.7431, 30.2674),
        ]
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(-0.1278, 51.5074).is_valid());
        assert!(!Coordinate::new(0.0, 91.0).is_valid());
        assert!(!Coordinate::new(181.0, 0.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_coordinate_serializes_as_pair() {
        let json = serde_json::to_string(&Coordinate::new(-97.5, 30.25)).unwrap();
        assert_eq!(json, "[-97.5,30.25]");

        let back: Vec<Coordinate> = serde_json::from_str("[[1.0,2.0],[3.0,4.0]]").unwrap();
        assert_eq!(back[1], Coordinate::new(3.0, 4.0));
    }

    #[test]
    fn test_bounds_center() {
        let bounds = Bounds::from_coordinates(&sample_ring()).unwrap();
        let center = bounds.center();
        assert!((center.longitude - -97.7430).abs() < 1e-9);
        assert!((center.latitude - 30.2673).abs() < 1e-9);
        assert!(Bounds::from_coordinates(&[]).is_none());
    }

    #[test]
    fn test_ring_to_estimate() {
        let area = derive_area(&sample_ring()).unwrap();
        assert!(area.value() > 0);

        let outcome = calculate_estimate(area, &PropertyConditions::default());
        let estimate = outcome.estimate().unwrap();
        assert!(estimate.low <= estimate.high);
    }
}

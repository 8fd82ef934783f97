//! Estimate records: the shape an estimate takes once a user saves it.
//!
//! A [`NewEstimateRecord`] is built client-side as soon as an estimate exists.
//! It only reaches durable storage on an explicit save, after which it comes
//! back as an [`EstimateRecord`] and is never mutated. Re-estimating produces
//! a new record.

use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::conditions::{Access, GrassLength, Obstacles, PropertyConditions, Slope};
use crate::error::{EstimatorError, Result};
use crate::estimate::Estimate;
use crate::{Coordinate, SquareFeet};

static ID_SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Generate an opaque estimate id: `estimate_<unix millis>_<sequence>`.
pub fn generate_estimate_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let seq = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed) % 100_000;
    format!("estimate_{}_{:05}", millis, seq)
}

/// An estimate ready to be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEstimateRecord {
    /// Caller-supplied id; the store generates one when absent.
    pub id: Option<String>,
    pub user_id: String,
    pub address: String,
    pub polygon: Vec<Coordinate>,
    pub square_footage: SquareFeet,
    pub conditions: PropertyConditions,
    pub estimate: Estimate,
    /// RFC 3339 timestamp
    pub created_at: String,
}

impl NewEstimateRecord {
    /// Capture the current estimate, stamped with the current time.
    pub fn new(
        user_id: impl Into<String>,
        address: impl Into<String>,
        polygon: Vec<Coordinate>,
        square_footage: SquareFeet,
        conditions: PropertyConditions,
        estimate: Estimate,
    ) -> Self {
        Self {
            id: None,
            user_id: user_id.into(),
            address: address.into(),
            polygon,
            square_footage,
            conditions,
            estimate,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Check the fields that are mandatory on write.
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(EstimatorError::invalid_record("user id is required"));
        }
        if self.square_footage.is_zero() {
            return Err(EstimatorError::invalid_record(
                "square footage must be greater than zero",
            ));
        }
        if self.estimate.low > self.estimate.high {
            return Err(EstimatorError::invalid_record(format!(
                "estimate low ({}) exceeds high ({})",
                self.estimate.low, self.estimate.high
            )));
        }
        Ok(())
    }

    /// Finalize into the persisted shape under the given id.
    pub fn into_record(self, id: String) -> EstimateRecord {
        EstimateRecord {
            id,
            user_id: self.user_id,
            address: self.address,
            polygon: self.polygon,
            square_footage: self.square_footage.value(),
            grass_length: self.conditions.grass_length,
            obstacles: self.conditions.obstacles,
            slope: self.conditions.slope,
            access: self.conditions.access,
            estimate_low: self.estimate.low,
            estimate_high: self.estimate.high,
            created_at: self.created_at,
        }
    }
}

/// A saved estimate, matching the external storage schema column for column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateRecord {
    pub id: String,
    pub user_id: String,
    pub address: String,
    pub polygon: Vec<Coordinate>,
    pub square_footage: u64,
    pub grass_length: GrassLength,
    pub obstacles: Obstacles,
    pub slope: Slope,
    pub access: Access,
    pub estimate_low: u64,
    pub estimate_high: u64,
    pub created_at: String,
}

impl EstimateRecord {
    pub fn conditions(&self) -> PropertyConditions {
        PropertyConditions::new(self.grass_length, self.obstacles, self.slope, self.access)
    }

    pub fn estimate(&self) -> Estimate {
        Estimate {
            low: self.estimate_low,
            high: self.estimate_high,
        }
    }

    pub fn area(&self) -> SquareFeet {
        SquareFeet(self.square_footage)
    }

    // Display values are derived on demand, never stored

    pub fn average(&self) -> u64 {
        self.estimate().average()
    }

    pub fn per_square_foot(&self) -> Option<(f64, f64)> {
        self.estimate().per_square_foot(self.area())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> NewEstimateRecord {
        NewEstimateRecord::new(
            "user-1",
            "1600 Pennsylvania Ave NW, Washington, DC",
            vec![
                Coordinate::new(-77.0366, 38.8976),
                Coordinate::new(-77.0364, 38.8976),
                Coordinate::new(-77.0364, 38.8978),
            ],
            SquareFeet(500),
            PropertyConditions::default(),
            Estimate { low: 601, high: 822 },
        )
    }

    #[test]
    fn test_new_record_is_stamped() {
        let record = draft();
        assert!(record.id.is_none());
        assert!(chrono::DateTime::parse_from_rfc3339(&record.created_at).is_ok());
        record.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_missing_user() {
        let mut record = draft();
        record.user_id = "  ".to_string();
        assert!(matches!(
            record.validate(),
            Err(EstimatorError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_area_and_inverted_range() {
        let mut record = draft();
        record.square_footage = SquareFeet::ZERO;
        assert!(record.validate().is_err());

        let mut record = draft();
        record.estimate = Estimate { low: 900, high: 800 };
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_persisted_shape() {
        let record = draft().into_record("estimate_1".to_string());
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["user_id"], "user-1");
        assert_eq!(json["square_footage"], 500);
        assert_eq!(json["grass_length"], "medium");
        assert_eq!(json["obstacles"], "some");
        assert_eq!(json["slope"], "flat");
        assert_eq!(json["access"], "easy");
        assert_eq!(json["estimate_low"], 601);
        assert_eq!(json["estimate_high"], 822);
        assert_eq!(json["polygon"][0][0], -77.0366);

        assert_eq!(record.conditions(), PropertyConditions::default());
        assert_eq!(record.average(), 712);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = generate_estimate_id();
        let b = generate_estimate_id();
        assert!(a.starts_with("estimate_"));
        assert_ne!(a, b);
    }
}

//! Estimate calculation: area + property conditions → (low, high) dollars.
//!
//! ```text
//! totalModifier = grass × obstacles × slope × access
//! low  = round(area × baseRate × 0.95 × totalModifier)
//! high = round(area × baseRate × 1.30 × totalModifier)
//! ```
//!
//! Both bounds are rounded half-up independently from the unrounded product;
//! `high` is never derived from a rounded `low`. A zero area yields
//! [`EstimateOutcome::NoEstimate`] rather than a $0 estimate.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::area::derive_area;
use crate::conditions::PropertyConditions;
use crate::error::{EstimatorError, GeometryError, Result};
use crate::{Coordinate, SquareFeet};

/// Pricing parameters.
///
/// The defaults are the published rate card; a custom config is only
/// accepted after [`PricingConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct PricingConfig {
    /// Dollars per square foot before condition multipliers.
    /// Default: 1.00
    pub base_rate: f64,

    /// Scale applied for the low end of the range.
    /// Default: 0.95
    pub low_factor: f64,

    /// Scale applied for the high end of the range. Must be >= `low_factor`.
    /// Default: 1.30
    pub high_factor: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_rate: 1.00,
            low_factor: 0.95,
            high_factor: 1.30,
        }
    }
}

impl PricingConfig {
    /// Load a config from JSON. Missing fields take their default value.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PricingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that could break `low <= high` or produce negative prices.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("baseRate", self.base_rate),
            ("lowFactor", self.low_factor),
            ("highFactor", self.high_factor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(EstimatorError::config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        if self.low_factor > self.high_factor {
            return Err(EstimatorError::config(format!(
                "lowFactor ({}) must not exceed highFactor ({})",
                self.low_factor, self.high_factor
            )));
        }
        Ok(())
    }
}

/// A cost range in whole dollars. Always `low <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Estimate {
    pub low: u64,
    pub high: u64,
}

impl Estimate {
    /// Midpoint, rounded half-up.
    pub fn average(&self) -> u64 {
        (self.low + self.high + 1) / 2
    }

    /// Per-square-foot range; `None` for a zero area.
    pub fn per_square_foot(&self, area: SquareFeet) -> Option<(f64, f64)> {
        if area.is_zero() {
            return None;
        }
        let sq_ft = area.value() as f64;
        Some((self.low as f64 / sq_ft, self.high as f64 / sq_ft))
    }
}

/// Result of an estimate calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum EstimateOutcome {
    /// A genuine estimate for a non-empty area.
    Ready(Estimate),
    /// Area is zero: nothing to show yet. Not an error.
    NoEstimate,
}

impl EstimateOutcome {
    pub fn estimate(&self) -> Option<Estimate> {
        match self {
            EstimateOutcome::Ready(estimate) => Some(*estimate),
            EstimateOutcome::NoEstimate => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, EstimateOutcome::Ready(_))
    }

    /// (low, high), or (0, 0) when no estimate is available.
    pub fn range(&self) -> (u64, u64) {
        match self {
            EstimateOutcome::Ready(estimate) => (estimate.low, estimate.high),
            EstimateOutcome::NoEstimate => (0, 0),
        }
    }
}

/// Round to the nearest whole unit, halves rounding up.
///
/// Negative and non-finite inputs clamp to 0; callers only pass
/// non-negative products.
pub fn round_half_up(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    // `round` is half away from zero, i.e. half-up for positive values
    value.round() as u64
}

/// Calculate an estimate with the default rate card.
///
/// # Example
/// ```
/// use landscape_estimator::{calculate_estimate, PropertyConditions, SquareFeet};
///
/// let outcome = calculate_estimate(SquareFeet(500), &PropertyConditions::default());
/// assert_eq!(outcome.range(), (601, 822));
/// ```
pub fn calculate_estimate(area: SquareFeet, conditions: &PropertyConditions) -> EstimateOutcome {
    calculate_estimate_with(area, conditions, &PricingConfig::default())
}

/// Calculate an estimate with a custom (validated) rate card.
pub fn calculate_estimate_with(
    area: SquareFeet,
    conditions: &PropertyConditions,
    config: &PricingConfig,
) -> EstimateOutcome {
    if area.is_zero() {
        return EstimateOutcome::NoEstimate;
    }

    let total_modifier = conditions.total_modifier();
    let sq_ft = area.value() as f64;

    let low = round_half_up(sq_ft * config.base_rate * config.low_factor * total_modifier);
    let high = round_half_up(sq_ft * config.base_rate * config.high_factor * total_modifier);

    debug!(
        "[Estimate] {} sq ft x {:.4} modifier -> ${} - ${}",
        area, total_modifier, low, high
    );

    EstimateOutcome::Ready(Estimate { low, high })
}

/// Derive the area of a ring and price it in one step.
pub fn estimate_for_ring(
    ring: &[Coordinate],
    conditions: &PropertyConditions,
) -> std::result::Result<(SquareFeet, EstimateOutcome), GeometryError> {
    let area = derive_area(ring)?;
    Ok((area, calculate_estimate(area, conditions)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::{Access, GrassLength, Obstacles, Slope};

    fn mildest() -> PropertyConditions {
        PropertyConditions::new(GrassLength::Short, Obstacles::None, Slope::Flat, Access::Easy)
    }

    fn harshest() -> PropertyConditions {
        PropertyConditions::new(
            GrassLength::Tall,
            Obstacles::Heavy,
            Slope::Steep,
            Access::Obstructed,
        )
    }

    #[test]
    fn test_all_unit_multipliers() {
        let outcome = calculate_estimate(SquareFeet(1000), &mildest());
        assert_eq!(outcome, EstimateOutcome::Ready(Estimate { low: 950, high: 1300 }));
    }

    #[test]
    fn test_harshest_conditions() {
        // 2315.625 -> 2316, 3168.75 -> 3169
        let outcome = calculate_estimate(SquareFeet(1000), &harshest());
        assert_eq!(outcome.range(), (2316, 3169));
    }

    #[test]
    fn test_default_conditions() {
        // 1.10 * 1.15 = 1.265
        let outcome = calculate_estimate(SquareFeet(500), &PropertyConditions::default());
        assert_eq!(outcome.range(), (601, 822));
    }

    #[test]
    fn test_zero_area_is_no_estimate() {
        let outcome = calculate_estimate(SquareFeet::ZERO, &harshest());
        assert_eq!(outcome, EstimateOutcome::NoEstimate);
        assert_eq!(outcome.range(), (0, 0));
        assert!(outcome.estimate().is_none());
    }

    #[test]
    fn test_single_square_foot() {
        // 0.95 rounds to 1, 1.30 rounds to 1
        assert_eq!(calculate_estimate(SquareFeet(1), &mildest()).range(), (1, 1));
    }

    #[test]
    fn test_idempotent() {
        let c = PropertyConditions::default();
        assert_eq!(
            calculate_estimate(SquareFeet(4321), &c),
            calculate_estimate(SquareFeet(4321), &c)
        );
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(0.5), 1);
        assert_eq!(round_half_up(2315.625), 2316);
        assert_eq!(round_half_up(822.25), 822);
        assert_eq!(round_half_up(2.4999), 2);
        assert_eq!(round_half_up(-3.0), 0);
        assert_eq!(round_half_up(f64::NAN), 0);
    }

    #[test]
    fn test_round_half_up_at_float_extremes() {
        // Largest double below 0.5; adding 0.5 to it would round to 1.0
        assert_eq!(round_half_up(0.499_999_999_999_999_94), 0);
        // Odd integer above 2^52, where x + 0.5 is not representable
        assert_eq!(round_half_up(4_503_599_627_370_497.0), 4_503_599_627_370_497);
    }

    #[test]
    fn test_average_and_per_square_foot() {
        let estimate = Estimate { low: 601, high: 822 };
        // (601 + 822) / 2 = 711.5 -> 712
        assert_eq!(estimate.average(), 712);

        let (low, high) = estimate.per_square_foot(SquareFeet(500)).unwrap();
        assert!((low - 1.202).abs() < 1e-12);
        assert!((high - 1.644).abs() < 1e-12);
        assert!(estimate.per_square_foot(SquareFeet::ZERO).is_none());
    }

    #[test]
    fn test_custom_pricing() {
        let config = PricingConfig {
            base_rate: 2.0,
            ..Default::default()
        };
        config.validate().unwrap();
        let outcome = calculate_estimate_with(SquareFeet(1000), &mildest(), &config);
        assert_eq!(outcome.range(), (1900, 2600));
    }

    #[test]
    fn test_pricing_from_json() {
        let config = PricingConfig::from_json(r#"{"baseRate": 1.5}"#).unwrap();
        assert_eq!(config.base_rate, 1.5);
        assert_eq!(config.low_factor, 0.95);
        assert_eq!(config.high_factor, 1.30);

        assert!(matches!(
            PricingConfig::from_json(r#"{"lowFactor": 2.0}"#),
            Err(EstimatorError::Config { .. })
        ));
        assert!(matches!(
            PricingConfig::from_json(r#"{"baseRate": -1.0}"#),
            Err(EstimatorError::Config { .. })
        ));
        assert!(matches!(
            PricingConfig::from_json("not json"),
            Err(EstimatorError::Serialization(_))
        ));
    }

    #[test]
    fn test_outcome_serialization() {
        let ready = EstimateOutcome::Ready(Estimate { low: 950, high: 1300 });
        let json = serde_json::to_string(&ready).unwrap();
        assert_eq!(json, r#"{"status":"ready","low":950,"high":1300}"#);

        let none = serde_json::to_string(&EstimateOutcome::NoEstimate).unwrap();
        assert_eq!(none, r#"{"status":"noEstimate"}"#);
    }

    #[test]
    fn test_estimate_for_ring() {
        let ring = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0002, 0.0),
            Coordinate::new(0.0002, 0.0002),
            Coordinate::new(0.0, 0.0002),
        ];
        let (area, outcome) = estimate_for_ring(&ring, &mildest()).unwrap();
        assert!(area.value() > 5000);
        assert!(outcome.is_ready());

        let (area, outcome) = estimate_for_ring(&[], &mildest()).unwrap();
        assert!(area.is_zero());
        assert_eq!(outcome, EstimateOutcome::NoEstimate);
    }
}

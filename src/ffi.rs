//! FFI bindings for mobile platforms (iOS/Android).
//!
//! This module provides the UniFFI bindings that expose the estimator core
//! to Kotlin and Swift. All FFI functions are prefixed with `ffi_` to avoid
//! naming conflicts with the internal API.

use log::{debug, info};

use crate::conditions::{ConditionCategory, PropertyConditions, Severity};
use crate::{
    calculate_estimate, calculate_estimate_with, derive_area, init_logging, Coordinate, Estimate,
    GeometryError, PricingConfig, SquareFeet,
};

/// Errors surfaced to mobile callers. Only the message crosses the boundary.
#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum FfiEstimatorError {
    #[error("{0}")]
    InsufficientVertices(String),
    #[error("{0}")]
    InvalidGeometry(String),
    #[error("{0}")]
    Config(String),
}

impl From<GeometryError> for FfiEstimatorError {
    fn from(e: GeometryError) -> Self {
        match e {
            GeometryError::InsufficientVertices { .. } => {
                FfiEstimatorError::InsufficientVertices(e.to_string())
            }
            GeometryError::InvalidGeometry { .. } => {
                FfiEstimatorError::InvalidGeometry(e.to_string())
            }
        }
    }
}

/// Area of a drawn ring in square feet. An empty ring is 0.
#[uniffi::export]
pub fn ffi_derive_area(ring: Vec<Coordinate>) -> Result<u64, FfiEstimatorError> {
    init_logging();
    debug!("[LandscapeEstimatorRust] ffi_derive_area: {} vertices", ring.len());
    Ok(derive_area(&ring)?.value())
}

/// Estimate for an area; `None` when the area is zero.
#[uniffi::export]
pub fn ffi_calculate_estimate(
    square_feet: u64,
    conditions: PropertyConditions,
) -> Option<Estimate> {
    init_logging();
    calculate_estimate(SquareFeet(square_feet), &conditions).estimate()
}

/// Estimate with a custom rate card.
#[uniffi::export]
pub fn ffi_calculate_estimate_with_config(
    square_feet: u64,
    conditions: PropertyConditions,
    config: PricingConfig,
) -> Result<Option<Estimate>, FfiEstimatorError> {
    init_logging();
    config
        .validate()
        .map_err(|e| FfiEstimatorError::Config(e.to_string()))?;
    Ok(calculate_estimate_with(SquareFeet(square_feet), &conditions, &config).estimate())
}

/// Derive the area and price it in one call.
#[uniffi::export]
pub fn ffi_estimate_for_ring(
    ring: Vec<Coordinate>,
    conditions: PropertyConditions,
) -> Result<Option<Estimate>, FfiEstimatorError> {
    init_logging();
    let area = derive_area(&ring)?;
    let estimate = calculate_estimate(area, &conditions).estimate();
    if let Some(ref e) = estimate {
        info!(
            "[LandscapeEstimatorRust] {} sq ft -> ${} - ${}",
            area, e.low, e.high
        );
    }
    Ok(estimate)
}

/// Conditions a new estimate starts with.
#[uniffi::export]
pub fn ffi_default_conditions() -> PropertyConditions {
    PropertyConditions::default()
}

/// Multiplier currently applied for one category.
#[uniffi::export]
pub fn ffi_condition_multiplier(
    conditions: PropertyConditions,
    category: ConditionCategory,
) -> f64 {
    match category {
        ConditionCategory::GrassLength => conditions.grass_length.multiplier(),
        ConditionCategory::Obstacles => conditions.obstacles.multiplier(),
        ConditionCategory::Slope => conditions.slope.multiplier(),
        ConditionCategory::Access => conditions.access.multiplier(),
    }
}

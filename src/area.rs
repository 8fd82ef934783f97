//! Area derivation: coordinate ring → square feet.
//!
//! The polygon's surface area is computed on a sphere (Chamberlain–Duquette
//! spherical excess, Earth radius 6 378 137 m) rather than as a flat shoelace
//! over raw degrees, so a yard near Anchorage and one near Miami with the same
//! degree footprint get different areas, as they should.

use geo::ChamberlainDuquetteArea;
use log::debug;

use crate::error::GeometryError;
use crate::estimate::round_half_up;
use crate::ring::CoordinateRing;
use crate::{Coordinate, SquareFeet};

/// Fixed unit conversion: 1 m² = 10.764 ft².
pub const SQUARE_FEET_PER_SQUARE_METER: f64 = 10.764;

/// Surface area of a ring in square meters.
///
/// An empty ring has zero area. Orientation does not matter.
pub fn derive_area_square_meters(points: &[Coordinate]) -> Result<f64, GeometryError> {
    Ok(CoordinateRing::normalize(points)?
        .as_ref()
        .map_or(0.0, ring_area_square_meters))
}

/// Surface area of an already validated ring in square meters.
pub fn ring_area_square_meters(ring: &CoordinateRing) -> f64 {
    ring.to_polygon().chamberlain_duquette_unsigned_area()
}

/// Area of an already validated ring in whole square feet.
pub fn ring_area(ring: &CoordinateRing) -> SquareFeet {
    square_meters_to_square_feet(ring_area_square_meters(ring))
}

/// Usable area of a ring in whole square feet (rounded half-up).
///
/// # Errors
/// - [`GeometryError::InsufficientVertices`] for 1–2 distinct vertices
/// - [`GeometryError::InvalidGeometry`] for self-intersecting, collinear or
///   out-of-range rings
///
/// # Example
/// ```
/// use landscape_estimator::{derive_area, Coordinate, SquareFeet};
///
/// assert_eq!(derive_area(&[]).unwrap(), SquareFeet(0));
/// assert!(derive_area(&[Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)]).is_err());
/// ```
pub fn derive_area(points: &[Coordinate]) -> Result<SquareFeet, GeometryError> {
    let square_meters = derive_area_square_meters(points)?;
    let area = square_meters_to_square_feet(square_meters);
    debug!(
        "[Area] {} input vertices -> {:.2} m² -> {} sq ft",
        points.len(),
        square_meters,
        area
    );
    Ok(area)
}

/// Convert square meters to whole square feet.
pub fn square_meters_to_square_feet(square_meters: f64) -> SquareFeet {
    SquareFeet(round_half_up(square_meters * SQUARE_FEET_PER_SQUARE_METER))
}

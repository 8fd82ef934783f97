//! Coordinate ring normalization.
//!
//! Drawing tools hand over rings in whatever shape they happen to produce:
//! closed or open, with doubled clicks, occasionally crossing themselves.
//! [`CoordinateRing::normalize`] turns that input into a canonical open
//! vertex list that is guaranteed to describe a simple polygon, or says
//! exactly why it cannot.
//!
//! ## Checks (in order)
//!
//! 1. Empty input is "no region selected" (`Ok(None)`)
//! 2. Every vertex is a valid longitude/latitude
//! 3. Consecutive duplicates and the closing vertex are dropped
//! 4. At least three distinct vertices remain
//! 5. The vertices are not all collinear
//! 6. No two edges cross or overlap
//!
//! Accepted rings are stored in canonical order: starting at the smallest
//! (longitude, latitude) vertex and winding counter-clockwise. Reversed or
//! rotated versions of the same drawing therefore normalize to the same
//! vertex list and yield bit-identical areas.

use geo::algorithm::kernels::{Kernel, Orientation, RobustKernel};
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Coord, Line, LineString, Polygon};
use log::debug;

use crate::error::{GeometryError, GeometryIssue, MIN_RING_VERTICES};
use crate::{Bounds, Coordinate};

/// A validated simple polygon boundary, stored open (first vertex not repeated).
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateRing {
    vertices: Vec<Coordinate>,
}

impl CoordinateRing {
    /// Normalize and validate a raw ring.
    ///
    /// Returns `Ok(None)` for an empty ring. Closure is normalized here, so the
    /// input may or may not repeat its first vertex at the end.
    pub fn normalize(points: &[Coordinate]) -> Result<Option<Self>, GeometryError> {
        if points.is_empty() {
            return Ok(None);
        }

        if let Some(index) = points.iter().position(|p| !p.is_valid()) {
            return Err(GeometryError::invalid(GeometryIssue::InvalidCoordinate {
                index,
            }));
        }

        let mut vertices: Vec<Coordinate> = Vec::with_capacity(points.len());
        for p in points {
            if vertices.last() != Some(p) {
                vertices.push(*p);
            }
        }
        while vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }

        let distinct = count_distinct(&vertices);
        if distinct < MIN_RING_VERTICES {
            return Err(GeometryError::insufficient(distinct));
        }

        let coords: Vec<Coord> = vertices.iter().map(|v| v.to_coord()).collect();

        if is_collinear(&coords) {
            return Err(GeometryError::invalid(GeometryIssue::ZeroArea));
        }

        if let Some((first_edge, second_edge)) = find_self_intersection(&coords) {
            debug!(
                "[Ring] Rejecting ring of {} vertices: edges {} and {} intersect",
                coords.len(),
                first_edge,
                second_edge
            );
            return Err(GeometryError::invalid(GeometryIssue::SelfIntersection {
                first_edge,
                second_edge,
            }));
        }

        canonicalize(&mut vertices);

        Ok(Some(Self { vertices }))
    }

    /// Distinct vertices in canonical order, without the closing vertex.
    pub fn vertices(&self) -> &[Coordinate] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Always false: a normalized ring has at least three vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertices with the first one repeated at the end.
    pub fn closed_vertices(&self) -> Vec<Coordinate> {
        let mut closed = self.vertices.clone();
        closed.push(self.vertices[0]);
        closed
    }

    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::around(self.vertices[0]);
        for v in &self.vertices[1..] {
            bounds.include(*v);
        }
        bounds
    }

    /// Build a `geo` polygon (x = longitude, y = latitude); the exterior is
    /// closed by `Polygon::new`.
    pub fn to_polygon(&self) -> Polygon {
        let exterior: LineString = self.vertices.iter().map(|v| v.to_coord()).collect();
        Polygon::new(exterior, vec![])
    }
}

fn cmp_lng_lat(a: &Coordinate, b: &Coordinate) -> std::cmp::Ordering {
    a.longitude
        .total_cmp(&b.longitude)
        .then(a.latitude.total_cmp(&b.latitude))
}

/// Number of distinct vertices anywhere in the ring, not just consecutive ones.
fn count_distinct(vertices: &[Coordinate]) -> usize {
    let mut sorted = vertices.to_vec();
    sorted.sort_by(cmp_lng_lat);
    sorted.dedup_by(|a, b| cmp_lng_lat(a, b).is_eq());
    sorted.len()
}

/// Rotate so the smallest (lng, lat) vertex comes first, then wind
/// counter-clockwise.
///
/// The smallest vertex of a simple polygon is convex, so the turn there
/// gives the winding of the whole ring.
fn canonicalize(vertices: &mut [Coordinate]) {
    let start = vertices
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| cmp_lng_lat(a, b))
        .map_or(0, |(i, _)| i);
    vertices.rotate_left(start);

    let n = vertices.len();
    let turn = RobustKernel::orient2d(
        vertices[n - 1].to_coord(),
        vertices[0].to_coord(),
        vertices[1].to_coord(),
    );
    if matches!(turn, Orientation::Clockwise) {
        vertices[1..].reverse();
    }
}

/// True if every vertex lies on the line through the first two.
///
/// Vertices are deduplicated before this runs, so `coords[0] != coords[1]`.
fn is_collinear(coords: &[Coord]) -> bool {
    let origin = coords[0];
    let towards = coords[1];
    coords[2..].iter().all(|&c| {
        matches!(
            RobustKernel::orient2d(origin, towards, c),
            Orientation::Collinear
        )
    })
}

/// Find the first pair of edges (by index) that cross or overlap.
///
/// Adjacent edges always share one endpoint; that touch is allowed, a
/// collinear overlap (the ring doubling back on itself) is not.
fn find_self_intersection(coords: &[Coord]) -> Option<(usize, usize)> {
    let n = coords.len();
    let edges: Vec<Line> = (0..n)
        .map(|i| Line::new(coords[i], coords[(i + 1) % n]))
        .collect();

    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);

            match line_intersection(edges[i], edges[j]) {
                None => {}
                Some(LineIntersection::SinglePoint { .. }) if adjacent => {}
                Some(LineIntersection::Collinear { intersection })
                    if adjacent && intersection.start == intersection.end => {}
                Some(_) => return Some((i, j)),
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Coordinate> {
        vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.001, 0.0),
            Coordinate::new(0.001, 0.001),
            Coordinate::new(0.0, 0.001),
        ]
    }

    #[test]
    fn test_empty_ring_is_no_region() {
        assert_eq!(CoordinateRing::normalize(&[]), Ok(None));
    }

    #[test]
    fn test_closing_vertex_is_dropped() {
        let mut closed = square();
        closed.push(closed[0]);

        let open = CoordinateRing::normalize(&square()).unwrap().unwrap();
        let from_closed = CoordinateRing::normalize(&closed).unwrap().unwrap();

        assert_eq!(open, from_closed);
        assert_eq!(from_closed.len(), 4);
        assert_eq!(from_closed.closed_vertices().len(), 5);
    }

    #[test]
    fn test_double_clicks_are_collapsed() {
        let points = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.001, 0.0),
            Coordinate::new(0.001, 0.001),
            Coordinate::new(0.001, 0.001),
        ];
        let ring = CoordinateRing::normalize(&points).unwrap().unwrap();
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn test_two_points_insufficient() {
        let points = vec![Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0)];
        assert_eq!(
            CoordinateRing::normalize(&points),
            Err(GeometryError::InsufficientVertices {
                vertex_count: 2,
                minimum_required: 3
            })
        );
    }

    #[test]
    fn test_closed_two_point_ring_insufficient() {
        // a -> b -> a only has two distinct vertices
        let points = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(0.0, 0.0),
        ];
        assert!(matches!(
            CoordinateRing::normalize(&points),
            Err(GeometryError::InsufficientVertices { vertex_count: 2, .. })
        ));
    }

    #[test]
    fn test_back_and_forth_two_points_insufficient() {
        // a -> b -> a -> b never encloses anything
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.001, 0.001);
        let err = CoordinateRing::normalize(&[a, b, a, b]).unwrap_err();

        assert_eq!(
            err,
            GeometryError::InsufficientVertices {
                vertex_count: 2,
                minimum_required: 3
            }
        );
        assert_eq!(err.user_message(), "Draw a complete area");
    }

    #[test]
    fn test_bounds_cover_all_vertices() {
        let ring = CoordinateRing::normalize(&square()).unwrap().unwrap();
        let bounds = ring.bounds();

        assert_eq!(bounds.min_lng, 0.0);
        assert_eq!(bounds.max_lng, 0.001);
        assert_eq!(bounds.min_lat, 0.0);
        assert_eq!(bounds.max_lat, 0.001);
        assert_eq!(bounds.center(), Coordinate::new(0.0005, 0.0005));
    }

    #[test]
    fn test_invalid_coordinate_reports_index() {
        let mut points = square();
        points[2] = Coordinate::new(0.001, f64::NAN);
        assert_eq!(
            CoordinateRing::normalize(&points),
            Err(GeometryError::InvalidGeometry {
                reason: GeometryIssue::InvalidCoordinate { index: 2 }
            })
        );
    }

    #[test]
    fn test_collinear_ring_rejected() {
        let points = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.001, 0.001),
            Coordinate::new(0.002, 0.002),
        ];
        assert_eq!(
            CoordinateRing::normalize(&points),
            Err(GeometryError::InvalidGeometry {
                reason: GeometryIssue::ZeroArea
            })
        );
    }

    #[test]
    fn test_bowtie_rejected() {
        // Edges 0 (0,0)->(1,1) and 2 (1,0)->(0,1) cross at the center
        let points = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.001, 0.001),
            Coordinate::new(0.001, 0.0),
            Coordinate::new(0.0, 0.001),
        ];
        assert_eq!(
            CoordinateRing::normalize(&points),
            Err(GeometryError::InvalidGeometry {
                reason: GeometryIssue::SelfIntersection {
                    first_edge: 0,
                    second_edge: 2
                }
            })
        );
    }

    #[test]
    fn test_spike_rejected() {
        // Doubles back along the bottom edge
        let points = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.002, 0.0),
            Coordinate::new(0.001, 0.0),
            Coordinate::new(0.001, 0.001),
        ];
        assert!(matches!(
            CoordinateRing::normalize(&points),
            Err(GeometryError::InvalidGeometry {
                reason: GeometryIssue::SelfIntersection { .. }
            })
        ));
    }

    #[test]
    fn test_concave_ring_accepted() {
        let points = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.002, 0.0),
            Coordinate::new(0.002, 0.002),
            Coordinate::new(0.001, 0.0005),
            Coordinate::new(0.0, 0.002),
        ];
        let ring = CoordinateRing::normalize(&points).unwrap().unwrap();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.bounds().max_lng, 0.002);
    }

    #[test]
    fn test_vertex_on_straight_edge_accepted() {
        let points = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.001, 0.0),
            Coordinate::new(0.002, 0.0),
            Coordinate::new(0.002, 0.002),
            Coordinate::new(0.0, 0.002),
        ];
        assert!(CoordinateRing::normalize(&points).unwrap().is_some());
    }

    #[test]
    fn test_canonical_order() {
        // Clockwise, starting at the north-east corner
        let points = vec![
            Coordinate::new(0.001, 0.001),
            Coordinate::new(0.001, 0.0),
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.001),
        ];
        let ring = CoordinateRing::normalize(&points).unwrap().unwrap();
        assert_eq!(
            ring.vertices(),
            &[
                Coordinate::new(0.0, 0.0),
                Coordinate::new(0.001, 0.0),
                Coordinate::new(0.001, 0.001),
                Coordinate::new(0.0, 0.001),
            ]
        );

        let mut reversed = points.clone();
        reversed.reverse();
        assert_eq!(CoordinateRing::normalize(&reversed).unwrap().unwrap(), ring);
    }

    #[test]
    fn test_normalization_is_deterministic() {
        let points = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.001, 0.001),
            Coordinate::new(0.001, 0.0),
            Coordinate::new(0.0, 0.001),
        ];
        assert_eq!(
            CoordinateRing::normalize(&points),
            CoordinateRing::normalize(&points)
        );
    }
}

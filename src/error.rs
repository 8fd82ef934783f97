//! Unified error handling for the landscape-estimator library.
//!
//! The pure core (ring normalization, area derivation, estimate calculation)
//! only ever fails with a [`GeometryError`]. Everything around it (pricing
//! configuration, record validation, storage) reports through
//! [`EstimatorError`], which wraps the core errors.
//!
//! Expected states are not errors: an empty ring is "no region selected" and
//! a zero area is "no estimate available".

use std::fmt;

use thiserror::Error;

/// Minimum number of distinct vertices a ring needs to enclose an area.
pub const MIN_RING_VERTICES: usize = 3;

/// Why a ring was rejected as invalid geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryIssue {
    /// A vertex is not a finite longitude/latitude within range.
    InvalidCoordinate { index: usize },
    /// Two edges of the ring cross or overlap. Edge `i` runs from vertex `i`
    /// to vertex `i + 1` (wrapping back to vertex 0).
    SelfIntersection { first_edge: usize, second_edge: usize },
    /// Every vertex lies on a single line, so the ring encloses nothing.
    ZeroArea,
}

impl fmt::Display for GeometryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryIssue::InvalidCoordinate { index } => {
                write!(f, "vertex {} is not a valid longitude/latitude", index)
            }
            GeometryIssue::SelfIntersection {
                first_edge,
                second_edge,
            } => {
                write!(f, "edges {} and {} intersect", first_edge, second_edge)
            }
            GeometryIssue::ZeroArea => write!(f, "all vertices are collinear"),
        }
    }
}

/// Errors produced while turning a coordinate ring into an area.
///
/// Both variants share the same recovery path: the user redraws the area.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// Ring has fewer than three distinct vertices.
    #[error("ring has {vertex_count} distinct vertices, minimum {minimum_required} required")]
    InsufficientVertices {
        vertex_count: usize,
        minimum_required: usize,
    },
    /// Ring is self-intersecting or otherwise not a simple polygon.
    #[error("invalid geometry: {reason}")]
    InvalidGeometry { reason: GeometryIssue },
}

impl GeometryError {
    pub(crate) fn insufficient(vertex_count: usize) -> Self {
        GeometryError::InsufficientVertices {
            vertex_count,
            minimum_required: MIN_RING_VERTICES,
        }
    }

    pub(crate) fn invalid(reason: GeometryIssue) -> Self {
        GeometryError::InvalidGeometry { reason }
    }

    /// Message shown to the user in place of the results panel.
    pub fn user_message(&self) -> &'static str {
        match self {
            GeometryError::InsufficientVertices { .. } => "Draw a complete area",
            GeometryError::InvalidGeometry { .. } => {
                "The drawn area crosses itself. Please redraw it"
            }
        }
    }
}

/// A condition level string that is not part of its category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {category} level '{value}'")]
pub struct ParseLevelError {
    pub category: &'static str,
    pub value: String,
}

/// Crate-wide error type for operations outside the pure core.
#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    UnknownLevel(#[from] ParseLevelError),

    /// Pricing configuration failed validation
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Estimate record is missing mandatory data
    #[error("invalid estimate record: {message}")]
    InvalidRecord { message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persistence/storage error
    #[cfg(feature = "persistence")]
    #[error("persistence error: {0}")]
    Persistence(#[from] rusqlite::Error),
}

impl EstimatorError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        EstimatorError::Config {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_record(message: impl Into<String>) -> Self {
        EstimatorError::InvalidRecord {
            message: message.into(),
        }
    }
}

/// Result type alias for landscape-estimator operations.
pub type Result<T> = std::result::Result<T, EstimatorError>;

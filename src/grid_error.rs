//! GridError: Unified error type for curvgrid public APIs
//!
//! Index and shape errors are programming errors and are always propagated.
//! Boundary-tag lookups are the one lenient surface: they return `None`
//! instead of an error (see [`crate::topology::boundary`]).

use thiserror::Error;

/// Unified error type for grid generation and access.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    /// Multi-index outside the node lattice (or a non-zero unused component).
    #[error("invalid multi-index ({m}, {n}, {p})")]
    InvalidIndex { m: usize, n: usize, p: usize },
    /// Linear node id outside `0..size`.
    #[error("invalid node id {id}: grid has {size} nodes")]
    InvalidNodeId { id: usize, size: usize },
    /// Axis or tensor component index at or beyond the grid dimensionality.
    #[error("invalid axis {axis} for a {ndim}D grid")]
    InvalidAxis { axis: usize, ndim: usize },
    /// The covariant metric matrix is singular or nearly so at this node.
    #[error("degenerate mapping at ({m}, {n}, {p}): det(g)/prod(g_ii) = {ratio:e}")]
    DegenerateMapping {
        m: usize,
        n: usize,
        p: usize,
        ratio: f64,
    },
    /// A value sequence does not match the grid's node count or lattice shape.
    #[error("shape mismatch: expected {expected} values, found {found}")]
    ShapeMismatch { expected: usize, found: usize },
    /// Operation restricted to another dimensionality.
    #[error("{operation} is not available on a {ndim}D grid")]
    UnsupportedDimension {
        operation: &'static str,
        ndim: usize,
    },
    /// Generation input rejected before any node was evaluated.
    #[error("invalid grid input: {0}")]
    InvalidInput(String),
    /// The grid was generated without metrics (explicit coordinate lists).
    #[error("metric data is not available on a metric-free grid")]
    MetricUnavailable,
    /// A NURBS parameter fell outside the knot-vector domain.
    #[error("parameter {value} outside the NURBS domain along axis {axis}")]
    ParameterOutOfDomain { axis: usize, value: f64 },
    /// A structural invariant of a generated grid does not hold.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

#![cfg_attr(docsrs, feature(doc_cfg))]
//! # curvgrid
//!
//! curvgrid builds structured (tensor-product) grids over possibly curved
//! physical domains and computes, at every node, the differential geometry
//! needed to do calculus in the curvilinear coordinate system: covariant basis
//! vectors, covariant and contravariant metrics, the metric determinant,
//! Christoffel symbols of the second kind and the Laplacian coefficients `L^k`.
//!
//! ## Features
//! - Uniform and explicit rectangular grids in 1D, 2D and 3D
//! - Transfinite (Coons-type) grids with analytic first and second derivatives
//! - NURBS-backed grids through the [`NurbsEvaluator`](geometry::nurbs::NurbsEvaluator) contract
//! - Edge and face node sets addressed by side number or integer tag
//! - Optional parallel generation with the `rayon` feature
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! curvgrid = "0.3"
//! # Optional features:
//! # features = ["rayon", "check-invariants"]
//! ```
//!
//! ```
//! use curvgrid::prelude::*;
//!
//! let ring = Transfinite::surf2d_quarter_ring(1.0, 2.0)?;
//! let r = vec![-1.0, 0.0, 1.0];
//! let grid = Grid::transfinite(&ring, &[r.clone(), r])?;
//! let l0 = grid.l_coeff(0, 0, 0, 0)?;
//! assert!((l0 + 2.0).abs() < 1e-12); // -1 / (rho * drho/dr) at rho = 1
//! # Ok::<(), GridError>(())
//! ```
//!
//! Grids are immutable once generated; regenerate to change them.

pub mod debug_invariants;
pub mod geometry;
pub mod grid;
pub mod grid_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;
pub use grid_error::GridError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::geometry::mapping::{CoordinateMapping, DerivOrder, Jet};
    pub use crate::geometry::metrics::Metric;
    pub use crate::geometry::nurbs::{Nurbs, NurbsEvaluator};
    pub use crate::geometry::transfinite::{BoundaryPatch, Transfinite};
    pub use crate::grid::{GenerationOptions, Grid, Node};
    pub use crate::grid_error::GridError;
    pub use crate::topology::boundary::BoundarySide;
    pub use crate::topology::index::GridShape;
}

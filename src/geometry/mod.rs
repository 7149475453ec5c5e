//! Coordinate mappings and the per-node metric engine.
//!
//! [`mapping`] turns a parametric coordinate into a position with derivatives;
//! [`metrics`] turns those derivatives into metric tensors and Christoffel symbols.

pub mod linalg;
pub mod mapping;
pub mod metrics;
pub mod nurbs;
pub mod transfinite;

pub use mapping::{CoordinateMapping, DerivOrder, Jet};
pub use metrics::{Metric, SingularMetric, compute_metric};

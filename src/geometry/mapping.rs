//! Coordinate mappings from the parametric cube `[-1, 1]^d` to physical space.
//!
//! Every variant answers the same question: given a node's parametric
//! coordinate `U`, what are `X(U)`, `dX/du_k` and `d2X/du_k du_l`?
//! The set of variants is closed; the grid dispatches on [`CoordinateMapping`].

use crate::geometry::linalg::{Vec3, scale};
use crate::geometry::nurbs::NurbsEvaluator;
use crate::geometry::transfinite::Transfinite;
use crate::grid_error::GridError;

/// Highest derivative order a caller needs from a mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DerivOrder {
    Position,
    First,
    Second,
}

/// Position and partial derivatives at one parametric point.
///
/// `d1[k]` is `dX/du_k` and `d2[k][l]` is `d2X/du_k du_l`. Entries beyond
/// the mapping's dimensionality, or beyond the requested order, are zero.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Jet {
    pub x: Vec3,
    pub d1: [Vec3; 3],
    pub d2: [[Vec3; 3]; 3],
}

impl Jet {
    /// Jet of a point with no derivative information.
    pub fn point(x: Vec3) -> Self {
        Self {
            x,
            ..Self::default()
        }
    }
}

/// The generation strategies a grid can be built from.
#[derive(Clone, Copy)]
pub enum CoordinateMapping<'a> {
    /// Axis-aligned box, affine along each axis.
    Uniform { xmin: Vec3, xmax: Vec3 },
    /// Per-axis coordinate lists; nodes take the listed values verbatim.
    Explicit { coords: &'a [Vec<f64>] },
    /// Boundary-interpolated (Coons-type) mapping.
    Transfinite(&'a Transfinite),
    /// External NURBS evaluator, rescaled from `[-1, 1]` to its own domain.
    Nurbs(&'a dyn NurbsEvaluator),
}

impl std::fmt::Debug for CoordinateMapping<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl CoordinateMapping<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uniform { .. } => "uniform",
            Self::Explicit { .. } => "explicit",
            Self::Transfinite(_) => "transfinite",
            Self::Nurbs(_) => "nurbs",
        }
    }

    /// Whether nodes generated from this mapping carry a metric.
    pub fn has_metric(&self) -> bool {
        !matches!(self, Self::Explicit { .. })
    }

    /// Evaluates the mapping for the node at multi-index `index` whose
    /// parametric coordinate is `u` (first `ndim` entries in use).
    pub fn evaluate(
        &self,
        index: [usize; 3],
        u: Vec3,
        ndim: usize,
        order: DerivOrder,
    ) -> Result<Jet, GridError> {
        match *self {
            Self::Uniform { xmin, xmax } => {
                let mut jet = Jet::default();
                for k in 0..ndim {
                    let half = (xmax[k] - xmin[k]) / 2.0;
                    jet.x[k] = xmin[k] + (1.0 + u[k]) * half;
                    jet.d1[k][k] = half;
                }
                Ok(jet)
            }
            Self::Explicit { coords } => {
                let mut x = [0.0; 3];
                for k in 0..ndim {
                    x[k] = coords[k][index[k]];
                }
                Ok(Jet::point(x))
            }
            Self::Transfinite(tfi) => Ok(tfi.evaluate(u, order)),
            Self::Nurbs(nurbs) => {
                let mut s = [0.0; 3];
                let mut h = [0.0; 3];
                for k in 0..ndim {
                    let (a, b) = nurbs.domain(k);
                    h[k] = (b - a) / 2.0;
                    s[k] = a + (1.0 + u[k]) * h[k];
                }
                let mut jet = nurbs.evaluate(&s[..ndim], order)?;
                for k in 0..ndim {
                    jet.d1[k] = scale(h[k], jet.d1[k]);
                    for l in 0..ndim {
                        jet.d2[k][l] = scale(h[k] * h[l], jet.d2[k][l]);
                    }
                }
                Ok(jet)
            }
        }
    }
}

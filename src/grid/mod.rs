//! Structured curvilinear grids with per-node metric data.
//!
//! A [`Grid`] is generated exactly once from one of the coordinate mappings in
//! [`crate::geometry::mapping`] and is immutable afterwards. Every node stores
//! its parametric coordinate `U`, its physical position `X` and, unless the
//! grid was built from explicit coordinate lists, the [`Metric`] at that node.
//!
//! ```
//! use curvgrid::grid::Grid;
//!
//! let grid = Grid::uniform(&[-6.0, -3.0], &[6.0, 3.0], &[5, 4])?;
//! assert_eq!(grid.size(), 20);
//! assert_eq!(grid.node(4)?, &[6.0, -3.0]);
//! assert_eq!(grid.edge(0), Some(vec![0, 5, 10, 15]));
//! # Ok::<(), curvgrid::GridError>(())
//! ```

pub mod meshgrid;

use serde::{Deserialize, Serialize};

use crate::debug_invariants::DebugInvariants;
use crate::geometry::linalg::Vec3;
use crate::geometry::mapping::{CoordinateMapping, DerivOrder};
use crate::geometry::metrics::{Metric, compute_metric};
use crate::geometry::nurbs::NurbsEvaluator;
use crate::geometry::transfinite::Transfinite;
use crate::grid_error::GridError;
use crate::topology::boundary;
use crate::topology::index::{GridShape, MAX_DIM};

/// One grid node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Parametric coordinate; components beyond the grid dimension are zero.
    pub u: Vec3,
    /// Physical position; unused components are zero.
    pub x: Vec3,
    /// `None` on grids generated from explicit coordinate lists.
    pub metric: Option<Metric>,
}

/// Knobs for grid generation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationOptions {
    /// A node is degenerate when `det(g) / prod(g_ii)` is at or below this value.
    pub degeneracy_tolerance: f64,
    /// Evaluate nodes on the rayon pool (only with the `rayon` feature).
    pub parallel: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            degeneracy_tolerance: 1e-12,
            parallel: true,
        }
    }
}

/// Tensor-product grid over a 1D, 2D or 3D parametric domain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct Grid {
    shape: GridShape,
    umin: Vec3,
    umax: Vec3,
    xmin: Vec3,
    xmax: Vec3,
    nodes: Vec<Node>,
}

/// Serialized layout of [`Grid`]; the node count must match the shape.
#[derive(Deserialize)]
struct RawGrid {
    shape: GridShape,
    umin: Vec3,
    umax: Vec3,
    xmin: Vec3,
    xmax: Vec3,
    nodes: Vec<Node>,
}

impl TryFrom<RawGrid> for Grid {
    type Error = GridError;

    fn try_from(raw: RawGrid) -> Result<Self, GridError> {
        if raw.nodes.len() != raw.shape.size() {
            return Err(GridError::ShapeMismatch {
                expected: raw.shape.size(),
                found: raw.nodes.len(),
            });
        }
        Ok(Self {
            shape: raw.shape,
            umin: raw.umin,
            umax: raw.umax,
            xmin: raw.xmin,
            xmax: raw.xmax,
            nodes: raw.nodes,
        })
    }
}

impl Grid {
    /// Axis-aligned box `[xmin, xmax]` with `npts` equally spaced points per axis.
    pub fn uniform(xmin: &[f64], xmax: &[f64], npts: &[usize]) -> Result<Self, GridError> {
        Self::uniform_with_options(xmin, xmax, npts, &GenerationOptions::default())
    }

    pub fn uniform_with_options(
        xmin: &[f64],
        xmax: &[f64],
        npts: &[usize],
        opts: &GenerationOptions,
    ) -> Result<Self, GridError> {
        let ndim = npts.len();
        for bounds in [xmin, xmax] {
            if bounds.len() != ndim {
                return Err(GridError::ShapeMismatch {
                    expected: ndim,
                    found: bounds.len(),
                });
            }
        }
        let mut lo = [0.0; 3];
        let mut hi = [0.0; 3];
        for axis in 0..ndim.min(MAX_DIM) {
            if !(xmin[axis] < xmax[axis]) || !xmin[axis].is_finite() || !xmax[axis].is_finite() {
                return Err(GridError::InvalidInput(format!(
                    "axis {axis}: need finite xmin < xmax, got [{}, {}]",
                    xmin[axis], xmax[axis]
                )));
            }
            lo[axis] = xmin[axis];
            hi[axis] = xmax[axis];
        }
        let ulists = npts
            .iter()
            .enumerate()
            .map(|(axis, &n)| {
                if n < 2 {
                    return Err(GridError::InvalidInput(format!(
                        "axis {axis} needs at least 2 points, got {n}"
                    )));
                }
                Ok(linspace(-1.0, 1.0, n))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::generate(
            CoordinateMapping::Uniform { xmin: lo, xmax: hi },
            &ulists,
            opts,
        )
    }

    /// Lattice whose nodes are exactly the listed per-axis coordinates.
    ///
    /// Each list must be strictly monotonic with at least two entries. The
    /// resulting grid carries no metric: the metric accessors report
    /// [`GridError::MetricUnavailable`].
    pub fn explicit(coords: &[Vec<f64>]) -> Result<Self, GridError> {
        Self::explicit_with_options(coords, &GenerationOptions::default())
    }

    pub fn explicit_with_options(
        coords: &[Vec<f64>],
        opts: &GenerationOptions,
    ) -> Result<Self, GridError> {
        let ulists = coords
            .iter()
            .enumerate()
            .map(|(axis, list)| {
                if list.len() < 2 {
                    return Err(GridError::InvalidInput(format!(
                        "axis {axis} needs at least 2 coordinates, got {}",
                        list.len()
                    )));
                }
                let increasing = list.windows(2).all(|w| w[0] < w[1]);
                let decreasing = list.windows(2).all(|w| w[0] > w[1]);
                if !(increasing || decreasing) || list.iter().any(|c| !c.is_finite()) {
                    return Err(GridError::InvalidInput(format!(
                        "axis {axis}: coordinates must be finite and strictly monotonic"
                    )));
                }
                let (first, last) = (list[0], list[list.len() - 1]);
                Ok(list
                    .iter()
                    .map(|&c| -1.0 + 2.0 * (c - first) / (last - first))
                    .collect::<Vec<_>>())
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::generate(CoordinateMapping::Explicit { coords }, &ulists, opts)
    }

    /// Grid through a transfinite mapping, sampled at the given parametric
    /// values (one list per axis, each value in `[-1, 1]`).
    pub fn transfinite(tfi: &Transfinite, samples: &[Vec<f64>]) -> Result<Self, GridError> {
        Self::transfinite_with_options(tfi, samples, &GenerationOptions::default())
    }

    pub fn transfinite_with_options(
        tfi: &Transfinite,
        samples: &[Vec<f64>],
        opts: &GenerationOptions,
    ) -> Result<Self, GridError> {
        check_samples(samples, tfi.ndim())?;
        Self::generate(CoordinateMapping::Transfinite(tfi), samples, opts)
    }

    /// Grid through a NURBS curve, surface or volume. Samples live in
    /// `[-1, 1]` and are rescaled onto the evaluator's knot domain.
    pub fn from_nurbs(nurbs: &dyn NurbsEvaluator, samples: &[Vec<f64>]) -> Result<Self, GridError> {
        Self::from_nurbs_with_options(nurbs, samples, &GenerationOptions::default())
    }

    pub fn from_nurbs_with_options(
        nurbs: &dyn NurbsEvaluator,
        samples: &[Vec<f64>],
        opts: &GenerationOptions,
    ) -> Result<Self, GridError> {
        check_samples(samples, nurbs.ndim())?;
        Self::generate(CoordinateMapping::Nurbs(nurbs), samples, opts)
    }

    fn generate(
        mapping: CoordinateMapping<'_>,
        ulists: &[Vec<f64>],
        opts: &GenerationOptions,
    ) -> Result<Self, GridError> {
        let npts: Vec<usize> = ulists.iter().map(Vec::len).collect();
        let shape = GridShape::new(&npts)?;
        let ndim = shape.ndim();
        let with_metric = mapping.has_metric();
        let order = if with_metric {
            DerivOrder::Second
        } else {
            DerivOrder::Position
        };
        let tolerance = opts.degeneracy_tolerance;

        let build = |(m, n, p): (usize, usize, usize)| -> Result<Node, GridError> {
            let index = [m, n, p];
            let mut u = [0.0; 3];
            for k in 0..ndim {
                u[k] = ulists[k][index[k]];
            }
            let jet = mapping.evaluate(index, u, ndim, order)?;
            let metric = if with_metric {
                let metric = compute_metric(ndim, &jet.d1, &jet.d2, tolerance).map_err(|e| {
                    log::trace!("{} mapping at ({m}, {n}, {p}): {e}", mapping.name());
                    GridError::DegenerateMapping {
                        m,
                        n,
                        p,
                        ratio: e.ratio,
                    }
                })?;
                Some(metric)
            } else {
                None
            };
            Ok(Node {
                u,
                x: jet.x,
                metric,
            })
        };

        #[cfg(feature = "rayon")]
        let nodes = if opts.parallel {
            use rayon::prelude::*;
            (0..shape.size())
                .into_par_iter()
                .map(|id| shape.to_multi(id).and_then(&build))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            shape.indices().map(&build).collect::<Result<Vec<_>, _>>()?
        };
        #[cfg(not(feature = "rayon"))]
        let nodes = shape.indices().map(&build).collect::<Result<Vec<_>, _>>()?;

        let mut umin = [0.0; 3];
        let mut umax = [0.0; 3];
        let mut xmin = [0.0; 3];
        let mut xmax = [0.0; 3];
        for k in 0..ndim {
            umin[k] = ulists[k].iter().copied().fold(f64::INFINITY, f64::min);
            umax[k] = ulists[k].iter().copied().fold(f64::NEG_INFINITY, f64::max);
            xmin[k] = nodes.iter().map(|nd| nd.x[k]).fold(f64::INFINITY, f64::min);
            xmax[k] = nodes.iter().map(|nd| nd.x[k]).fold(f64::NEG_INFINITY, f64::max);
        }

        let grid = Self {
            shape,
            umin,
            umax,
            xmin,
            xmax,
            nodes,
        };
        log::debug!(
            "generated {} grid: npts {:?}, {} nodes",
            mapping.name(),
            npts,
            grid.size()
        );
        crate::debug_invariants!(grid.validate_invariants(), "Grid::generate");
        Ok(grid)
    }

    // ---------------------------------------------------------------------
    // shape and bounds
    // ---------------------------------------------------------------------

    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Point count along `axis`; 1 for axes beyond the grid dimension.
    #[inline]
    pub fn npts(&self, axis: usize) -> usize {
        self.shape.npts(axis)
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn shape(&self) -> &GridShape {
        &self.shape
    }

    pub fn umin(&self, axis: usize) -> f64 {
        self.umin.get(axis).copied().unwrap_or(0.0)
    }

    pub fn umax(&self, axis: usize) -> f64 {
        self.umax.get(axis).copied().unwrap_or(0.0)
    }

    pub fn xmin(&self, axis: usize) -> f64 {
        self.xmin.get(axis).copied().unwrap_or(0.0)
    }

    pub fn xmax(&self, axis: usize) -> f64 {
        self.xmax.get(axis).copied().unwrap_or(0.0)
    }

    /// Physical extent `xmax - xmin` along `axis`.
    pub fn xlen(&self, axis: usize) -> f64 {
        self.xmax(axis) - self.xmin(axis)
    }

    // ---------------------------------------------------------------------
    // nodes
    // ---------------------------------------------------------------------

    pub fn index_to_linear(&self, m: usize, n: usize, p: usize) -> Result<usize, GridError> {
        self.shape.to_linear(m, n, p)
    }

    pub fn index_to_multi(&self, id: usize) -> Result<(usize, usize, usize), GridError> {
        self.shape.to_multi(id)
    }

    /// All nodes in linear-id order.
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Physical coordinate of node `id` (first `ndim` components).
    pub fn node(&self, id: usize) -> Result<&[f64], GridError> {
        let ndim = self.ndim();
        self.nodes
            .get(id)
            .map(|nd| &nd.x[..ndim])
            .ok_or(GridError::InvalidNodeId {
                id,
                size: self.nodes.len(),
            })
    }

    fn node_at(&self, m: usize, n: usize, p: usize) -> Result<&Node, GridError> {
        let id = self.shape.to_linear(m, n, p)?;
        self.nodes.get(id).ok_or(GridError::InvalidNodeId {
            id,
            size: self.nodes.len(),
        })
    }

    /// Parametric coordinate at `(m, n, p)`.
    pub fn u(&self, m: usize, n: usize, p: usize) -> Result<&[f64], GridError> {
        let ndim = self.ndim();
        Ok(&self.node_at(m, n, p)?.u[..ndim])
    }

    /// Physical coordinate at `(m, n, p)`.
    pub fn x(&self, m: usize, n: usize, p: usize) -> Result<&[f64], GridError> {
        let ndim = self.ndim();
        Ok(&self.node_at(m, n, p)?.x[..ndim])
    }

    // ---------------------------------------------------------------------
    // metrics
    // ---------------------------------------------------------------------

    /// Whether nodes carry metric data.
    pub fn has_metric(&self) -> bool {
        self.nodes.iter().all(|nd| nd.metric.is_some())
    }

    /// Full metric record at `(m, n, p)`.
    pub fn metric(&self, m: usize, n: usize, p: usize) -> Result<&Metric, GridError> {
        self.node_at(m, n, p)?
            .metric
            .as_ref()
            .ok_or(GridError::MetricUnavailable)
    }

    fn check_axis(&self, axes: &[usize]) -> Result<(), GridError> {
        let ndim = self.ndim();
        match axes.iter().find(|&&axis| axis >= ndim) {
            Some(&axis) => Err(GridError::InvalidAxis { axis, ndim }),
            None => Ok(()),
        }
    }

    /// Covariant basis vector `g_k` at `(m, n, p)`, first `ndim` components.
    pub fn covar_basis(&self, m: usize, n: usize, p: usize, k: usize) -> Result<Vec<f64>, GridError> {
        self.check_axis(&[k])?;
        let g = self.metric(m, n, p)?.covariant_basis(k);
        Ok(g[..self.ndim()].to_vec())
    }

    /// Covariant metric `g_ij` at `(m, n, p)`.
    pub fn covar_matrix(&self, m: usize, n: usize, p: usize) -> Result<Vec<Vec<f64>>, GridError> {
        Ok(self.metric(m, n, p)?.covariant_matrix())
    }

    /// Contravariant metric `g^ij` at `(m, n, p)`.
    pub fn contra_matrix(&self, m: usize, n: usize, p: usize) -> Result<Vec<Vec<f64>>, GridError> {
        Ok(self.metric(m, n, p)?.contravariant_matrix())
    }

    /// `det(g_ij)` at `(m, n, p)`.
    pub fn det_covar_matrix(&self, m: usize, n: usize, p: usize) -> Result<f64, GridError> {
        Ok(self.metric(m, n, p)?.determinant())
    }

    /// Christoffel symbol `Γ^k_ij` at `(m, n, p)`.
    pub fn gamma_s(
        &self,
        m: usize,
        n: usize,
        p: usize,
        k: usize,
        i: usize,
        j: usize,
    ) -> Result<f64, GridError> {
        self.check_axis(&[k, i, j])?;
        Ok(self.metric(m, n, p)?.gamma(k, i, j))
    }

    /// Laplacian coefficient `L^k` at `(m, n, p)`.
    pub fn l_coeff(&self, m: usize, n: usize, p: usize, k: usize) -> Result<f64, GridError> {
        self.check_axis(&[k])?;
        Ok(self.metric(m, n, p)?.l_coeff(k))
    }

    // ---------------------------------------------------------------------
    // boundaries
    // ---------------------------------------------------------------------

    /// Node ids on a 2D edge (0 xmin, 1 xmax, 2 ymin, 3 ymax).
    pub fn edge(&self, side: usize) -> Option<Vec<usize>> {
        boundary::edge(&self.shape, side)
    }

    /// Node ids on a 3D face (0 xmin, 1 xmax, 2 ymin, 3 ymax, 4 zmin, 5 zmax).
    pub fn face(&self, side: usize) -> Option<Vec<usize>> {
        boundary::face(&self.shape, side)
    }

    pub fn edge_given_tag(&self, tag: i32) -> Option<Vec<usize>> {
        boundary::edge_given_tag(&self.shape, tag)
    }

    pub fn face_given_tag(&self, tag: i32) -> Option<Vec<usize>> {
        boundary::face_given_tag(&self.shape, tag)
    }

    /// Edge (2D) or face (3D) node ids for `tag`.
    pub fn boundary(&self, tag: i32) -> Option<Vec<usize>> {
        boundary::boundary(&self.shape, tag)
    }
}

impl DebugInvariants for Grid {
    fn validate_invariants(&self) -> Result<(), GridError> {
        if self.nodes.len() != self.shape.size() {
            return Err(GridError::InvariantViolation(format!(
                "{} nodes stored for a lattice of {}",
                self.nodes.len(),
                self.shape.size()
            )));
        }
        for (id, node) in self.nodes.iter().enumerate() {
            if node.x.iter().any(|c| !c.is_finite()) {
                return Err(GridError::InvariantViolation(format!(
                    "node {id} has a non-finite position"
                )));
            }
            if let Some(mtr) = &node.metric {
                mtr.validate_invariants().map_err(|err| match err {
                    GridError::InvariantViolation(msg) => {
                        GridError::InvariantViolation(format!("node {id}: {msg}"))
                    }
                    other => other,
                })?;
            }
        }
        Ok(())
    }
}

/// `n >= 2` equally spaced values from `a` to `b`, endpoints exact.
fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
    let step = (b - a) / (n - 1) as f64;
    let mut out: Vec<f64> = (0..n).map(|i| a + i as f64 * step).collect();
    out[n - 1] = b;
    out
}

fn check_samples(samples: &[Vec<f64>], ndim: usize) -> Result<(), GridError> {
    if samples.len() != ndim {
        return Err(GridError::ShapeMismatch {
            expected: ndim,
            found: samples.len(),
        });
    }
    for (axis, list) in samples.iter().enumerate() {
        if list.is_empty() {
            return Err(GridError::InvalidInput(format!(
                "axis {axis} has no sample values"
            )));
        }
        if let Some(bad) = list.iter().find(|u| !(-1.0..=1.0).contains(*u)) {
            return Err(GridError::InvalidInput(format!(
                "axis {axis}: sample {bad} outside [-1, 1]"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-13
    }

    #[test]
    fn linspace_hits_endpoints() {
        let v = linspace(-1.0, 1.0, 5);
        assert_eq!(v, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert_eq!(linspace(-1.0, 1.0, 4)[3], 1.0);
    }

    #[test]
    fn one_dimensional_uniform() {
        let grid = Grid::uniform(&[2.0], &[6.0], &[3]).unwrap();
        assert_eq!(grid.ndim(), 1);
        assert_eq!(grid.size(), 3);
        assert_eq!(grid.npts(1), 1);
        assert_eq!(grid.node(1).unwrap(), &[4.0]);
        assert!(approx(grid.det_covar_matrix(2, 0, 0).unwrap(), 4.0));
        assert_eq!(grid.edge(0), None);
        assert_eq!(grid.boundary(10), None);
        assert_eq!(grid.xlen(0), 4.0);
        assert_eq!(grid.xlen(2), 0.0);
    }

    #[test]
    fn explicit_grid_has_no_metric() {
        let coords = vec![vec![3.0, 2.0, 0.0], vec![0.0, 1.0]];
        let grid = Grid::explicit(&coords).unwrap();
        assert!(!grid.has_metric());
        assert_eq!(grid.x(2, 1, 0).unwrap(), &[0.0, 1.0]);
        assert_eq!(grid.u(0, 0, 0).unwrap(), &[-1.0, -1.0]);
        assert!(approx(grid.u(1, 0, 0).unwrap()[0], -1.0 / 3.0));
        assert_eq!(grid.metric(0, 0, 0), Err(GridError::MetricUnavailable));
        assert_eq!(grid.xmin(0), 0.0);
        assert_eq!(grid.xmax(0), 3.0);
        grid.validate_invariants().unwrap();
    }

    #[test]
    fn rejects_bad_generation_input() {
        assert!(matches!(
            Grid::uniform(&[0.0], &[1.0, 2.0], &[3, 3]),
            Err(GridError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            Grid::uniform(&[0.0, 0.0], &[1.0, 0.0], &[3, 3]),
            Err(GridError::InvalidInput(_))
        ));
        assert!(matches!(
            Grid::uniform(&[0.0, 0.0], &[1.0, 1.0], &[3, 1]),
            Err(GridError::InvalidInput(_))
        ));
        assert!(matches!(
            Grid::uniform(&[0.0; 4], &[1.0; 4], &[2; 4]),
            Err(GridError::UnsupportedDimension { ndim: 4, .. })
        ));
        assert!(matches!(
            Grid::explicit(&[vec![0.0, 1.0, 1.0]]),
            Err(GridError::InvalidInput(_))
        ));
        let tfi = Transfinite::surf2d_quarter_ring(1.0, 2.0).unwrap();
        assert!(matches!(
            Grid::transfinite(&tfi, &[vec![-1.0, 1.0]]),
            Err(GridError::ShapeMismatch {
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            Grid::transfinite(&tfi, &[vec![-1.0, 1.5], vec![0.0]]),
            Err(GridError::InvalidInput(_))
        ));
        assert!(matches!(
            Grid::transfinite(&tfi, &[vec![], vec![0.0]]),
            Err(GridError::InvalidInput(_))
        ));
    }

    #[test]
    fn degenerate_node_is_reported_with_its_index() {
        // collapsing the inner radius folds the u0 = -1 column onto the origin
        let tfi = Transfinite::surf2d_quarter_ring(0.0, 2.0).unwrap();
        let samples = vec![vec![-1.0, 0.0, 1.0], vec![-1.0, 1.0]];
        let opts = GenerationOptions {
            parallel: false,
            ..GenerationOptions::default()
        };
        match Grid::transfinite_with_options(&tfi, &samples, &opts) {
            Err(GridError::DegenerateMapping { m, n, p, ratio }) => {
                assert_eq!((m, n, p), (0, 0, 0));
                assert!(ratio <= 1e-12);
            }
            other => panic!("expected DegenerateMapping, got {other:?}"),
        }
    }

    #[test]
    fn accessors_validate_axes() {
        let grid = Grid::uniform(&[0.0, 0.0], &[2.0, 4.0], &[3, 3]).unwrap();
        assert_eq!(
            grid.covar_basis(0, 0, 0, 2),
            Err(GridError::InvalidAxis { axis: 2, ndim: 2 })
        );
        assert_eq!(
            grid.gamma_s(0, 0, 0, 0, 0, 2),
            Err(GridError::InvalidAxis { axis: 2, ndim: 2 })
        );
        assert_eq!(
            grid.l_coeff(0, 0, 0, 3),
            Err(GridError::InvalidAxis { axis: 3, ndim: 2 })
        );
        assert_eq!(
            grid.x(0, 0, 1),
            Err(GridError::InvalidIndex { m: 0, n: 0, p: 1 })
        );
        assert_eq!(
            grid.node(9),
            Err(GridError::InvalidNodeId { id: 9, size: 9 })
        );
    }

    #[test]
    fn tolerance_is_configurable() {
        // an axis-aligned box has ratio 1
        let opts = GenerationOptions {
            degeneracy_tolerance: 1.5,
            parallel: false,
        };
        assert!(matches!(
            Grid::uniform_with_options(&[0.0, 0.0], &[1.0, 1.0], &[2, 2], &opts),
            Err(GridError::DegenerateMapping { m: 0, n: 0, p: 0, .. })
        ));
    }

    #[test]
    fn grid_serializes() {
        let grid = Grid::uniform(&[0.0, 0.0], &[1.0, 1.0], &[2, 3]).unwrap();
        let json = serde_json::to_string(&grid).unwrap();
        let back: Grid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn parallel_generation_matches_serial() {
        let serial = GenerationOptions {
            parallel: false,
            ..GenerationOptions::default()
        };
        let parallel = GenerationOptions {
            parallel: true,
            ..GenerationOptions::default()
        };
        let tfi = Transfinite::surf3d_quarter_ring(1.0, 2.0, 3.0).unwrap();
        let samples = vec![linspace(-1.0, 1.0, 4), linspace(-1.0, 1.0, 5), linspace(-1.0, 1.0, 6)];
        assert_eq!(
            Grid::transfinite_with_options(&tfi, &samples, &parallel).unwrap(),
            Grid::transfinite_with_options(&tfi, &samples, &serial).unwrap()
        );

        let ring = Transfinite::surf2d_quarter_ring(0.0, 2.0).unwrap();
        let folded = vec![vec![-1.0, 0.0, 1.0], vec![-1.0, 1.0]];
        assert!(matches!(
            Grid::transfinite_with_options(&ring, &folded, &parallel),
            Err(GridError::DegenerateMapping { m: 0, p: 0, .. })
        ));
    }

    #[test]
    fn tampered_json_is_rejected() {
        let grid = Grid::uniform(&[0.0, 0.0], &[1.0, 1.0], &[2, 3]).unwrap();
        let value = serde_json::to_value(&grid).unwrap();

        let mut truncated = value.clone();
        truncated["nodes"].as_array_mut().unwrap().truncate(2);
        let err = serde_json::from_value::<Grid>(truncated).unwrap_err();
        assert!(err.to_string().contains("expected 6"), "{err}");

        let mut empty_axis = value;
        empty_axis["shape"]["npts"] = serde_json::json!([0, 3, 1]);
        assert!(serde_json::from_value::<Grid>(empty_axis).is_err());
    }
}

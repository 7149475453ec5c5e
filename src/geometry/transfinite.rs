//! Transfinite (Coons-type) interpolation of boundary curves and surfaces.
//!
//! Boundary `k = 2 * axis + (0 min | 1 max)` is parametrized by the remaining
//! axes in increasing order:
//! - 2D: `B0(s)`, `B1(s)`, `B2(r)`, `B3(r)`
//! - 3D: `B0(s,t)`, `B1(s,t)`, `B2(r,t)`, `B3(r,t)`, `B4(r,s)`, `B5(r,s)`
//!
//! The interior mapping is the Boolean sum of linear blends between opposite
//! boundaries. Expanded, it is a signed sum over every non-empty set of pinned
//! axes: faces enter with `+`, edges with `-`, corners with `+` (3D), and each
//! term is a product of per-axis blending weights `(1 ∓ u)/2` times one
//! boundary evaluation. Derivatives follow from the product rule, so they are
//! as exact as the boundary derivatives themselves.

use std::f64::consts::FRAC_PI_4;

use crate::geometry::linalg::{self, Vec3};
use crate::geometry::mapping::{DerivOrder, Jet};
use crate::grid_error::GridError;

/// A boundary curve (one parameter) or surface (two parameters) on `[-1, 1]`.
///
/// Unused parameter slots receive `0.0`. `Jet::d1[a]` and `Jet::d2[a][b]`
/// are derivatives with respect to parameter slots `a` and `b`.
pub trait BoundaryPatch: Send + Sync {
    fn eval(&self, t: [f64; 2]) -> Jet;
}

impl<F> BoundaryPatch for F
where
    F: Fn([f64; 2]) -> Jet + Send + Sync,
{
    fn eval(&self, t: [f64; 2]) -> Jet {
        self(t)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Blend {
    One,
    Lower,
    Upper,
}

impl Blend {
    fn value(self, u: f64) -> f64 {
        match self {
            Blend::One => 1.0,
            Blend::Lower => (1.0 - u) / 2.0,
            Blend::Upper => (1.0 + u) / 2.0,
        }
    }

    fn slope(self) -> f64 {
        match self {
            Blend::One => 0.0,
            Blend::Lower => -0.5,
            Blend::Upper => 0.5,
        }
    }
}

/// What feeds one boundary parameter slot: a free axis or a pinned end.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Slot {
    Free(usize),
    Pinned(f64),
}

#[derive(Clone, Debug)]
struct Term {
    sign: f64,
    blend: [Blend; 3],
    boundary: usize,
    slots: [Option<Slot>; 2],
}

/// Interior mapping interpolated from `2 * ndim` boundaries.
pub struct Transfinite {
    ndim: usize,
    boundaries: Vec<Box<dyn BoundaryPatch>>,
    terms: Vec<Term>,
}

impl std::fmt::Debug for Transfinite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transfinite")
            .field("ndim", &self.ndim)
            .field("terms", &self.terms.len())
            .finish()
    }
}

impl Transfinite {
    /// Builds the mapping from boundaries ordered xmin, xmax, ymin, ymax[, zmin, zmax].
    pub fn new(ndim: usize, boundaries: Vec<Box<dyn BoundaryPatch>>) -> Result<Self, GridError> {
        if ndim != 2 && ndim != 3 {
            return Err(GridError::UnsupportedDimension {
                operation: "Transfinite::new",
                ndim,
            });
        }
        if boundaries.len() != 2 * ndim {
            return Err(GridError::InvalidInput(format!(
                "a {ndim}D transfinite mapping needs {} boundaries, got {}",
                2 * ndim,
                boundaries.len()
            )));
        }
        let tfi = Self {
            ndim,
            boundaries,
            terms: build_terms(ndim),
        };
        tfi.check_corners();
        Ok(tfi)
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Evaluates the interpolated mapping at `u` (first `ndim` entries used).
    pub fn evaluate(&self, u: Vec3, order: DerivOrder) -> Jet {
        let d = self.ndim;
        let mut out = Jet::default();
        for term in &self.terms {
            let mut t = [0.0; 2];
            // parameter slot bound to each free axis
            let mut slot_of = [None; 3];
            for (a, slot) in term.slots.iter().enumerate() {
                match slot {
                    Some(Slot::Free(axis)) => {
                        t[a] = u[*axis];
                        slot_of[*axis] = Some(a);
                    }
                    Some(Slot::Pinned(v)) => t[a] = *v,
                    None => {}
                }
            }
            let b = self.boundaries[term.boundary].eval(t);

            let values: [f64; 3] = std::array::from_fn(|k| term.blend[k].value(u[k]));
            let w: f64 = values[..d].iter().product();
            linalg::axpy(&mut out.x, term.sign * w, b.x);
            if order == DerivOrder::Position {
                continue;
            }

            let others = |skip: &[usize]| -> f64 {
                (0..d)
                    .filter(|k| !skip.contains(k))
                    .map(|k| values[k])
                    .product()
            };
            let dw: [f64; 3] = std::array::from_fn(|i| {
                if i < d {
                    term.blend[i].slope() * others(&[i])
                } else {
                    0.0
                }
            });
            let df = |i: usize| slot_of[i].map_or([0.0; 3], |a| b.d1[a]);

            for i in 0..d {
                let mut gi = linalg::scale(dw[i], b.x);
                linalg::axpy(&mut gi, w, df(i));
                linalg::axpy(&mut out.d1[i], term.sign, gi);
            }
            if order == DerivOrder::First {
                continue;
            }

            for i in 0..d {
                for j in i..d {
                    let d2w = if i == j {
                        0.0
                    } else {
                        term.blend[i].slope() * term.blend[j].slope() * others(&[i, j])
                    };
                    let d2f = match (slot_of[i], slot_of[j]) {
                        (Some(a), Some(c)) => b.d2[a][c],
                        _ => [0.0; 3],
                    };
                    let mut hij = linalg::scale(d2w, b.x);
                    linalg::axpy(&mut hij, dw[i], df(j));
                    linalg::axpy(&mut hij, dw[j], df(i));
                    linalg::axpy(&mut hij, w, d2f);
                    linalg::axpy(&mut out.d2[i][j], term.sign, hij);
                }
            }
        }
        for i in 0..d {
            for j in 0..i {
                out.d2[i][j] = out.d2[j][i];
            }
        }
        out
    }

    /// Warns when neighbouring boundaries disagree at a shared corner.
    fn check_corners(&self) {
        let d = self.ndim;
        for corner in 0..(1usize << d) {
            let at = |axis: usize| if corner >> axis & 1 == 1 { 1.0 } else { -1.0 };
            let mut first: Option<Vec3> = None;
            for axis in 0..d {
                let mut t = [0.0; 2];
                for (a, k) in (0..d).filter(|&k| k != axis).enumerate() {
                    t[a] = at(k);
                }
                let boundary = 2 * axis + (corner >> axis & 1);
                let x = self.boundaries[boundary].eval(t).x;
                match first {
                    None => first = Some(x),
                    Some(x0) => {
                        let gap = linalg::norm(linalg::sub(x, x0));
                        if gap > 1e-10 * (1.0 + linalg::norm(x0)) {
                            log::warn!(
                                "transfinite boundaries disagree at corner {corner}: gap={gap:e}"
                            );
                        }
                    }
                }
            }
        }
    }

    /// Quarter of the annulus `a <= ρ <= b`, `0 <= α <= π/2`, with
    /// `ρ = a + (1 + r)(b - a)/2` and `α = (1 + s)π/4`.
    pub fn surf2d_quarter_ring(a: f64, b: f64) -> Result<Self, GridError> {
        let half = (b - a) / 2.0;
        let arc = move |radius: f64| {
            move |t: [f64; 2]| {
                let alpha = (1.0 + t[0]) * FRAC_PI_4;
                let (s, c) = alpha.sin_cos();
                let mut jet = Jet::point([radius * c, radius * s, 0.0]);
                jet.d1[0] = [-radius * s * FRAC_PI_4, radius * c * FRAC_PI_4, 0.0];
                let k = radius * FRAC_PI_4 * FRAC_PI_4;
                jet.d2[0][0] = [-k * c, -k * s, 0.0];
                jet
            }
        };
        let ray = move |dir: Vec3| {
            move |t: [f64; 2]| {
                let rho = a + (1.0 + t[0]) * half;
                let mut jet = Jet::point(linalg::scale(rho, dir));
                jet.d1[0] = linalg::scale(half, dir);
                jet
            }
        };
        Self::new(
            2,
            vec![
                Box::new(arc(a)) as Box<dyn BoundaryPatch>,
                Box::new(arc(b)) as Box<dyn BoundaryPatch>,
                Box::new(ray([1.0, 0.0, 0.0])) as Box<dyn BoundaryPatch>,
                Box::new(ray([0.0, 1.0, 0.0])) as Box<dyn BoundaryPatch>,
            ],
        )
    }

    /// The 2D quarter ring in the `y-z` plane extruded along `x` over `[0, h]`:
    /// `x = h(1 + r)/2`, `ρ = a + (1 + s)(b - a)/2`, `α = (1 + t)π/4`.
    pub fn surf3d_quarter_ring(a: f64, b: f64, h: f64) -> Result<Self, GridError> {
        let half = (b - a) / 2.0;
        let q = FRAC_PI_4;
        // r = ±1 faces, parameters (s, t)
        let cap = move |x0: f64| {
            move |t: [f64; 2]| {
                let rho = a + (1.0 + t[0]) * half;
                let (s, c) = ((1.0 + t[1]) * q).sin_cos();
                let mut jet = Jet::point([x0, rho * c, rho * s]);
                jet.d1[0] = [0.0, half * c, half * s];
                jet.d1[1] = [0.0, -rho * s * q, rho * c * q];
                jet.d2[0][1] = [0.0, -half * s * q, half * c * q];
                jet.d2[1][0] = jet.d2[0][1];
                jet.d2[1][1] = [0.0, -rho * c * q * q, -rho * s * q * q];
                jet
            }
        };
        // s = ±1 faces, parameters (r, t)
        let shell = move |radius: f64| {
            move |t: [f64; 2]| {
                let (s, c) = ((1.0 + t[1]) * q).sin_cos();
                let mut jet = Jet::point([h * (1.0 + t[0]) / 2.0, radius * c, radius * s]);
                jet.d1[0] = [h / 2.0, 0.0, 0.0];
                jet.d1[1] = [0.0, -radius * s * q, radius * c * q];
                jet.d2[1][1] = [0.0, -radius * c * q * q, -radius * s * q * q];
                jet
            }
        };
        // t = ±1 faces, parameters (r, s)
        let wall = move |dir: Vec3| {
            move |t: [f64; 2]| {
                let rho = a + (1.0 + t[1]) * half;
                let mut x = linalg::scale(rho, dir);
                x[0] = h * (1.0 + t[0]) / 2.0;
                let mut jet = Jet::point(x);
                jet.d1[0] = [h / 2.0, 0.0, 0.0];
                jet.d1[1] = linalg::scale(half, dir);
                jet
            }
        };
        Self::new(
            3,
            vec![
                Box::new(cap(0.0)) as Box<dyn BoundaryPatch>,
                Box::new(cap(h)) as Box<dyn BoundaryPatch>,
                Box::new(shell(a)) as Box<dyn BoundaryPatch>,
                Box::new(shell(b)) as Box<dyn BoundaryPatch>,
                Box::new(wall([0.0, 1.0, 0.0])) as Box<dyn BoundaryPatch>,
                Box::new(wall([0.0, 0.0, 1.0])) as Box<dyn BoundaryPatch>,
            ],
        )
    }
}

/// Expands the Boolean sum into signed blended boundary terms.
fn build_terms(ndim: usize) -> Vec<Term> {
    let mut terms = Vec::new();
    for pinned in 1usize..(1 << ndim) {
        let sign = if pinned.count_ones() % 2 == 1 { 1.0 } else { -1.0 };
        let lead = pinned.trailing_zeros() as usize;
        for ends in 0usize..(1 << ndim) {
            if ends & !pinned != 0 {
                continue;
            }
            let upper = |axis: usize| ends >> axis & 1 == 1;
            let mut blend = [Blend::One; 3];
            for (axis, b) in blend.iter_mut().enumerate().take(ndim) {
                if pinned >> axis & 1 == 1 {
                    *b = if upper(axis) { Blend::Upper } else { Blend::Lower };
                }
            }
            let mut slots = [None; 2];
            for (a, axis) in (0..ndim).filter(|&k| k != lead).enumerate() {
                slots[a] = Some(if pinned >> axis & 1 == 1 {
                    Slot::Pinned(if upper(axis) { 1.0 } else { -1.0 })
                } else {
                    Slot::Free(axis)
                });
            }
            terms.push(Term {
                sign,
                blend,
                boundary: 2 * lead + upper(lead) as usize,
                slots,
            });
        }
    }
    terms
}

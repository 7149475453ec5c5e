//! NURBS evaluation contract and a tensor-product NURBS implementation.
//!
//! The grid only relies on [`NurbsEvaluator`]: position plus first and second
//! partial derivatives at a point of the evaluator's own parameter domain.
//! [`Nurbs`] covers curves, surfaces and volumes with clamped knot vectors.
//!
//! Control points are `[x, y, z, weight]` (not premultiplied), ordered with the
//! first parametric axis varying fastest.

use crate::geometry::linalg;
use crate::geometry::mapping::{DerivOrder, Jet};
use crate::grid_error::GridError;

/// Anything that can evaluate a NURBS-like mapping with derivatives.
pub trait NurbsEvaluator: Send + Sync {
    /// Number of parametric axes (1 curve, 2 surface, 3 volume).
    fn ndim(&self) -> usize;

    /// Parameter interval along `axis`.
    fn domain(&self, axis: usize) -> (f64, f64);

    /// Position and derivatives up to `order` at `u` (one entry per axis).
    fn evaluate(&self, u: &[f64], order: DerivOrder) -> Result<Jet, GridError>;
}

/// Tensor-product non-uniform rational B-spline.
#[derive(Clone, Debug, PartialEq)]
pub struct Nurbs {
    ndim: usize,
    degrees: [usize; 3],
    counts: [usize; 3],
    knots: Vec<Vec<f64>>,
    control: Vec<[f64; 4]>,
}

impl Nurbs {
    /// Creates a NURBS from per-axis degrees and knot vectors.
    ///
    /// The control net size along each axis is `knots.len() - degree - 1`.
    pub fn new(
        degrees: &[usize],
        knots: Vec<Vec<f64>>,
        control: Vec<[f64; 4]>,
    ) -> Result<Self, GridError> {
        let ndim = degrees.len();
        if ndim == 0 || ndim > 3 {
            return Err(GridError::UnsupportedDimension {
                operation: "Nurbs::new",
                ndim,
            });
        }
        if knots.len() != ndim {
            return Err(GridError::InvalidInput(format!(
                "expected {ndim} knot vectors, got {}",
                knots.len()
            )));
        }
        let mut all_degrees = [0; 3];
        let mut counts = [1; 3];
        for (axis, (&p, kv)) in degrees.iter().zip(&knots).enumerate() {
            if kv.len() < 2 * (p + 1) {
                return Err(GridError::InvalidInput(format!(
                    "axis {axis}: {} knots cannot carry degree {p}",
                    kv.len()
                )));
            }
            if kv.windows(2).any(|w| !(w[0] <= w[1])) {
                return Err(GridError::InvalidInput(format!(
                    "axis {axis}: knots must be non-decreasing"
                )));
            }
            if !(kv[p] < kv[kv.len() - p - 1]) {
                return Err(GridError::InvalidInput(format!(
                    "axis {axis}: empty parameter domain"
                )));
            }
            all_degrees[axis] = p;
            counts[axis] = kv.len() - p - 1;
        }
        let expected: usize = counts.iter().product();
        if control.len() != expected {
            return Err(GridError::ShapeMismatch {
                expected,
                found: control.len(),
            });
        }
        if control.iter().any(|c| !c[3].is_finite() || c[3] <= 0.0) {
            return Err(GridError::InvalidInput(
                "control weights must be finite and positive".into(),
            ));
        }
        Ok(Self {
            ndim,
            degrees: all_degrees,
            counts,
            knots,
            control,
        })
    }

    #[inline]
    pub fn degree(&self, axis: usize) -> usize {
        self.degrees[axis]
    }

    /// Control points along `axis`.
    #[inline]
    pub fn control_count(&self, axis: usize) -> usize {
        self.counts[axis]
    }

    /// Quarter of the annulus centred at `(xc, yc)` with radii `r < big_r`;
    /// axis 0 runs radially (degree 1), axis 1 along the arc (degree 2).
    pub fn surf2d_quarter_ring(xc: f64, yc: f64, r: f64, big_r: f64) -> Result<Self, GridError> {
        let w = std::f64::consts::FRAC_1_SQRT_2;
        let arc = [([1.0, 0.0], 1.0), ([1.0, 1.0], w), ([0.0, 1.0], 1.0)];
        let mut control = Vec::with_capacity(6);
        for (dir, weight) in arc {
            for radius in [r, big_r] {
                control.push([xc + radius * dir[0], yc + radius * dir[1], 0.0, weight]);
            }
        }
        Self::new(
            &[1, 2],
            vec![vec![0.0, 0.0, 1.0, 1.0], vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]],
            control,
        )
    }

    fn locate(&self, axis: usize, u: f64) -> Result<f64, GridError> {
        let (a, b) = self.domain(axis);
        let slack = 1e-12 * (b - a);
        if !(u >= a - slack && u <= b + slack) {
            return Err(GridError::ParameterOutOfDomain { axis, value: u });
        }
        Ok(u.clamp(a, b))
    }
}

impl NurbsEvaluator for Nurbs {
    fn ndim(&self) -> usize {
        self.ndim
    }

    fn domain(&self, axis: usize) -> (f64, f64) {
        let kv = &self.knots[axis];
        let p = self.degrees[axis];
        (kv[p], kv[kv.len() - p - 1])
    }

    fn evaluate(&self, u: &[f64], order: DerivOrder) -> Result<Jet, GridError> {
        let d = self.ndim;
        if u.len() != d {
            return Err(GridError::ShapeMismatch {
                expected: d,
                found: u.len(),
            });
        }
        let nder = match order {
            DerivOrder::Position => 0,
            DerivOrder::First => 1,
            DerivOrder::Second => 2,
        };

        // per-axis: first control index of the span and basis derivatives [order][local]
        let mut first = [0usize; 3];
        let mut basis: [Vec<[f64; 3]>; 3] = [vec![[1.0, 0.0, 0.0]], vec![[1.0, 0.0, 0.0]], vec![
            [1.0, 0.0, 0.0],
        ]];
        for axis in 0..d {
            let t = self.locate(axis, u[axis])?;
            let p = self.degrees[axis];
            let kv = &self.knots[axis];
            let span = find_span(kv, p, self.counts[axis], t);
            first[axis] = span - p;
            basis[axis] = ders_basis_funs(kv, p, span, t, nder);
        }

        let mut a0 = [0.0; 3];
        let mut w0 = 0.0;
        let mut a1 = [[0.0; 3]; 3];
        let mut w1 = [0.0; 3];
        let mut a2 = [[[0.0; 3]; 3]; 3];
        let mut w2 = [[0.0; 3]; 3];

        let (c0, c1) = (self.counts[0], self.counts[1]);
        for (i2, n2) in basis[2].iter().enumerate() {
            for (i1, n1) in basis[1].iter().enumerate() {
                for (i0, n0) in basis[0].iter().enumerate() {
                    let g = (first[0] + i0) + (first[1] + i1) * c0 + (first[2] + i2) * c0 * c1;
                    let cp = self.control[g];
                    let wt = cp[3];
                    let pw = [cp[0] * wt, cp[1] * wt, cp[2] * wt];
                    let n = [n0, n1, n2];
                    let value = |k: usize, ord: usize| n[k][ord];
                    let product = |skip: &[usize]| -> f64 {
                        (0..3)
                            .filter(|k| !skip.contains(k))
                            .map(|k| value(k, 0))
                            .product()
                    };

                    let b0 = product(&[]);
                    linalg::axpy(&mut a0, b0, pw);
                    w0 += b0 * wt;
                    if nder == 0 {
                        continue;
                    }
                    for i in 0..d {
                        let bi = value(i, 1) * product(&[i]);
                        linalg::axpy(&mut a1[i], bi, pw);
                        w1[i] += bi * wt;
                        if nder < 2 {
                            continue;
                        }
                        for j in i..d {
                            let bij = if i == j {
                                value(i, 2) * product(&[i])
                            } else {
                                value(i, 1) * value(j, 1) * product(&[i, j])
                            };
                            linalg::axpy(&mut a2[i][j], bij, pw);
                            w2[i][j] += bij * wt;
                        }
                    }
                }
            }
        }

        // quotient rule on X = A / W
        let mut jet = Jet::point(linalg::scale(1.0 / w0, a0));
        if nder == 0 {
            return Ok(jet);
        }
        for i in 0..d {
            let num = linalg::sub(a1[i], linalg::scale(w1[i], jet.x));
            jet.d1[i] = linalg::scale(1.0 / w0, num);
        }
        if nder < 2 {
            return Ok(jet);
        }
        for i in 0..d {
            for j in i..d {
                let mut num = linalg::sub(a2[i][j], linalg::scale(w2[i][j], jet.x));
                linalg::axpy(&mut num, -w1[i], jet.d1[j]);
                linalg::axpy(&mut num, -w1[j], jet.d1[i]);
                jet.d2[i][j] = linalg::scale(1.0 / w0, num);
                jet.d2[j][i] = jet.d2[i][j];
            }
        }
        Ok(jet)
    }
}

/// Knot span index containing `u` (clamped knot vector, `count` control points).
fn find_span(knots: &[f64], degree: usize, count: usize, u: f64) -> usize {
    let n = count - 1;
    if u >= knots[n + 1] {
        return n;
    }
    if u <= knots[degree] {
        return degree;
    }
    let (mut low, mut high) = (degree, n + 1);
    let mut mid = (low + high) / 2;
    while u < knots[mid] || u >= knots[mid + 1] {
        if u < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// Non-zero basis functions on `span` and their derivatives up to `nder`
/// (at most 2), returned as `[local][order]`.
fn ders_basis_funs(knots: &[f64], p: usize, span: usize, u: f64, nder: usize) -> Vec<[f64; 3]> {
    let mut ndu = vec![vec![0.0; p + 1]; p + 1];
    let mut left = vec![0.0; p + 1];
    let mut right = vec![0.0; p + 1];
    ndu[0][0] = 1.0;
    for j in 1..=p {
        left[j] = u - knots[span + 1 - j];
        right[j] = knots[span + j] - u;
        let mut saved = 0.0;
        for r in 0..j {
            ndu[j][r] = right[r + 1] + left[j - r];
            let temp = ndu[r][j - 1] / ndu[j][r];
            ndu[r][j] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        ndu[j][j] = saved;
    }

    let mut ders = vec![[0.0; 3]; p + 1];
    for (j, d) in ders.iter_mut().enumerate() {
        d[0] = ndu[j][p];
    }
    let n = nder.min(p);
    let pi = p as isize;
    let mut a = [vec![0.0; p + 1], vec![0.0; p + 1]];
    for r in 0..=pi {
        let (mut s1, mut s2) = (0, 1);
        a[0][0] = 1.0;
        for k in 1..=n as isize {
            let mut d = 0.0;
            let rk = r - k;
            let pk = pi - k;
            if r >= k {
                a[s2][0] = a[s1][0] / ndu[(pk + 1) as usize][rk as usize];
                d = a[s2][0] * ndu[rk as usize][pk as usize];
            }
            let j1 = if rk >= -1 { 1 } else { -rk };
            let j2 = if r - 1 <= pk { k - 1 } else { pi - r };
            for j in j1..=j2 {
                let jj = j as usize;
                a[s2][jj] =
                    (a[s1][jj] - a[s1][jj - 1]) / ndu[(pk + 1) as usize][(rk + j) as usize];
                d += a[s2][jj] * ndu[(rk + j) as usize][pk as usize];
            }
            if r <= pk {
                let kk = k as usize;
                a[s2][kk] = -a[s1][kk - 1] / ndu[(pk + 1) as usize][r as usize];
                d += a[s2][kk] * ndu[r as usize][pk as usize];
            }
            ders[r as usize][k as usize] = d;
            std::mem::swap(&mut s1, &mut s2);
        }
    }
    let mut factor = p as f64;
    for k in 1..=n {
        for d in ders.iter_mut() {
            d[k] *= factor;
        }
        factor *= (p - k) as f64;
    }
    ders
}

//! Per-node differential geometry of a coordinate mapping.
//!
//! Given the covariant basis `g_k = dX/du_k` and the second derivatives
//! `d2X/du_i du_j` at a point, [`compute_metric`] assembles:
//! - the covariant metric `g_ij = g_i . g_j` and its determinant,
//! - the contravariant metric `g^ij`, the inverse of `g_ij`,
//! - Christoffel symbols of the second kind `Γ^k_ij = (d2X/du_i du_j) . g^k`
//!   where `g^k = g^kl g_l` is the contravariant basis,
//! - the coefficients `L^k = g^ij Γ^k_ij` that appear in the curvilinear
//!   Laplacian `∇²f = g^ij f,ij - L^k f,k`.
//!
//! Storage is padded to three dimensions; only the leading `ndim` block is
//! meaningful and everything else is zero.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::debug_invariants::DebugInvariants;
use crate::geometry::linalg::{self, Mat3, Vec3};
use crate::grid_error::GridError;

/// The covariant metric is singular to within the requested tolerance.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("singular covariant metric: det(g)/prod(g_ii) = {ratio:e}")]
pub struct SingularMetric {
    /// Hadamard ratio `det(g) / prod_i g_ii`; 1 for orthogonal bases, 0 when folded.
    pub ratio: f64,
}

/// Metric data at one grid node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    ndim: usize,
    covariant_basis: [Vec3; 3],
    covariant_matrix: Mat3,
    contravariant_matrix: Mat3,
    determinant: f64,
    gamma: [[[f64; 3]; 3]; 3],
    l_coeff: [f64; 3],
}

/// Computes the metric record from first and second derivatives of the mapping.
///
/// `tolerance` bounds the Hadamard ratio from below; anything at or under it
/// is reported as [`SingularMetric`] rather than inverted.
pub fn compute_metric(
    ndim: usize,
    basis: &[Vec3; 3],
    second: &[[Vec3; 3]; 3],
    tolerance: f64,
) -> Result<Metric, SingularMetric> {
    let mut covariant_matrix = [[0.0; 3]; 3];
    for i in 0..ndim {
        for j in i..ndim {
            let gij = linalg::dot(basis[i], basis[j]);
            covariant_matrix[i][j] = gij;
            covariant_matrix[j][i] = gij;
        }
    }

    let determinant = linalg::det(&covariant_matrix, ndim);
    let diagonal: f64 = (0..ndim).map(|i| covariant_matrix[i][i]).product();
    let ratio = if diagonal > 0.0 {
        determinant / diagonal
    } else {
        0.0
    };
    // also rejects NaN coming from a broken mapping
    if !(ratio > tolerance) {
        return Err(SingularMetric { ratio });
    }
    let contravariant_matrix = linalg::inverse(&covariant_matrix, ndim, determinant);

    let mut contravariant_basis = [[0.0; 3]; 3];
    for (k, cnt) in contravariant_basis.iter_mut().enumerate().take(ndim) {
        for l in 0..ndim {
            linalg::axpy(cnt, contravariant_matrix[k][l], basis[l]);
        }
    }

    let mut gamma = [[[0.0; 3]; 3]; 3];
    for i in 0..ndim {
        for j in i..ndim {
            for k in 0..ndim {
                let value = linalg::dot(second[i][j], contravariant_basis[k]);
                gamma[k][i][j] = value;
                gamma[k][j][i] = value;
            }
        }
    }

    let mut l_coeff = [0.0; 3];
    for (k, lk) in l_coeff.iter_mut().enumerate().take(ndim) {
        for i in 0..ndim {
            for j in 0..ndim {
                *lk += contravariant_matrix[i][j] * gamma[k][i][j];
            }
        }
    }

    let mut covariant_basis = [[0.0; 3]; 3];
    covariant_basis[..ndim].copy_from_slice(&basis[..ndim]);

    Ok(Metric {
        ndim,
        covariant_basis,
        covariant_matrix,
        contravariant_matrix,
        determinant,
        gamma,
        l_coeff,
    })
}

impl Metric {
    #[inline]
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Covariant basis vector `g_k = dX/du_k` (physical 3-vector).
    ///
    /// # Panics
    /// Panics if `k >= 3`. Use [`crate::grid::Grid::covar_basis`] for a checked lookup.
    #[inline]
    pub fn covariant_basis(&self, k: usize) -> Vec3 {
        self.covariant_basis[k]
    }

    /// Contravariant basis vector `g^k = g^kl g_l`.
    ///
    /// # Panics
    /// Panics if `k >= 3`.
    pub fn contravariant_basis(&self, k: usize) -> Vec3 {
        let mut out = [0.0; 3];
        for l in 0..self.ndim {
            linalg::axpy(&mut out, self.contravariant_matrix[k][l], self.covariant_basis[l]);
        }
        out
    }

    /// Entry `g_ij`.
    ///
    /// # Panics
    /// Panics if `i` or `j` is 3 or more.
    #[inline]
    pub fn covariant(&self, i: usize, j: usize) -> f64 {
        self.covariant_matrix[i][j]
    }

    /// Entry `g^ij`.
    ///
    /// # Panics
    /// Panics if `i` or `j` is 3 or more.
    #[inline]
    pub fn contravariant(&self, i: usize, j: usize) -> f64 {
        self.contravariant_matrix[i][j]
    }

    /// `g_ij` as an `ndim x ndim` nested vector.
    pub fn covariant_matrix(&self) -> Vec<Vec<f64>> {
        leading_block(&self.covariant_matrix, self.ndim)
    }

    /// `g^ij` as an `ndim x ndim` nested vector.
    pub fn contravariant_matrix(&self) -> Vec<Vec<f64>> {
        leading_block(&self.contravariant_matrix, self.ndim)
    }

    /// `det(g_ij)`.
    #[inline]
    pub fn determinant(&self) -> f64 {
        self.determinant
    }

    /// Christoffel symbol `Γ^k_ij`.
    ///
    /// # Panics
    /// Panics if any index is 3 or more. [`crate::grid::Grid::gamma_s`] checks
    /// indices against the grid dimension instead.
    #[inline]
    pub fn gamma(&self, k: usize, i: usize, j: usize) -> f64 {
        self.gamma[k][i][j]
    }

    /// All Christoffel symbols as `[k][i][j]`, `ndim` entries per level.
    pub fn gamma_tensor(&self) -> Vec<Vec<Vec<f64>>> {
        self.gamma[..self.ndim]
            .iter()
            .map(|gk| leading_block(gk, self.ndim))
            .collect()
    }

    /// Laplacian coefficient `L^k`.
    ///
    /// # Panics
    /// Panics if `k >= 3`.
    #[inline]
    pub fn l_coeff(&self, k: usize) -> f64 {
        self.l_coeff[k]
    }

    /// All `L^k`.
    #[inline]
    pub fn l_coeffs(&self) -> &[f64] {
        &self.l_coeff[..self.ndim]
    }

    /// Largest deviation of `g^ik g_kj` from the identity.
    pub fn inverse_residual(&self) -> f64 {
        let prod = linalg::matmul(&self.contravariant_matrix, &self.covariant_matrix, self.ndim);
        let mut worst: f64 = 0.0;
        for (i, row) in prod.iter().enumerate().take(self.ndim) {
            for (j, value) in row.iter().enumerate().take(self.ndim) {
                let expected = if i == j { 1.0 } else { 0.0 };
                worst = worst.max((value - expected).abs());
            }
        }
        worst
    }
}

impl DebugInvariants for Metric {
    /// Symmetry of `g_ij` and `Γ^k_ij`, and `g^ik g_kj = δ_ij` up to round-off
    /// scaled by the conditioning of `g_ij`.
    fn validate_invariants(&self) -> Result<(), GridError> {
        let d = self.ndim;
        let mut norms = (0.0, 0.0);
        for i in 0..d {
            for j in 0..d {
                if self.covariant_matrix[i][j] != self.covariant_matrix[j][i] {
                    return Err(GridError::InvariantViolation(format!(
                        "g_{i}{j} != g_{j}{i}"
                    )));
                }
                for k in 0..d {
                    if self.gamma[k][i][j] != self.gamma[k][j][i] {
                        return Err(GridError::InvariantViolation(format!(
                            "Γ^{k}_{i}{j} != Γ^{k}_{j}{i}"
                        )));
                    }
                }
                norms.0 += self.covariant_matrix[i][j].abs();
                norms.1 += self.contravariant_matrix[i][j].abs();
            }
        }
        let residual = self.inverse_residual();
        if !(residual <= 1e-10 * (norms.0 * norms.1).max(1.0)) {
            return Err(GridError::InvariantViolation(format!(
                "|g^ik g_kj - I| = {residual:e}"
            )));
        }
        Ok(())
    }
}

fn leading_block(mat: &Mat3, ndim: usize) -> Vec<Vec<f64>> {
    mat[..ndim].iter().map(|row| row[..ndim].to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    const FLAT: [[Vec3; 3]; 3] = [[[0.0; 3]; 3]; 3];

    #[test]
    fn flat_box_metric() {
        let basis = [[0.5, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 1.0]];
        let mtr = compute_metric(3, &basis, &FLAT, 1e-12).unwrap();
        assert_eq!(
            mtr.covariant_matrix(),
            vec![
                vec![0.25, 0.0, 0.0],
                vec![0.0, 4.0, 0.0],
                vec![0.0, 0.0, 1.0]
            ]
        );
        assert!(approx(mtr.determinant(), 1.0));
        assert!(approx(mtr.contravariant(0, 0), 4.0));
        assert!(approx(mtr.contravariant(1, 1), 0.25));
        assert_eq!(mtr.gamma_tensor(), vec![vec![vec![0.0; 3]; 3]; 3]);
        assert_eq!(mtr.l_coeffs(), &[0.0, 0.0, 0.0]);
        assert!(mtr.inverse_residual() < 1e-15);
        mtr.validate_invariants().unwrap();
    }

    #[test]
    fn polar_coordinates() {
        // x = ρ(cos α, sin α) with ρ = r, α = s, evaluated at ρ = 2, α = 0.3
        let (rho, alpha) = (2.0_f64, 0.3_f64);
        let (c, s) = (alpha.cos(), alpha.sin());
        let basis = [[c, s, 0.0], [-rho * s, rho * c, 0.0], [0.0; 3]];
        let mut second = FLAT;
        second[0][1] = [-s, c, 0.0];
        second[1][0] = [-s, c, 0.0];
        second[1][1] = [-rho * c, -rho * s, 0.0];
        let mtr = compute_metric(2, &basis, &second, 1e-12).unwrap();
        assert!(approx(mtr.covariant(0, 0), 1.0));
        assert!(approx(mtr.covariant(1, 1), rho * rho));
        assert!(approx(mtr.covariant(0, 1), 0.0));
        assert!(approx(mtr.determinant(), rho * rho));
        assert!(approx(mtr.gamma(0, 1, 1), -rho));
        assert!(approx(mtr.gamma(1, 0, 1), 1.0 / rho));
        assert!(approx(mtr.gamma(1, 1, 0), 1.0 / rho));
        assert!(approx(mtr.gamma(0, 0, 0), 0.0));
        assert!(approx(mtr.l_coeff(0), -1.0 / rho));
        assert!(approx(mtr.l_coeff(1), 0.0));
        let g1 = mtr.contravariant_basis(1);
        assert!(approx(linalg::dot(g1, basis[1]), 1.0));
        assert!(approx(linalg::dot(g1, basis[0]), 0.0));
    }

    #[test]
    fn one_dimensional_metric() {
        let basis = [[3.0, 4.0, 0.0], [0.0; 3], [0.0; 3]];
        let mut second = FLAT;
        second[0][0] = [1.0, 0.0, 0.0];
        let mtr = compute_metric(1, &basis, &second, 1e-12).unwrap();
        assert!(approx(mtr.determinant(), 25.0));
        assert!(approx(mtr.contravariant(0, 0), 1.0 / 25.0));
        assert!(approx(mtr.gamma(0, 0, 0), 3.0 / 25.0));
        assert!(approx(mtr.l_coeff(0), 3.0 / 625.0));
    }

    #[test]
    fn parallel_basis_is_singular() {
        let basis = [[1.0, 1.0, 0.0], [2.0, 2.0, 0.0], [0.0; 3]];
        let err = compute_metric(2, &basis, &FLAT, 1e-12).unwrap_err();
        assert!(err.ratio.abs() <= 1e-12);
        let zero = [[0.0; 3]; 3];
        assert!(compute_metric(2, &zero, &FLAT, 1e-12).is_err());
        let nan = [[f64::NAN; 3]; 3];
        assert!(compute_metric(2, &nan, &FLAT, 1e-12).is_err());
    }

    #[test]
    fn broken_symmetry_is_reported() {
        let basis = [[1.0, 0.0, 0.0], [0.5, 1.0, 0.0], [0.0; 3]];
        let mut mtr = compute_metric(2, &basis, &FLAT, 1e-12).unwrap();
        mtr.validate_invariants().unwrap();
        mtr.gamma[1][0][1] = 1.0;
        assert!(matches!(
            mtr.validate_invariants(),
            Err(GridError::InvariantViolation(_))
        ));
    }

    #[test]
    #[should_panic]
    fn gamma_index_past_three_panics() {
        let basis = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0; 3]];
        let mtr = compute_metric(2, &basis, &FLAT, 1e-12).unwrap();
        // padding entries up to index 2 are readable; 3 is out of range
        assert_eq!(mtr.gamma(2, 2, 2), 0.0);
        let _ = mtr.gamma(3, 0, 0);
    }

    #[test]
    fn serde_round_trip() {
        let basis = [[1.0, 0.0, 0.0], [0.5, 1.0, 0.0], [0.0; 3]];
        let mtr = compute_metric(2, &basis, &FLAT, 1e-12).unwrap();
        let json = serde_json::to_string(&mtr).unwrap();
        let back: Metric = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mtr);
    }
}

//! Fixed-size dense helpers for the metric engine.
//!
//! Vectors are physical-space 3-vectors; matrices are `3 x 3` with only the
//! leading `dim x dim` block in use. Entries outside that block stay zero.

/// Physical-space vector.
pub type Vec3 = [f64; 3];
/// Square matrix padded to 3x3.
pub type Mat3 = [[f64; 3]; 3];

pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn scale(s: f64, a: Vec3) -> Vec3 {
    [s * a[0], s * a[1], s * a[2]]
}

/// `acc += s * a`
pub fn axpy(acc: &mut Vec3, s: f64, a: Vec3) {
    acc[0] += s * a[0];
    acc[1] += s * a[1];
    acc[2] += s * a[2];
}

pub fn norm(a: Vec3) -> f64 {
    dot(a, a).sqrt()
}

/// Determinant of the leading `dim x dim` block.
pub fn det(mat: &Mat3, dim: usize) -> f64 {
    match dim {
        1 => mat[0][0],
        2 => mat[0][0] * mat[1][1] - mat[0][1] * mat[1][0],
        3 => {
            mat[0][0] * (mat[1][1] * mat[2][2] - mat[1][2] * mat[2][1])
                - mat[0][1] * (mat[1][0] * mat[2][2] - mat[1][2] * mat[2][0])
                + mat[0][2] * (mat[1][0] * mat[2][1] - mat[1][1] * mat[2][0])
        }
        _ => 1.0,
    }
}

/// Inverse of the leading `dim x dim` block given its determinant.
///
/// The caller is responsible for rejecting singular matrices first.
pub fn inverse(mat: &Mat3, dim: usize, det: f64) -> Mat3 {
    let mut inv = [[0.0; 3]; 3];
    let inv_det = 1.0 / det;
    match dim {
        1 => inv[0][0] = inv_det,
        2 => {
            inv[0][0] = mat[1][1] * inv_det;
            inv[0][1] = -mat[0][1] * inv_det;
            inv[1][0] = -mat[1][0] * inv_det;
            inv[1][1] = mat[0][0] * inv_det;
        }
        3 => {
            inv[0][0] = (mat[1][1] * mat[2][2] - mat[1][2] * mat[2][1]) * inv_det;
            inv[0][1] = (mat[0][2] * mat[2][1] - mat[0][1] * mat[2][2]) * inv_det;
            inv[0][2] = (mat[0][1] * mat[1][2] - mat[0][2] * mat[1][1]) * inv_det;
            inv[1][0] = (mat[1][2] * mat[2][0] - mat[1][0] * mat[2][2]) * inv_det;
            inv[1][1] = (mat[0][0] * mat[2][2] - mat[0][2] * mat[2][0]) * inv_det;
            inv[1][2] = (mat[0][2] * mat[1][0] - mat[0][0] * mat[1][2]) * inv_det;
            inv[2][0] = (mat[1][0] * mat[2][1] - mat[1][1] * mat[2][0]) * inv_det;
            inv[2][1] = (mat[0][1] * mat[2][0] - mat[0][0] * mat[2][1]) * inv_det;
            inv[2][2] = (mat[0][0] * mat[1][1] - mat[0][1] * mat[1][0]) * inv_det;
        }
        _ => {}
    }
    inv
}

/// Product of the leading `dim x dim` blocks.
pub fn matmul(a: &Mat3, b: &Mat3, dim: usize) -> Mat3 {
    let mut out = [[0.0; 3]; 3];
    for i in 0..dim {
        for j in 0..dim {
            out[i][j] = (0..dim).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn inverse_times_matrix_is_identity() {
        let mat = [[4.0, 1.0, 0.5], [1.0, 3.0, 0.25], [0.5, 0.25, 2.0]];
        for dim in 1..=3 {
            let d = det(&mat, dim);
            let inv = inverse(&mat, dim, d);
            let prod = matmul(&inv, &mat, dim);
            for i in 0..dim {
                for j in 0..dim {
                    let expected = if i == j { 1.0 } else { 0.0 };
                    assert!(approx(prod[i][j], expected), "dim {dim} ({i},{j})");
                }
            }
        }
    }

    #[test]
    fn determinants() {
        let mat = [[2.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 4.0]];
        assert!(approx(det(&mat, 1), 2.0));
        assert!(approx(det(&mat, 2), 6.0));
        assert!(approx(det(&mat, 3), 24.0));
    }

    #[test]
    fn vector_ops() {
        let a = [1.0, 2.0, 2.0];
        assert!(approx(norm(a), 3.0));
        assert_eq!(sub(a, a), [0.0; 3]);
        assert_eq!(scale(-1.0, a), [-1.0, -2.0, -2.0]);
        let mut acc = [0.0; 3];
        axpy(&mut acc, 2.0, a);
        assert_eq!(acc, [2.0, 4.0, 4.0]);
    }
}

//! Dense matrix helpers shared by the proximal operators and solvers.

use nalgebra::DMatrix;

/// Symmetry tolerance used for input validation and solution postconditions.
pub const SYMMETRY_TOL: f64 = 1e-5;

/// Largest absolute entry of `A - A^T`.
pub fn max_asymmetry(a: &DMatrix<f64>) -> f64 {
    let n = a.nrows();
    let mut worst = 0.0_f64;
    for j in 0..n {
        for i in (j + 1)..n {
            worst = worst.max((a[(i, j)] - a[(j, i)]).abs());
        }
    }
    worst
}

/// `(A + A^T) / 2`
pub fn symmetrize(a: &DMatrix<f64>) -> DMatrix<f64> {
    let mut m = (a + a.transpose()) * 0.5;
    // Force exact mirror so downstream checks see bitwise symmetry.
    let n = m.nrows();
    for j in 0..n {
        for i in (j + 1)..n {
            m[(j, i)] = m[(i, j)];
        }
    }
    m
}

/// Scalar soft-threshold: `sign(x) * max(|x| - t, 0)`.
#[inline]
pub fn soft_threshold(x: f64, t: f64) -> f64 {
    if x > t {
        x - t
    } else if x < -t {
        x + t
    } else {
        0.0
    }
}

/// Frobenius norm over a stack of matrices (all entries treated as one vector).
pub fn stack_norm(stack: &[DMatrix<f64>]) -> f64 {
    stack.iter().map(|m| m.norm_squared()).sum::<f64>().sqrt()
}

/// Frobenius norm of `a - b` over a stack.
pub fn stack_diff_norm(a: &[DMatrix<f64>], b: &[DMatrix<f64>]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).norm_squared())
        .sum::<f64>()
        .sqrt()
}

/// Identity matrices of the given dimensions.
pub fn identity_stack(dims: &[usize]) -> Vec<DMatrix<f64>> {
    dims.iter().map(|&p| DMatrix::identity(p, p)).collect()
}

pub fn zeros_stack(dims: &[usize]) -> Vec<DMatrix<f64>> {
    dims.iter().map(|&p| DMatrix::zeros(p, p)).collect()
}

/// Euclidean norm of a slice.
#[inline]
pub fn norm2(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_threshold() {
        assert_eq!(soft_threshold(3.0, 1.0), 2.0);
        assert_eq!(soft_threshold(-3.0, 1.0), -2.0);
        assert_eq!(soft_threshold(0.5, 1.0), 0.0);
        assert_eq!(soft_threshold(-1.0, 1.0), 0.0);
        assert_eq!(soft_threshold(0.7, 0.0), 0.7);
    }

    #[test]
    fn test_symmetrize_is_exact() {
        let a = DMatrix::from_row_slice(3, 3, &[
            1.0, 2.0, 3.0,
            2.1, 4.0, 5.0,
            2.9, 5.2, 6.0,
        ]);
        assert!((max_asymmetry(&a) - 0.2).abs() < 1e-12);

        let s = symmetrize(&a);
        assert_eq!(max_asymmetry(&s), 0.0);
        assert!((s[(0, 1)] - 2.05).abs() < 1e-12);
        assert!((s[(2, 1)] - 5.1).abs() < 1e-12);
    }

    #[test]
    fn test_stack_norms() {
        let a = vec![DMatrix::identity(2, 2), DMatrix::identity(3, 3)];
        let b = zeros_stack(&[2, 3]);
        assert!((stack_norm(&a) - 5.0_f64.sqrt()).abs() < 1e-12);
        assert!((stack_diff_norm(&a, &b) - 5.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(identity_stack(&[2, 3]), a);
    }
}

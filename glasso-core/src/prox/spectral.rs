//! Spectral proximal maps.
//!
//! Both operators eigendecompose a symmetric matrix, transform the spectrum
//! elementwise, and rebuild `Q diag(f(d)) Q^T`.

use nalgebra::linalg::SymmetricEigen;
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::util::numerics::symmetrize;

fn map_spectrum<F>(a: &DMatrix<f64>, f: F) -> DMatrix<f64>
where
    F: Fn(f64) -> f64,
{
    let eig = SymmetricEigen::new(symmetrize(a));
    let vals: DVector<f64> = eig.eigenvalues.map(f);
    let b = &eig.eigenvectors * DMatrix::<f64>::from_diagonal(&vals) * eig.eigenvectors.transpose();
    symmetrize(&b)
}

/// Positive root of `b^2 - d b - beta = 0`.
#[inline]
fn logdet_root(d: f64, beta: f64) -> f64 {
    let r = (d * d + 4.0 * beta).sqrt();
    if d >= 0.0 {
        0.5 * (d + r)
    } else {
        // d + r cancels for large negative d
        2.0 * beta / (r - d)
    }
}

/// Proximal map of `-log det` with scale `beta`:
///
/// ```text
/// argmin_B  -log det(B) + 1/(2 beta) ||B - A||_F^2
/// ```
///
/// The result is symmetric positive definite for every symmetric `A`.
pub fn prox_logdet(a: &DMatrix<f64>, beta: f64) -> DMatrix<f64> {
    debug_assert!(beta > 0.0);
    map_spectrum(a, |d| logdet_root(d, beta))
}

/// [`prox_logdet`] over independent instances, evaluated in parallel.
pub fn prox_logdet_stack(inputs: &[DMatrix<f64>], betas: &[f64]) -> Vec<DMatrix<f64>> {
    debug_assert_eq!(inputs.len(), betas.len());
    inputs
        .par_iter()
        .zip(betas.par_iter())
        .map(|(a, &beta)| prox_logdet(a, beta))
        .collect()
}

/// Proximal map of `t ||L||_* + I(L ⪰ 0)`: eigenvalues become `max(d - t, 0)`.
pub fn prox_nuclear_psd(a: &DMatrix<f64>, t: f64) -> DMatrix<f64> {
    debug_assert!(t >= 0.0);
    map_spectrum(a, |d| (d - t).max(0.0))
}

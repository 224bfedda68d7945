//! KKT-based stopping criteria for the ADMM solvers.
//!
//! Each criterion is a nonnegative scalar that vanishes exactly at a KKT point
//! of the corresponding problem. The solvers carry scaled duals `X`; the
//! criteria work with the unscaled multipliers `rho * X`.

use nalgebra::DMatrix;

use crate::error::GlassoResult;
use crate::problem::{ConformingProblem, NonConformingProblem};
use crate::prox::{prox_group, prox_logdet, prox_nuclear_psd, prox_od_l1, prox_penalty};
use crate::util::numerics::{norm2, stack_diff_norm, stack_norm};
use crate::util::SYMMETRY_TOL;

/// Relative distance `||a - b|| / (1 + ||scale||)` over a stack.
fn rel_stack(a: &[DMatrix<f64>], b: &[DMatrix<f64>], scale: &[DMatrix<f64>]) -> f64 {
    stack_diff_norm(a, b) / (1.0 + stack_norm(scale))
}

fn rel(a: &DMatrix<f64>, b: &DMatrix<f64>, scale: &DMatrix<f64>) -> f64 {
    (a - b).norm() / (1.0 + scale.norm())
}

/// Stationarity of the likelihood block: `Omega_k = phi+(Omega_k - n_k S_k - rho X_k; n_k)`.
fn logdet_stationarity(
    omega: &[DMatrix<f64>],
    s: &[DMatrix<f64>],
    x: &[DMatrix<f64>],
    n: &[f64],
    rho: f64,
) -> f64 {
    let fixed: Vec<DMatrix<f64>> = omega
        .iter()
        .zip(s)
        .zip(x)
        .zip(n)
        .map(|(((om, sk), xk), &nk)| prox_logdet(&(om - sk * nk - xk * rho), nk))
        .collect();
    rel_stack(omega, &fixed, omega)
}

/// Stationarity of the penalty block: `Theta = prox_P(Theta + rho X)`.
fn penalty_stationarity(
    prob: &ConformingProblem,
    theta: &[DMatrix<f64>],
    x: &[DMatrix<f64>],
    rho: f64,
) -> f64 {
    let shifted: Vec<DMatrix<f64>> = theta.iter().zip(x).map(|(t, xk)| t + xk * rho).collect();
    let fixed = prox_penalty(&shifted, prob.lambda1(), prob.lambda2(), prob.penalty());
    rel_stack(theta, &fixed, theta)
}

/// Conforming criterion: `max(t1, t2, t3)`.
///
/// - `t1 = ||Theta - prox_P(Theta + rho X)|| / (1 + ||Theta||)`
/// - `t2 = ||Theta - Omega|| / (1 + ||Theta||)`
/// - `t3 = ||Omega - phi+(Omega - n S - rho X; n)|| / (1 + ||Omega||)`
pub fn conforming_residual(
    prob: &ConformingProblem,
    omega: &[DMatrix<f64>],
    theta: &[DMatrix<f64>],
    x: &[DMatrix<f64>],
    rho: f64,
) -> f64 {
    let t1 = penalty_stationarity(prob, theta, x, rho);
    let t2 = rel_stack(theta, omega, theta);
    let t3 = logdet_stationarity(omega, prob.covariances(), x, prob.sample_sizes(), rho);
    t1.max(t2).max(t3)
}

/// Latent criterion: `max(t1, t2, t3, t4)` for the constraint `Omega = Theta - L`.
///
/// `t2` measures primal feasibility `||Omega - Theta + L||` and `t4` the
/// stationarity of the low-rank block `L = prox_nuclear_psd(L - rho X; mu1)`.
pub fn latent_residual(
    prob: &ConformingProblem,
    mu1: &[f64],
    omega: &[DMatrix<f64>],
    theta: &[DMatrix<f64>],
    low_rank: &[DMatrix<f64>],
    x: &[DMatrix<f64>],
    rho: f64,
) -> f64 {
    let t1 = penalty_stationarity(prob, theta, x, rho);

    let feas: Vec<DMatrix<f64>> = omega
        .iter()
        .zip(theta)
        .zip(low_rank)
        .map(|((om, th), l)| om - th + l)
        .collect();
    let t2 = stack_norm(&feas) / (1.0 + stack_norm(theta));

    let t3 = logdet_stationarity(omega, prob.covariances(), x, prob.sample_sizes(), rho);

    let fixed_l: Vec<DMatrix<f64>> = low_rank
        .iter()
        .zip(x)
        .zip(mu1)
        .map(|((l, xk), &m)| prox_nuclear_psd(&(l - xk * rho), m))
        .collect();
    let t4 = rel_stack(low_rank, &fixed_l, low_rank);

    t1.max(t2).max(t3).max(t4)
}

/// Non-conforming criterion.
///
/// Five per-instance terms are computed; each is collapsed over instances by
/// the Euclidean norm and the largest of the five is returned.
pub fn nonconforming_residual(
    prob: &NonConformingProblem,
    omega: &[DMatrix<f64>],
    theta: &[DMatrix<f64>],
    lambda: &[DMatrix<f64>],
    x0: &[DMatrix<f64>],
    x1: &[DMatrix<f64>],
    rho: f64,
) -> GlassoResult<f64> {
    let k_count = omega.len();
    let mut terms = [
        Vec::with_capacity(k_count),
        Vec::with_capacity(k_count),
        Vec::with_capacity(k_count),
        Vec::with_capacity(k_count),
        Vec::with_capacity(k_count),
    ];

    let shifted: Vec<DMatrix<f64>> = lambda.iter().zip(x1).map(|(l, x)| l + x * rho).collect();
    let lambda_fixed = prox_group(&shifted, prob.groups(), prob.lambda2(), SYMMETRY_TOL)?;

    for k in 0..k_count {
        let s = &prob.covariances()[k];
        let (om, th, la) = (&omega[k], &theta[k], &lambda[k]);
        let (x0k, x1k) = (&x0[k], &x1[k]);

        let omega_fixed = prox_logdet(&(om - s - x0k * rho), 1.0);
        terms[0].push(rel(om, &omega_fixed, om));

        let theta_fixed = prox_od_l1(&(th + x0k * rho - x1k * rho), prob.lambda1()[k]);
        terms[1].push(rel(th, &theta_fixed, th));

        terms[2].push(rel(&lambda_fixed[k], la, la));
        terms[3].push(rel(om, th, th));
        terms[4].push(rel(la, th, th));
    }

    Ok(terms.iter().map(|t| norm2(t)).fold(0.0, f64::max))
}

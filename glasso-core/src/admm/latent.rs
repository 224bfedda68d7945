//! ADMM for conforming instances with latent variables.
//!
//! The precision matrix is modelled as sparse minus low-rank,
//! `Omega = Theta - L` with `L` positive semidefinite and penalized by its
//! nuclear norm `mu1_k ||L_k||_*`. With scaled dual `X` on `Omega - Theta + L = 0`:
//!
//! ```text
//! Omega_k <- phi+(Theta_k - L_k - X_k - (n_k / rho) S_k; n_k / rho)
//! Theta   <- prox_P(Omega + L + X; lambda1 / rho, lambda2 / rho)
//! L_k     <- prox_nuclear_psd(Theta_k - Omega_k - X_k; mu1_k / rho)
//! X       <- X + Omega - Theta + L
//! ```

use rayon::prelude::*;

use super::termination::latent_residual;
use super::trace::IterationRecorder;
use super::{assert_symmetric, prepare, Stack};
use crate::error::{GlassoError, GlassoResult};
use crate::problem::{AdmmSettings, ConformingProblem, ConformingSolution, SolveResult, SolveStatus};
use crate::prox::{prox_logdet_stack, prox_nuclear_psd, prox_penalty};
use crate::util::numerics::zeros_stack;

const SOLVER: &str = "latent";

#[derive(Debug, Clone)]
struct Iterate {
    omega: Stack,
    theta: Stack,
    low_rank: Stack,
    x: Stack,
}

impl Iterate {
    fn step(&self, prob: &ConformingProblem, mu1: &[f64], rho: f64) -> Self {
        let n = prob.sample_sizes();

        let inputs: Stack = self
            .theta
            .iter()
            .zip(&self.low_rank)
            .zip(&self.x)
            .zip(prob.covariances())
            .zip(n)
            .map(|((((th, l), x), s), &nk)| th - l - x - s * (nk / rho))
            .collect();
        let betas: Vec<f64> = n.iter().map(|nk| nk / rho).collect();
        let omega = prox_logdet_stack(&inputs, &betas);

        let shifted: Stack = omega
            .iter()
            .zip(&self.low_rank)
            .zip(&self.x)
            .map(|((om, l), x)| om + l + x)
            .collect();
        let l1: Vec<f64> = prob.lambda1().iter().map(|l| l / rho).collect();
        let theta = prox_penalty(&shifted, &l1, prob.lambda2() / rho, prob.penalty());

        let low_rank: Stack = theta
            .par_iter()
            .zip(omega.par_iter())
            .zip(self.x.par_iter())
            .zip(mu1.par_iter())
            .map(|(((th, om), x), &m)| prox_nuclear_psd(&(th - om - x), m / rho))
            .collect();

        let x = self
            .x
            .iter()
            .zip(&omega)
            .zip(&theta)
            .zip(&low_rank)
            .map(|(((x, om), th), l)| x + om - th + l)
            .collect();

        Self { omega, theta, low_rank, x }
    }
}

/// Solve a conforming problem with a latent low-rank component.
///
/// The warm start seeds `Omega`, `Theta` and `X`; `L` always starts at zero.
pub fn solve_latent(
    prob: &ConformingProblem,
    settings: &AdmmSettings,
) -> GlassoResult<SolveResult<ConformingSolution>> {
    let mu1 = prob.mu1().ok_or_else(|| {
        GlassoError::InvalidProblem("latent solver requires mu1 weights".to_string())
    })?;

    let dims = prob.dims();
    let (omega, theta, x) = prepare(settings, &dims)?;
    let rho = settings.rho;

    log::debug!(
        "{}: K = {}, p = {}, penalty {}, rho = {}",
        SOLVER,
        prob.num_instances(),
        prob.dim(),
        prob.penalty(),
        rho
    );

    let mut it = Iterate {
        omega,
        theta,
        low_rank: zeros_stack(&dims),
        x,
    };
    let mut rec = IterationRecorder::new(SOLVER, settings.verbose, settings.measure);
    let mut status = SolveStatus::MaxIterReached;

    for _ in 0..settings.max_iter {
        rec.begin_iter();
        it = it.step(prob, mu1, rho);
        let eta = latent_residual(prob, mu1, &it.omega, &it.theta, &it.low_rank, &it.x, rho);
        rec.record(eta);
        if eta <= settings.eps_admm {
            status = SolveStatus::Optimal;
            break;
        }
    }

    assert_symmetric(SOLVER, "omega", &it.omega);
    assert_symmetric(SOLVER, "theta", &it.theta);
    assert_symmetric(SOLVER, "low_rank", &it.low_rank);

    Ok(SolveResult {
        solution: ConformingSolution {
            omega: it.omega,
            theta: it.theta,
            dual: it.x,
            low_rank: Some(it.low_rank),
        },
        info: rec.finish(status),
    })
}

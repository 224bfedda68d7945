//! ADMM for conforming instances.
//!
//! Splits the problem as `Omega = Theta` with scaled dual `X`:
//!
//! ```text
//! Omega_k <- phi+(Theta_k - X_k - (n_k / rho) S_k; n_k / rho)
//! Theta   <- prox_P(Omega + X; lambda1 / rho, lambda2 / rho)
//! X       <- X + Omega - Theta
//! ```

use super::termination::conforming_residual;
use super::trace::IterationRecorder;
use super::{assert_symmetric, prepare, Stack};
use crate::error::GlassoResult;
use crate::problem::{AdmmSettings, ConformingProblem, ConformingSolution, SolveResult, SolveStatus};
use crate::prox::{prox_logdet_stack, prox_penalty};

const SOLVER: &str = "conforming";

#[derive(Debug, Clone)]
struct Iterate {
    omega: Stack,
    theta: Stack,
    x: Stack,
}

impl Iterate {
    fn step(&self, prob: &ConformingProblem, rho: f64) -> Self {
        let n = prob.sample_sizes();

        let inputs: Stack = self
            .theta
            .iter()
            .zip(&self.x)
            .zip(prob.covariances())
            .zip(n)
            .map(|(((th, x), s), &nk)| th - x - s * (nk / rho))
            .collect();
        let betas: Vec<f64> = n.iter().map(|nk| nk / rho).collect();
        let omega = prox_logdet_stack(&inputs, &betas);

        let shifted: Stack = omega.iter().zip(&self.x).map(|(om, x)| om + x).collect();
        let l1: Vec<f64> = prob.lambda1().iter().map(|l| l / rho).collect();
        let theta = prox_penalty(&shifted, &l1, prob.lambda2() / rho, prob.penalty());

        let x = self
            .x
            .iter()
            .zip(&omega)
            .zip(&theta)
            .map(|((x, om), th)| x + om - th)
            .collect();

        Self { omega, theta, x }
    }
}

/// Solve a conforming problem.
///
/// Problems that carry latent weights are handed to [`solve_latent`](super::solve_latent).
pub fn solve_conforming(
    prob: &ConformingProblem,
    settings: &AdmmSettings,
) -> GlassoResult<SolveResult<ConformingSolution>> {
    if prob.is_latent() {
        return super::solve_latent(prob, settings);
    }

    let (omega, theta, x) = prepare(settings, &prob.dims())?;
    let rho = settings.rho;

    log::debug!(
        "{}: K = {}, p = {}, penalty {}, rho = {}",
        SOLVER,
        prob.num_instances(),
        prob.dim(),
        prob.penalty(),
        rho
    );

    let mut it = Iterate { omega, theta, x };
    let mut rec = IterationRecorder::new(SOLVER, settings.verbose, settings.measure);
    let mut status = SolveStatus::MaxIterReached;

    for _ in 0..settings.max_iter {
        rec.begin_iter();
        it = it.step(prob, rho);
        let eta = conforming_residual(prob, &it.omega, &it.theta, &it.x, rho);
        rec.record(eta);
        if eta <= settings.eps_admm {
            status = SolveStatus::Optimal;
            break;
        }
    }

    assert_symmetric(SOLVER, "omega", &it.omega);
    assert_symmetric(SOLVER, "theta", &it.theta);

    Ok(SolveResult {
        solution: ConformingSolution {
            omega: it.omega,
            theta: it.theta,
            dual: it.x,
            low_rank: None,
        },
        info: rec.finish(status),
    })
}

//! ADMM for non-conforming instances.
//!
//! Each instance has its own dimension `p_k`. The group penalty acts on a
//! consensus copy `Lambda` of `Theta`, linked through the group index:
//!
//! ```text
//! Omega_k <- phi+(Theta_k - X0_k - S_k / rho; 1 / rho)
//! Theta_k <- prox_od_l1((Omega_k + X0_k + Lambda_k - X1_k) / 2; lambda1_k / (2 rho))
//! Lambda  <- prox_G(Theta + X1; lambda2 / rho)
//! X0_k    <- X0_k + Omega_k - Theta_k
//! X1_k    <- X1_k + Theta_k - Lambda_k
//! ```

use super::termination::nonconforming_residual;
use super::trace::IterationRecorder;
use super::{assert_symmetric, prepare, Stack};
use crate::error::GlassoResult;
use crate::problem::{AdmmSettings, NonConformingProblem, NonConformingSolution, SolveResult, SolveStatus};
use crate::prox::{prox_group, prox_logdet_stack, prox_od_l1};
use crate::util::numerics::zeros_stack;
use crate::util::SYMMETRY_TOL;

const SOLVER: &str = "nonconforming";

#[derive(Debug, Clone)]
struct Iterate {
    omega: Stack,
    theta: Stack,
    lambda: Stack,
    x0: Stack,
    x1: Stack,
}

impl Iterate {
    fn step(&self, prob: &NonConformingProblem, rho: f64) -> GlassoResult<Self> {
        let inputs: Stack = self
            .theta
            .iter()
            .zip(&self.x0)
            .zip(prob.covariances())
            .map(|((th, x0), s)| th - x0 - s / rho)
            .collect();
        let betas = vec![1.0 / rho; inputs.len()];
        let omega = prox_logdet_stack(&inputs, &betas);

        let theta: Stack = omega
            .iter()
            .zip(&self.x0)
            .zip(&self.lambda)
            .zip(&self.x1)
            .zip(prob.lambda1())
            .map(|((((om, x0), la), x1), &l1)| {
                prox_od_l1(&((om + x0 + la - x1) * 0.5), l1 / (2.0 * rho))
            })
            .collect();

        let shifted: Stack = theta.iter().zip(&self.x1).map(|(th, x1)| th + x1).collect();
        let lambda = prox_group(&shifted, prob.groups(), prob.lambda2() / rho, SYMMETRY_TOL)?;

        let x0 = self
            .x0
            .iter()
            .zip(&omega)
            .zip(&theta)
            .map(|((x0, om), th)| x0 + om - th)
            .collect();
        let x1 = self
            .x1
            .iter()
            .zip(&theta)
            .zip(&lambda)
            .map(|((x1, th), la)| x1 + th - la)
            .collect();

        Ok(Self { omega, theta, lambda, x0, x1 })
    }
}

/// Solve a non-conforming problem with the group penalty.
///
/// The warm start seeds `Omega`, `Theta` (and `Lambda = Theta`) and `X0`;
/// `X1` always starts at zero.
pub fn solve_nonconforming(
    prob: &NonConformingProblem,
    settings: &AdmmSettings,
) -> GlassoResult<SolveResult<NonConformingSolution>> {
    let dims = prob.dims();
    let (omega, theta, x0) = prepare(settings, &dims)?;
    let rho = settings.rho;

    log::debug!(
        "{}: K = {}, dims = {:?}, groups = {}, rho = {}",
        SOLVER,
        prob.num_instances(),
        dims,
        prob.groups().num_groups(),
        rho
    );

    let mut it = Iterate {
        lambda: theta.clone(),
        omega,
        theta,
        x0,
        x1: zeros_stack(&dims),
    };
    let mut rec = IterationRecorder::new(SOLVER, settings.verbose, settings.measure);
    let mut status = SolveStatus::MaxIterReached;

    for _ in 0..settings.max_iter {
        rec.begin_iter();
        it = it.step(prob, rho)?;
        let eta = nonconforming_residual(prob, &it.omega, &it.theta, &it.lambda, &it.x0, &it.x1, rho)?;
        rec.record(eta);
        if eta <= settings.eps_admm {
            status = SolveStatus::Optimal;
            break;
        }
    }

    assert_symmetric(SOLVER, "omega", &it.omega);
    assert_symmetric(SOLVER, "theta", &it.theta);
    assert_symmetric(SOLVER, "lambda", &it.lambda);

    Ok(SolveResult {
        solution: NonConformingSolution {
            omega: it.omega,
            theta: it.theta,
            lambda: it.lambda,
            x0: it.x0,
            x1: it.x1,
        },
        info: rec.finish(status),
    })
}

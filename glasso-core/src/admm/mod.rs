//! ADMM solvers for the multiple graphical lasso.
//!
//! Three variants share the same loop shape: a single pass of at most
//! `max_iter` iterations, each followed by a KKT residual check.
//!
//! - [`solve_conforming`]: all instances share one variable set
//! - [`solve_latent`]: conforming, with an additional low-rank PSD component
//! - [`solve_nonconforming`]: instances linked through a [`GroupIndex`](crate::group::GroupIndex)

pub mod conforming;
pub mod latent;
pub mod nonconforming;
pub mod termination;
mod trace;

pub use conforming::solve_conforming;
pub use latent::solve_latent;
pub use nonconforming::solve_nonconforming;
pub use termination::{conforming_residual, latent_residual, nonconforming_residual};

use nalgebra::DMatrix;

use crate::error::GlassoResult;
use crate::problem::{AdmmSettings, WarmStart};
use crate::util::numerics::{identity_stack, max_asymmetry, zeros_stack};
use crate::util::SYMMETRY_TOL;

type Stack = Vec<DMatrix<f64>>;

/// Initial `(Omega, Theta, dual)` from the warm start, or `(I, I, 0)`.
fn start_point(warm: Option<&WarmStart>, dims: &[usize]) -> GlassoResult<(Stack, Stack, Stack)> {
    match warm {
        Some(ws) => {
            ws.validate(dims)?;
            let omega = ws.omega.clone();
            let theta = ws.theta.clone().unwrap_or_else(|| omega.clone());
            let dual = ws.dual.clone().unwrap_or_else(|| zeros_stack(dims));
            Ok((omega, theta, dual))
        }
        None => Ok((identity_stack(dims), identity_stack(dims), zeros_stack(dims))),
    }
}

fn prepare(settings: &AdmmSettings, dims: &[usize]) -> GlassoResult<(Stack, Stack, Stack)> {
    settings.validate()?;
    start_point(settings.warm_start.as_ref(), dims)
}

/// Final iterates must be symmetric; anything else is a bug in the solver.
fn assert_symmetric(solver: &str, name: &str, stack: &[DMatrix<f64>]) {
    for (k, m) in stack.iter().enumerate() {
        let max_asym = max_asymmetry(m);
        assert!(
            max_asym <= SYMMETRY_TOL,
            "{}: {}[{}] is not symmetric (max |A - A^T| = {:.3e})",
            solver,
            name,
            k,
            max_asym
        );
    }
}

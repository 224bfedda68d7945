//! glasso-core: ADMM solvers for the multiple graphical lasso
//!
//! Estimates K sparse precision matrices jointly from K empirical covariance
//! matrices. Two coupling penalties are supported on top of the per-instance
//! off-diagonal L1 term:
//!
//! - **Group graphical lasso (GGL)**: L2 norm of each entry across instances
//! - **Fused graphical lasso (FGL)**: L1 norm of differences between
//!   consecutive instances
//!
//! Instances may share one variable set (*conforming*) or have partially
//! overlapping variable sets linked by a [`GroupIndex`] (*non-conforming*).
//! Conforming problems may additionally carry a low-rank PSD latent component.
//!
//! # Algorithm
//!
//! All solvers use ADMM in scaled form. Each iteration evaluates a
//! log-determinant proximal map per instance (one symmetric
//! eigendecomposition each, in parallel), a penalty proximal map, and a dual
//! update, then checks a KKT residual against `eps_admm`.
//!
//! # Example
//!
//! ```no_run
//! use glasso_core::{solve, AdmmSettings, ConformingProblem, Penalty};
//! use nalgebra::DMatrix;
//!
//! let s = DMatrix::from_fn(4, 4, |i, j| 0.5f64.powi((i as i32 - j as i32).abs()));
//! let prob = ConformingProblem::new(vec![s.clone(), s], 0.05, 0.05, Penalty::Group)?;
//!
//! let result = solve(&prob.into(), &AdmmSettings::default())?;
//! println!("status: {}", result.info.status);
//! println!("Theta_0 = {}", result.solution.theta()[0]);
//! # Ok::<(), glasso_core::GlassoError>(())
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)]

pub mod admm;
pub mod error;
pub mod group;
pub mod problem;
pub mod prox;
pub mod util;

pub use error::{GlassoError, GlassoResult};
pub use group::GroupIndex;
pub use problem::{
    AdmmSettings, ConformingProblem, ConformingSolution, InstanceWeights, NonConformingProblem,
    NonConformingSolution, Penalty, Problem, Solution, SolveInfo, SolveResult, SolveStatus,
    SolveTrace, WarmStart,
};
pub use util::SYMMETRY_TOL;

/// Main solve entry point.
///
/// Dispatches on the problem class. Conforming problems with latent weights
/// run the latent-variable solver.
pub fn solve(problem: &Problem, settings: &AdmmSettings) -> GlassoResult<SolveResult> {
    match problem {
        Problem::Conforming(p) => admm::solve_conforming(p, settings).map(|r| r.map(Solution::Conforming)),
        Problem::NonConforming(p) => {
            admm::solve_nonconforming(p, settings).map(|r| r.map(Solution::NonConforming))
        }
    }
}

//! Problem data structures and validation.
//!
//! This module defines the two problem classes the solvers accept, the
//! solver settings, and the result types.
//!
//! The multiple graphical lasso estimates K precision matrices from K
//! empirical covariance matrices `S_k`:
//!
//! ```text
//! minimize  sum_k n_k (-log det Theta_k + <S_k, Theta_k>) + P(Theta)
//! ```
//!
//! with the group penalty
//!
//! ```text
//! P(Theta) = sum_k lambda1_k ||Theta_k||_{1,od} + lambda2 sum_{i!=j} ||Theta[ij]||_2
//! ```
//!
//! or the fused penalty
//!
//! ```text
//! P(Theta) = lambda1 sum_k ||Theta_k||_{1,od} + lambda2 sum_k ||Theta_k - Theta_{k-1}||_{1,od}
//! ```

use std::fmt;
use std::time::Duration;

use nalgebra::DMatrix;

use crate::error::{check_positive, GlassoError, GlassoResult};
use crate::group::GroupIndex;
use crate::util::numerics::max_asymmetry;
use crate::util::SYMMETRY_TOL;

/// Cross-instance penalty type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Penalty {
    /// Group graphical lasso: L2 norm of each entry across instances
    #[default]
    Group,
    /// Fused graphical lasso: L1 norm of differences between consecutive instances
    Fused,
}

impl fmt::Display for Penalty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Penalty::Group => write!(f, "GGL"),
            Penalty::Fused => write!(f, "FGL"),
        }
    }
}

/// A per-instance weight given either once for all instances or per instance.
#[derive(Debug, Clone, PartialEq)]
pub enum InstanceWeights {
    Scalar(f64),
    PerInstance(Vec<f64>),
}

impl From<f64> for InstanceWeights {
    fn from(v: f64) -> Self {
        InstanceWeights::Scalar(v)
    }
}

impl From<usize> for InstanceWeights {
    fn from(v: usize) -> Self {
        InstanceWeights::Scalar(v as f64)
    }
}

impl From<Vec<f64>> for InstanceWeights {
    fn from(v: Vec<f64>) -> Self {
        InstanceWeights::PerInstance(v)
    }
}

impl From<&[f64]> for InstanceWeights {
    fn from(v: &[f64]) -> Self {
        InstanceWeights::PerInstance(v.to_vec())
    }
}

impl InstanceWeights {
    /// Expand to one strictly positive value per instance.
    pub fn resolve(&self, name: &'static str, num_instances: usize) -> GlassoResult<Vec<f64>> {
        let values = match self {
            InstanceWeights::Scalar(v) => vec![*v; num_instances],
            InstanceWeights::PerInstance(v) => {
                if v.len() != num_instances {
                    return Err(GlassoError::InvalidProblem(format!(
                        "{} has length {}, expected {}",
                        name,
                        v.len(),
                        num_instances
                    )));
                }
                v.clone()
            }
        };
        for &v in &values {
            check_positive(name, v)?;
        }
        Ok(values)
    }
}

/// Check that every matrix is square and symmetric; returns the dimensions.
pub fn validate_covariances(covariances: &[DMatrix<f64>], sym_tol: f64) -> GlassoResult<Vec<usize>> {
    if covariances.is_empty() {
        return Err(GlassoError::InvalidProblem("no covariance matrices given".to_string()));
    }
    let mut dims = Vec::with_capacity(covariances.len());
    for (k, s) in covariances.iter().enumerate() {
        if !s.is_square() {
            return Err(GlassoError::NotSquare {
                instance: k,
                rows: s.nrows(),
                cols: s.ncols(),
            });
        }
        if s.nrows() == 0 {
            return Err(GlassoError::InvalidProblem(format!("instance {} has dimension 0", k)));
        }
        if s.iter().any(|v| !v.is_finite()) {
            return Err(GlassoError::InvalidProblem(format!(
                "instance {} contains non-finite entries",
                k
            )));
        }
        let max_asym = max_asymmetry(s);
        if max_asym > sym_tol {
            return Err(GlassoError::NotSymmetric { instance: k, max_asym });
        }
        dims.push(s.nrows());
    }
    Ok(dims)
}

/// K instances sharing one variable set of size p.
#[derive(Debug, Clone)]
pub struct ConformingProblem {
    covariances: Vec<DMatrix<f64>>,
    lambda1: Vec<f64>,
    lambda2: f64,
    penalty: Penalty,
    sample_sizes: Vec<f64>,
    mu1: Option<Vec<f64>>,
}

impl ConformingProblem {
    /// Create a conforming problem; `lambda1` is expanded to one value per instance.
    ///
    /// Sample sizes default to one for every instance.
    pub fn new(
        covariances: Vec<DMatrix<f64>>,
        lambda1: impl Into<InstanceWeights>,
        lambda2: f64,
        penalty: Penalty,
    ) -> GlassoResult<Self> {
        let dims = validate_covariances(&covariances, SYMMETRY_TOL)?;
        let p = dims[0];
        if let Some(k) = dims.iter().position(|&d| d != p) {
            return Err(GlassoError::InvalidProblem(format!(
                "instance {} has dimension {}, expected {} (use a non-conforming problem for differing dimensions)",
                k, dims[k], p
            )));
        }

        let k_count = covariances.len();
        let lambda1 = lambda1.into().resolve("lambda1", k_count)?;
        check_positive("lambda2", lambda2)?;

        if penalty == Penalty::Fused && lambda1.iter().any(|&l| l != lambda1[0]) {
            return Err(GlassoError::UnsupportedPenalty(
                "fused penalty requires the same lambda1 for every instance".to_string(),
            ));
        }

        Ok(Self {
            covariances,
            lambda1,
            lambda2,
            penalty,
            sample_sizes: vec![1.0; k_count],
            mu1: None,
        })
    }

    /// Weight each instance's likelihood by its sample size.
    pub fn with_sample_sizes(mut self, n: impl Into<InstanceWeights>) -> GlassoResult<Self> {
        self.sample_sizes = n.into().resolve("sample_sizes", self.num_instances())?;
        Ok(self)
    }

    /// Add a low-rank latent component penalized by `mu1_k ||L_k||_*`.
    pub fn with_latent(mut self, mu1: impl Into<InstanceWeights>) -> GlassoResult<Self> {
        self.mu1 = Some(mu1.into().resolve("mu1", self.num_instances())?);
        Ok(self)
    }

    pub fn num_instances(&self) -> usize {
        self.covariances.len()
    }

    /// Shared dimension p.
    pub fn dim(&self) -> usize {
        self.covariances[0].nrows()
    }

    pub fn covariances(&self) -> &[DMatrix<f64>] {
        &self.covariances
    }

    pub fn lambda1(&self) -> &[f64] {
        &self.lambda1
    }

    pub fn lambda2(&self) -> f64 {
        self.lambda2
    }

    pub fn penalty(&self) -> Penalty {
        self.penalty
    }

    pub fn sample_sizes(&self) -> &[f64] {
        &self.sample_sizes
    }

    /// Nuclear-norm weights, present for latent-variable problems.
    pub fn mu1(&self) -> Option<&[f64]> {
        self.mu1.as_deref()
    }

    pub fn is_latent(&self) -> bool {
        self.mu1.is_some()
    }

    pub fn dims(&self) -> Vec<usize> {
        vec![self.dim(); self.num_instances()]
    }
}

/// K instances with partially overlapping variable sets of sizes p_k, linked
/// through a group-index map.
#[derive(Debug, Clone)]
pub struct NonConformingProblem {
    covariances: Vec<DMatrix<f64>>,
    groups: GroupIndex,
    lambda1: Vec<f64>,
    lambda2: f64,
}

impl NonConformingProblem {
    /// Create a non-conforming problem. Only [`Penalty::Group`] is defined here.
    pub fn new(
        covariances: Vec<DMatrix<f64>>,
        groups: GroupIndex,
        lambda1: impl Into<InstanceWeights>,
        lambda2: f64,
        penalty: Penalty,
    ) -> GlassoResult<Self> {
        if penalty != Penalty::Group {
            return Err(GlassoError::UnsupportedPenalty(format!(
                "{} is not defined for non-conforming instances",
                penalty
            )));
        }
        let dims = validate_covariances(&covariances, SYMMETRY_TOL)?;
        groups.validate(&dims)?;
        let lambda1 = lambda1.into().resolve("lambda1", covariances.len())?;
        check_positive("lambda2", lambda2)?;

        Ok(Self {
            covariances,
            groups,
            lambda1,
            lambda2,
        })
    }

    pub fn num_instances(&self) -> usize {
        self.covariances.len()
    }

    pub fn dims(&self) -> Vec<usize> {
        self.covariances.iter().map(|s| s.nrows()).collect()
    }

    pub fn covariances(&self) -> &[DMatrix<f64>] {
        &self.covariances
    }

    pub fn groups(&self) -> &GroupIndex {
        &self.groups
    }

    pub fn lambda1(&self) -> &[f64] {
        &self.lambda1
    }

    pub fn lambda2(&self) -> f64 {
        self.lambda2
    }
}

/// Problem class, fixed at construction and dispatched to its solver.
#[derive(Debug, Clone)]
pub enum Problem {
    Conforming(ConformingProblem),
    NonConforming(NonConformingProblem),
}

impl Problem {
    pub fn num_instances(&self) -> usize {
        match self {
            Problem::Conforming(p) => p.num_instances(),
            Problem::NonConforming(p) => p.num_instances(),
        }
    }

    pub fn dims(&self) -> Vec<usize> {
        match self {
            Problem::Conforming(p) => p.dims(),
            Problem::NonConforming(p) => p.dims(),
        }
    }
}

impl From<ConformingProblem> for Problem {
    fn from(p: ConformingProblem) -> Self {
        Problem::Conforming(p)
    }
}

impl From<NonConformingProblem> for Problem {
    fn from(p: NonConformingProblem) -> Self {
        Problem::NonConforming(p)
    }
}

/// Starting point for a solve, typically a previous solution at nearby weights.
#[derive(Debug, Clone)]
pub struct WarmStart {
    /// Precision-matrix start point (one per instance)
    pub omega: Vec<DMatrix<f64>>,
    /// Sparse iterate start (defaults to `omega`)
    pub theta: Option<Vec<DMatrix<f64>>>,
    /// Scaled dual start (defaults to zero). Seeds `X` for conforming
    /// problems and `X0` for non-conforming problems.
    pub dual: Option<Vec<DMatrix<f64>>>,
}

impl WarmStart {
    pub fn new(omega: Vec<DMatrix<f64>>) -> Self {
        Self { omega, theta: None, dual: None }
    }

    pub fn with_theta(mut self, theta: Vec<DMatrix<f64>>) -> Self {
        self.theta = Some(theta);
        self
    }

    pub fn with_dual(mut self, dual: Vec<DMatrix<f64>>) -> Self {
        self.dual = Some(dual);
        self
    }

    /// Check shapes against the instance dimensions.
    pub fn validate(&self, dims: &[usize]) -> GlassoResult<()> {
        let check = |name: &str, mats: &[DMatrix<f64>]| -> GlassoResult<()> {
            if mats.len() != dims.len() {
                return Err(GlassoError::InvalidWarmStart(format!(
                    "{} has {} matrices, expected {}",
                    name,
                    mats.len(),
                    dims.len()
                )));
            }
            for (k, (m, &p)) in mats.iter().zip(dims).enumerate() {
                if m.shape() != (p, p) {
                    return Err(GlassoError::InvalidWarmStart(format!(
                        "{}[{}] has shape {}x{}, expected {}x{}",
                        name,
                        k,
                        m.nrows(),
                        m.ncols(),
                        p,
                        p
                    )));
                }
                let max_asym = max_asymmetry(m);
                if max_asym > SYMMETRY_TOL {
                    return Err(GlassoError::InvalidWarmStart(format!(
                        "{}[{}] is not symmetric (max |A - A^T| = {:.3e})",
                        name, k, max_asym
                    )));
                }
            }
            Ok(())
        };

        check("omega", &self.omega)?;
        if let Some(theta) = &self.theta {
            check("theta", theta)?;
        }
        if let Some(dual) = &self.dual {
            check("dual", dual)?;
        }
        Ok(())
    }
}

/// ADMM solver settings.
#[derive(Debug, Clone)]
pub struct AdmmSettings {
    /// Maximum number of ADMM iterations
    pub max_iter: usize,

    /// ADMM step size (penalty parameter of the augmented Lagrangian)
    pub rho: f64,

    /// Tolerance on the KKT residual
    pub eps_admm: f64,

    /// Log every iteration at info level
    pub verbose: bool,

    /// Record per-iteration residuals and wall times
    pub measure: bool,

    /// Optional start point (defaults to identity)
    pub warm_start: Option<WarmStart>,
}

impl Default for AdmmSettings {
    fn default() -> Self {
        // Allow environment overrides for the iteration budget and step size
        let max_iter = std::env::var("GLASSO_MAX_ITER")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(1000);
        let rho = std::env::var("GLASSO_RHO")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(1.0);

        Self {
            max_iter,
            rho,
            eps_admm: 1e-5,
            verbose: false,
            measure: false,
            warm_start: None,
        }
    }
}

impl AdmmSettings {
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_rho(mut self, rho: f64) -> Self {
        self.rho = rho;
        self
    }

    pub fn with_tol(mut self, eps_admm: f64) -> Self {
        self.eps_admm = eps_admm;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_measure(mut self, measure: bool) -> Self {
        self.measure = measure;
        self
    }

    pub fn with_warm_start(mut self, warm_start: WarmStart) -> Self {
        self.warm_start = Some(warm_start);
        self
    }

    pub fn validate(&self) -> GlassoResult<()> {
        if self.max_iter == 0 {
            return Err(GlassoError::InvalidProblem("max_iter must be at least 1".to_string()));
        }
        check_positive("rho", self.rho)?;
        check_positive("eps_admm", self.eps_admm)?;
        Ok(())
    }
}

/// Termination status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// KKT residual below tolerance
    Optimal,
    /// Iteration budget exhausted before convergence
    MaxIterReached,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "optimal"),
            SolveStatus::MaxIterReached => write!(f, "max iterations reached"),
        }
    }
}

/// Per-iteration traces, recorded when [`AdmmSettings::measure`] is set.
#[derive(Debug, Clone, Default)]
pub struct SolveTrace {
    /// KKT residual after each iteration
    pub residuals: Vec<f64>,
    /// Wall time of each iteration
    pub runtimes: Vec<Duration>,
}

/// Solve diagnostics.
#[derive(Debug, Clone)]
pub struct SolveInfo {
    pub status: SolveStatus,

    /// Number of ADMM iterations run
    pub iters: usize,

    /// Final KKT residual
    pub residual: f64,

    /// Total solve time
    pub solve_time: Duration,

    pub trace: Option<SolveTrace>,
}

/// Iterates of the conforming (and latent) solvers.
#[derive(Debug, Clone)]
pub struct ConformingSolution {
    /// Positive definite estimate from the log-det step
    pub omega: Vec<DMatrix<f64>>,
    /// Sparse estimate from the penalty step
    pub theta: Vec<DMatrix<f64>>,
    /// Scaled dual variable
    pub dual: Vec<DMatrix<f64>>,
    /// Low-rank component, present for latent-variable problems
    pub low_rank: Option<Vec<DMatrix<f64>>>,
}

/// Iterates of the non-conforming solver.
#[derive(Debug, Clone)]
pub struct NonConformingSolution {
    pub omega: Vec<DMatrix<f64>>,
    pub theta: Vec<DMatrix<f64>>,
    /// Group-consensus variable
    pub lambda: Vec<DMatrix<f64>>,
    /// Scaled dual of `Omega = Theta`
    pub x0: Vec<DMatrix<f64>>,
    /// Scaled dual of `Theta = Lambda`
    pub x1: Vec<DMatrix<f64>>,
}

#[derive(Debug, Clone)]
pub enum Solution {
    Conforming(ConformingSolution),
    NonConforming(NonConformingSolution),
}

impl Solution {
    /// The sparse precision-matrix estimates.
    pub fn theta(&self) -> &[DMatrix<f64>] {
        match self {
            Solution::Conforming(s) => &s.theta,
            Solution::NonConforming(s) => &s.theta,
        }
    }

    pub fn omega(&self) -> &[DMatrix<f64>] {
        match self {
            Solution::Conforming(s) => &s.omega,
            Solution::NonConforming(s) => &s.omega,
        }
    }
}

/// Solution with diagnostics.
#[derive(Debug, Clone)]
pub struct SolveResult<T = Solution> {
    pub solution: T,
    pub info: SolveInfo,
}

impl<T> SolveResult<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SolveResult<U> {
        SolveResult {
            solution: f(self.solution),
            info: self.info,
        }
    }
}

use std::time::{Duration, Instant};

use crate::problem::{SolveInfo, SolveStatus, SolveTrace};

/// Per-iteration bookkeeping shared by all ADMM solvers.
///
/// Records the residual sequence and iteration wall times when `measure`
/// is set, and emits iteration logs through the `log` facade.
pub(crate) struct IterationRecorder {
    solver: &'static str,
    verbose: bool,
    trace: Option<SolveTrace>,
    solve_start: Instant,
    iter_start: Instant,
    iters: usize,
    residual: f64,
}

impl IterationRecorder {
    pub fn new(solver: &'static str, verbose: bool, measure: bool) -> Self {
        let now = Instant::now();
        Self {
            solver,
            verbose,
            trace: measure.then(SolveTrace::default),
            solve_start: now,
            iter_start: now,
            iters: 0,
            residual: f64::INFINITY,
        }
    }

    pub fn begin_iter(&mut self) {
        self.iter_start = Instant::now();
    }

    /// Close the current iteration with its KKT residual.
    pub fn record(&mut self, residual: f64) {
        let dt = self.iter_start.elapsed();
        self.iters += 1;
        self.residual = residual;

        if let Some(trace) = self.trace.as_mut() {
            trace.residuals.push(residual);
            trace.runtimes.push(dt);
        }

        if self.verbose {
            log::info!("{} iter {:4}: residual {:.3e} ({:.2?})", self.solver, self.iters, residual, dt);
        } else {
            log::trace!("{} iter {:4}: residual {:.3e}", self.solver, self.iters, residual);
        }
    }

    pub fn finish(self, status: SolveStatus) -> SolveInfo {
        let solve_time: Duration = self.solve_start.elapsed();

        if status == SolveStatus::MaxIterReached {
            log::warn!(
                "{}: no convergence after {} iterations (residual {:.3e})",
                self.solver,
                self.iters,
                self.residual
            );
        } else if self.verbose {
            log::info!(
                "{}: {} after {} iterations, residual {:.3e}, {:.2?}",
                self.solver,
                status,
                self.iters,
                self.residual,
                solve_time
            );
        } else {
            log::debug!(
                "{}: {} after {} iterations, residual {:.3e}",
                self.solver,
                status,
                self.iters,
                self.residual
            );
        }

        SolveInfo {
            status,
            iters: self.iters,
            residual: self.residual,
            solve_time,
            trace: self.trace,
        }
    }
}

//! End-to-end tests for the ADMM solvers.
//!
//! These tests run the full solve pipeline on small conforming,
//! non-conforming and latent-variable problems.

use glasso_core::admm::{solve_conforming, solve_latent, solve_nonconforming};
use glasso_core::{
    solve, AdmmSettings, ConformingProblem, GlassoError, GroupIndex, NonConformingProblem,
    Penalty, Problem, Solution, SolveStatus, WarmStart,
};
use nalgebra::{DMatrix, SymmetricEigen};

fn ar1(p: usize, r: f64) -> DMatrix<f64> {
    DMatrix::from_fn(p, p, |i, j| r.powi((i as i32 - j as i32).abs()))
}

fn min_eigenvalue(a: &DMatrix<f64>) -> f64 {
    SymmetricEigen::new(a.clone()).eigenvalues.min()
}

fn max_asym(a: &DMatrix<f64>) -> f64 {
    (a - a.transpose()).abs().max()
}

fn settings(max_iter: usize) -> AdmmSettings {
    AdmmSettings {
        max_iter,
        rho: 1.0,
        eps_admm: 1e-5,
        ..Default::default()
    }
}

#[test]
fn test_identity_covariance() {
    // S = I, start at I: the identity is optimal for any positive weights
    let s = vec![DMatrix::identity(3, 3); 2];
    let prob = ConformingProblem::new(s, 0.1, 0.1, Penalty::Group).unwrap();

    let result = solve(&prob.into(), &settings(1000)).expect("Solve failed");

    assert_eq!(result.info.status, SolveStatus::Optimal);
    assert!(result.info.residual <= 1e-5);
    for theta in result.solution.theta() {
        assert!(max_asym(theta) <= 1e-5);
        for i in 0..3 {
            for j in 0..3 {
                if i != j {
                    assert!(theta[(i, j)].abs() < 1e-8, "theta[{},{}] = {}", i, j, theta[(i, j)]);
                }
            }
        }
    }
}

#[test]
fn test_group_lasso_ar1() {
    let s = vec![ar1(5, 0.5), ar1(5, 0.4)];
    let prob = ConformingProblem::new(s, 0.05, 0.05, Penalty::Group).unwrap();

    let result = solve_conforming(&prob, &settings(5000)).expect("Solve failed");
    println!("GGL: {} in {} iterations", result.info.status, result.info.iters);

    assert_eq!(result.info.status, SolveStatus::Optimal);
    let sol = &result.solution;
    for k in 0..2 {
        assert!(min_eigenvalue(&sol.omega[k]) > 0.0);
        assert!(max_asym(&sol.omega[k]) <= 1e-5);
        assert!(max_asym(&sol.theta[k]) <= 1e-5);
        // Omega and Theta agree at convergence
        assert!((&sol.omega[k] - &sol.theta[k]).norm() < 1e-3);
        // Positive neighbour correlation gives a negative precision entry
        assert!(sol.theta[k][(0, 1)] < 0.0);
        assert!(sol.theta[k][(0, 0)] > 1.0);
    }
}

#[test]
fn test_group_lasso_strong_penalty_is_diagonal() {
    // Small correlations and large weights: the optimum is exactly diag(1 / S_ii) = I
    let s = vec![ar1(4, 0.3), ar1(4, 0.2)];
    let prob = ConformingProblem::new(s, 1.0, 1.0, Penalty::Group).unwrap();

    let result = solve_conforming(&prob, &settings(2000)).expect("Solve failed");

    assert_eq!(result.info.status, SolveStatus::Optimal);
    for theta in &result.solution.theta {
        for i in 0..4 {
            assert!((theta[(i, i)] - 1.0).abs() < 1e-3);
            for j in 0..4 {
                if i != j {
                    assert_eq!(theta[(i, j)], 0.0);
                }
            }
        }
    }
}

#[test]
fn test_fused_lasso_ar1() {
    let s = vec![ar1(5, 0.5), ar1(5, 0.45), ar1(5, 0.4)];
    let prob = ConformingProblem::new(s, 0.05, 0.05, Penalty::Fused).unwrap();

    let result = solve_conforming(&prob, &settings(5000)).expect("Solve failed");
    println!("FGL: {} in {} iterations", result.info.status, result.info.iters);

    assert_eq!(result.info.status, SolveStatus::Optimal);
    for k in 0..3 {
        assert!(min_eigenvalue(&result.solution.omega[k]) > 0.0);
        assert!(max_asym(&result.solution.theta[k]) <= 1e-5);
    }
}

#[test]
fn test_fused_lasso_identical_instances() {
    let s = vec![ar1(4, 0.6); 3];
    let prob = ConformingProblem::new(s, 0.05, 0.2, Penalty::Fused).unwrap();

    let result = solve_conforming(&prob, &settings(5000)).expect("Solve failed");

    assert_eq!(result.info.status, SolveStatus::Optimal);
    let theta = &result.solution.theta;
    for k in 1..3 {
        assert!((&theta[k] - &theta[0]).abs().max() < 1e-6);
    }
}

#[test]
fn test_sample_size_weighting() {
    let s = vec![ar1(4, 0.5), ar1(4, 0.3)];
    let prob = ConformingProblem::new(s, 0.05, 0.05, Penalty::Group)
        .unwrap()
        .with_sample_sizes(vec![2.0, 1.0])
        .unwrap();

    let result = solve_conforming(&prob, &settings(5000)).expect("Solve failed");

    assert_eq!(result.info.status, SolveStatus::Optimal);
    for omega in &result.solution.omega {
        assert!(min_eigenvalue(omega) > 0.0);
    }
}

#[test]
fn test_nonconforming_shared_pair() {
    // Variables (0, 1) of instance 0 and (1, 2) of instance 1 are the same pair
    let s = vec![
        DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.5, 1.0]),
        DMatrix::from_row_slice(3, 3, &[
            1.0, 0.0, 0.0,
            0.0, 1.0, 0.5,
            0.0, 0.5, 1.0,
        ]),
    ];
    let groups = GroupIndex::from_groups(2, vec![vec![Some((0, 1)), Some((1, 2))]]).unwrap();
    let prob = NonConformingProblem::new(s, groups, 0.1, 0.1, Penalty::Group).unwrap();

    let result = solve_nonconforming(&prob, &settings(5000)).expect("Solve failed");
    println!("non-conforming: {} in {} iterations", result.info.status, result.info.iters);

    assert_eq!(result.info.status, SolveStatus::Optimal);
    let sol = &result.solution;

    let a = sol.theta[0][(0, 1)];
    let b = sol.theta[1][(1, 2)];
    assert!((a - b).abs() < 1e-3, "shared pair differs: {} vs {}", a, b);
    assert!(a < 0.0);

    // Variable 0 of instance 1 is independent of the rest
    assert!(sol.theta[1][(0, 1)].abs() < 1e-8);
    assert!(sol.theta[1][(0, 2)].abs() < 1e-8);

    for k in 0..2 {
        assert!(min_eigenvalue(&sol.omega[k]) > 0.0);
        assert!(max_asym(&sol.theta[k]) <= 1e-5);
        assert!(max_asym(&sol.lambda[k]) <= 1e-5);
    }
}

#[test]
fn test_nonconforming_via_solve() {
    let s = vec![ar1(3, 0.5), ar1(4, 0.5)];
    let groups = GroupIndex::from_groups(
        2,
        vec![
            vec![Some((0, 1)), Some((2, 3))],
            vec![Some((1, 2)), None],
        ],
    )
    .unwrap();
    let prob = NonConformingProblem::new(s, groups, vec![0.05, 0.08], 0.05, Penalty::Group).unwrap();

    let result = solve(&Problem::NonConforming(prob), &settings(5000)).expect("Solve failed");

    assert_eq!(result.info.status, SolveStatus::Optimal);
    match result.solution {
        Solution::NonConforming(sol) => {
            assert_eq!(sol.theta[0].shape(), (3, 3));
            assert_eq!(sol.theta[1].shape(), (4, 4));
            assert_eq!(sol.x1.len(), 2);
        }
        Solution::Conforming(_) => panic!("expected a non-conforming solution"),
    }
}

#[test]
fn test_warm_start_saves_iterations() {
    let s = vec![ar1(5, 0.5), ar1(5, 0.4)];
    let nearby = ConformingProblem::new(s.clone(), 0.052, 0.05, Penalty::Group).unwrap();
    let target = ConformingProblem::new(s, 0.05, 0.05, Penalty::Group).unwrap();

    let prev = solve_conforming(&nearby, &settings(5000)).expect("Solve failed");
    assert_eq!(prev.info.status, SolveStatus::Optimal);

    let cold = solve_conforming(&target, &settings(5000)).expect("Solve failed");

    let ws = WarmStart::new(prev.solution.omega)
        .with_theta(prev.solution.theta)
        .with_dual(prev.solution.dual);
    let warm = solve_conforming(&target, &settings(5000).with_warm_start(ws)).expect("Solve failed");

    println!("cold: {} iterations, warm: {} iterations", cold.info.iters, warm.info.iters);
    assert_eq!(warm.info.status, SolveStatus::Optimal);
    assert!(warm.info.iters <= cold.info.iters);
}

#[test]
fn test_trace_lengths() {
    let s = vec![ar1(4, 0.5), ar1(4, 0.3)];
    let prob = ConformingProblem::new(s, 0.05, 0.05, Penalty::Group).unwrap();

    let result = solve_conforming(&prob, &settings(5000).with_measure(true)).expect("Solve failed");
    let trace = result.info.trace.expect("trace requested");
    assert_eq!(trace.residuals.len(), result.info.iters);
    assert_eq!(trace.runtimes.len(), result.info.iters);
    assert_eq!(trace.residuals.last().copied(), Some(result.info.residual));

    let result = solve_conforming(&prob, &settings(5000)).expect("Solve failed");
    assert!(result.info.trace.is_none());
}

#[test]
fn test_max_iter_reached() {
    let s = vec![ar1(5, 0.5), ar1(5, 0.4)];
    let prob = ConformingProblem::new(s, 0.05, 0.05, Penalty::Group).unwrap();

    let result = solve_conforming(&prob, &settings(2).with_measure(true)).expect("Solve failed");

    assert_eq!(result.info.status, SolveStatus::MaxIterReached);
    assert_eq!(result.info.status.to_string(), "max iterations reached");
    assert_eq!(result.info.iters, 2);
    assert_eq!(result.info.trace.map(|t| t.residuals.len()), Some(2));
    // Iterates remain valid even without convergence
    for omega in &result.solution.omega {
        assert!(min_eigenvalue(omega) > 0.0);
    }
}

#[test]
fn test_latent_variables() {
    // AR(1) structure plus a shared rank-one factor
    let factor = DMatrix::from_element(5, 1, 0.4);
    let s: Vec<_> = [0.5, 0.4]
        .iter()
        .map(|&r| ar1(5, r) + &factor * factor.transpose())
        .collect();
    let prob = ConformingProblem::new(s, 0.05, 0.05, Penalty::Group)
        .unwrap()
        .with_latent(0.2)
        .unwrap();

    let result = solve(&prob.into(), &settings(10000)).expect("Solve failed");
    println!("latent: {} in {} iterations", result.info.status, result.info.iters);

    assert_eq!(result.info.status, SolveStatus::Optimal);
    let sol = match result.solution {
        Solution::Conforming(sol) => sol,
        Solution::NonConforming(_) => panic!("expected a conforming solution"),
    };
    let low_rank = sol.low_rank.expect("latent solve returns L");
    for k in 0..2 {
        assert!(min_eigenvalue(&low_rank[k]) > -1e-8);
        assert!(min_eigenvalue(&sol.omega[k]) > 0.0);
        let gap = &sol.omega[k] - (&sol.theta[k] - &low_rank[k]);
        assert!(gap.norm() < 1e-3);
    }
}

#[test]
fn test_latent_solver_requires_weights() {
    let prob = ConformingProblem::new(vec![ar1(3, 0.5)], 0.1, 0.1, Penalty::Group).unwrap();
    assert!(solve_latent(&prob, &settings(10)).is_err());
}

#[test]
fn test_validation_errors() {
    // asymmetric covariance
    let mut s = ar1(3, 0.5);
    s[(0, 1)] = 0.9;
    let err = ConformingProblem::new(vec![s], 0.1, 0.1, Penalty::Group).unwrap_err();
    assert!(matches!(err, GlassoError::NotSymmetric { .. }));

    // non-positive weights
    assert!(matches!(
        ConformingProblem::new(vec![ar1(3, 0.5)], 0.0, 0.1, Penalty::Group),
        Err(GlassoError::NonPositiveParameter { name: "lambda1", .. })
    ));
    assert!(matches!(
        ConformingProblem::new(vec![ar1(3, 0.5)], 0.1, -0.1, Penalty::Group),
        Err(GlassoError::NonPositiveParameter { name: "lambda2", .. })
    ));

    // group coordinate out of range
    let groups = GroupIndex::from_groups(2, vec![vec![Some((0, 2)), Some((0, 1))]]).unwrap();
    let err = NonConformingProblem::new(vec![ar1(2, 0.5), ar1(3, 0.5)], groups, 0.1, 0.1, Penalty::Group)
        .unwrap_err();
    assert!(matches!(err, GlassoError::InvalidGroupIndex(_)));

    // fused penalty is not defined for non-conforming problems
    let groups = GroupIndex::from_groups(2, vec![vec![Some((0, 1)), Some((0, 1))]]).unwrap();
    let err = NonConformingProblem::new(vec![ar1(2, 0.5), ar1(3, 0.5)], groups, 0.1, 0.1, Penalty::Fused)
        .unwrap_err();
    assert!(matches!(err, GlassoError::UnsupportedPenalty(_)));

    // bad settings and warm start are rejected before iterating
    let prob: Problem = ConformingProblem::new(vec![ar1(3, 0.5)], 0.1, 0.1, Penalty::Group)
        .unwrap()
        .into();
    assert!(solve(&prob, &settings(100).with_rho(0.0)).is_err());
    let ws = WarmStart::new(vec![DMatrix::identity(2, 2)]);
    let err = solve(&prob, &settings(100).with_warm_start(ws)).unwrap_err();
    assert!(matches!(err, GlassoError::InvalidWarmStart(_)));
}

//! Off-diagonal sparsity and fusion penalties.
//!
//! Diagonals always pass through unchanged: the log-det term controls them.

use nalgebra::DMatrix;

use super::group::block_shrink;
use super::tv::tv_denoise;
use crate::problem::Penalty;
use crate::util::numerics::soft_threshold;

/// Off-diagonal soft-threshold of a single matrix with threshold `t`.
pub fn prox_od_l1(a: &DMatrix<f64>, t: f64) -> DMatrix<f64> {
    let mut out = a.clone();
    let (rows, cols) = a.shape();
    for j in 0..cols {
        for i in 0..rows {
            if i != j {
                out[(i, j)] = soft_threshold(a[(i, j)], t);
            }
        }
    }
    out
}

/// Proximal map of the multi-instance penalty on a conforming stack.
///
/// - `Group`: `sum_k l1[k] ||A_k||_{1,od} + l2 sum_{i!=j} ||A[ij]||_2`
/// - `Fused`: `l1 sum_k ||A_k||_{1,od} + l2 sum_k ||A_k - A_{k-1}||_{1,od}`
///
/// where `A[ij]` is the K-vector of entry `(i, j)` across instances. Both are
/// evaluated exactly per off-diagonal pair; the pair value is read as the
/// average of `(i, j)` and `(j, i)` and written back to both.
///
/// `Fused` expects a uniform `l1`; the first entry is used.
pub fn prox_penalty(
    stack: &[DMatrix<f64>],
    l1: &[f64],
    l2: f64,
    penalty: Penalty,
) -> Vec<DMatrix<f64>> {
    debug_assert_eq!(stack.len(), l1.len());
    let k_count = stack.len();
    if k_count == 0 {
        return Vec::new();
    }
    let p = stack[0].nrows();
    let mut out = stack.to_vec();
    let mut v = vec![0.0; k_count];

    for i in 0..p {
        for j in (i + 1)..p {
            for (k, a) in stack.iter().enumerate() {
                v[k] = 0.5 * (a[(i, j)] + a[(j, i)]);
            }

            match penalty {
                Penalty::Group => {
                    for (x, &t) in v.iter_mut().zip(l1) {
                        *x = soft_threshold(*x, t);
                    }
                    block_shrink(&mut v, l2);
                }
                Penalty::Fused => {
                    let z = tv_denoise(&v, l2);
                    let t = l1[0];
                    for (x, zk) in v.iter_mut().zip(z) {
                        *x = soft_threshold(zk, t);
                    }
                }
            }

            for (m, &x) in out.iter_mut().zip(v.iter()) {
                m[(i, j)] = x;
                m[(j, i)] = x;
            }
        }
    }
    out
}

//! Cross-instance L2 group penalty.

use nalgebra::DMatrix;

use crate::error::{GlassoError, GlassoResult};
use crate::group::GroupIndex;
use crate::util::numerics::{max_asymmetry, norm2};

/// Euclidean-ball shrinkage in place: `v <- max(0, 1 - t / ||v||) v`.
///
/// The zero vector is a fixed point.
pub fn block_shrink(v: &mut [f64], t: f64) {
    let nrm = norm2(v);
    let scale = if nrm <= t || nrm == 0.0 { 0.0 } else { 1.0 - t / nrm };
    for x in v.iter_mut() {
        *x *= scale;
    }
}

/// Proximal map of `l2 * sum_l ||v_l||_2` where `v_l` gathers the entries of
/// group `l` across instances.
///
/// Instances absent from a group are neither read nor written. Entries not
/// covered by any group are returned unchanged. Shrunk values are written to
/// both `(row, col)` and `(col, row)`.
///
/// Every input matrix must be symmetric within `sym_tol`.
pub fn prox_group(
    x: &[DMatrix<f64>],
    groups: &GroupIndex,
    l2: f64,
    sym_tol: f64,
) -> GlassoResult<Vec<DMatrix<f64>>> {
    if groups.num_instances() != x.len() {
        return Err(GlassoError::InvalidGroupIndex(format!(
            "group index covers {} instances, got {} matrices",
            groups.num_instances(),
            x.len()
        )));
    }
    for (k, m) in x.iter().enumerate() {
        if !m.is_square() {
            return Err(GlassoError::NotSquare {
                instance: k,
                rows: m.nrows(),
                cols: m.ncols(),
            });
        }
        let max_asym = max_asymmetry(m);
        if max_asym > sym_tol {
            return Err(GlassoError::NotSymmetric { instance: k, max_asym });
        }
    }

    let mut out = x.to_vec();
    let mut v: Vec<f64> = Vec::with_capacity(x.len());
    let mut slots: Vec<(usize, usize, usize)> = Vec::with_capacity(x.len());

    for l in 0..groups.num_groups() {
        v.clear();
        slots.clear();
        for (k, row, col) in groups.members(l) {
            let p = x[k].nrows();
            if row >= p || col >= p {
                return Err(GlassoError::InvalidGroupIndex(format!(
                    "group {} instance {}: coordinate ({}, {}) out of range for p = {}",
                    l, k, row, col, p
                )));
            }
            v.push(x[k][(row, col)]);
            slots.push((k, row, col));
        }
        if v.is_empty() {
            continue;
        }

        block_shrink(&mut v, l2);

        for (&(k, row, col), &val) in slots.iter().zip(v.iter()) {
            out[k][(row, col)] = val;
            out[k][(col, row)] = val;
        }
    }

    Ok(out)
}

//! Group-index map for instances with partially overlapping variables.
//!
//! A group is one variable pair observed in several instances. For group `l`
//! and instance `k` the map stores the `(row, col)` coordinate of that pair in
//! instance `k`'s matrix, or nothing when instance `k` does not observe the
//! pair. The raw form is a `2 x L x K` integer array with `-1` as the
//! "absent" sentinel.

use std::collections::HashSet;

use crate::error::{GlassoError, GlassoResult};

/// Sentinel marking "instance has no member in this group" in the raw array.
pub const ABSENT: i64 = -1;

/// Validated-on-demand group index (`L` groups over `K` instances).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupIndex {
    num_instances: usize,
    /// Row-major `L x K`
    entries: Vec<Option<(usize, usize)>>,
}

impl GroupIndex {
    /// Build from explicit groups; each group lists one optional coordinate per instance.
    pub fn from_groups(
        num_instances: usize,
        groups: Vec<Vec<Option<(usize, usize)>>>,
    ) -> GlassoResult<Self> {
        let mut entries = Vec::with_capacity(groups.len() * num_instances);
        for (l, group) in groups.into_iter().enumerate() {
            if group.len() != num_instances {
                return Err(GlassoError::InvalidGroupIndex(format!(
                    "group {} has {} entries, expected {}",
                    l,
                    group.len(),
                    num_instances
                )));
            }
            entries.extend(group);
        }
        Ok(Self { num_instances, entries })
    }

    /// Parse a raw `2 x L x K` array stored row-major (C order), i.e. the value
    /// `G[d, l, k]` lives at `raw[(d * L + l) * K + k]`.
    pub fn from_raw(raw: &[i64], num_groups: usize, num_instances: usize) -> GlassoResult<Self> {
        let plane = num_groups * num_instances;
        if raw.len() != 2 * plane {
            return Err(GlassoError::InvalidGroupIndex(format!(
                "raw array has length {}, expected 2 x {} x {} = {}",
                raw.len(),
                num_groups,
                num_instances,
                2 * plane
            )));
        }

        let mut entries = Vec::with_capacity(plane);
        for l in 0..num_groups {
            for k in 0..num_instances {
                let row = raw[l * num_instances + k];
                let col = raw[plane + l * num_instances + k];
                let entry = match (row, col) {
                    (ABSENT, ABSENT) => None,
                    (r, c) if r >= 0 && c >= 0 => Some((r as usize, c as usize)),
                    (r, c) => {
                        return Err(GlassoError::InvalidGroupIndex(format!(
                            "group {} instance {}: invalid coordinate ({}, {})",
                            l, k, r, c
                        )))
                    }
                };
                entries.push(entry);
            }
        }
        Ok(Self { num_instances, entries })
    }

    /// Implicit grouping for conforming instances: one group per off-diagonal
    /// upper-triangle pair `(i, j)`, `i < j`, present in every instance.
    pub fn vector_over_k(p: usize, num_instances: usize) -> Self {
        let mut entries = Vec::with_capacity(p * p.saturating_sub(1) / 2 * num_instances);
        for i in 0..p {
            for j in (i + 1)..p {
                entries.extend(std::iter::repeat(Some((i, j))).take(num_instances));
            }
        }
        Self { num_instances, entries }
    }

    pub fn num_groups(&self) -> usize {
        if self.num_instances == 0 {
            0
        } else {
            self.entries.len() / self.num_instances
        }
    }

    pub fn num_instances(&self) -> usize {
        self.num_instances
    }

    /// Coordinate of group `l` in instance `k`, if present.
    #[inline]
    pub fn get(&self, l: usize, k: usize) -> Option<(usize, usize)> {
        self.entries[l * self.num_instances + k]
    }

    /// Members of group `l` as `(instance, row, col)`.
    pub fn members(&self, l: usize) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        let start = l * self.num_instances;
        self.entries[start..start + self.num_instances]
            .iter()
            .enumerate()
            .filter_map(|(k, e)| e.map(|(r, c)| (k, r, c)))
    }

    /// Validate against the instance dimensions `p_k`.
    ///
    /// Coordinates must be in range and off-diagonal, and within one instance
    /// an unordered variable pair may belong to at most one group.
    pub fn validate(&self, dims: &[usize]) -> GlassoResult<()> {
        if dims.len() != self.num_instances {
            return Err(GlassoError::InvalidGroupIndex(format!(
                "group index covers {} instances, data has {}",
                self.num_instances,
                dims.len()
            )));
        }

        let mut seen: Vec<HashSet<(usize, usize)>> = vec![HashSet::new(); self.num_instances];
        for l in 0..self.num_groups() {
            for (k, row, col) in self.members(l) {
                let p = dims[k];
                if row >= p || col >= p {
                    return Err(GlassoError::InvalidGroupIndex(format!(
                        "group {} instance {}: coordinate ({}, {}) out of range for p = {}",
                        l, k, row, col, p
                    )));
                }
                if row == col {
                    return Err(GlassoError::InvalidGroupIndex(format!(
                        "group {} instance {}: diagonal coordinate ({}, {})",
                        l, k, row, col
                    )));
                }
                let key = (row.min(col), row.max(col));
                if !seen[k].insert(key) {
                    return Err(GlassoError::InvalidGroupIndex(format!(
                        "instance {}: pair ({}, {}) assigned to more than one group",
                        k, key.0, key.1
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_layout() {
        // L = 2, K = 2
        // group 0: (0,1) in k=0, (1,2) in k=1
        // group 1: absent in k=0, (0,2) in k=1
        let raw = vec![
            0, 1, // G[0, 0, :]
            -1, 0, // G[0, 1, :]
            1, 2, // G[1, 0, :]
            -1, 2, // G[1, 1, :]
        ];
        let g = GroupIndex::from_raw(&raw, 2, 2).unwrap();
        assert_eq!(g.num_groups(), 2);
        assert_eq!(g.get(0, 0), Some((0, 1)));
        assert_eq!(g.get(0, 1), Some((1, 2)));
        assert_eq!(g.get(1, 0), None);
        assert_eq!(g.get(1, 1), Some((0, 2)));
        assert!(g.validate(&[2, 3]).is_ok());

        let members: Vec<_> = g.members(1).collect();
        assert_eq!(members, vec![(1, 0, 2)]);
    }

    #[test]
    fn test_from_raw_rejects_half_sentinel() {
        let raw = vec![-1, 0, 1, 0];
        assert!(GroupIndex::from_raw(&raw, 1, 2).is_err());
        assert!(GroupIndex::from_raw(&raw[..3], 1, 2).is_err());
    }

    #[test]
    fn test_validate() {
        let g = GroupIndex::from_groups(2, vec![vec![Some((0, 1)), Some((0, 3))]]).unwrap();
        assert!(g.validate(&[2, 3]).is_err()); // out of range
        assert!(g.validate(&[2, 4]).is_ok());
        assert!(g.validate(&[2]).is_err()); // instance count

        let diag = GroupIndex::from_groups(1, vec![vec![Some((1, 1))]]).unwrap();
        assert!(diag.validate(&[2]).is_err());

        // (0,1) and (1,0) are the same pair
        let dup = GroupIndex::from_groups(1, vec![vec![Some((0, 1))], vec![Some((1, 0))]]).unwrap();
        assert!(dup.validate(&[2]).is_err());

        assert!(GroupIndex::from_groups(2, vec![vec![Some((0, 1))]]).is_err());
    }

    #[test]
    fn test_vector_over_k() {
        let g = GroupIndex::vector_over_k(3, 2);
        assert_eq!(g.num_groups(), 3);
        assert_eq!(g.get(2, 1), Some((1, 2)));
        assert!(g.validate(&[3, 3]).is_ok());
    }
}

// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Snapping fractional windows of a tree to its cluster boundaries.
//!
//! A cluster is the smallest batch of rows that can be read on its own. A
//! range that started or ended inside a cluster would make two tasks read the
//! same cluster, so both ends of every window are moved to a boundary.

use distrange_common::{invalid_argument_err, Result};
use serde::{Deserialize, Serialize};

use crate::bisect::bisect_left;

/// Row count and cluster boundaries of one tree, as returned by a
/// [`TreeMetadataProvider`](crate::provider::TreeMetadataProvider)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeClusters {
    /// Entry numbers at which clusters start, followed by `entries`.
    /// For 100 entries in clusters of 10: `[0, 10, 20, ..., 90, 100]`.
    /// An empty tree is `[0]`.
    pub boundaries: Vec<u64>,
    /// Total number of entries in the tree
    pub entries: u64,
}

impl TreeClusters {
    pub fn new(boundaries: Vec<u64>, entries: u64) -> Self {
        Self {
            boundaries,
            entries,
        }
    }

    /// Clusters of exactly `cluster_size` entries, the last one possibly shorter
    pub fn with_cluster_size(entries: u64, cluster_size: u64) -> Self {
        let step = cluster_size.max(1) as usize;
        let mut boundaries: Vec<u64> = (0..entries).step_by(step).collect();
        boundaries.push(entries);
        boundaries.dedup();
        Self {
            boundaries,
            entries,
        }
    }

    /// Checks that the boundaries are strictly increasing and span exactly
    /// `[0, entries]`
    pub fn validate(&self) -> Result<()> {
        match (self.boundaries.first(), self.boundaries.last()) {
            (Some(0), Some(&last)) if last == self.entries => {}
            _ => {
                return invalid_argument_err!(
                    "cluster boundaries {:?} do not span [0, {}]",
                    self.boundaries,
                    self.entries
                )
            }
        }
        if let Some(w) = self.boundaries.windows(2).find(|w| w[0] >= w[1]) {
            return invalid_argument_err!(
                "cluster boundaries must be strictly increasing, found {} followed by {}",
                w[0],
                w[1]
            );
        }
        Ok(())
    }
}

/// Entries of a tree that a task reads after aligning to cluster boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterAlignedRange {
    /// First entry, at a cluster boundary
    pub start: u64,
    /// Entry one past the last, at a cluster boundary
    pub end: u64,
    /// Either 0, or all entries of the tree when start and end snapped to the
    /// same boundary and the tree contributes nothing to the task
    pub entries_to_discard: u64,
}

fn check_fraction(name: &str, fraction: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&fraction) {
        return invalid_argument_err!("{name} must be within [0, 1], got {fraction}");
    }
    Ok(())
}

/// Aligns the window `[start_fraction, end_fraction)` of a tree to the
/// boundaries of its clusters.
///
/// Both fractions are turned into entry numbers (rounded down) and moved to
/// the first boundary at or after them. A start that falls inside a cluster
/// therefore skips that cluster, which the task reading the window before it
/// will process, since its end moves forward to the same boundary.
///
/// ```text
/// boundaries:    0, 10, 20, 30
/// entries 10..13 -> 10..20
/// entries 13..16 -> 20..20 (empty)
/// entries 19..22 -> 20..30
/// ```
pub fn align_to_clusters(
    start_fraction: f64,
    end_fraction: f64,
    clusters: &TreeClusters,
) -> Result<ClusterAlignedRange> {
    check_fraction("start fraction", start_fraction)?;
    check_fraction("end fraction", end_fraction)?;
    if start_fraction > end_fraction {
        return invalid_argument_err!(
            "start fraction {start_fraction} is past end fraction {end_fraction}"
        );
    }
    clusters.validate()?;

    let entries = clusters.entries;
    let start_entry = (start_fraction * entries as f64).floor() as u64;
    let end_entry = (end_fraction * entries as f64).floor() as u64;

    let start_cluster = bisect_left(&clusters.boundaries, start_entry);
    let end_cluster = bisect_left(&clusters.boundaries, end_entry);

    // Avoid creating tasks that will do nothing
    let entries_to_discard = if start_cluster == end_cluster {
        entries
    } else {
        0
    };

    Ok(ClusterAlignedRange {
        start: clusters.boundaries[start_cluster],
        end: clusters.boundaries[end_cluster],
        entries_to_discard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use distrange_common::RangeError;

    fn tens() -> TreeClusters {
        TreeClusters::with_cluster_size(100, 10)
    }

    #[test]
    fn with_cluster_size_boundaries() {
        assert_eq!(
            tens().boundaries,
            vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100]
        );
        assert_eq!(TreeClusters::with_cluster_size(25, 10).boundaries, vec![0, 10, 20, 25]);
        assert_eq!(TreeClusters::with_cluster_size(0, 10).boundaries, vec![0]);
    }

    #[test]
    fn whole_tree_is_idempotent() {
        for clusters in [
            tens(),
            TreeClusters::new(vec![0, 3, 50, 51, 99, 100], 100),
            TreeClusters::new(vec![0, 7], 7),
        ] {
            let aligned = align_to_clusters(0.0, 1.0, &clusters).unwrap();
            assert_eq!(aligned.start, 0);
            assert_eq!(aligned.end, clusters.entries);
            assert_eq!(aligned.entries_to_discard, 0);
        }
    }

    #[test]
    fn snaps_forward_to_boundaries() {
        let aligned = align_to_clusters(0.1, 0.35, &tens()).unwrap();
        assert_eq!(
            aligned,
            ClusterAlignedRange {
                start: 10,
                end: 40,
                entries_to_discard: 0
            }
        );
    }

    #[test]
    fn window_inside_one_cluster_is_discarded() {
        // 31 and 34 both move forward to boundary 40
        let aligned = align_to_clusters(0.31, 0.34, &tens()).unwrap();
        assert_eq!(aligned.start, 40);
        assert_eq!(aligned.end, 40);
        assert_eq!(aligned.entries_to_discard, 100);
    }

    #[test]
    fn start_on_boundary_is_kept_end_on_boundary_is_excluded() {
        // [30, 40) covers exactly one cluster
        let aligned = align_to_clusters(0.3, 0.4, &tens()).unwrap();
        assert_eq!((aligned.start, aligned.end), (30, 40));
        assert_eq!(aligned.entries_to_discard, 0);
    }

    #[test]
    fn empty_tree_discards_nothing() {
        let aligned = align_to_clusters(0.0, 1.0, &TreeClusters::new(vec![0], 0)).unwrap();
        assert_eq!((aligned.start, aligned.end), (0, 0));
        assert_eq!(aligned.entries_to_discard, 0);
    }

    #[test]
    fn rejects_bad_fractions() {
        for (start, end) in [(-0.1, 0.5), (0.0, 1.5), (f64::NAN, 0.5), (0.6, 0.5)] {
            let err = align_to_clusters(start, end, &tens()).unwrap_err();
            assert!(matches!(err, RangeError::InvalidArgument(_)), "{start} {end}");
        }
    }

    #[test]
    fn rejects_malformed_clusters() {
        for clusters in [
            TreeClusters::new(vec![10, 100], 100),
            TreeClusters::new(vec![0, 90], 100),
            TreeClusters::new(vec![0, 50, 50, 100], 100),
            TreeClusters::new(vec![], 0),
        ] {
            let err = align_to_clusters(0.0, 1.0, &clusters).unwrap_err();
            assert!(matches!(err, RangeError::InvalidArgument(_)), "{clusters:?}");
        }
    }
}

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

//! Splitting a chain of trees into ranges expressed as fractions of trees

use distrange_common::{invalid_argument_err, Result};
use itertools::Itertools;
use log::debug;

use crate::metadata::{FriendInfo, SampleMap, SampleMetadata};
use crate::range::{ExecutionId, TaskId, TreeRangePercentage, TreeRef, TreeSpan};

/// Splits an ordered list of trees into `target_partitions` tasks without
/// knowing how many entries each tree holds.
///
/// Every tree counts as one unit that can be cut at any fraction, so the
/// chain spans `[0, ntrees)` and task `i` covers
/// `[ntrees * i / n, ntrees * (i + 1) / n)`. The integer part of each bound
/// picks the tree and the fractional part where inside it the task starts or
/// stops. Row numbers are only computed later, when a task is
/// [materialized](crate::materialize::materialize) against the real clusters.
///
/// # Example
///
/// 10 trees and 7 partitions give the bounds
///
/// ```text
/// bound        0.    1.428  2.857  4.285  5.714  7.142  8.571  10.
/// tree         0     1      2      4      5      7      8      10
/// fraction     0.    0.428  0.857  0.285  0.714  0.142  0.571  0.
/// ```
///
/// so task 0 reads trees `0..2` from `0.0` of tree 0 to `0.428` of tree 1 and
/// task 6 reads trees `8..10` from `0.571` of tree 8 to the end of tree 9: a
/// bound with no fractional part ends the task with the whole previous tree.
///
/// # Friends
///
/// With [`FriendInfo`] every task keeps the full list of trees and absolute
/// indices ([`TreeSpan::Aligned`]) so friend entries can be matched by global
/// entry number. Otherwise each task only gets its own trees
/// ([`TreeSpan::Standalone`]).
#[derive(Debug, Clone)]
pub struct PercentageRangeBuilder<'a> {
    trees: Vec<TreeRef>,
    target_partitions: usize,
    friends: Option<FriendInfo>,
    samples: Option<&'a SampleMap>,
}

impl<'a> PercentageRangeBuilder<'a> {
    /// Creates a new [`PercentageRangeBuilder`] with `target_partitions = 1`
    pub fn new(trees: Vec<TreeRef>) -> Self {
        Self {
            trees,
            target_partitions: 1,
            friends: None,
            samples: None,
        }
    }

    /// Creates a builder from parallel lists where tree `i` is stored in file `i`
    pub fn try_from_names(tree_names: &[String], file_names: &[String]) -> Result<Self> {
        if tree_names.len() != file_names.len() {
            return invalid_argument_err!(
                "got {} tree names for {} file names",
                tree_names.len(),
                file_names.len()
            );
        }
        let trees = file_names
            .iter()
            .zip(tree_names)
            .map(|(file, tree)| TreeRef::new(file.as_str(), tree.as_str()))
            .collect();
        Ok(Self::new(trees))
    }

    /// Set the number of tasks to build
    pub fn with_target_partitions(mut self, target_partitions: usize) -> Self {
        self.target_partitions = target_partitions;
        self
    }

    /// Set the friend trees of the dataset
    pub fn with_friends(mut self, friends: Option<FriendInfo>) -> Self {
        self.friends = friends;
        self
    }

    /// Set the sample metadata to attach to every tree of a task
    pub fn with_samples(mut self, samples: Option<&'a SampleMap>) -> Self {
        self.samples = samples;
        self
    }

    /// Builds exactly `target_partitions` ranges with task ids `0..target_partitions`
    pub fn build(&self, exec_id: ExecutionId) -> Result<Vec<TreeRangePercentage>> {
        let npartitions = self.target_partitions;
        let ntrees = self.trees.len();
        if npartitions == 0 {
            return invalid_argument_err!("the number of partitions must be positive");
        }
        if ntrees == 0 {
            return invalid_argument_err!("cannot split a dataset without trees");
        }

        // (tree index, fraction of that tree) of every bound between tasks
        let bounds = (0..=npartitions)
            .map(|i| {
                let bound = (ntrees * i) as f64 / npartitions as f64;
                let tree = bound.floor();
                (tree as usize, bound - tree)
            })
            .collect_vec();

        let ranges = bounds
            .iter()
            .tuple_windows()
            .enumerate()
            .map(|(id, (&(first_index, start_fraction), &(end_tree, end_fraction)))| {
                // A bound right at the start of a tree ends the task with the
                // whole previous tree
                let (last_index, last_tree_end_fraction) = if end_fraction > 0.0 {
                    (end_tree + 1, end_fraction)
                } else {
                    (end_tree, 1.0)
                };
                let range = self.make_range(
                    TaskId::new(exec_id, id),
                    first_index,
                    last_index,
                    start_fraction,
                    last_tree_end_fraction,
                );
                debug!(
                    "Task {id} reads trees {first_index}..{last_index} \
                     from {start_fraction:.4} to {last_tree_end_fraction:.4}"
                );
                range
            })
            .collect_vec();

        debug!("Split {ntrees} trees into {npartitions} ranges");
        Ok(ranges)
    }

    fn make_range(
        &self,
        task: TaskId,
        first_index: usize,
        last_index: usize,
        first_tree_start_fraction: f64,
        last_tree_end_fraction: f64,
    ) -> TreeRangePercentage {
        let span = match &self.friends {
            Some(friends) => TreeSpan::Aligned {
                trees: self.trees.clone(),
                first_index,
                last_index,
                friends: friends.clone(),
            },
            None => TreeSpan::Standalone {
                trees: self.trees[first_index..last_index].to_vec(),
            },
        };
        let samples = self.samples.map(|samples| lookup_samples(samples, span.trees()));
        TreeRangePercentage {
            task,
            span,
            first_tree_start_fraction,
            last_tree_end_fraction,
            samples,
        }
    }
}

/// Sample of every tree, `None` for trees without one
fn lookup_samples(samples: &SampleMap, trees: &[TreeRef]) -> Vec<Option<SampleMetadata>> {
    trees
        .iter()
        .map(|tree| samples.get(&tree.key()).cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use distrange_common::RangeError;

    fn trees(n: usize) -> Vec<TreeRef> {
        (0..n)
            .map(|i| TreeRef::new(format!("file{i}.root"), "Events"))
            .collect()
    }

    fn build(ntrees: usize, npartitions: usize) -> Vec<TreeRangePercentage> {
        PercentageRangeBuilder::new(trees(ntrees))
            .with_target_partitions(npartitions)
            .build(ExecutionId::new())
            .unwrap()
    }

    /// (first_index, last_index, start, end) with indices made absolute
    fn summary(ranges: &[TreeRangePercentage], all: &[TreeRef]) -> Vec<(usize, usize, f64, f64)> {
        ranges
            .iter()
            .map(|r| {
                let offset = all
                    .iter()
                    .position(|t| Some(t) == r.span.trees().first())
                    .unwrap();
                let offset = if r.span.friends().is_some() { 0 } else { offset };
                (
                    r.span.first_index() + offset,
                    r.span.last_index() + offset,
                    r.first_tree_start_fraction,
                    r.last_tree_end_fraction,
                )
            })
            .collect()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-3, "{actual} != {expected}");
    }

    #[test]
    fn ten_trees_seven_partitions() {
        let ranges = build(10, 7);
        let got = summary(&ranges, &trees(10));
        let expected = [
            (0, 2, 0.0, 0.428),
            (1, 3, 0.428, 0.857),
            (2, 5, 0.857, 0.285),
            (4, 6, 0.285, 0.714),
            (5, 8, 0.714, 0.142),
            (7, 9, 0.142, 0.571),
            (8, 10, 0.571, 1.0),
        ];
        assert_eq!(got.len(), expected.len());
        for (g, e) in got.iter().zip(expected) {
            assert_eq!((g.0, g.1), (e.0, e.1));
            assert_close(g.2, e.2);
            assert_close(g.3, e.3);
        }
        let ids: Vec<_> = ranges.iter().map(|r| r.task.id).collect();
        assert_eq!(ids, (0..7).collect_vec());
    }

    #[test]
    fn one_partition_per_tree() {
        let got = summary(&build(3, 3), &trees(3));
        assert_eq!(
            got,
            vec![(0, 1, 0.0, 1.0), (1, 2, 0.0, 1.0), (2, 3, 0.0, 1.0)]
        );
    }

    #[test]
    fn more_partitions_than_trees() {
        let got = summary(&build(1, 4), &trees(1));
        assert_eq!(
            got,
            vec![
                (0, 1, 0.0, 0.25),
                (0, 1, 0.25, 0.5),
                (0, 1, 0.5, 0.75),
                (0, 1, 0.75, 1.0)
            ]
        );
    }

    #[test]
    fn standalone_spans_are_sliced() {
        let all = trees(4);
        let ranges = build(4, 2);
        assert_eq!(ranges[0].span.trees(), &all[..2]);
        assert_eq!(ranges[1].span.trees(), &all[2..]);
        assert!(ranges.iter().all(|r| r.span.first_index() == 0));
        assert!(ranges.iter().all(|r| r.samples.is_none()));
    }

    #[test]
    fn friends_keep_full_tree_list() {
        let all = trees(4);
        let friends = FriendInfo {
            friend_names: vec![("weights".into(), "w".into())],
            friend_file_names: vec![vec!["weights.root".into()]],
            friend_chain_sub_names: vec![vec![]],
        };
        let ranges = PercentageRangeBuilder::new(all.clone())
            .with_target_partitions(3)
            .with_friends(Some(friends.clone()))
            .build(ExecutionId::new())
            .unwrap();
        for range in &ranges {
            assert_eq!(range.span.trees(), all.as_slice());
            assert_eq!(range.span.friends(), Some(&friends));
        }
        let indices: Vec<_> = ranges
            .iter()
            .map(|r| (r.span.first_index(), r.span.last_index()))
            .collect();
        assert_eq!(indices, vec![(0, 2), (1, 3), (2, 4)]);
    }

    #[test]
    fn samples_follow_the_span() {
        let all = trees(3);
        let mut samples = SampleMap::new();
        samples.insert(all[0].key(), SampleMetadata::new("signal"));
        samples.insert(all[2].key(), SampleMetadata::new("background"));

        let ranges = PercentageRangeBuilder::new(all.clone())
            .with_target_partitions(2)
            .with_samples(Some(&samples))
            .build(ExecutionId::new())
            .unwrap();
        let names = |r: &TreeRangePercentage| -> Vec<Option<String>> {
            r.samples
                .as_ref()
                .unwrap()
                .iter()
                .map(|s| s.as_ref().map(|s| s.sample_name.clone()))
                .collect()
        };
        // trees 0..2 and 1..3
        assert_eq!(names(&ranges[0]), vec![Some("signal".to_string()), None]);
        assert_eq!(names(&ranges[1]), vec![None, Some("background".to_string())]);

        let ranges = PercentageRangeBuilder::new(all)
            .with_target_partitions(2)
            .with_friends(Some(FriendInfo::default()))
            .with_samples(Some(&samples))
            .build(ExecutionId::new())
            .unwrap();
        assert_eq!(names(&ranges[0]).len(), 3);
    }

    #[test]
    fn spans_tile_the_chain() {
        for ntrees in 1..15 {
            for npartitions in 1..20 {
                let ranges = build(ntrees, npartitions);
                assert_eq!(ranges.len(), npartitions);
                let got = summary(&ranges, &trees(ntrees));
                assert_eq!(got.first().unwrap().0, 0);
                assert_eq!(got.first().unwrap().2, 0.0);
                assert_eq!(got.last().unwrap().1, ntrees);
                assert_eq!(got.last().unwrap().3, 1.0);
                for (prev, next) in got.iter().tuple_windows() {
                    assert!(prev.0 < prev.1);
                    // the next task starts in the tree where the previous one stopped,
                    // or right after it when the previous one read its last tree whole
                    if prev.3 == 1.0 {
                        assert_eq!((next.0, next.2), (prev.1, 0.0));
                    } else {
                        assert_eq!(next.0, prev.1 - 1);
                        assert_eq!(next.2, prev.3);
                    }
                }
            }
        }
    }

    #[test]
    fn invalid_input() {
        let names = vec!["Events".to_string()];
        let err = PercentageRangeBuilder::try_from_names(&names, &[]).unwrap_err();
        assert!(matches!(err, RangeError::InvalidArgument(_)));

        let err = PercentageRangeBuilder::new(vec![])
            .with_target_partitions(2)
            .build(ExecutionId::new())
            .unwrap_err();
        assert!(matches!(err, RangeError::InvalidArgument(_)));

        let err = PercentageRangeBuilder::new(trees(2))
            .with_target_partitions(0)
            .build(ExecutionId::new())
            .unwrap_err();
        assert!(matches!(err, RangeError::InvalidArgument(_)));
    }

    #[test]
    fn from_names_pairs_trees_with_files() {
        let tree_names = vec!["a".to_string(), "b".to_string()];
        let file_names = vec!["x.root".to_string(), "x.root".to_string()];
        let ranges = PercentageRangeBuilder::try_from_names(&tree_names, &file_names)
            .unwrap()
            .build(ExecutionId::new())
            .unwrap();
        assert_eq!(ranges.len(), 1);
        assert_eq!(
            ranges[0].span.trees(),
            &[TreeRef::new("x.root", "a"), TreeRef::new("x.root", "b")]
        );
    }
}

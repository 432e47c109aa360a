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

//! Turning a [`TreeRangePercentage`] into entry numbers aligned to clusters

use std::collections::BTreeMap;
use std::iter;

use distrange_common::{internal_err, invalid_argument_err, Result};
use futures::{StreamExt, TryStreamExt};
use log::debug;

use crate::accounting::TaskRowAccounting;
use crate::cluster::{align_to_clusters, TreeClusters};
use crate::provider::TreeMetadataProvider;
use crate::range::{MaterializeOutcome, MaterializedTreeRange, TreeRangePercentage, TreeSpan};

/// Computes the global entries `[start, end)` a task reads from the chain of
/// trees in its span.
///
/// The clusters and entries of every tree of the span are fetched from
/// `provider`, at most `fetch_concurrency` at a time. With friends that means
/// every tree in the dataset: the entry offset of a tree is the sum of the
/// entries of all trees before it, and friends are matched by that offset.
///
/// Only the first and the last tree of the task are cut, each at a cluster
/// boundary. If that leaves no rows (all trees are empty, or a cut falls
/// inside a single cluster) the task is [`MaterializeOutcome::Empty`].
///
/// Errors of the provider are returned unchanged.
pub async fn materialize(
    range: TreeRangePercentage,
    provider: &dyn TreeMetadataProvider,
    fetch_concurrency: usize,
) -> Result<MaterializeOutcome> {
    let first = range.span.first_index();
    let last = range.span.last_index();
    let trees = range.span.trees();
    if first >= last || last > trees.len() {
        return invalid_argument_err!(
            "task {} reads trees {first}..{last} of a span of {} trees",
            range.task,
            trees.len()
        );
    }

    let all_clusters: Vec<TreeClusters> = futures::stream::iter(trees)
        .map(|tree| provider.clusters_and_entries(tree))
        .buffered(fetch_concurrency.max(1))
        .try_collect()
        .await?;
    for (tree, clusters) in trees.iter().zip(&all_clusters) {
        clusters
            .validate()
            .map_err(|e| e.context(format!("Invalid clusters for tree {tree}")))?;
    }

    // The offsets lag behind the entries by one:
    // entries = [10, 10, 10, 10]
    // offsets = [0, 10, 20, 30]
    let offsets: Vec<u64> = iter::once(0)
        .chain(all_clusters.iter().scan(0, |acc, c| {
            *acc += c.entries;
            Some(*acc)
        }))
        .collect();

    // Full entries of every tree of the task, for the global row check
    let rows_per_tree: BTreeMap<String, u64> = trees[first..last]
        .iter()
        .zip(&all_clusters[first..last])
        .map(|(tree, clusters)| (tree.key(), clusters.entries))
        .collect();

    let (first_tree_start, last_tree_end, entries_to_discard) = if last - first == 1 {
        let aligned = align_to_clusters(
            range.first_tree_start_fraction,
            range.last_tree_end_fraction,
            &all_clusters[first],
        )?;
        (aligned.start, aligned.end, aligned.entries_to_discard)
    } else {
        let head = align_to_clusters(
            range.first_tree_start_fraction,
            1.0,
            &all_clusters[first],
        )?;
        let tail = align_to_clusters(0.0, range.last_tree_end_fraction, &all_clusters[last - 1])?;
        (
            head.start,
            tail.end,
            head.entries_to_discard + tail.entries_to_discard,
        )
    };

    let task_entries: u64 = all_clusters[first..last].iter().map(|c| c.entries).sum();
    let contributed = task_entries - entries_to_discard;
    if contributed == 0 {
        debug!("Task {} has no entries to process", range.task);
        return Ok(MaterializeOutcome::Empty {
            task: range.task,
            accounting: TaskRowAccounting::new(0, rows_per_tree),
        });
    }

    let global_start = offsets[first] + first_tree_start;
    let global_end = offsets[last - 1] + last_tree_end;
    if global_end <= global_start {
        return internal_err!(
            "task {} has {contributed} entries but an empty range {global_start}..{global_end}",
            range.task
        );
    }
    debug!(
        "Task {} reads entries {global_start}..{global_end} of trees {first}..{last}",
        range.task
    );

    let TreeRangePercentage {
        task, span, samples, ..
    } = range;
    let (trees, friends) = match span {
        TreeSpan::Aligned { trees, friends, .. } => (trees, Some(friends)),
        TreeSpan::Standalone { trees } => (trees, None),
    };
    Ok(MaterializeOutcome::Materialized {
        range: MaterializedTreeRange {
            task,
            trees,
            global_start,
            global_end,
            friends,
            samples,
        },
        accounting: TaskRowAccounting::new(global_end - global_start, rows_per_tree),
    })
}

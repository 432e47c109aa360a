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

//! [`RangePlanner`] builds the ranges of a distributed run from configuration

use std::sync::Arc;

use distrange_common::{exec_err, PartitioningOptions, Result};
use futures::{StreamExt, TryStreamExt};
use log::{debug, log_enabled, warn, Level};

use crate::cluster::TreeClusters;
use crate::materialize::materialize;
use crate::metadata::{FriendInfo, SampleMap};
use crate::percentage::PercentageRangeBuilder;
use crate::provider::TreeMetadataProvider;
use crate::range::{
    EmptySourceRange, ExecutionId, MaterializeOutcome, TreeRangePercentage, TreeRef,
    WholeFileRange,
};
use crate::split::{balanced_ranges, whole_file_ranges};

/// Plans and materializes the ranges of one distributed run.
///
/// All ranges produced by a planner share its [`ExecutionId`]. The number of
/// ranges is `target_partitions` from [`PartitioningOptions`].
#[derive(Debug, Clone)]
pub struct RangePlanner {
    options: PartitioningOptions,
    provider: Arc<dyn TreeMetadataProvider>,
    exec_id: ExecutionId,
}

impl RangePlanner {
    /// Creates a planner for a new run
    pub fn new(options: PartitioningOptions, provider: Arc<dyn TreeMetadataProvider>) -> Self {
        Self {
            options,
            provider,
            exec_id: ExecutionId::new(),
        }
    }

    /// Set the identifier of the run
    pub fn with_exec_id(mut self, exec_id: ExecutionId) -> Self {
        self.exec_id = exec_id;
        self
    }

    pub fn exec_id(&self) -> ExecutionId {
        self.exec_id
    }

    /// Ranges for a source of `nentries` rows without files.
    ///
    /// Uses one partition per entry when fewer entries than partitions exist.
    pub fn plan_empty_source(&self, nentries: u64) -> Result<Vec<EmptySourceRange>> {
        if nentries == 0 {
            return exec_err!(
                "Cannot build a distributed dataset with zero entries. \
                 Distributed execution requires at least one entry"
            );
        }
        let mut npartitions = self.options.target_partitions;
        if npartitions as u64 > nentries {
            warn!(
                "Number of partitions {npartitions} is greater than number of entries \
                 {nentries} in the dataset. Using {nentries} partition(s)"
            );
            npartitions = nentries as usize;
        }
        balanced_ranges(nentries, npartitions, self.exec_id)
    }

    /// Ranges for a chain of trees. They still have to be
    /// [materialized](Self::materialize) before rows can be read.
    pub async fn plan_trees(
        &self,
        trees: Vec<TreeRef>,
        friends: Option<FriendInfo>,
        samples: Option<&SampleMap>,
    ) -> Result<Vec<TreeRangePercentage>> {
        let npartitions = self.options.target_partitions;
        debug!(
            "Building {npartitions} ranges from {} trees (friends: {})",
            trees.len(),
            friends.is_some()
        );

        // Opening a file may be expensive, so only do it when someone will
        // see the result
        if self.options.check_partition_count && log_enabled!(Level::Debug) {
            if let Some(first) = trees.first() {
                self.check_partition_count(first, npartitions, trees.len())
                    .await?;
            }
        }

        PercentageRangeBuilder::new(trees)
            .with_target_partitions(npartitions)
            .with_friends(friends)
            .with_samples(samples)
            .build(self.exec_id)
    }

    /// Reports whether more partitions were requested than the first tree has
    /// clusters per file, in which case some tasks will be empty
    async fn check_partition_count(
        &self,
        first: &TreeRef,
        npartitions: usize,
        ntrees: usize,
    ) -> Result<()> {
        let clusters = self.provider.clusters_and_entries(first).await?;
        if too_many_partitions(npartitions, ntrees, &clusters) {
            debug!(
                "The number of requested partitions could be higher than the maximum \
                 amount of chunks the dataset can be split in. Some tasks could be doing \
                 no work. Consider lowering target_partitions (currently {npartitions})"
            );
        }
        Ok(())
    }

    /// Ranges of whole files for formats that cannot be split inside a file
    pub fn plan_whole_files(
        &self,
        unit_name: &str,
        file_names: &[String],
    ) -> Result<Vec<WholeFileRange>> {
        whole_file_ranges(
            unit_name,
            file_names,
            self.options.target_partitions,
            self.exec_id,
        )
    }

    /// Materializes one range against this planner's tree metadata provider
    pub async fn materialize(&self, range: TreeRangePercentage) -> Result<MaterializeOutcome> {
        materialize(
            range,
            self.provider.as_ref(),
            self.options.metadata_fetch_concurrency,
        )
        .await
    }

    /// Materializes `ranges` concurrently, returning the outcomes in the order
    /// of the input. The first error aborts the remaining tasks.
    pub async fn materialize_all(
        &self,
        ranges: Vec<TreeRangePercentage>,
    ) -> Result<Vec<MaterializeOutcome>> {
        let concurrency = self.options.metadata_fetch_concurrency.max(1);
        futures::stream::iter(ranges)
            .map(|range| self.materialize(range))
            .buffered(concurrency)
            .try_collect()
            .await
    }
}

/// Estimates from the first tree whether `npartitions` leaves some tasks
/// without entries. Compares against the number of boundaries rather than
/// clusters, so one partition more than there are clusters per tree is still
/// accepted. An empty tree says nothing about the others.
fn too_many_partitions(npartitions: usize, ntrees: usize, clusters: &TreeClusters) -> bool {
    clusters.entries > 0
        && npartitions as f64 / ntrees as f64 > clusters.boundaries.len() as f64
}

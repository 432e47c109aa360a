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

//! Partitioning of file backed tree datasets into ranges for distributed
//! processing.
//!
//! A dataset is an ordered chain of trees, each stored in a file and made of
//! clusters: batches of rows that can only be read as a whole. Three kinds of
//! ranges can be built:
//!
//! * [`balanced_ranges`] splits the rows of a source without files.
//! * [`whole_file_ranges`] splits a list of files without looking inside them.
//! * [`PercentageRangeBuilder`] splits a chain of trees by fractions of trees.
//!   Each of those ranges is turned into entry numbers aligned to cluster
//!   boundaries by [`materialize`], on the worker that processes it.
//!
//! Every row of a chain of trees ends up in exactly one materialized range.
//! The [`TaskRowAccounting`] returned alongside each range lets the caller
//! check that with [`verify_row_conservation`] once all tasks are done.
//!
//! [`RangePlanner`] ties these together with [`PartitioningOptions`].
//!
//! [`PartitioningOptions`]: distrange_common::PartitioningOptions

pub mod accounting;
pub mod bisect;
pub mod cluster;
pub mod materialize;
pub mod metadata;
pub mod percentage;
pub mod planner;
pub mod provider;
pub mod range;
pub mod split;

pub use accounting::{verify_row_conservation, TaskRowAccounting};
pub use cluster::{align_to_clusters, ClusterAlignedRange, TreeClusters};
pub use materialize::materialize;
pub use metadata::{FriendInfo, SampleMap, SampleMetadata};
pub use percentage::PercentageRangeBuilder;
pub use planner::RangePlanner;
pub use provider::{InMemoryTreeProvider, TreeMetadataProvider};
pub use range::{
    EmptySourceRange, ExecutionId, MaterializeOutcome, MaterializedTreeRange, TaskId,
    TreeRangePercentage, TreeRef, TreeSpan, WholeFileRange,
};
pub use split::{balanced_ranges, split_equal_size, whole_file_ranges};

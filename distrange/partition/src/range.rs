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

//! Task descriptors produced by the partitioning functions of this crate

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounting::TaskRowAccounting;
use crate::metadata::{FriendInfo, SampleMetadata};

/// Identifies one distributed run. All ranges built for the same run share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionId(Uuid);

impl ExecutionId {
    /// Creates a new random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a single task: the run it belongs to and its zero-based index
/// within that run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId {
    pub exec_id: ExecutionId,
    pub id: usize,
}

impl TaskId {
    pub fn new(exec_id: ExecutionId, id: usize) -> Self {
        Self { exec_id, id }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.exec_id, self.id)
    }
}

/// A tree stored in a file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TreeRef {
    pub file_name: String,
    pub tree_name: String,
}

impl TreeRef {
    pub fn new(file_name: impl Into<String>, tree_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            tree_name: tree_name.into(),
        }
    }

    /// The `file/tree` key used for row accounting and sample lookups
    pub fn key(&self) -> String {
        format!("{}/{}", self.file_name, self.tree_name)
    }
}

impl fmt::Display for TreeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.file_name, self.tree_name)
    }
}

/// Half-open interval `[start, end)` of rows of a data source that has no
/// backing files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptySourceRange {
    pub task: TaskId,
    pub start: u64,
    pub end: u64,
}

impl EmptySourceRange {
    pub fn num_rows(&self) -> u64 {
        self.end - self.start
    }
}

/// Files assigned to a task of a storage format that can only be split at
/// file granularity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WholeFileRange {
    pub task: TaskId,
    pub unit_name: String,
    pub file_names: Vec<String>,
}

/// The trees a [`TreeRangePercentage`] refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeSpan {
    /// Friend trees are attached: `trees` is the full dataset so that global
    /// offsets line up with the friends, and the task reads the trees in
    /// `first_index..last_index` only.
    Aligned {
        trees: Vec<TreeRef>,
        first_index: usize,
        last_index: usize,
        friends: FriendInfo,
    },
    /// `trees` holds exactly the trees this task reads.
    Standalone { trees: Vec<TreeRef> },
}

impl TreeSpan {
    /// Every tree carried by this span, including those only needed for
    /// offset bookkeeping
    pub fn trees(&self) -> &[TreeRef] {
        match self {
            TreeSpan::Aligned { trees, .. } | TreeSpan::Standalone { trees } => trees,
        }
    }

    /// Index of the first tree read by the task (inclusive)
    pub fn first_index(&self) -> usize {
        match self {
            TreeSpan::Aligned { first_index, .. } => *first_index,
            TreeSpan::Standalone { .. } => 0,
        }
    }

    /// Index one past the last tree read by the task (exclusive)
    pub fn last_index(&self) -> usize {
        match self {
            TreeSpan::Aligned { last_index, .. } => *last_index,
            TreeSpan::Standalone { trees } => trees.len(),
        }
    }

    pub fn friends(&self) -> Option<&FriendInfo> {
        match self {
            TreeSpan::Aligned { friends, .. } => Some(friends),
            TreeSpan::Standalone { .. } => None,
        }
    }
}

/// A task expressed as fractions of the first and last tree it reads. This is
/// the input of [`materialize`](crate::materialize::materialize), which turns
/// it into row numbers aligned to cluster boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeRangePercentage {
    pub task: TaskId,
    pub span: TreeSpan,
    /// Fraction of the first tree at which the task starts reading
    pub first_tree_start_fraction: f64,
    /// Fraction of the last tree at which the task stops reading
    pub last_tree_end_fraction: f64,
    /// Sample metadata of every tree in `span.trees()`, if the dataset has any
    pub samples: Option<Vec<Option<SampleMetadata>>>,
}

/// Rows `[global_start, global_end)` of the virtual concatenation of `trees`,
/// aligned to cluster boundaries. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterializedTreeRange {
    pub task: TaskId,
    pub trees: Vec<TreeRef>,
    pub global_start: u64,
    pub global_end: u64,
    pub friends: Option<FriendInfo>,
    pub samples: Option<Vec<Option<SampleMetadata>>>,
}

impl MaterializedTreeRange {
    pub fn num_rows(&self) -> u64 {
        self.global_end - self.global_start
    }
}

/// Result of materializing one [`TreeRangePercentage`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MaterializeOutcome {
    /// The task has rows to process
    Materialized {
        range: MaterializedTreeRange,
        accounting: TaskRowAccounting,
    },
    /// After cluster alignment the task has no rows left. Its accounting still
    /// takes part in the global row check.
    Empty {
        task: TaskId,
        accounting: TaskRowAccounting,
    },
}

impl MaterializeOutcome {
    pub fn task(&self) -> &TaskId {
        match self {
            MaterializeOutcome::Materialized { range, .. } => &range.task,
            MaterializeOutcome::Empty { task, .. } => task,
        }
    }

    pub fn accounting(&self) -> &TaskRowAccounting {
        match self {
            MaterializeOutcome::Materialized { accounting, .. }
            | MaterializeOutcome::Empty { accounting, .. } => accounting,
        }
    }

    pub fn range(&self) -> Option<&MaterializedTreeRange> {
        match self {
            MaterializeOutcome::Materialized { range, .. } => Some(range),
            MaterializeOutcome::Empty { .. } => None,
        }
    }

    pub fn into_accounting(self) -> TaskRowAccounting {
        match self {
            MaterializeOutcome::Materialized { accounting, .. }
            | MaterializeOutcome::Empty { accounting, .. } => accounting,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_key_joins_file_and_tree() {
        let tree = TreeRef::new("root://eos/data/run1.root", "Events");
        assert_eq!(tree.key(), "root://eos/data/run1.root/Events");
        assert_eq!(tree.to_string(), tree.key());
    }

    #[test]
    fn span_indices() {
        let trees = vec![
            TreeRef::new("a.root", "t"),
            TreeRef::new("b.root", "t"),
            TreeRef::new("c.root", "t"),
        ];
        let standalone = TreeSpan::Standalone {
            trees: trees[1..].to_vec(),
        };
        assert_eq!(standalone.first_index(), 0);
        assert_eq!(standalone.last_index(), 2);
        assert!(standalone.friends().is_none());

        let aligned = TreeSpan::Aligned {
            trees: trees.clone(),
            first_index: 1,
            last_index: 3,
            friends: FriendInfo::default(),
        };
        assert_eq!(aligned.first_index(), 1);
        assert_eq!(aligned.last_index(), 3);
        assert_eq!(aligned.trees(), trees.as_slice());
        assert!(aligned.friends().is_some());
    }

    #[test]
    fn task_ids_of_one_run_share_exec_id() {
        let exec_id = ExecutionId::new();
        let a = TaskId::new(exec_id, 0);
        let b = TaskId::new(exec_id, 1);
        assert_eq!(a.exec_id, b.exec_id);
        assert_ne!(a, b);
        assert_ne!(exec_id, ExecutionId::new());
        assert_eq!(b.to_string(), format!("{exec_id}/1"));
    }
}

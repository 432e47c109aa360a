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

//! Bookkeeping of processed rows, used to check after a distributed run that
//! every row of the dataset was processed exactly once.

use std::collections::{BTreeMap, BTreeSet};

use distrange_common::{exec_err, Result};
use serde::{Deserialize, Serialize};

use crate::range::TreeRef;

/// Rows processed by one task (or, after [merging](Self::merge), by many)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRowAccounting {
    /// Rows the task reads after cluster alignment
    pub processed_rows: u64,
    /// Total entries of every tree the task opened, keyed by
    /// [`TreeRef::key`]. This is the full tree, not only the rows processed.
    pub rows_per_tree: BTreeMap<String, u64>,
}

impl TaskRowAccounting {
    pub fn new(processed_rows: u64, rows_per_tree: BTreeMap<String, u64>) -> Self {
        Self {
            processed_rows,
            rows_per_tree,
        }
    }

    /// Adds the rows of `other` to these. Trees seen by both keep a single
    /// entry since their row count is the same.
    pub fn merge(&mut self, other: TaskRowAccounting) {
        self.processed_rows += other.processed_rows;
        self.rows_per_tree.extend(other.rows_per_tree);
    }
}

impl FromIterator<TaskRowAccounting> for TaskRowAccounting {
    fn from_iter<I: IntoIterator<Item = TaskRowAccounting>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), |mut acc, task| {
            acc.merge(task);
            acc
        })
    }
}

/// Checks the merged accounting of all tasks of a run against the trees it
/// was asked to process.
///
/// The set of trees opened by the tasks must be the set of input trees, and
/// the processed rows must add up to the entries of all input trees. A tree
/// listed several times in the input is expected to be processed that many
/// times.
pub fn verify_row_conservation(
    input_trees: &[TreeRef],
    merged: &TaskRowAccounting,
) -> Result<()> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for tree in input_trees {
        *counts.entry(tree.key()).or_default() += 1;
    }

    let input_keys: BTreeSet<_> = counts.keys().collect();
    let processed_keys: BTreeSet<_> = merged.rows_per_tree.keys().collect();
    if input_keys != processed_keys {
        return exec_err!(
            "The specified input trees and the trees that were actually processed \
             are not the same:\nInput trees: {input_keys:?}\nProcessed trees: {processed_keys:?}"
        );
    }

    let total_dataset_rows: u64 = merged
        .rows_per_tree
        .iter()
        .map(|(key, rows)| rows * counts[key])
        .sum();
    if merged.processed_rows != total_dataset_rows {
        return exec_err!(
            "The dataset has {total_dataset_rows} entries, but {} were processed",
            merged.processed_rows
        );
    }
    Ok(())
}

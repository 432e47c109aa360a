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

//! Execution functions for the `distrange` subcommands

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use distrange_common::{PartitioningOptions, Result};
use distrange_partition::{
    verify_row_conservation, InMemoryTreeProvider, MaterializeOutcome, RangePlanner,
    TaskRowAccounting,
};
use log::info;

use crate::dataset::Dataset;
use crate::print_format::PrintFormat;

/// Prints the ranges of a source of `entries` rows without files
pub fn exec_empty<W: Write>(
    options: PartitioningOptions,
    entries: u64,
    format: PrintFormat,
    writer: &mut W,
) -> Result<()> {
    let planner = RangePlanner::new(options, Arc::new(InMemoryTreeProvider::new()));
    let ranges = planner.plan_empty_source(entries)?;
    info!(
        "Execution {} split {entries} entries into {} ranges",
        planner.exec_id(),
        ranges.len()
    );
    format.print_rows(writer, &ranges)
}

/// Prints the ranges of the trees of a dataset, either as fractions of trees
/// or, with `materialize`, as global entries aligned to clusters
pub async fn exec_trees<W: Write>(
    options: PartitioningOptions,
    dataset: &Path,
    materialize: bool,
    format: PrintFormat,
    writer: &mut W,
) -> Result<()> {
    let Dataset {
        trees,
        provider,
        friends,
        samples,
    } = Dataset::try_from_path(dataset)?;
    let verify = options.verify_row_conservation;
    let planner = RangePlanner::new(options, Arc::new(provider));
    let ranges = planner
        .plan_trees(trees.clone(), friends, samples.as_ref())
        .await?;
    info!(
        "Execution {} split {} trees into {} ranges",
        planner.exec_id(),
        trees.len(),
        ranges.len()
    );
    if !materialize {
        return format.print_rows(writer, &ranges);
    }

    let outcomes = planner.materialize_all(ranges).await?;
    if verify {
        let merged: TaskRowAccounting = outcomes
            .iter()
            .map(|outcome| outcome.accounting().clone())
            .collect();
        verify_row_conservation(&trees, &merged)?;
        info!(
            "Row check passed: {} entries assigned to {} tasks",
            merged.processed_rows,
            outcomes.len()
        );
    }
    let empty = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, MaterializeOutcome::Empty { .. }))
        .count();
    if empty > 0 {
        info!("{empty} tasks have no entries to process");
    }
    format.print_rows(writer, &outcomes)
}

/// Prints the ranges of whole files of a dataset
pub fn exec_files<W: Write>(
    options: PartitioningOptions,
    unit_name: &str,
    dataset: &Path,
    format: PrintFormat,
    writer: &mut W,
) -> Result<()> {
    let dataset = Dataset::try_from_path(dataset)?;
    let files = dataset.file_names();
    let planner = RangePlanner::new(options, Arc::new(dataset.provider));
    let ranges = planner.plan_whole_files(unit_name, &files)?;
    info!(
        "Execution {} split {} files into {} ranges",
        planner.exec_id(),
        files.len(),
        ranges.len()
    );
    format.print_rows(writer, &ranges)
}

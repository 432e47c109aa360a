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

use std::io::Write;

use distrange_cli::exec::{exec_empty, exec_files, exec_trees};
use distrange_cli::print_format::PrintFormat;
use distrange_common::{ConfigOptions, PartitioningOptions, RangeError};
use distrange_partition::{EmptySourceRange, TreeRangePercentage, WholeFileRange};
use serde_json::Value;
use tempfile::NamedTempFile;

const DATASET: &str = r#"{
    "trees": [
        {"file": "a.root", "tree": "Events", "entries": 100, "clusters": [0, 25, 50, 75, 100]},
        {"file": "b.root", "tree": "Events", "entries": 0},
        {"file": "c.root", "tree": "Events", "entries": 60, "clusters": [0, 30, 60]}
    ],
    "samples": {
        "a.root/Events": {"sample_name": "signal", "tree_names": ["Events"],
                          "file_globs": ["a.root"], "metadata": {"lumi": 1.0}}
    }
}"#;

fn dataset_file(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

fn options(settings: &[(&str, &str)]) -> PartitioningOptions {
    let mut config = ConfigOptions::new();
    for (key, value) in settings {
        config.set(key, value).unwrap();
    }
    config.partitioning
}

fn partitions(n: usize) -> PartitioningOptions {
    options(&[("distrange.partitioning.target_partitions", &n.to_string())])
}

#[test]
fn empty_source_json() {
    let mut out = vec![];
    exec_empty(partitions(3), 10, PrintFormat::Json, &mut out).unwrap();
    let ranges: Vec<EmptySourceRange> = serde_json::from_slice(&out).unwrap();
    let bounds: Vec<_> = ranges.iter().map(|r| (r.start, r.end)).collect();
    assert_eq!(bounds, vec![(0, 4), (4, 7), (7, 10)]);
}

#[test]
fn empty_source_without_entries() {
    let mut out = vec![];
    let err = exec_empty(partitions(3), 0, PrintFormat::Table, &mut out).unwrap_err();
    assert!(matches!(err, RangeError::Execution(_)));
    assert!(out.is_empty());
}

#[test]
fn whole_files() {
    let file = dataset_file(DATASET);
    let mut out = vec![];
    exec_files(partitions(2), "Events", file.path(), PrintFormat::NdJson, &mut out).unwrap();
    let ranges: Vec<WholeFileRange> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(ranges.len(), 2);
    assert_eq!(ranges[0].file_names, vec!["a.root", "b.root"]);
    assert_eq!(ranges[1].file_names, vec!["c.root"]);
    assert!(ranges.iter().all(|r| r.unit_name == "Events"));
}

#[tokio::test]
async fn percentage_ranges_carry_samples() {
    let file = dataset_file(DATASET);
    let mut out = vec![];
    exec_trees(partitions(2), file.path(), false, PrintFormat::Json, &mut out)
        .await
        .unwrap();
    let ranges: Vec<TreeRangePercentage> = serde_json::from_slice(&out).unwrap();
    assert_eq!(ranges.len(), 2);

    let samples = ranges[0].samples.as_ref().unwrap();
    assert_eq!(samples.len(), ranges[0].span.trees().len());
    assert_eq!(samples[0].as_ref().unwrap().sample_name, "signal");
    assert!(samples[1].is_none());
}

#[tokio::test]
async fn materialized_ranges_cover_the_dataset() {
    let file = dataset_file(DATASET);
    let mut out = vec![];
    exec_trees(partitions(4), file.path(), true, PrintFormat::NdJson, &mut out)
        .await
        .unwrap();

    let outcomes: Vec<Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(outcomes.len(), 4);
    let processed: u64 = outcomes
        .iter()
        .map(|outcome| {
            let (_, body) = outcome.as_object().unwrap().iter().next().unwrap();
            body["accounting"]["processed_rows"].as_u64().unwrap()
        })
        .sum();
    assert_eq!(processed, 160);
}

#[tokio::test]
async fn materialized_table() {
    let file = dataset_file(
        r#"{"trees": [{"file": "a.root", "tree": "t", "entries": 10, "clusters": [0, 5, 10]}]}"#,
    );
    let mut out = vec![];
    exec_trees(partitions(2), file.path(), true, PrintFormat::Table, &mut out)
        .await
        .unwrap();
    let expected = [
        "+------+----------+--------------+------------+------+",
        "| task | trees    | global_start | global_end | rows |",
        "+------+----------+--------------+------------+------+",
        "| 0    | a.root/t | 0            | 5          | 5    |",
        "| 1    | a.root/t | 5            | 10         | 5    |",
        "+------+----------+--------------+------------+------+",
        "",
    ]
    .join("\n");
    assert_eq!(String::from_utf8(out).unwrap(), expected);
}

#[tokio::test]
async fn invalid_dataset_is_reported() {
    let file = dataset_file(r#"{"trees": [{"file": "a.root", "tree": "t"}]}"#);
    let mut out = vec![];
    let err = exec_trees(partitions(2), file.path(), true, PrintFormat::Table, &mut out)
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("Failed to load dataset"));
    assert!(matches!(err.find_root(), RangeError::Json(_)));
}

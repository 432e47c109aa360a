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

//! Datasets described by a JSON file

use std::fs;
use std::path::Path;

use distrange_common::{invalid_argument_err, RangeError, Result};
use distrange_partition::{
    FriendInfo, InMemoryTreeProvider, SampleMap, TreeClusters, TreeRef,
};
use itertools::Itertools;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DatasetFile {
    trees: Vec<TreeEntry>,
    #[serde(default)]
    friends: Option<FriendInfo>,
    /// Keyed by `file/tree`
    #[serde(default)]
    samples: Option<SampleMap>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TreeEntry {
    file: String,
    tree: String,
    entries: u64,
    /// Cluster boundaries from 0 to `entries`. One cluster when missing.
    #[serde(default)]
    clusters: Option<Vec<u64>>,
}

/// An ordered chain of trees with the cluster layout of each of them
#[derive(Debug)]
pub struct Dataset {
    pub trees: Vec<TreeRef>,
    pub provider: InMemoryTreeProvider,
    pub friends: Option<FriendInfo>,
    pub samples: Option<SampleMap>,
}

impl Dataset {
    /// Reads a dataset from a JSON file
    pub fn try_from_path(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path).map_err(|e| {
            RangeError::from(e).context(format!("Failed to open dataset {}", path.display()))
        })?;
        Self::from_json(&json)
            .map_err(|e| e.context(format!("Failed to load dataset {}", path.display())))
    }

    /// Reads a dataset from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Self::try_new(serde_json::from_str(json)?)
    }

    fn try_new(parsed: DatasetFile) -> Result<Self> {
        if parsed.trees.is_empty() {
            return invalid_argument_err!("dataset has no trees");
        }

        let mut provider = InMemoryTreeProvider::new();
        let mut trees = Vec::with_capacity(parsed.trees.len());
        for entry in parsed.trees {
            let tree = TreeRef::new(entry.file, entry.tree);
            let clusters = match entry.clusters {
                Some(boundaries) => TreeClusters::new(boundaries, entry.entries),
                None => TreeClusters::with_cluster_size(entry.entries, entry.entries),
            };
            clusters
                .validate()
                .map_err(|e| e.context(format!("Invalid clusters for tree {tree}")))?;

            match provider.get(&tree) {
                Some(previous) if previous != &clusters => {
                    return invalid_argument_err!(
                        "tree {tree} is listed more than once with different clusters"
                    );
                }
                Some(_) => {}
                None => provider.insert(&tree, clusters),
            }
            trees.push(tree);
        }

        Ok(Self {
            trees,
            provider,
            friends: parsed.friends,
            samples: parsed.samples,
        })
    }

    /// Distinct files of the dataset in the order they first appear
    pub fn file_names(&self) -> Vec<String> {
        self.trees
            .iter()
            .map(|tree| tree.file_name.clone())
            .unique()
            .collect()
    }
}

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

//! Access to the row counts and cluster boundaries of stored trees

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use distrange_common::{RangeError, Result};

use crate::cluster::TreeClusters;
use crate::range::TreeRef;

/// Source of [`TreeClusters`] for the trees of a dataset.
///
/// Implementations open the file (locally or remotely) and read the tree
/// header. Failures are reported as [`RangeError::DataAccess`]; callers do not
/// retry, so any retry policy belongs to the implementation.
#[async_trait]
pub trait TreeMetadataProvider: Debug + Send + Sync {
    /// Returns the cluster boundaries and number of entries of `tree`
    async fn clusters_and_entries(&self, tree: &TreeRef) -> Result<TreeClusters>;
}

/// A [`TreeMetadataProvider`] answering from memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryTreeProvider {
    trees: HashMap<String, TreeClusters>,
}

impl InMemoryTreeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `clusters` for `tree`, replacing any previous entry
    pub fn insert(&mut self, tree: &TreeRef, clusters: TreeClusters) {
        self.trees.insert(tree.key(), clusters);
    }

    pub fn with_tree(mut self, tree: &TreeRef, clusters: TreeClusters) -> Self {
        self.insert(tree, clusters);
        self
    }

    pub fn get(&self, tree: &TreeRef) -> Option<&TreeClusters> {
        self.trees.get(&tree.key())
    }
}

#[async_trait]
impl TreeMetadataProvider for InMemoryTreeProvider {
    async fn clusters_and_entries(&self, tree: &TreeRef) -> Result<TreeClusters> {
        self.trees.get(&tree.key()).cloned().ok_or_else(|| {
            RangeError::DataAccess(format!("tree {tree} could not be opened").into())
        })
    }
}

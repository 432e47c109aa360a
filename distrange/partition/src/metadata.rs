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

//! Metadata that is attached to ranges but never interpreted by the
//! partitioning code: friend trees and per-sample annotations.

use std::collections::HashMap;

use distrange_common::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Friend trees of a dataset. Rows of a friend are matched to rows of the main
/// trees by global entry number, which is why ranges built for datasets with
/// friends keep the full list of trees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendInfo {
    /// `(name, alias)` of every friend
    pub friend_names: Vec<(String, String)>,
    /// Files of every friend
    pub friend_file_names: Vec<Vec<String>>,
    /// Names of the trees in each file of a friend chain. Empty when the
    /// friend is a single tree.
    pub friend_chain_sub_names: Vec<Vec<String>>,
}

/// Sample a tree belongs to, together with user supplied metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleMetadata {
    pub sample_name: String,
    pub tree_names: Vec<String>,
    pub file_globs: Vec<String>,
    pub metadata: Map<String, Value>,
}

impl SampleMetadata {
    pub fn new(sample_name: impl Into<String>) -> Self {
        Self {
            sample_name: sample_name.into(),
            ..Default::default()
        }
    }

    pub fn with_trees(mut self, tree_names: Vec<String>, file_globs: Vec<String>) -> Self {
        self.tree_names = tree_names;
        self.file_globs = file_globs;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Serializes this sample to a JSON document
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Rebuilds a sample from a document written by [`Self::export_json`]
    pub fn import_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Sample metadata keyed by [`TreeRef::key`](crate::range::TreeRef::key)
pub type SampleMap = HashMap<String, SampleMetadata>;

#[cfg(test)]
mod tests {
    use super::*;
    use distrange_common::RangeError;

    #[test]
    fn sample_survives_export_and_import() {
        let sample = SampleMetadata::new("ttbar")
            .with_trees(vec!["Events".into()], vec!["ttbar_*.root".into()])
            .with_metadata("xsec", 831.76)
            .with_metadata("is_mc", true);
        let json = sample.export_json().unwrap();
        let imported = SampleMetadata::import_json(&json).unwrap();
        assert_eq!(imported, sample);
        assert_eq!(imported.metadata["xsec"], Value::from(831.76));
    }

    #[test]
    fn import_rejects_garbage() {
        let err = SampleMetadata::import_json("{\"sample_name\": 3").unwrap_err();
        assert!(matches!(err, RangeError::Json(_)));
    }
}

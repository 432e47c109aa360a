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

//! Runtime configuration, via [`ConfigOptions`]

use crate::{internal_err, RangeError, Result};
use std::collections::HashMap;
use std::fmt::Display;

/// A macro that wraps a configuration struct and automatically derives
/// [`Default`] and [`ConfigField`] for it, allowing it to be used
/// in the [`ConfigOptions`] configuration tree
///
/// For example,
///
/// ```ignore
/// config_namespace! {
///    /// Amazing config
///    pub struct MyConfig {
///        /// Field 1 doc
///        field1: bool, default = false
///
///        /// Field 2 doc
///        field2: usize, default = 232
///    }
///}
/// ```
///
/// generates the struct, a [`Default`] impl using the given defaults and a
/// [`ConfigField`] impl that dispatches `set` on the first segment of a
/// dotted key and visits every field under `<prefix>.<field>`.
///
/// NB: Misplaced commas may result in nonsensical errors
macro_rules! config_namespace {
    (
     $(#[doc = $struct_d:tt])*
     $vis:vis struct $struct_name:ident {
        $(
        $(#[doc = $d:tt])*
        $field_vis:vis $field_name:ident : $field_type:ty, default = $default:expr
        )*$(,)*
    }
    ) => {

        $(#[doc = $struct_d])*
        #[derive(Debug, Clone, PartialEq)]
        #[non_exhaustive]
        $vis struct $struct_name{
            $(
            $(#[doc = $d])*
            $field_vis $field_name : $field_type,
            )*
        }

        impl ConfigField for $struct_name {
            fn set(&mut self, key: &str, value: &str) -> Result<()> {
                let (key, rem) = key.split_once('.').unwrap_or((key, ""));
                match key {
                    $(
                       stringify!($field_name) => self.$field_name.set(rem, value),
                    )*
                    _ => internal_err!(
                        "Config value \"{}\" not found on {}", key, stringify!($struct_name)
                    )
                }
            }

            fn visit<V: Visit>(&self, v: &mut V, key_prefix: &str, _description: &'static str) {
                $(
                let key = format!(concat!("{}.", stringify!($field_name)), key_prefix);
                let desc = concat!($($d),*).trim();
                self.$field_name.visit(v, key.as_str(), desc);
                )*
            }
        }

        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field_name: $default),*
                }
            }
        }
    }
}

config_namespace! {
    /// Options related to splitting a dataset into ranges
    pub struct PartitioningOptions {
        /// Number of ranges a dataset is split into when the caller does not
        /// request a specific number.
        ///
        /// Defaults to the number of CPU cores on the system
        pub target_partitions: usize, default = num_cpus::get()

        /// Maximum number of tree metadata queries (row count and cluster
        /// boundaries) in flight while materializing a task. Also bounds how
        /// many tasks are materialized at the same time
        pub metadata_fetch_concurrency: usize, default = 32

        /// When set to true, the planner inspects the clusters of the first
        /// tree and reports, at debug level, if more partitions were requested
        /// than the dataset can be split in
        pub check_partition_count: bool, default = true

        /// When set to true, the rows processed by all tasks are checked
        /// against the rows in the input trees once a run is complete
        pub verify_row_conservation: bool, default = true
    }
}

/// A key value pair, with a corresponding description
#[derive(Debug)]
pub struct ConfigEntry {
    /// A unique string to identify this config value
    pub key: String,

    /// The current value
    pub value: String,

    /// A description of this configuration entry
    pub description: &'static str,
}

/// Configuration options struct
#[derive(Debug, Clone, Default, PartialEq)]
#[non_exhaustive]
pub struct ConfigOptions {
    /// Partitioning options
    pub partitioning: PartitioningOptions,
}

impl ConfigField for ConfigOptions {
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let (key, rem) = key.split_once('.').unwrap_or((key, ""));
        match key {
            "partitioning" => self.partitioning.set(rem, value),
            _ => internal_err!("Config value \"{key}\" not found on ConfigOptions"),
        }
    }

    fn visit<V: Visit>(&self, v: &mut V, _key_prefix: &str, _description: &'static str) {
        self.partitioning.visit(v, "distrange.partitioning", "");
    }
}

impl ConfigOptions {
    /// Creates a new [`ConfigOptions`] with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a configuration option
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let (prefix, key) = key.split_once('.').ok_or_else(|| {
            RangeError::InvalidArgument(format!(
                "could not find config namespace for key \"{key}\""
            ))
        })?;

        if prefix != "distrange" {
            return internal_err!("Could not find config namespace \"{prefix}\"");
        }
        ConfigField::set(self, key, value)
    }

    /// Create new ConfigOptions struct, taking values from
    /// environment variables where possible.
    ///
    /// For example, setting `DISTRANGE_PARTITIONING_TARGET_PARTITIONS` will
    /// control `distrange.partitioning.target_partitions`.
    pub fn from_env() -> Result<Self> {
        // Extract the names of all fields and then look up the corresponding
        // environment variables. This avoids ambiguity between `a.b` and `a_b`
        // which would both correspond to an environment variable of `A_B`
        let mut ret = Self::default();
        for key in ret.keys() {
            let env = key.to_uppercase().replace('.', "_");
            if let Some(var) = std::env::var_os(env) {
                ret.set(&key, var.to_string_lossy().as_ref())?;
            }
        }

        Ok(ret)
    }

    /// Create new ConfigOptions struct, taking values from a string hash map.
    ///
    /// Only the built-in configurations will be extracted from the hash map
    /// and other key value pairs will be ignored.
    pub fn from_string_hash_map(settings: &HashMap<String, String>) -> Result<Self> {
        let mut ret = Self::default();
        for key in ret.keys() {
            if let Some(var) = settings.get(&key) {
                ret.set(&key, var)?;
            }
        }

        Ok(ret)
    }

    /// Returns the [`ConfigEntry`] stored within this [`ConfigOptions`]
    pub fn entries(&self) -> Vec<ConfigEntry> {
        struct Visitor(Vec<ConfigEntry>);

        impl Visit for Visitor {
            fn some<V: Display>(
                &mut self,
                key: &str,
                value: V,
                description: &'static str,
            ) {
                self.0.push(ConfigEntry {
                    key: key.to_string(),
                    value: value.to_string(),
                    description,
                })
            }
        }

        let mut v = Visitor(vec![]);
        self.visit(&mut v, "distrange", "");
        v.0
    }

    fn keys(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.key).collect()
    }
}

/// A trait implemented by `config_namespace` and for field types that provides
/// the ability to walk and mutate the configuration tree
trait ConfigField {
    fn visit<V: Visit>(&self, v: &mut V, key: &str, description: &'static str);

    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

macro_rules! config_field {
    ($t:ty) => {
        impl ConfigField for $t {
            fn visit<V: Visit>(&self, v: &mut V, key: &str, description: &'static str) {
                v.some(key, self, description)
            }

            fn set(&mut self, _: &str, value: &str) -> Result<()> {
                *self = value.parse().map_err(|e| {
                    RangeError::Context(
                        format!(concat!("Error parsing {} as ", stringify!($t),), value),
                        Box::new(RangeError::InvalidArgument(format!("{e}"))),
                    )
                })?;
                Ok(())
            }
        }
    };
}

config_field!(bool);
config_field!(usize);

/// An implementation trait used to recursively walk configuration
trait Visit {
    fn some<V: Display>(&mut self, key: &str, value: V, description: &'static str);
}

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

//! Print format variants

use std::io::Write;
use std::str::FromStr;

use comfy_table::Table;
use distrange_common::Result;
use distrange_partition::{
    EmptySourceRange, MaterializeOutcome, TreeRangePercentage, WholeFileRange,
};
use itertools::Itertools;
use serde::Serialize;

/// Allow ranges to be printed in different formats
#[derive(Debug, PartialEq, Eq, clap::ValueEnum, Clone, Copy)]
pub enum PrintFormat {
    Table,
    Json,
    #[value(name = "ndjson")]
    NdJson,
}

impl FromStr for PrintFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        clap::ValueEnum::from_str(s, true)
    }
}

/// Outer borders and a line under the header, no lines between rows
const TABLE_PRESET: &str = "||--+-++|    ++++++";

/// A value that can be shown as one line of a table
pub trait TableRow {
    /// Column names
    fn header() -> &'static [&'static str];

    /// One cell per column of [`TableRow::header`]
    fn cells(&self) -> Vec<String>;
}

impl PrintFormat {
    /// Print the rows to the writer using the specified format
    pub fn print_rows<W, T>(&self, writer: &mut W, rows: &[T]) -> Result<()>
    where
        W: Write,
        T: Serialize + TableRow,
    {
        match self {
            Self::Json => {
                serde_json::to_writer_pretty(&mut *writer, rows)?;
                writeln!(writer)?;
            }
            Self::NdJson => {
                for row in rows {
                    serde_json::to_writer(&mut *writer, row)?;
                    writeln!(writer)?;
                }
            }
            Self::Table => {
                let mut table = Table::new();
                table.load_preset(TABLE_PRESET);
                table.set_header(T::header().to_vec());
                for row in rows {
                    table.add_row(row.cells());
                }
                writeln!(writer, "{table}")?;
            }
        }
        Ok(())
    }
}

impl TableRow for EmptySourceRange {
    fn header() -> &'static [&'static str] {
        &["task", "start", "end", "rows"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.task.id.to_string(),
            self.start.to_string(),
            self.end.to_string(),
            self.num_rows().to_string(),
        ]
    }
}

impl TableRow for WholeFileRange {
    fn header() -> &'static [&'static str] {
        &["task", "unit", "files"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.task.id.to_string(),
            self.unit_name.clone(),
            self.file_names.join(", "),
        ]
    }
}

impl TableRow for TreeRangePercentage {
    fn header() -> &'static [&'static str] {
        &["task", "trees", "first_tree_start", "last_tree_end", "friends"]
    }

    fn cells(&self) -> Vec<String> {
        let span = &self.span;
        let trees = span.trees()[span.first_index()..span.last_index()]
            .iter()
            .join(", ");
        vec![
            self.task.id.to_string(),
            trees,
            self.first_tree_start_fraction.to_string(),
            self.last_tree_end_fraction.to_string(),
            span.friends().is_some().to_string(),
        ]
    }
}

impl TableRow for MaterializeOutcome {
    fn header() -> &'static [&'static str] {
        &["task", "trees", "global_start", "global_end", "rows"]
    }

    fn cells(&self) -> Vec<String> {
        match self.range() {
            Some(range) => vec![
                range.task.id.to_string(),
                range.trees.iter().join(", "),
                range.global_start.to_string(),
                range.global_end.to_string(),
                range.num_rows().to_string(),
            ],
            None => vec![
                self.task().id.to_string(),
                String::new(),
                String::new(),
                String::new(),
                "0".to_string(),
            ],
        }
    }
}

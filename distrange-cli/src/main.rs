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

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use distrange_cli::exec::{exec_empty, exec_files, exec_trees};
use distrange_cli::print_format::PrintFormat;
use distrange_common::{ConfigOptions, Result};

#[derive(Debug, Parser, PartialEq)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(
        short,
        long,
        global = true,
        help = "Number of ranges to build, overrides distrange.partitioning.target_partitions",
        value_parser(parse_partitions)
    )]
    partitions: Option<usize>,

    #[clap(long, global = true, value_enum, default_value_t = PrintFormat::Table)]
    format: PrintFormat,

    #[clap(
        long = "set",
        global = true,
        value_name = "KEY=VALUE",
        help = "Set a configuration option, e.g. distrange.partitioning.metadata_fetch_concurrency=8",
        value_parser(parse_key_value)
    )]
    settings: Vec<(String, String)>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand, PartialEq)]
enum Command {
    /// Split the entries of a source without files
    Empty {
        #[clap(long, help = "Number of entries of the source")]
        entries: u64,
    },
    /// Split the trees of a dataset into fractions of trees
    Trees {
        #[clap(long, help = "JSON file describing the trees of the dataset")]
        dataset: PathBuf,

        #[clap(long, help = "Align the ranges to cluster boundaries")]
        materialize: bool,
    },
    /// Split the files of a dataset without looking inside them
    Files {
        #[clap(long, help = "Name of the unit stored in every file")]
        unit: String,

        #[clap(long, help = "JSON file describing the trees of the dataset")]
        dataset: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = main_inner().await {
        println!("Error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn main_inner() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = ConfigOptions::from_env()?;
    for (key, value) in &args.settings {
        config.set(key, value)?;
    }
    if let Some(partitions) = args.partitions {
        config.partitioning.target_partitions = partitions;
    }
    let options = config.partitioning;

    let mut stdout = std::io::stdout().lock();
    match args.command {
        Command::Empty { entries } => exec_empty(options, entries, args.format, &mut stdout),
        Command::Trees {
            dataset,
            materialize,
        } => exec_trees(options, &dataset, materialize, args.format, &mut stdout).await,
        Command::Files { unit, dataset } => {
            exec_files(options, &unit, &dataset, args.format, &mut stdout)
        }
    }
}

fn parse_partitions(partitions: &str) -> std::result::Result<usize, String> {
    match partitions.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("Invalid number of partitions '{partitions}'")),
    }
}

fn parse_key_value(setting: &str) -> std::result::Result<(String, String), String> {
    match setting.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("Invalid setting '{setting}', expected KEY=VALUE")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_args() {
        let args = Args::try_parse_from([
            "distrange",
            "--set",
            "distrange.partitioning.check_partition_count=false",
            "trees",
            "--dataset",
            "data.json",
            "--materialize",
            "-p",
            "8",
            "--format",
            "ndjson",
        ])
        .unwrap();
        assert_eq!(args.partitions, Some(8));
        assert_eq!(args.format, PrintFormat::NdJson);
        assert_eq!(
            args.settings,
            vec![(
                "distrange.partitioning.check_partition_count".to_string(),
                "false".to_string()
            )]
        );
        assert_eq!(
            args.command,
            Command::Trees {
                dataset: PathBuf::from("data.json"),
                materialize: true
            }
        );
    }

    #[test]
    fn reject_invalid_args() {
        assert!(Args::try_parse_from(["distrange", "-p", "0", "empty", "--entries", "3"]).is_err());
        assert!(Args::try_parse_from(["distrange", "--set", "novalue", "empty", "--entries", "3"])
            .is_err());
        assert!(Args::try_parse_from(["distrange", "files", "--dataset", "d.json"]).is_err());
    }
}

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

//! Partitioning without cluster information: whole files and virtual rows

use distrange_common::{invalid_argument_err, Result};
use log::debug;

use crate::range::{EmptySourceRange, ExecutionId, TaskId, WholeFileRange};

fn check_partitions(npartitions: usize) -> Result<()> {
    if npartitions == 0 {
        return invalid_argument_err!("the number of partitions must be positive");
    }
    Ok(())
}

/// Splits `items` into exactly `npartitions` contiguous chunks whose sizes
/// differ by at most one. The first `len % npartitions` chunks get the extra
/// element; with more partitions than items the trailing chunks are empty.
pub fn split_equal_size<T>(items: &[T], npartitions: usize) -> Result<Vec<&[T]>> {
    check_partitions(npartitions)?;
    let quotient = items.len() / npartitions;
    let remainder = items.len() % npartitions;
    Ok((0..npartitions)
        .map(|i| {
            let start = i * quotient + i.min(remainder);
            let end = (i + 1) * quotient + (i + 1).min(remainder);
            &items[start..end]
        })
        .collect())
}

/// Builds one [`WholeFileRange`] per partition for formats that cannot be
/// split below file granularity. Partitions may be left without files when
/// there are fewer files than partitions.
pub fn whole_file_ranges(
    unit_name: &str,
    file_names: &[String],
    npartitions: usize,
    exec_id: ExecutionId,
) -> Result<Vec<WholeFileRange>> {
    let ranges: Vec<_> = split_equal_size(file_names, npartitions)?
        .into_iter()
        .enumerate()
        .map(|(id, files)| WholeFileRange {
            task: TaskId::new(exec_id, id),
            unit_name: unit_name.to_string(),
            file_names: files.to_vec(),
        })
        .collect();
    debug!(
        "Split {} files of {unit_name} into {} ranges",
        file_names.len(),
        ranges.len()
    );
    Ok(ranges)
}

/// Splits the virtual rows `[0, nentries)` of a source without files into
/// contiguous ranges of nearly equal size. The first `nentries % npartitions`
/// ranges hold one extra row. Fewer than `npartitions` ranges are returned
/// when there are fewer rows than partitions, and none when `nentries == 0`.
pub fn balanced_ranges(
    nentries: u64,
    npartitions: usize,
    exec_id: ExecutionId,
) -> Result<Vec<EmptySourceRange>> {
    check_partitions(npartitions)?;
    let partition_size = nentries / npartitions as u64;
    let mut remainder = nentries % npartitions as u64;

    let mut ranges = vec![];
    let mut start = 0;
    while start < nentries {
        let mut end = start + partition_size;
        if remainder > 0 {
            end += 1;
            remainder -= 1;
        }
        ranges.push(EmptySourceRange {
            task: TaskId::new(exec_id, ranges.len()),
            start,
            end,
        });
        start = end;
    }
    debug!("Split {nentries} entries into {} ranges", ranges.len());
    Ok(ranges)
}

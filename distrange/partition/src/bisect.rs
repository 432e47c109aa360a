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

//! Binary search over sorted cluster boundaries

/// Returns the index of the first element of `sorted` that is not smaller
/// than `target`, or `sorted.len()` if there is none.
///
/// An exact match returns the index of that element, not the next one.
pub fn bisect_left(sorted: &[u64], target: u64) -> usize {
    let mut low: usize = 0;
    let mut high: usize = sorted.len();
    while low < high {
        let mid = ((high - low) / 2) + low;
        // sorted[..low] < target <= sorted[high..]
        if sorted[mid] < target {
            low = mid + 1;
        } else {
            high = mid;
        }
    }
    low
}

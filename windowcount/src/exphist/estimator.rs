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

use crate::exphist::Bucket;

/// Estimates the number of ones in the window covered by `buckets`.
///
/// Every bucket except the oldest lies entirely inside the window, and at
/// least the newest one of the oldest bucket does too. The estimate counts
/// half of the oldest bucket, so it is off by at most `oldest.size() / 2`.
///
/// The slice may be in any order. Returns 0 for an empty slice.
///
/// # Examples
///
/// ```
/// # use windowcount::exphist::ExpHistogram;
/// # use windowcount::exphist::estimate;
/// let mut hist = ExpHistogram::new(4, 2).unwrap();
/// hist.extend([true, true, true, true]);
/// assert_eq!(estimate(&hist.snapshot()), 3);
/// ```
pub fn estimate(buckets: &[Bucket]) -> u64 {
    match oldest(buckets) {
        Some(oldest) => total_size(buckets) - oldest.size() / 2,
        None => 0,
    }
}

pub(crate) fn oldest(buckets: &[Bucket]) -> Option<&Bucket> {
    buckets.iter().max_by_key(|b| b.age())
}

pub(crate) fn total_size(buckets: &[Bucket]) -> u64 {
    buckets.iter().map(Bucket::size).sum()
}

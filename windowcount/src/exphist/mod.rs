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

//! Exponential histogram for counting ones in a sliding window.
//!
//! The histogram approximates the number of one bits among the last N bits
//! of an unbounded stream while keeping only O(log(N) * err_param) buckets.
//! Each bucket stands for a power-of-two number of consecutive ones and
//! remembers how long ago its newest one arrived. On every tick all buckets
//! age by one, a new bucket of size 1 is added for a one bit, buckets that
//! fell out of the window are dropped, and whenever a size class holds too
//! many buckets its two oldest are merged into one of twice the size. Merges
//! cascade until every size class is within its limit.
//!
//! The estimate is the sum of all bucket sizes minus half the size of the
//! oldest bucket, the only bucket that may straddle the window boundary.
//!
//! For background, see Datar, Gionis, Indyk and Motwani, "Maintaining Stream
//! Statistics over Sliding Windows" (SIAM J. Comput. 31(6), 2002).
//!
//! # Usage
//!
//! ```rust
//! # use windowcount::exphist::ExpHistogram;
//! let mut hist = ExpHistogram::new(4, 2).unwrap();
//! for bit in [1, 1, 1, 1] {
//!     hist.update_bit(bit);
//! }
//! assert_eq!(hist.estimate(), 3);
//! assert!(hist.lower_bound() <= 4 && 4 <= hist.upper_bound());
//!
//! let snapshot = hist.snapshot();
//! let ages: Vec<u64> = snapshot.iter().map(|b| b.age()).collect();
//! assert_eq!(ages, vec![3, 2, 1]);
//! assert_eq!(hist.bucket_sizes(), vec![2, 1, 1]);
//! ```

mod bucket;
mod estimator;
mod sketch;

pub use self::bucket::Bucket;
pub use self::estimator::estimate;
pub use self::sketch::ExpHistogram;

/// Minimum value of the window size.
pub const MIN_WINDOW_SIZE: u64 = 1;
/// Minimum value of the error parameter.
pub const MIN_ERR_PARAM: u32 = 1;

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

use std::cmp::Reverse;
use std::collections::BTreeMap;

use tracing::debug;
use tracing::trace;

use crate::error::Error;
use crate::exphist::Bucket;
use crate::exphist::MIN_ERR_PARAM;
use crate::exphist::MIN_WINDOW_SIZE;
use crate::exphist::estimator;

/// Exponential histogram counting the ones among the last `window_size` bits.
///
/// The histogram exclusively owns its buckets; callers only ever see copies
/// through [`snapshot`](Self::snapshot) and [`bucket_sizes`](Self::bucket_sizes).
///
/// Updating requires `&mut self` and every query takes `&self`, so a single
/// instance has one writer or many readers at a time. To share it between
/// threads, wrap it in a lock (for example `std::sync::RwLock`) held across
/// the whole [`update`](Self::update) call and across each read.
///
/// See the [exphist module level documentation](crate::exphist) for more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpHistogram {
    window_size: u64,
    err_param: u32,
    n: u64,
    buckets: Vec<Bucket>,
}

impl ExpHistogram {
    /// Creates an empty histogram over the last `window_size` bits.
    ///
    /// `err_param` caps how many buckets each size class may hold before two
    /// of them are merged: size 1 may hold `err_param` buckets, every larger
    /// size `max(err_param / 2, 1)`. Larger values give tighter estimates at
    /// the cost of more buckets.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid)
    /// if `window_size` or `err_param` is 0.
    ///
    /// # Examples
    ///
    /// ```
    /// # use windowcount::exphist::ExpHistogram;
    /// let hist = ExpHistogram::new(40, 4).unwrap();
    /// assert_eq!(hist.window_size(), 40);
    /// assert!(ExpHistogram::new(0, 4).is_err());
    /// ```
    pub fn new(window_size: u64, err_param: u32) -> Result<Self, Error> {
        if window_size < MIN_WINDOW_SIZE {
            return Err(
                Error::config_invalid(format!("window size must be at least {MIN_WINDOW_SIZE}"))
                    .with_context("window_size", window_size)
                    .with_context("err_param", err_param),
            );
        }
        if err_param < MIN_ERR_PARAM {
            return Err(
                Error::config_invalid(format!("error parameter must be at least {MIN_ERR_PARAM}"))
                    .with_context("window_size", window_size)
                    .with_context("err_param", err_param),
            );
        }
        debug!(window_size, err_param, "created exponential histogram");
        Ok(Self {
            window_size,
            err_param,
            n: 0,
            buckets: Vec::new(),
        })
    }

    /// Returns the number of most recent bits the histogram covers.
    pub fn window_size(&self) -> u64 {
        self.window_size
    }

    /// Returns the error parameter used to configure this histogram.
    pub fn err_param(&self) -> u32 {
        self.err_param
    }

    /// Returns the number of bits ingested since creation or the last reset.
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Returns true if no one bit is left inside the window.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Returns the number of buckets currently held.
    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the sum of all bucket sizes.
    pub fn total_size(&self) -> u64 {
        estimator::total_size(&self.buckets)
    }

    /// Returns the maximum number of buckets a size class may hold.
    pub fn class_limit(&self, size: u64) -> usize {
        if size == 1 {
            self.err_param as usize
        } else {
            (self.err_param / 2).max(1) as usize
        }
    }

    /// Ingests one bit, advancing the window by one tick.
    ///
    /// # Examples
    ///
    /// ```
    /// # use windowcount::exphist::ExpHistogram;
    /// let mut hist = ExpHistogram::new(3, 2).unwrap();
    /// hist.update(true);
    /// assert_eq!(hist.estimate(), 1);
    /// for _ in 0..3 {
    ///     hist.update(false);
    /// }
    /// assert_eq!(hist.estimate(), 0);
    /// ```
    pub fn update(&mut self, bit: bool) {
        self.n += 1;
        for bucket in &mut self.buckets {
            bucket.tick();
        }
        if bit {
            self.buckets.push(Bucket::new_one());
        }
        self.evict_expired();
        self.rebalance();
    }

    /// Ingests one bit given as an integer.
    ///
    /// # Panics
    ///
    /// Panics if `value` is neither 0 nor 1.
    pub fn update_bit(&mut self, value: u8) {
        assert!(value <= 1, "bit must be 0 or 1, got {value}");
        self.update(value == 1);
    }

    /// Returns the approximate number of ones in the window.
    ///
    /// The result differs from the exact count by at most
    /// [`max_error`](Self::max_error).
    pub fn estimate(&self) -> u64 {
        estimator::estimate(&self.buckets)
    }

    /// Returns a count the exact number of ones never exceeds.
    pub fn upper_bound(&self) -> u64 {
        self.total_size()
    }

    /// Returns a count the exact number of ones is never below.
    pub fn lower_bound(&self) -> u64 {
        match estimator::oldest(&self.buckets) {
            Some(oldest) => self.total_size() - oldest.size() + 1,
            None => 0,
        }
    }

    /// Returns the largest possible distance between the estimate and the exact count.
    pub fn max_error(&self) -> u64 {
        estimator::oldest(&self.buckets).map_or(0, |oldest| oldest.size() / 2)
    }

    /// Returns a copy of the buckets, oldest first.
    pub fn snapshot(&self) -> Vec<Bucket> {
        let mut buckets = self.buckets.clone();
        buckets.sort_unstable_by_key(|b| Reverse(b.age()));
        buckets
    }

    /// Returns the bucket sizes, oldest first.
    pub fn bucket_sizes(&self) -> Vec<u64> {
        self.snapshot().iter().map(Bucket::size).collect()
    }

    /// Resets the histogram to an empty state, keeping its configuration.
    pub fn reset(&mut self) {
        debug!(
            window_size = self.window_size,
            err_param = self.err_param,
            ticks = self.n,
            "reset exponential histogram"
        );
        self.buckets.clear();
        self.n = 0;
    }

    fn evict_expired(&mut self) {
        let window_size = self.window_size;
        let before = self.buckets.len();
        self.buckets.retain(|b| b.age() <= window_size);
        let evicted = before - self.buckets.len();
        if evicted > 0 {
            trace!(tick = self.n, evicted, "evicted expired buckets");
        }
    }

    fn rebalance(&mut self) {
        while let Some(size) = self.first_overfull_class() {
            self.merge_oldest_pair(size);
        }
    }

    /// Smallest size class holding more buckets than its limit.
    fn first_overfull_class(&self) -> Option<u64> {
        count_per_class(&self.buckets)
            .into_iter()
            .find(|&(size, count)| count > self.class_limit(size))
            .map(|(size, _)| size)
    }

    fn merge_oldest_pair(&mut self, size: u64) {
        let (oldest, second) = two_oldest_in_class(&self.buckets, size)
            .expect("an overfull size class holds at least two buckets");
        let merged = Bucket::merge(self.buckets[oldest], self.buckets[second]);
        // Remove the higher index first so the lower one stays valid.
        let (high, low) = if oldest > second {
            (oldest, second)
        } else {
            (second, oldest)
        };
        self.buckets.swap_remove(high);
        self.buckets.swap_remove(low);
        self.buckets.push(merged);
        trace!(
            tick = self.n,
            size,
            merged_size = merged.size(),
            merged_age = merged.age(),
            "merged two oldest buckets"
        );
    }
}

impl Extend<bool> for ExpHistogram {
    fn extend<I: IntoIterator<Item = bool>>(&mut self, iter: I) {
        for bit in iter {
            self.update(bit);
        }
    }
}

/// Counts buckets per size class, keyed by the literal bucket size.
fn count_per_class(buckets: &[Bucket]) -> BTreeMap<u64, usize> {
    let mut counts = BTreeMap::new();
    for bucket in buckets {
        *counts.entry(bucket.size()).or_insert(0) += 1;
    }
    counts
}

/// Indices of the oldest and second oldest buckets of the given size.
fn two_oldest_in_class(buckets: &[Bucket], size: u64) -> Option<(usize, usize)> {
    let mut oldest: Option<usize> = None;
    let mut second: Option<usize> = None;
    for (idx, bucket) in buckets.iter().enumerate() {
        if bucket.size() != size {
            continue;
        }
        match oldest {
            Some(o) if buckets[o].age() >= bucket.age() => {
                if second.is_none_or(|s| buckets[s].age() < bucket.age()) {
                    second = Some(idx);
                }
            }
            _ => {
                second = oldest;
                oldest = Some(idx);
            }
        }
    }
    oldest.zip(second)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(age: u64, size: u64) -> Bucket {
        let mut b = Bucket::new_one();
        while b.size() < size {
            b = Bucket::merge(b, b);
        }
        for _ in 1..age {
            b.tick();
        }
        b
    }

    #[test]
    fn test_count_per_class_sparse_sizes() {
        let buckets = [bucket(9, 4), bucket(6, 4), bucket(1, 1)];
        let counts = count_per_class(&buckets);
        assert_eq!(counts, BTreeMap::from([(1, 1), (4, 2)]));
    }

    #[test]
    fn test_first_overfull_class_skips_empty_classes() {
        let mut hist = ExpHistogram::new(20, 2).unwrap();
        hist.buckets = vec![bucket(9, 4), bucket(6, 4), bucket(1, 1)];
        assert_eq!(hist.first_overfull_class(), Some(4));
    }

    #[test]
    fn test_first_overfull_class_prefers_smallest() {
        let mut hist = ExpHistogram::new(20, 2).unwrap();
        hist.buckets = vec![
            bucket(12, 2),
            bucket(9, 2),
            bucket(3, 1),
            bucket(2, 1),
            bucket(1, 1),
        ];
        assert_eq!(hist.first_overfull_class(), Some(1));
    }

    #[test]
    fn test_rebalance_merges_sparse_class() {
        let mut hist = ExpHistogram::new(20, 2).unwrap();
        hist.buckets = vec![bucket(1, 1), bucket(9, 4), bucket(6, 4)];
        hist.rebalance();
        assert_eq!(hist.snapshot(), vec![bucket(6, 8), bucket(1, 1)]);
    }

    #[test]
    fn test_two_oldest_in_class_ignores_other_sizes() {
        let buckets = [
            bucket(10, 2),
            bucket(4, 1),
            bucket(8, 1),
            bucket(6, 1),
            bucket(2, 1),
        ];
        assert_eq!(two_oldest_in_class(&buckets, 1), Some((2, 3)));
        assert_eq!(two_oldest_in_class(&buckets, 2), None);
        assert_eq!(two_oldest_in_class(&buckets, 4), None);
    }

    #[test]
    fn test_class_limit() {
        let hist = ExpHistogram::new(10, 5).unwrap();
        assert_eq!(hist.class_limit(1), 5);
        assert_eq!(hist.class_limit(2), 2);
        assert_eq!(hist.class_limit(64), 2);

        let hist = ExpHistogram::new(10, 1).unwrap();
        assert_eq!(hist.class_limit(1), 1);
        assert_eq!(hist.class_limit(2), 1);
    }
}

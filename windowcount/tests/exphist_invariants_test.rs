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

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::RwLock;
use std::thread;

use googletest::assert_that;
use googletest::prelude::eq;
use googletest::prelude::ge;
use googletest::prelude::le;
use windowcount::common::RandomBits;
use windowcount::common::XorShift64;
use windowcount::exact::ErrorMetrics;
use windowcount::exact::ExactWindow;
use windowcount::exphist::ExpHistogram;

const WINDOW_SIZES: [u64; 7] = [1, 2, 3, 7, 16, 40, 100];
const ERR_PARAMS: [u32; 6] = [1, 2, 3, 4, 5, 8];
const DENSITIES: [u8; 3] = [2, 5, 9];
const TICKS: usize = 1500;

fn check_invariants(hist: &ExpHistogram) {
    let snapshot = hist.snapshot();

    let mut per_class = BTreeMap::new();
    for bucket in &snapshot {
        assert!(bucket.size().is_power_of_two(), "size {}", bucket.size());
        assert_that!(bucket.age(), ge(1u64));
        assert_that!(bucket.age(), le(hist.window_size()));
        *per_class.entry(bucket.size()).or_insert(0usize) += 1;
    }
    for (size, count) in per_class {
        assert_that!(count, le(hist.class_limit(size)));
    }

    // Oldest first: ages strictly decrease, sizes never increase.
    for pair in snapshot.windows(2) {
        assert!(pair[0].age() > pair[1].age(), "ages not distinct: {pair:?}");
        assert_that!(pair[0].size(), ge(pair[1].size()));
    }
}

#[test]
fn test_invariants_hold_after_every_update() {
    for window_size in WINDOW_SIZES {
        for err_param in ERR_PARAMS {
            for density in DENSITIES {
                let mut hist = ExpHistogram::new(window_size, err_param).unwrap();
                let seed = window_size * 1_000 + u64::from(err_param) * 10 + u64::from(density);
                let bits = RandomBits::new(XorShift64::seeded(seed), density);
                for bit in bits.take(TICKS) {
                    hist.update(bit);
                    check_invariants(&hist);
                }
            }
        }
    }
}

#[test]
fn test_estimate_within_error_bound() {
    for window_size in WINDOW_SIZES {
        for err_param in ERR_PARAMS {
            for density in DENSITIES {
                let mut hist = ExpHistogram::new(window_size, err_param).unwrap();
                let mut exact = ExactWindow::new(window_size as usize).unwrap();
                let seed = 7 + window_size * 31 + u64::from(err_param) * 17 + u64::from(density);
                let bits = RandomBits::new(XorShift64::seeded(seed), density);
                for bit in bits.take(TICKS) {
                    hist.update(bit);
                    exact.update(bit);

                    let count = exact.count();
                    assert_that!(count, ge(hist.lower_bound()));
                    assert_that!(count, le(hist.upper_bound()));
                    let metrics = ErrorMetrics::between(hist.estimate(), count);
                    assert_that!(metrics.absolute(), le(hist.max_error()));
                }
            }
        }
    }
}

#[test]
fn test_relative_error_shrinks_with_err_param() {
    // With k buckets allowed per size class the relative error is on the
    // order of 1/k once the window is full of ones.
    for err_param in [2u32, 4, 8, 16] {
        let mut hist = ExpHistogram::new(1_000, err_param).unwrap();
        let mut exact = ExactWindow::new(1_000).unwrap();
        for bit in RandomBits::new(XorShift64::seeded(11), 10).take(5_000) {
            hist.update(bit);
            exact.update(bit);
            let metrics = ErrorMetrics::between(hist.estimate(), exact.count());
            assert_that!(metrics.relative(), le(2.0 / f64::from(err_param)));
        }
    }
}

#[test]
fn test_bucket_count_is_logarithmic() {
    let window_size = 4_096u64;
    let err_param = 4u32;
    let mut hist = ExpHistogram::new(window_size, err_param).unwrap();
    hist.extend(std::iter::repeat_n(true, 20_000));

    // One class per power of two up to the window size, each within its limit.
    let max_buckets = err_param as usize + 13 * hist.class_limit(2);
    assert_that!(hist.num_buckets(), le(max_buckets));
    assert_that!(hist.upper_bound(), ge(window_size));
}

#[test]
fn test_same_stream_same_histogram() {
    let bits: Vec<bool> = RandomBits::new(XorShift64::seeded(5), 5).take(800).collect();
    let mut a = ExpHistogram::new(50, 3).unwrap();
    let mut b = ExpHistogram::new(50, 3).unwrap();
    a.extend(bits.iter().copied());
    for bit in bits {
        b.update(bit);
    }
    assert_eq!(a.snapshot(), b.snapshot());
    assert_that!(a.n(), eq(800u64));
}

#[test]
fn test_shared_behind_rwlock() {
    let hist = Arc::new(RwLock::new(ExpHistogram::new(64, 4).unwrap()));

    let writer = {
        let hist = Arc::clone(&hist);
        thread::spawn(move || {
            for bit in RandomBits::new(XorShift64::seeded(21), 5).take(500) {
                hist.write().unwrap().update(bit);
            }
        })
    };
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let hist = Arc::clone(&hist);
            thread::spawn(move || {
                let mut seen = BTreeSet::new();
                for _ in 0..200 {
                    let guard = hist.read().unwrap();
                    let estimate = guard.estimate();
                    assert_that!(estimate, le(guard.upper_bound()));
                    seen.insert(guard.n());
                }
                seen
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        let seen = reader.join().unwrap();
        assert!(seen.iter().all(|n| *n <= 500));
    }
    assert_eq!(hist.read().unwrap().n(), 500);
}

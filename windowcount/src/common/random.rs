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

//! Random bit streams for driving sliding-window counters.
//!
//! Nothing in the histogram itself is random; these sources exist so that
//! demos and tests can feed reproducible streams into it.

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

const DEFAULT_SEED: u64 = 0x9e3779b97f4a7c15;

/// Random number source for bit streams.
pub trait RandomSource {
    /// Returns the next random 64-bit value.
    fn next_u64(&mut self) -> u64;

    /// Returns a value uniformly drawn from `[0, bound)`.
    ///
    /// # Panics
    ///
    /// Panics if `bound` is 0.
    fn next_below(&mut self, bound: u64) -> u64 {
        assert!(bound > 0, "bound must be greater than 0");
        // Multiply-shift reduction.
        ((self.next_u64() as u128 * bound as u128) >> 64) as u64
    }
}

/// Xorshift-based random generator.
#[derive(Debug, Clone, Copy)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    /// Creates a new generator using the provided seed.
    pub fn seeded(seed: u64) -> Self {
        let state = if seed == 0 { DEFAULT_SEED } else { seed };
        Self { state }
    }
}

impl Default for XorShift64 {
    fn default() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        Self::seeded(nanos as u64 ^ (std::process::id() as u64))
    }
}

impl RandomSource for XorShift64 {
    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

/// An endless stream of random bits.
///
/// Each bit is one with probability `ones_per_ten / 10`: a digit is drawn
/// uniformly from `[0, 10)` and the bit is one when the digit is at least
/// `10 - ones_per_ten`.
///
/// # Examples
///
/// ```
/// # use windowcount::common::RandomBits;
/// # use windowcount::common::XorShift64;
/// let bits: Vec<bool> = RandomBits::new(XorShift64::seeded(7), 10).take(5).collect();
/// assert_eq!(bits, vec![true; 5]);
/// ```
#[derive(Debug, Clone)]
pub struct RandomBits<R = XorShift64> {
    rng: R,
    ones_per_ten: u8,
}

impl<R: RandomSource> RandomBits<R> {
    /// Creates a bit stream over `rng`.
    ///
    /// # Panics
    ///
    /// Panics if `ones_per_ten` is greater than 10.
    pub fn new(rng: R, ones_per_ten: u8) -> Self {
        assert!(
            ones_per_ten <= 10,
            "ones_per_ten must be in [0, 10], got {ones_per_ten}"
        );
        Self { rng, ones_per_ten }
    }

    /// Returns the configured density of ones, in tenths.
    pub fn ones_per_ten(&self) -> u8 {
        self.ones_per_ten
    }
}

impl<R: RandomSource> Iterator for RandomBits<R> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        let digit = self.rng.next_below(10);
        Some(digit >= u64::from(10 - self.ones_per_ten))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

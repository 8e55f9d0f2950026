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

//! Exact sliding-window counting, used as the baseline for error comparison.
//!
//! [`ExactWindow`] keeps every bit of the window and therefore needs memory
//! linear in the window size. It answers the same question as
//! [`ExpHistogram`](crate::exphist::ExpHistogram) without error, so the two
//! can be fed the same stream and compared with [`ErrorMetrics`].
//!
//! # Usage
//!
//! ```rust
//! # use windowcount::exact::ErrorMetrics;
//! # use windowcount::exact::ExactWindow;
//! # use windowcount::exphist::ExpHistogram;
//! let mut exact = ExactWindow::new(4).unwrap();
//! let mut hist = ExpHistogram::new(4, 2).unwrap();
//! for bit in [true, true, true, true] {
//!     exact.update(bit);
//!     hist.update(bit);
//! }
//! let metrics = ErrorMetrics::between(hist.estimate(), exact.count());
//! assert_eq!(metrics.absolute(), 1);
//! assert_eq!(metrics.relative(), 0.25);
//! ```

use std::collections::VecDeque;

use crate::error::Error;

/// A window holding the last `window_size` bits of a stream verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactWindow {
    window_size: usize,
    // Newest bit at the front.
    bits: VecDeque<bool>,
    ones: u64,
}

impl ExactWindow {
    /// Creates an empty window over the last `window_size` bits.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ConfigInvalid`](crate::error::ErrorKind::ConfigInvalid)
    /// if `window_size` is 0.
    pub fn new(window_size: usize) -> Result<Self, Error> {
        if window_size == 0 {
            return Err(Error::config_invalid("window size must be at least 1")
                .with_context("window_size", window_size));
        }
        Ok(Self {
            window_size,
            bits: VecDeque::new(),
            ones: 0,
        })
    }

    /// Returns the configured window size.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Returns the number of bits currently held, at most the window size.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns true if no bit has been pushed yet.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Pushes the newest bit, dropping the oldest one once the window is full.
    pub fn update(&mut self, bit: bool) {
        if self.bits.len() == self.window_size && self.bits.pop_back() == Some(true) {
            self.ones -= 1;
        }
        self.bits.push_front(bit);
        if bit {
            self.ones += 1;
        }
    }

    /// Returns the exact number of ones in the window.
    pub fn count(&self) -> u64 {
        self.ones
    }

    /// Iterates over the bits in the window, newest first.
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }
}

/// Deviation of an estimate from the exact count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorMetrics {
    absolute: u64,
    relative: f64,
}

impl ErrorMetrics {
    /// Compares `estimate` against `exact`.
    ///
    /// The relative error is the absolute error divided by `exact`, or 0.0
    /// when `exact` is 0.
    pub fn between(estimate: u64, exact: u64) -> Self {
        let absolute = estimate.abs_diff(exact);
        let relative = if exact > 0 {
            absolute as f64 / exact as f64
        } else {
            0.0
        };
        Self { absolute, relative }
    }

    /// Returns `|estimate - exact|`.
    pub fn absolute(&self) -> u64 {
        self.absolute
    }

    /// Returns the absolute error relative to the exact count.
    pub fn relative(&self) -> f64 {
        self.relative
    }
}

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

/// A run of ones compressed into a power-of-two count.
///
/// `age` is the number of ticks since the most recent one of the run
/// arrived (1 for a one that arrived on the current tick). Every one
/// represented by the bucket arrived at or before that position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bucket {
    age: u64,
    size: u64,
}

impl Bucket {
    /// The bucket created for a one arriving on the current tick.
    pub(crate) const fn new_one() -> Self {
        Self { age: 1, size: 1 }
    }

    /// Returns the ticks elapsed since the bucket's newest one arrived.
    pub fn age(&self) -> u64 {
        self.age
    }

    /// Returns the number of ones the bucket represents.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Combines two buckets of equal size into one of twice the size.
    ///
    /// The result keeps the younger of the two ages, since its newest one
    /// is the newer of the two inputs' newest ones.
    ///
    /// # Panics
    ///
    /// Panics if the two buckets differ in size.
    ///
    /// # Examples
    ///
    /// ```
    /// # use windowcount::exphist::Bucket;
    /// # use windowcount::exphist::ExpHistogram;
    /// let mut hist = ExpHistogram::new(8, 4).unwrap();
    /// hist.extend([true, true]);
    /// let snapshot = hist.snapshot();
    /// let merged = Bucket::merge(snapshot[0], snapshot[1]);
    /// assert_eq!(merged.size(), 2);
    /// assert_eq!(merged.age(), 1);
    /// ```
    pub fn merge(a: Bucket, b: Bucket) -> Bucket {
        assert_eq!(a.size, b.size, "only buckets of equal size can be merged");
        Bucket {
            age: a.age.min(b.age),
            size: a.size * 2,
        }
    }

    pub(crate) fn tick(&mut self) {
        self.age += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_younger_age() {
        let older = Bucket { age: 7, size: 4 };
        let newer = Bucket { age: 3, size: 4 };
        assert_eq!(Bucket::merge(older, newer), Bucket { age: 3, size: 8 });
        assert_eq!(Bucket::merge(newer, older), Bucket { age: 3, size: 8 });
    }

    #[test]
    #[should_panic(expected = "only buckets of equal size can be merged")]
    fn test_merge_unequal_sizes_panics() {
        Bucket::merge(Bucket { age: 5, size: 2 }, Bucket { age: 1, size: 1 });
    }

    #[test]
    fn test_tick_ages_bucket() {
        let mut bucket = Bucket::new_one();
        bucket.tick();
        bucket.tick();
        assert_eq!(bucket.age(), 3);
        assert_eq!(bucket.size(), 1);
    }
}

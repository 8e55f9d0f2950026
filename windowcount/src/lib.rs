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

//! Approximate counting of ones in a sliding window over a bit stream.
//!
//! The [`exphist`] module implements the exponential histogram, which
//! answers "how many of the last N bits were one?" with a bounded error in
//! memory logarithmic in N. The [`exact`] module provides a linear-memory
//! baseline to measure that error against, and [`common`] holds
//! reproducible random bit streams for driving both.

pub mod common;
pub mod error;
pub mod exact;
pub mod exphist;

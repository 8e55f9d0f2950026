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

//! Feeds a random bit stream through an exponential histogram and an exact
//! window side by side, printing both counts and the error at every step.
//!
//! ```text
//! cargo run -p demos --bin window_count -- --window-size 40 --err-param 4
//! RUST_LOG=windowcount=trace cargo run -p demos --bin window_count -- --steps 20
//! ```

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use windowcount::common::RandomBits;
use windowcount::common::XorShift64;
use windowcount::exact::ErrorMetrics;
use windowcount::exact::ExactWindow;
use windowcount::exphist::ExpHistogram;

#[derive(Debug, Parser)]
#[command(about = "Approximate the number of ones in a sliding window over a random bit stream")]
struct Args {
    /// Number of most recent bits to count ones in.
    #[arg(long, default_value_t = 40)]
    window_size: u64,

    /// Buckets allowed per size class; a tenth of the window size is a sensible start.
    #[arg(long, default_value_t = 4)]
    err_param: u32,

    /// Number of bits to feed.
    #[arg(long, default_value_t = 2000)]
    steps: u64,

    /// Seed for the bit stream; time based when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Expected number of ones per ten bits.
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(0..=10))]
    ones_per_ten: u8,

    /// Print only the final summary.
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Default)]
struct Summary {
    steps: u64,
    max_absolute: u64,
    sum_relative: f64,
}

impl Summary {
    fn record(&mut self, metrics: ErrorMetrics) {
        self.steps += 1;
        self.max_absolute = self.max_absolute.max(metrics.absolute());
        self.sum_relative += metrics.relative();
    }

    fn mean_relative(&self) -> f64 {
        if self.steps == 0 {
            0.0
        } else {
            self.sum_relative / self.steps as f64
        }
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let rng = match args.seed {
        Some(seed) => XorShift64::seeded(seed),
        None => XorShift64::default(),
    };
    let mut hist = ExpHistogram::new(args.window_size, args.err_param)?;
    let mut exact = ExactWindow::new(usize::try_from(args.window_size)?)?;
    info!(
        window_size = args.window_size,
        err_param = args.err_param,
        steps = args.steps,
        "starting stream"
    );

    let mut summary = Summary::default();
    let bits = RandomBits::new(rng, args.ones_per_ten);
    for (step, bit) in (0..args.steps).zip(bits) {
        exact.update(bit);
        hist.update(bit);
        let metrics = ErrorMetrics::between(hist.estimate(), exact.count());
        summary.record(metrics);
        if !args.quiet {
            print_step(step, bit, &exact, &hist, metrics);
        }
    }

    println!("Steps: {}", summary.steps);
    println!("Buckets at end: {}", hist.num_buckets());
    println!("Maximum absolute error: {}", summary.max_absolute);
    println!("Mean relative error: {:.4}", summary.mean_relative());
    Ok(())
}

fn print_step(
    step: u64,
    bit: bool,
    exact: &ExactWindow,
    hist: &ExpHistogram,
    metrics: ErrorMetrics,
) {
    let padding = exact.window_size() - exact.len();
    let window: Vec<u8> = exact
        .bits()
        .map(u8::from)
        .chain(std::iter::repeat_n(0, padding))
        .collect();
    let buckets: Vec<[u64; 2]> = hist
        .snapshot()
        .iter()
        .map(|b| [b.age(), b.size()])
        .collect();

    println!(
        "Sliding window (newest first): {window:?}  <-  new element: {}",
        u8::from(bit)
    );
    println!("Exact number of ones: {}", exact.count());
    println!("Buckets [age, size]: {buckets:?}");
    println!("Bucket sizes: {:?}", hist.bucket_sizes());
    println!("Estimated number of ones: {}", hist.estimate());
    println!("Absolute error: {}", metrics.absolute());
    println!("Relative error: {:.4}", metrics.relative());
    println!("---------------------------------------- step {step}");
}

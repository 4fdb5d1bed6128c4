// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A restartable wall-clock stopwatch.

use std::time::{Duration, Instant};

/// Measures elapsed wall-clock time between `start`/`restart` and `stop`.
#[derive(Debug, Clone)]
pub struct Stopwatch {
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl Stopwatch {
    /// Creates a stopwatch that is already running.
    pub fn new() -> Self {
        Self {
            started_at: Some(Instant::now()),
            accumulated: Duration::ZERO,
        }
    }

    /// Creates a stopwatch that is not running and reads zero.
    pub fn stopped() -> Self {
        Self {
            started_at: None,
            accumulated: Duration::ZERO,
        }
    }

    /// Resets the elapsed time to zero and starts running.
    pub fn restart(&mut self) {
        self.accumulated = Duration::ZERO;
        self.started_at = Some(Instant::now());
    }

    /// Stops the stopwatch, keeping the elapsed time.
    pub fn stop(&mut self) {
        if let Some(started_at) = self.started_at.take() {
            self.accumulated += started_at.elapsed();
        }
    }

    /// Returns `true` while the stopwatch is running.
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Total elapsed time, including the current run.
    pub fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(started_at) => self.accumulated + started_at.elapsed(),
            None => self.accumulated,
        }
    }

    /// Elapsed whole milliseconds.
    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed().as_millis()
    }

    /// Elapsed seconds, or `None` if the stopwatch never ran.
    pub fn elapsed_secs_f64(&self) -> Option<f64> {
        if self.started_at.is_none() && self.accumulated.is_zero() {
            return None;
        }
        Some(self.elapsed().as_secs_f64())
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

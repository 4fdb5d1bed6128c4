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

//! Metric identifiers and values.

use std::fmt::{self, Display};
use thiserror::Error;

/// A structured identifier for a metric: `namespace:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricId {
    /// The broad category of the metric (e.g., "assets", "scenes").
    pub namespace: String,
    /// The specific name of the metric (e.g., "loaded_total").
    pub name: String,
}

impl MetricId {
    /// Creates a new `MetricId` with a namespace and a name.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)
    }
}

/// The fundamental type of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    /// A value that only ever increases.
    Counter,
    /// A value that can go up or down.
    Gauge,
    /// A distribution of measurements across fixed buckets.
    Histogram,
}

/// The current value of a metric.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// A monotonically increasing count.
    Counter(u64),
    /// A point-in-time value.
    Gauge(f64),
    /// Samples bucketed by upper bound.
    Histogram {
        /// The upper bounds of the buckets.
        bucket_bounds: Vec<f64>,
        /// Sample count per bucket; one extra trailing bucket holds overflow.
        bucket_counts: Vec<u64>,
        /// Number of samples recorded.
        count: u64,
        /// Sum of all samples recorded.
        sum: f64,
    },
}

impl MetricValue {
    /// Creates an empty histogram over `bucket_bounds`.
    pub fn empty_histogram(mut bucket_bounds: Vec<f64>) -> Self {
        bucket_bounds.sort_by(|a, b| a.total_cmp(b));
        let bucket_counts = vec![0; bucket_bounds.len() + 1];
        MetricValue::Histogram {
            bucket_bounds,
            bucket_counts,
            count: 0,
            sum: 0.0,
        }
    }

    /// Returns the [`MetricType`] corresponding to this value.
    pub fn metric_type(&self) -> MetricType {
        match self {
            MetricValue::Counter(_) => MetricType::Counter,
            MetricValue::Gauge(_) => MetricType::Gauge,
            MetricValue::Histogram { .. } => MetricType::Histogram,
        }
    }

    /// Returns the value as a `u64` if it is a `Counter`.
    pub fn as_counter(&self) -> Option<u64> {
        match self {
            MetricValue::Counter(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as an `f64` if it is a `Gauge`.
    pub fn as_gauge(&self) -> Option<f64> {
        match self {
            MetricValue::Gauge(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the number of samples if this is a `Histogram`.
    pub fn sample_count(&self) -> Option<u64> {
        match self {
            MetricValue::Histogram { count, .. } => Some(*count),
            _ => None,
        }
    }
}

/// A specialized `Result` type for metric-related operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// An error that can occur within the metrics system.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    /// The requested metric was not registered.
    #[error("metric not found: {0}")]
    MetricNotFound(MetricId),
    /// An operation was attempted on a metric of the wrong type.
    #[error("type mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch {
        /// The expected metric type for the operation.
        expected: MetricType,
        /// The actual metric type that was found.
        found: MetricType,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_id_formatting() {
        assert_eq!(MetricId::new("assets", "loaded_total").to_string(), "assets:loaded_total");
    }

    #[test]
    fn empty_histogram_sorts_bounds() {
        let value = MetricValue::empty_histogram(vec![100.0, 1.0, 16.0]);
        match value {
            MetricValue::Histogram {
                bucket_bounds,
                bucket_counts,
                ..
            } => {
                assert_eq!(bucket_bounds, vec![1.0, 16.0, 100.0]);
                assert_eq!(bucket_counts.len(), 4);
            }
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn value_accessors() {
        assert_eq!(MetricValue::Counter(3).as_counter(), Some(3));
        assert_eq!(MetricValue::Counter(3).as_gauge(), None);
        assert_eq!(MetricValue::Gauge(1.5).metric_type(), MetricType::Gauge);
    }
}

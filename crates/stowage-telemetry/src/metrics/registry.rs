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

//! Registry for managing metrics.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use stowage_core::telemetry::metrics::{
    MetricId, MetricType, MetricValue, MetricsError, MetricsResult,
};

type Storage = Arc<RwLock<BTreeMap<MetricId, MetricValue>>>;

/// Central registry for stowage metrics.
///
/// Registration is idempotent: registering an id twice returns a handle to
/// the metric registered first. Handles are cheap to clone and update the
/// shared storage directly.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    storage: Storage,
}

impl MetricsRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a counter starting at zero.
    pub fn register_counter(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> CounterHandle {
        let id = self.register(MetricId::new(namespace, name), MetricValue::Counter(0));
        CounterHandle {
            id,
            storage: Arc::clone(&self.storage),
        }
    }

    /// Registers a gauge starting at zero.
    pub fn register_gauge(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> GaugeHandle {
        let id = self.register(MetricId::new(namespace, name), MetricValue::Gauge(0.0));
        GaugeHandle {
            id,
            storage: Arc::clone(&self.storage),
        }
    }

    /// Registers a histogram over the given bucket upper bounds.
    pub fn register_histogram(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        buckets: Vec<f64>,
    ) -> HistogramHandle {
        let id = self.register(
            MetricId::new(namespace, name),
            MetricValue::empty_histogram(buckets),
        );
        HistogramHandle {
            id,
            storage: Arc::clone(&self.storage),
        }
    }

    /// Returns a snapshot of a metric's value.
    pub fn get(&self, id: &MetricId) -> MetricsResult<MetricValue> {
        read(&self.storage)
            .get(id)
            .cloned()
            .ok_or_else(|| MetricsError::MetricNotFound(id.clone()))
    }

    /// Returns a snapshot of every metric in `namespace`.
    pub fn namespace_metrics(&self, namespace: &str) -> Vec<(MetricId, MetricValue)> {
        read(&self.storage)
            .iter()
            .filter(|(id, _)| id.namespace == namespace)
            .map(|(id, value)| (id.clone(), value.clone()))
            .collect()
    }

    /// The number of registered metrics.
    pub fn metric_count(&self) -> usize {
        read(&self.storage).len()
    }

    fn register(&self, id: MetricId, initial: MetricValue) -> MetricId {
        write(&self.storage).entry(id.clone()).or_insert(initial);
        id
    }
}

fn read(storage: &Storage) -> RwLockReadGuard<'_, BTreeMap<MetricId, MetricValue>> {
    storage.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(storage: &Storage) -> RwLockWriteGuard<'_, BTreeMap<MetricId, MetricValue>> {
    storage.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn with_metric<R>(
    storage: &Storage,
    id: &MetricId,
    expected: MetricType,
    f: impl FnOnce(&mut MetricValue) -> R,
) -> MetricsResult<R> {
    let mut guard = write(storage);
    let value = guard
        .get_mut(id)
        .ok_or_else(|| MetricsError::MetricNotFound(id.clone()))?;
    if value.metric_type() != expected {
        return Err(MetricsError::TypeMismatch {
            expected,
            found: value.metric_type(),
        });
    }
    Ok(f(value))
}

/// Handle for counter operations.
#[derive(Debug, Clone)]
pub struct CounterHandle {
    id: MetricId,
    storage: Storage,
}

impl CounterHandle {
    /// Increments the counter by 1, returning the new value.
    pub fn increment(&self) -> MetricsResult<u64> {
        self.increment_by(1)
    }

    /// Increments the counter by `amount`, returning the new value.
    pub fn increment_by(&self, amount: u64) -> MetricsResult<u64> {
        with_metric(&self.storage, &self.id, MetricType::Counter, |value| {
            if let MetricValue::Counter(count) = value {
                *count = count.saturating_add(amount);
                *count
            } else {
                0
            }
        })
    }

    /// The current counter value.
    pub fn get(&self) -> MetricsResult<u64> {
        with_metric(&self.storage, &self.id, MetricType::Counter, |value| {
            value.as_counter().unwrap_or_default()
        })
    }

    /// The metric id.
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}

/// Handle for gauge operations.
#[derive(Debug, Clone)]
pub struct GaugeHandle {
    id: MetricId,
    storage: Storage,
}

impl GaugeHandle {
    /// Sets the gauge.
    pub fn set(&self, new_value: f64) -> MetricsResult<()> {
        with_metric(&self.storage, &self.id, MetricType::Gauge, |value| {
            *value = MetricValue::Gauge(new_value);
        })
    }

    /// Adds `delta` to the gauge, returning the new value.
    pub fn add(&self, delta: f64) -> MetricsResult<f64> {
        with_metric(&self.storage, &self.id, MetricType::Gauge, |value| {
            let next = value.as_gauge().unwrap_or_default() + delta;
            *value = MetricValue::Gauge(next);
            next
        })
    }

    /// The current gauge value.
    pub fn get(&self) -> MetricsResult<f64> {
        with_metric(&self.storage, &self.id, MetricType::Gauge, |value| {
            value.as_gauge().unwrap_or_default()
        })
    }
}

/// Handle for histogram operations.
#[derive(Debug, Clone)]
pub struct HistogramHandle {
    id: MetricId,
    storage: Storage,
}

impl HistogramHandle {
    /// Records one sample.
    pub fn observe(&self, sample: f64) -> MetricsResult<()> {
        with_metric(&self.storage, &self.id, MetricType::Histogram, |value| {
            if let MetricValue::Histogram {
                bucket_bounds,
                bucket_counts,
                count,
                sum,
            } = value
            {
                let bucket = bucket_bounds
                    .iter()
                    .position(|bound| sample <= *bound)
                    .unwrap_or(bucket_bounds.len());
                bucket_counts[bucket] += 1;
                *count += 1;
                *sum += sample;
            }
        })
    }

    /// The number of samples recorded so far.
    pub fn sample_count(&self) -> MetricsResult<u64> {
        with_metric(&self.storage, &self.id, MetricType::Histogram, |value| {
            value.sample_count().unwrap_or_default()
        })
    }

    /// The metric id.
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}

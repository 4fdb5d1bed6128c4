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

//! Load/unload eventing and provider diagnostics.
//!
//! [`Diagnostics`] is the hub the excluded presentation layer listens to. It
//! times loads per key, publishes [`AssetEvent`]s to every subscriber, keeps
//! the asset metrics current and, while enabled, logs provider faults and
//! operation completions without displacing whatever fault handler was
//! installed before it.

use crate::metrics::registry::{CounterHandle, GaugeHandle, HistogramHandle};
use crate::utils::timer::ScopedMetricTimer;
use crate::MetricsRegistry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use stowage_core::event::EventBus;
use stowage_core::provider::{
    CallbackId, ContentProvider, DiagnosticCallback, ExceptionHandler, HandleId, OperationEvent,
    OperationEventKind,
};
use stowage_core::{AssetKey, ProviderError, Stopwatch};

/// A notification about the asset cache's contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetEvent {
    /// The key now has a valid cached handle.
    Loaded(AssetKey),
    /// The key's cached handle was released.
    Unloaded(AssetKey),
}

struct DiagnosticsMetrics {
    loaded_total: CounterHandle,
    unloaded_total: CounterHandle,
    resident: GaugeHandle,
    load_time_ms: HistogramHandle,
    scene_load_time_ms: HistogramHandle,
}

impl DiagnosticsMetrics {
    fn new(registry: &MetricsRegistry) -> Self {
        let buckets = vec![1.0, 5.0, 16.0, 33.0, 100.0, 500.0, 2000.0];
        Self {
            loaded_total: registry.register_counter("assets", "loaded_total"),
            unloaded_total: registry.register_counter("assets", "unloaded_total"),
            resident: registry.register_gauge("assets", "resident"),
            load_time_ms: registry.register_histogram("assets", "load_time", buckets.clone()),
            scene_load_time_ms: registry.register_histogram("scenes", "load_time", buckets),
        }
    }
}

struct InstalledHooks {
    provider: Arc<dyn ContentProvider>,
    previous_handler: Option<ExceptionHandler>,
    callback: CallbackId,
}

/// Timing and eventing hooks for the asset and scene components.
pub struct Diagnostics {
    events: EventBus<AssetEvent>,
    timers: Mutex<HashMap<AssetKey, Stopwatch>>,
    hooks: Mutex<Option<InstalledHooks>>,
    registry: Arc<MetricsRegistry>,
    metrics: DiagnosticsMetrics,
}

impl Diagnostics {
    /// Creates diagnostics with a private metrics registry.
    pub fn new() -> Self {
        Self::with_registry(Arc::new(MetricsRegistry::new()))
    }

    /// Creates diagnostics that record into `registry`.
    pub fn with_registry(registry: Arc<MetricsRegistry>) -> Self {
        let metrics = DiagnosticsMetrics::new(&registry);
        Self {
            events: EventBus::new(),
            timers: Mutex::new(HashMap::new()),
            hooks: Mutex::new(None),
            registry,
            metrics,
        }
    }

    /// The registry the asset metrics are recorded in.
    pub fn metrics_registry(&self) -> &Arc<MetricsRegistry> {
        &self.registry
    }

    /// Returns a receiver for every subsequent [`AssetEvent`].
    pub fn subscribe(&self) -> flume::Receiver<AssetEvent> {
        self.events.subscribe()
    }

    /// Hooks into `provider`: chains a logging fault handler in front of the
    /// one already installed and logs operation completions. Idempotent.
    pub fn enable(&self, provider: &Arc<dyn ContentProvider>) {
        let mut hooks = lock(&self.hooks);
        if hooks.is_some() {
            return;
        }

        let previous_handler = provider.swap_exception_handler(None);
        let chained = previous_handler.clone();
        let wrapper: ExceptionHandler = Arc::new(move |handle: HandleId, error: &ProviderError| {
            log::error!("[Stowage][Fault] {handle}: {error}");
            if let Some(previous) = &chained {
                previous(handle, error);
            }
        });
        provider.swap_exception_handler(Some(wrapper));

        let callback: DiagnosticCallback = Arc::new(|event: &OperationEvent| {
            let phase = match event.kind {
                OperationEventKind::Complete => "Complete",
                OperationEventKind::Failed => "Failed",
            };
            log::debug!("[Stowage][{phase}] {} | Id:{}", event.name, event.handle);
        });
        let callback = provider.register_diagnostic_callback(callback);

        *hooks = Some(InstalledHooks {
            provider: Arc::clone(provider),
            previous_handler,
            callback,
        });
        log::info!("[Stowage] Diagnostics enabled.");
    }

    /// Restores the provider's previous fault handler, removes the completion
    /// callback and forgets every running timer. Idempotent.
    pub fn disable(&self) {
        let Some(hooks) = lock(&self.hooks).take() else {
            return;
        };
        hooks.provider.swap_exception_handler(hooks.previous_handler);
        hooks.provider.unregister_diagnostic_callback(hooks.callback);
        lock(&self.timers).clear();
        log::info!("[Stowage] Diagnostics disabled.");
    }

    /// Returns `true` while hooked into a provider.
    pub fn is_enabled(&self) -> bool {
        lock(&self.hooks).is_some()
    }

    /// Starts (or restarts) the load timer for `key`. Blank keys are ignored.
    pub fn start_timer(&self, key: &AssetKey) {
        if key.is_blank() {
            return;
        }
        lock(&self.timers)
            .entry(key.clone())
            .or_insert_with(Stopwatch::stopped)
            .restart();
    }

    /// Reports that `key` now has a valid cached handle.
    pub fn notify_loaded(&self, key: &AssetKey) {
        if let Some(elapsed_ms) = self.stop_and_log_timer(key, "Loaded") {
            self.record(self.metrics.load_time_ms.observe(elapsed_ms));
        }
        self.record(self.metrics.loaded_total.increment());
        self.record(self.metrics.resident.add(1.0));
        self.events.publish(AssetEvent::Loaded(key.clone()));
    }

    /// Reports that `key`'s cached handle was released.
    pub fn notify_unloaded(&self, key: &AssetKey) {
        self.stop_and_log_timer(key, "Unloaded");
        self.record(self.metrics.unloaded_total.increment());
        self.record(self.metrics.resident.add(-1.0));
        self.events.publish(AssetEvent::Unloaded(key.clone()));
    }

    /// Times a scene transition until the returned guard is dropped.
    pub fn scene_timer(&self) -> ScopedMetricTimer<'_> {
        ScopedMetricTimer::new(&self.metrics.scene_load_time_ms)
    }

    fn stop_and_log_timer(&self, key: &AssetKey, phase: &str) -> Option<f64> {
        let mut stopwatch = lock(&self.timers).remove(key)?;
        let was_running = stopwatch.is_running();
        stopwatch.stop();
        log::info!("[Stowage][{phase}] {key} in {} ms", stopwatch.elapsed_ms());
        was_running.then(|| stopwatch.elapsed().as_secs_f64() * 1000.0)
    }

    fn record<T>(&self, result: stowage_core::telemetry::MetricsResult<T>) {
        if let Err(e) = result {
            log::warn!("[Stowage] Failed to record metric: {e}");
        }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Diagnostics {
    fn drop(&mut self) {
        self.disable();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_core::telemetry::MetricId;

    #[test]
    fn load_and_unload_publish_events() {
        let diagnostics = Diagnostics::new();
        let events = diagnostics.subscribe();
        let key = AssetKey::new("ui/icon");

        diagnostics.notify_loaded(&key);
        diagnostics.notify_unloaded(&key);

        let received: Vec<_> = events.try_iter().collect();
        assert_eq!(
            received,
            vec![AssetEvent::Loaded(key.clone()), AssetEvent::Unloaded(key)]
        );
    }

    #[test]
    fn counters_and_gauge_track_residency() {
        let diagnostics = Diagnostics::new();
        let a = AssetKey::new("ui/a");
        let b = AssetKey::new("ui/b");
        diagnostics.notify_loaded(&a);
        diagnostics.notify_loaded(&b);
        diagnostics.notify_unloaded(&a);

        let registry = diagnostics.metrics_registry();
        let loaded = registry.get(&MetricId::new("assets", "loaded_total")).unwrap();
        let resident = registry.get(&MetricId::new("assets", "resident")).unwrap();
        assert_eq!(loaded.as_counter(), Some(2));
        assert_eq!(resident.as_gauge(), Some(1.0));
    }

    #[test]
    fn timed_load_records_a_sample() {
        let diagnostics = Diagnostics::new();
        let key = AssetKey::new("characters/hero");
        diagnostics.start_timer(&key);
        diagnostics.notify_loaded(&key);

        let load_time = diagnostics
            .metrics_registry()
            .get(&MetricId::new("assets", "load_time"))
            .unwrap();
        assert_eq!(load_time.sample_count(), Some(1));
    }

    #[test]
    fn untimed_load_records_no_sample() {
        let diagnostics = Diagnostics::new();
        diagnostics.notify_loaded(&AssetKey::new("ui/untimed"));
        let load_time = diagnostics
            .metrics_registry()
            .get(&MetricId::new("assets", "load_time"))
            .unwrap();
        assert_eq!(load_time.sample_count(), Some(0));
    }

    #[test]
    fn notifications_forget_the_key_timer() {
        let diagnostics = Diagnostics::new();
        let hero = AssetKey::new("characters/hero");
        let icon = AssetKey::new("ui/icon");
        diagnostics.start_timer(&hero);
        diagnostics.start_timer(&icon);
        assert_eq!(lock(&diagnostics.timers).len(), 2);

        diagnostics.notify_loaded(&hero);
        assert!(!lock(&diagnostics.timers).contains_key(&hero));

        diagnostics.notify_unloaded(&icon);
        assert!(lock(&diagnostics.timers).is_empty());
    }

    #[test]
    fn blank_keys_start_no_timer() {
        let diagnostics = Diagnostics::new();
        diagnostics.start_timer(&AssetKey::new("  "));
        assert!(lock(&diagnostics.timers).is_empty());
    }
}

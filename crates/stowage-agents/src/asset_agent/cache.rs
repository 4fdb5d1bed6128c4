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

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use stowage_core::asset::{ResourceHandle, ResourceKind};
use stowage_core::config::Verbosity;
use stowage_core::provider::{drive, ContentProvider};
use stowage_core::{AssetKey, ContentError, ContentResult};
use stowage_io::{DownloadCoordinator, KeyNormalizer};
use stowage_telemetry::Diagnostics;
use tokio::sync::watch;

type Shared = Option<ContentResult<ResourceHandle>>;

#[derive(Default)]
struct CacheState {
    handles: HashMap<AssetKey, ResourceHandle>,
    loaded: HashSet<AssetKey>,
    in_flight: HashMap<AssetKey, watch::Receiver<Shared>>,
}

enum Lookup {
    Cached(ResourceHandle),
    Wait(watch::Receiver<Shared>),
    Fetch(watch::Sender<Shared>),
}

/// Removes the in-flight entry of a load if its future is dropped early.
struct InFlightEntry<'a> {
    cache: &'a AssetCache,
    key: AssetKey,
    armed: bool,
}

impl Drop for InFlightEntry<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.cache.lock().in_flight.remove(&self.key);
        }
    }
}

/// Loads assets through the provider and keeps at most one live handle per key.
///
/// A key with a valid cached handle is served without touching the provider.
/// A key whose load is already running is not loaded twice: later callers
/// wait for the running load and receive its result, success or failure.
pub struct AssetCache {
    provider: Arc<dyn ContentProvider>,
    downloads: DownloadCoordinator,
    diagnostics: Arc<Diagnostics>,
    verbosity: Verbosity,
    state: Mutex<CacheState>,
}

impl AssetCache {
    /// Creates an empty cache.
    pub fn new(
        provider: Arc<dyn ContentProvider>,
        downloads: DownloadCoordinator,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            provider,
            downloads,
            diagnostics,
            verbosity: Verbosity::Verbose,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Sets how dependency downloads triggered by loads are logged.
    pub fn with_download_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the handle for `key`, loading it as `kind` if it is not cached.
    ///
    /// Missing dependencies are downloaded first. On failure nothing is
    /// cached and the provider handle of the failed load is released.
    /// A handle cached under an incompatible kind is rejected as an invalid key.
    pub async fn load(&self, key: &AssetKey, kind: ResourceKind) -> ContentResult<ResourceHandle> {
        if key.is_blank() {
            return Err(ContentError::InvalidKey {
                key: key.clone(),
                kind: Some(kind),
            });
        }

        loop {
            let (lookup, stale) = self.lookup(key);
            if stale {
                self.diagnostics.notify_unloaded(key);
            }
            match lookup {
                Lookup::Cached(handle) => return check_kind(key, handle, kind),
                Lookup::Fetch(sender) => return self.fetch_and_publish(key, kind, sender).await,
                Lookup::Wait(mut receiver) => {
                    log::debug!("[AssetCache] Waiting for in-flight load of {key}");
                    let outcome = {
                        let changed = receiver.wait_for(Option::is_some).await;
                        changed.ok().and_then(|value| value.clone())
                    };
                    if let Some(result) = outcome {
                        return result.and_then(|handle| check_kind(key, handle, kind));
                    }
                }
            }
        }
    }

    /// Also reports whether a stale handle for `key` was evicted on the way.
    fn lookup(&self, key: &AssetKey) -> (Lookup, bool) {
        let mut state = self.lock();
        let mut stale = false;
        if let Some(handle) = state.handles.get(key) {
            if handle.is_valid() {
                return (Lookup::Cached(handle.clone()), false);
            }
            log::warn!("[AssetCache] Dropping stale handle for {key}");
            state.handles.remove(key);
            stale = state.loaded.remove(key);
        }
        if let Some(receiver) = state.in_flight.get(key) {
            if receiver.has_changed().is_ok() {
                return (Lookup::Wait(receiver.clone()), stale);
            }
            state.in_flight.remove(key);
        }
        let (sender, receiver) = watch::channel(None);
        state.in_flight.insert(key.clone(), receiver);
        (Lookup::Fetch(sender), stale)
    }

    /// Evicts every cached handle that was released behind the cache's back.
    fn evict_stale(&self) {
        let stale: Vec<AssetKey> = {
            let mut state = self.lock();
            let keys: Vec<AssetKey> = state
                .handles
                .iter()
                .filter(|(_, handle)| !handle.is_valid())
                .map(|(key, _)| key.clone())
                .collect();
            let mut evicted = Vec::new();
            for key in keys {
                state.handles.remove(&key);
                if state.loaded.remove(&key) {
                    evicted.push(key);
                }
            }
            evicted
        };
        for key in &stale {
            log::warn!("[AssetCache] Dropping stale handle for {key}");
            self.diagnostics.notify_unloaded(key);
        }
    }

    async fn fetch_and_publish(
        &self,
        key: &AssetKey,
        kind: ResourceKind,
        sender: watch::Sender<Shared>,
    ) -> ContentResult<ResourceHandle> {
        let mut entry = InFlightEntry {
            cache: self,
            key: key.clone(),
            armed: true,
        };
        let result = self.fetch(key, kind).await;

        {
            let mut state = self.lock();
            state.in_flight.remove(key);
            if let Ok(handle) = &result {
                state.handles.insert(key.clone(), handle.clone());
                state.loaded.insert(key.clone());
            }
        }
        entry.armed = false;

        if result.is_ok() {
            self.diagnostics.notify_loaded(key);
        }
        sender.send_replace(Some(result.clone()));
        result
    }

    async fn fetch(&self, key: &AssetKey, kind: ResourceKind) -> ContentResult<ResourceHandle> {
        self.downloads.ensure_downloaded(key, self.verbosity).await?;

        self.diagnostics.start_timer(key);
        let provider_key = KeyNormalizer::normalize(key.as_str());
        let operation = self.provider.load_asset(&provider_key, kind);
        let (guard, result) = drive(&self.provider, operation, |_| {}).await;
        match result {
            Ok(resource) => Ok(ResourceHandle::new(key.clone(), resource, guard)),
            Err(e) => {
                log::error!("[AssetCache] Failed to load {key} as {kind:?}: {e}");
                guard.release();
                Err(ContentError::from_provider(key, e))
            }
        }
    }

    /// Releases the cached handle of `key`.
    ///
    /// Returns `true` (and emits one unloaded event) only if the key was loaded.
    pub fn unload(&self, key: &AssetKey) -> bool {
        let (handle, was_loaded) = {
            let mut state = self.lock();
            (state.handles.remove(key), state.loaded.remove(key))
        };
        if let Some(handle) = handle {
            handle.release();
        }
        if was_loaded {
            log::debug!("[AssetCache] Unloaded {key}");
            self.diagnostics.notify_unloaded(key);
        }
        was_loaded
    }

    /// Releases every cached handle, then reclaims unused provider resources.
    ///
    /// Emits one unloaded event per previously loaded key, in key order.
    pub async fn unload_all(&self) {
        let (handles, mut loaded) = {
            let mut state = self.lock();
            let handles: Vec<ResourceHandle> = state.handles.drain().map(|(_, h)| h).collect();
            let loaded: Vec<AssetKey> = state.loaded.drain().collect();
            (handles, loaded)
        };

        for handle in &handles {
            handle.release();
        }
        loaded.sort();
        for key in &loaded {
            self.diagnostics.notify_unloaded(key);
        }
        log::info!("[AssetCache] Unloaded {} asset(s)", loaded.len());

        self.provider.unload_unused_resources().await;
        self.provider.collect_garbage();
    }

    /// Whether `key` currently has a valid cached handle.
    pub fn is_loaded(&self, key: &str) -> bool {
        self.evict_stale();
        self.lock().loaded.contains(key)
    }

    /// A sorted snapshot of the keys with a valid cached handle.
    pub fn loaded_keys(&self) -> Vec<AssetKey> {
        self.evict_stale();
        let mut keys: Vec<AssetKey> = self.lock().loaded.iter().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of loaded keys.
    pub fn len(&self) -> usize {
        self.evict_stale();
        self.lock().loaded.len()
    }

    /// Whether nothing is loaded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A cached handle only serves requests for a compatible capability.
fn check_kind(key: &AssetKey, handle: ResourceHandle, kind: ResourceKind) -> ContentResult<ResourceHandle> {
    let cached = handle.kind();
    if cached == kind || (cached.is_object_like() && kind.is_object_like()) {
        return Ok(handle);
    }
    log::warn!("[AssetCache] {key} is cached as {cached:?}, not {kind:?}");
    Err(ContentError::InvalidKey {
        key: key.clone(),
        kind: Some(kind),
    })
}

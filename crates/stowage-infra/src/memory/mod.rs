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

//! An in-process [`ContentProvider`] driven by scheduling ticks.

mod locator;
mod operation;

pub use locator::MemoryLocator;

use crate::manifest::{BundleManifest, ContentManifest, EntryManifest, LocatorManifest};
use async_trait::async_trait;
use operation::{Finish, MemoryOperation};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use stowage_core::asset::{LoadedResource, ResourceKind, ResourceLocation, SceneInstance, SceneLoadMode};
use stowage_core::provider::{
    BoxedOperation, CallbackId, ContentProvider, DiagnosticCallback, ExceptionHandler, HandleId,
    ResourceLocator,
};
use stowage_core::{ProviderError, ProviderKey};

/// How many ticks each kind of operation takes to complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickConfig {
    /// Ticks for a dependency download that has bytes to fetch.
    pub download: u32,
    /// Ticks for an asset load.
    pub load: u32,
    /// Ticks for a scene load.
    pub scene: u32,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            download: 4,
            load: 2,
            scene: 3,
        }
    }
}

/// The stage at which an injected failure fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    /// `download_dependencies`.
    Download,
    /// `load_asset`.
    Load,
    /// `load_scene`.
    SceneLoad,
    /// `unload_scene`, keyed by the scene's key.
    SceneUnload,
}

pub(crate) struct ProviderState {
    initialized: bool,
    locators: Vec<Arc<MemoryLocator>>,
    staged_updates: Vec<LocatorManifest>,
    bundles: BTreeMap<String, BundleManifest>,
    handles: BTreeMap<HandleId, String>,
    scenes: BTreeMap<HandleId, SceneInstance>,
    next_handle: u64,
    next_callback: u64,
    failures: HashMap<(FailurePoint, String), String>,
    ticks: TickConfig,
    pub(crate) exception_handler: Option<ExceptionHandler>,
    pub(crate) callbacks: Vec<(CallbackId, DiagnosticCallback)>,
    load_calls: HashMap<String, usize>,
    download_calls: HashMap<String, usize>,
    reclaim_passes: usize,
    collections: usize,
}

impl ProviderState {
    fn entries(&self, key: &ProviderKey) -> Vec<EntryManifest> {
        let mut seen = BTreeSet::new();
        self.locators
            .iter()
            .flat_map(|locator| locator.matching(key).cloned().collect::<Vec<_>>())
            .filter(|entry| seen.insert(entry.key.clone()))
            .collect()
    }

    fn bundles_of(&self, key: &ProviderKey) -> BTreeSet<String> {
        self.entries(key)
            .into_iter()
            .filter_map(|entry| entry.bundle)
            .collect()
    }

    fn pending_bytes(&self, key: &ProviderKey) -> u64 {
        self.bundles_of(key)
            .iter()
            .filter_map(|name| self.bundles.get(name))
            .filter(|bundle| !bundle.cached)
            .map(|bundle| bundle.size)
            .sum()
    }

    fn set_cached(&mut self, bundles: &BTreeSet<String>, cached: bool) {
        for name in bundles {
            if let Some(bundle) = self.bundles.get_mut(name) {
                bundle.cached = cached;
            }
        }
    }

    fn injected(&self, point: FailurePoint, key: &str) -> Result<(), ProviderError> {
        match self.failures.get(&(point, key.to_string())) {
            Some(message) => Err(ProviderError::Failed(message.clone())),
            None => Ok(()),
        }
    }

    fn allocate(&mut self, name: &str) -> HandleId {
        self.next_handle += 1;
        let id = HandleId(self.next_handle);
        self.handles.insert(id, name.to_string());
        id
    }
}

fn kind_accepts(declared: Option<ResourceKind>, requested: ResourceKind) -> bool {
    match declared {
        None => true,
        Some(kind) => {
            kind == requested || (kind.is_object_like() && requested.is_object_like())
        }
    }
}

fn scene_name(internal_id: &str) -> String {
    let file = internal_id.rsplit(['/', '\\']).next().unwrap_or(internal_id);
    match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file.to_string(),
    }
}

/// A content provider that serves a [`ContentManifest`] from memory.
///
/// Every operation allocates a handle that stays live until released, and
/// completes after the number of ticks configured in [`TickConfig`]. Call
/// counters, handle accounting and failure injection make the provider's
/// side of every interaction observable.
pub struct MemoryContentProvider {
    shared: Arc<Mutex<ProviderState>>,
}

impl Default for MemoryContentProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContentProvider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::from_manifest(ContentManifest::default())
    }

    /// Creates a provider serving `manifest`.
    pub fn from_manifest(manifest: ContentManifest) -> Self {
        for bundle in manifest.undeclared_bundles() {
            log::warn!("[MemoryContentProvider] Bundle '{bundle}' is referenced but not declared");
        }
        let state = ProviderState {
            initialized: false,
            locators: manifest
                .locators
                .into_iter()
                .map(|l| Arc::new(MemoryLocator::new(l)))
                .collect(),
            staged_updates: Vec::new(),
            bundles: manifest.bundles,
            handles: BTreeMap::new(),
            scenes: BTreeMap::new(),
            next_handle: 0,
            next_callback: 0,
            failures: HashMap::new(),
            ticks: TickConfig::default(),
            exception_handler: None,
            callbacks: Vec::new(),
            load_calls: HashMap::new(),
            download_calls: HashMap::new(),
            reclaim_passes: 0,
            collections: 0,
        };
        Self {
            shared: Arc::new(Mutex::new(state)),
        }
    }

    /// Reads a RON manifest file and serves it.
    pub fn load_manifest(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Ok(Self::from_manifest(ContentManifest::load_from_file(path)?))
    }

    /// Replaces the tick configuration.
    pub fn with_ticks(self, ticks: TickConfig) -> Self {
        self.state().ticks = ticks;
        self
    }

    fn state(&self) -> MutexGuard<'_, ProviderState> {
        self.shared.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn operation<T, F>(&self, name: String, ticks: u32, total_bytes: u64, finish: F) -> BoxedOperation<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut ProviderState, HandleId) -> Result<T, ProviderError> + Send + 'static,
    {
        let handle = self.state().allocate(&name);
        let finish: Finish<T> = Box::new(finish);
        Box::new(MemoryOperation::new(
            handle,
            name,
            Arc::clone(&self.shared),
            ticks,
            total_bytes,
            finish,
        ))
    }

    /// Registers an additional catalog.
    pub fn add_locator(&self, locator: LocatorManifest) {
        self.state().locators.push(Arc::new(MemoryLocator::new(locator)));
    }

    /// Declares or replaces a remote bundle.
    pub fn add_bundle(&self, name: impl Into<String>, bundle: BundleManifest) {
        self.state().bundles.insert(name.into(), bundle);
    }

    /// Stages a newer version of a catalog, reported by `check_for_catalog_updates`.
    pub fn stage_catalog_update(&self, locator: LocatorManifest) {
        self.state().staged_updates.push(locator);
    }

    /// Makes operations on `key` at `point` fail with `message`.
    pub fn inject_failure(&self, point: FailurePoint, key: impl Into<String>, message: impl Into<String>) {
        self.state()
            .failures
            .insert((point, key.into()), message.into());
    }

    /// Removes an injected failure.
    pub fn clear_failure(&self, point: FailurePoint, key: &str) {
        self.state().failures.remove(&(point, key.to_string()));
    }

    /// Whether `initialize` has completed.
    pub fn is_initialized(&self) -> bool {
        self.state().initialized
    }

    /// Number of handles that are allocated and not yet released.
    pub fn live_handle_count(&self) -> usize {
        self.state().handles.len()
    }

    /// Number of `load_asset` calls issued for `key`.
    pub fn load_calls(&self, key: &str) -> usize {
        self.state().load_calls.get(key).copied().unwrap_or(0)
    }

    /// Number of `download_dependencies` calls issued for `key`.
    pub fn download_calls(&self, key: &str) -> usize {
        self.state().download_calls.get(key).copied().unwrap_or(0)
    }

    /// Number of `unload_unused_resources` passes.
    pub fn reclaim_passes(&self) -> usize {
        self.state().reclaim_passes
    }

    /// Number of `collect_garbage` calls.
    pub fn collections(&self) -> usize {
        self.state().collections
    }

    /// Keys of the scenes currently loaded, in load order.
    pub fn loaded_scenes(&self) -> Vec<String> {
        self.state().scenes.values().map(|s| s.key.clone()).collect()
    }

    /// Whether `bundle` is in the local cache.
    pub fn is_bundle_cached(&self, bundle: &str) -> bool {
        self.state().bundles.get(bundle).is_some_and(|b| b.cached)
    }

    /// Whether an exception handler is installed.
    pub fn has_exception_handler(&self) -> bool {
        self.state().exception_handler.is_some()
    }

    /// Number of registered diagnostic callbacks.
    pub fn diagnostic_callback_count(&self) -> usize {
        self.state().callbacks.len()
    }
}

#[async_trait]
impl ContentProvider for MemoryContentProvider {
    async fn initialize(&self) -> Result<(), ProviderError> {
        let mut state = self.state();
        if !state.initialized {
            state.initialized = true;
            log::info!(
                "[MemoryContentProvider] Initialized with {} catalog(s)",
                state.locators.len()
            );
        }
        Ok(())
    }

    async fn check_for_catalog_updates(&self) -> Result<Vec<String>, ProviderError> {
        let state = self.state();
        if !state.initialized {
            return Err(ProviderError::NotInitialized);
        }
        Ok(state.staged_updates.iter().map(|l| l.id.clone()).collect())
    }

    async fn update_catalogs(&self, catalogs: &[String]) -> Result<(), ProviderError> {
        let mut state = self.state();
        if !state.initialized {
            return Err(ProviderError::NotInitialized);
        }
        for id in catalogs {
            let Some(index) = state.staged_updates.iter().position(|l| &l.id == id) else {
                return Err(ProviderError::Failed(format!("no update staged for catalog '{id}'")));
            };
            let update = Arc::new(MemoryLocator::new(state.staged_updates.remove(index)));
            match state.locators.iter().position(|l| l.id() == id) {
                Some(existing) => state.locators[existing] = update,
                None => state.locators.push(update),
            }
            log::info!("[MemoryContentProvider] Catalog '{id}' updated");
        }
        Ok(())
    }

    fn resource_locators(&self) -> Vec<Arc<dyn ResourceLocator>> {
        let state = self.state();
        if !state.initialized {
            return Vec::new();
        }
        state
            .locators
            .iter()
            .map(|l| Arc::clone(l) as Arc<dyn ResourceLocator>)
            .collect()
    }

    async fn locate(
        &self,
        key: &ProviderKey,
        kind: Option<ResourceKind>,
    ) -> Result<Vec<ResourceLocation>, ProviderError> {
        let state = self.state();
        Ok(state
            .locators
            .iter()
            .filter_map(|locator| locator.locate(key, kind))
            .flatten()
            .collect())
    }

    fn download_size(&self, key: &ProviderKey) -> BoxedOperation<u64> {
        let key = key.clone();
        self.operation(format!("GetDownloadSize({key})"), 1, 0, move |state, _| {
            if state.entries(&key).is_empty() {
                return Err(ProviderError::InvalidKey {
                    key: key.to_string(),
                    kind: None,
                });
            }
            Ok(state.pending_bytes(&key))
        })
    }

    fn download_dependencies(&self, key: &ProviderKey) -> BoxedOperation<()> {
        let (ticks, total) = {
            let mut state = self.state();
            *state.download_calls.entry(key.to_string()).or_default() += 1;
            let total = state.pending_bytes(key);
            (if total == 0 { 1 } else { state.ticks.download }, total)
        };
        let key = key.clone();
        self.operation(format!("DownloadDependencies({key})"), ticks, total, move |state, _| {
            state.injected(FailurePoint::Download, &key.to_string())?;
            let bundles = state.bundles_of(&key);
            if state.entries(&key).is_empty() {
                return Err(ProviderError::InvalidKey {
                    key: key.to_string(),
                    kind: None,
                });
            }
            state.set_cached(&bundles, true);
            Ok(())
        })
    }

    fn load_asset(&self, key: &ProviderKey, kind: ResourceKind) -> BoxedOperation<LoadedResource> {
        let ticks = {
            let mut state = self.state();
            *state.load_calls.entry(key.to_string()).or_default() += 1;
            state.ticks.load
        };
        let key = key.clone();
        self.operation(format!("LoadAsset<{kind:?}>({key})"), ticks, 0, move |state, _| {
            state.injected(FailurePoint::Load, &key.to_string())?;
            let entry = state
                .entries(&key)
                .into_iter()
                .find(|entry| kind_accepts(entry.kind, kind))
                .ok_or_else(|| ProviderError::InvalidKey {
                    key: key.to_string(),
                    kind: Some(kind),
                })?;
            if let Some(bundle) = &entry.bundle {
                state.set_cached(&BTreeSet::from([bundle.clone()]), true);
            }
            Ok(LoadedResource {
                kind,
                internal_id: entry.internal_id,
                bytes: entry.payload.into_bytes(),
            })
        })
    }

    fn load_scene(&self, key: &ProviderKey, mode: SceneLoadMode) -> BoxedOperation<SceneInstance> {
        let ticks = self.state().ticks.scene;
        let key = key.clone();
        self.operation(format!("LoadScene({key})"), ticks, 0, move |state, handle| {
            state.injected(FailurePoint::SceneLoad, &key.to_string())?;
            let entry = state
                .entries(&key)
                .into_iter()
                .find(|entry| entry.kind == Some(ResourceKind::Scene))
                .ok_or_else(|| ProviderError::InvalidKey {
                    key: key.to_string(),
                    kind: Some(ResourceKind::Scene),
                })?;
            let scene = SceneInstance {
                key: entry.key.clone(),
                name: scene_name(&entry.internal_id),
                mode,
            };
            state.scenes.insert(handle, scene.clone());
            Ok(scene)
        })
    }

    fn unload_scene(&self, scene: HandleId) -> BoxedOperation<()> {
        self.operation(format!("UnloadScene({scene})"), 1, 0, move |state, _| {
            let key = state
                .scenes
                .get(&scene)
                .map(|s| s.key.clone())
                .ok_or(ProviderError::InvalidHandle(scene))?;
            state.injected(FailurePoint::SceneUnload, &key)?;
            state.scenes.remove(&scene);
            Ok(())
        })
    }

    fn clear_dependency_cache(&self, key: &ProviderKey) -> BoxedOperation<()> {
        let key = key.clone();
        self.operation(format!("ClearDependencyCache({key})"), 1, 0, move |state, _| {
            let bundles = state.bundles_of(&key);
            state.set_cached(&bundles, false);
            Ok(())
        })
    }

    fn release(&self, handle: HandleId) {
        let mut state = self.state();
        if let Some(name) = state.handles.remove(&handle) {
            if let Some(scene) = state.scenes.remove(&handle) {
                log::debug!("[MemoryContentProvider] Releasing {handle} unloaded scene '{}'", scene.key);
            }
            log::trace!("[MemoryContentProvider] Released {handle} ({name})");
        }
    }

    fn is_valid(&self, handle: HandleId) -> bool {
        self.state().handles.contains_key(&handle)
    }

    async fn unload_unused_resources(&self) {
        let mut state = self.state();
        state.reclaim_passes += 1;
        log::debug!(
            "[MemoryContentProvider] Reclaim pass {} ({} live handle(s))",
            state.reclaim_passes,
            state.handles.len()
        );
    }

    fn collect_garbage(&self) {
        self.state().collections += 1;
    }

    fn swap_exception_handler(&self, handler: Option<ExceptionHandler>) -> Option<ExceptionHandler> {
        std::mem::replace(&mut self.state().exception_handler, handler)
    }

    fn register_diagnostic_callback(&self, callback: DiagnosticCallback) -> CallbackId {
        let mut state = self.state();
        state.next_callback += 1;
        let id = CallbackId(state.next_callback);
        state.callbacks.push((id, callback));
        id
    }

    fn unregister_diagnostic_callback(&self, id: CallbackId) {
        self.state().callbacks.retain(|(existing, _)| *existing != id);
    }
}

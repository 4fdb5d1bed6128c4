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

use std::sync::{Arc, Mutex, MutexGuard};
use stowage_core::asset::{ResourceKind, SceneInstance, SceneLoadMode};
use stowage_core::config::ProgressSplit;
use stowage_core::provider::{drive, ContentProvider, HandleGuard};
use stowage_core::{AssetKey, ContentError, ContentResult, Stopwatch};
use stowage_io::{DownloadCoordinator, DownloadOutcome, KeyNormalizer};
use stowage_telemetry::Diagnostics;
use tokio::sync::watch;

/// Where a scene transition currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneState {
    /// No transition is running. A previous scene may still be active.
    #[default]
    Idle,
    /// Fetching the scene's dependency bundle.
    Downloading,
    /// Loading and activating the scene.
    Loading,
    /// The last transition completed and its scene is current.
    Active,
}

struct ActiveScene {
    guard: HandleGuard,
    instance: SceneInstance,
}

#[derive(Default)]
struct SceneSlot {
    state: SceneState,
    current: Option<ActiveScene>,
}

/// Keeps exactly one scene active and reports unified transition progress.
///
/// A new scene is activated before the previous one is unloaded, so there
/// is never a moment without an active scene. If the new scene fails, the
/// previous one stays current.
pub struct SceneTransitionManager {
    provider: Arc<dyn ContentProvider>,
    downloads: DownloadCoordinator,
    diagnostics: Arc<Diagnostics>,
    split: ProgressSplit,
    slot: Mutex<SceneSlot>,
    progress: watch::Sender<f32>,
}

impl SceneTransitionManager {
    /// Creates a manager with no active scene.
    pub fn new(
        provider: Arc<dyn ContentProvider>,
        downloads: DownloadCoordinator,
        diagnostics: Arc<Diagnostics>,
        split: ProgressSplit,
    ) -> Self {
        let (progress, _) = watch::channel(0.0);
        Self {
            provider,
            downloads,
            diagnostics,
            split,
            slot: Mutex::new(SceneSlot::default()),
            progress,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SceneSlot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Unified transition progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        *self.progress.borrow()
    }

    /// A receiver that observes every progress update.
    pub fn watch_progress(&self) -> watch::Receiver<f32> {
        self.progress.subscribe()
    }

    /// The current transition state.
    pub fn state(&self) -> SceneState {
        self.lock().state
    }

    /// The active scene, if any.
    pub fn current_scene(&self) -> Option<SceneInstance> {
        self.lock().current.as_ref().map(|active| active.instance.clone())
    }

    /// Whether `key` locates as a scene.
    pub async fn is_scene_key(&self, key: &AssetKey) -> ContentResult<bool> {
        if key.is_blank() {
            return Ok(false);
        }
        let locations = self
            .provider
            .locate(&KeyNormalizer::normalize(key.as_str()), Some(ResourceKind::Scene))
            .await
            .map_err(|e| ContentError::from_provider(key, e))?;
        Ok(!locations.is_empty())
    }

    /// Downloads, loads and activates `key`, then unloads the scene it replaces.
    ///
    /// Blank and non-scene keys are rejected before any transfer. A failed
    /// download or load resets progress to 0 and leaves the previous scene
    /// current. A failure while unloading the replaced scene is only logged.
    pub async fn load_scene(&self, key: &AssetKey, mode: SceneLoadMode) -> ContentResult<SceneInstance> {
        if !self.is_scene_key(key).await? {
            log::error!("[SceneLoader] '{key}' is not a scene key");
            return Err(ContentError::InvalidKey {
                key: key.clone(),
                kind: Some(ResourceKind::Scene),
            });
        }

        let _timer = self.diagnostics.scene_timer();
        let stopwatch = Stopwatch::new();
        self.enter(SceneState::Downloading, 0.0);

        let split = self.split;
        let downloaded = match self
            .downloads
            .ensure_downloaded_with_progress(key, |status| {
                self.publish(split.download_progress(status.percent()));
            })
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.fail(key, e)),
        };

        self.enter(SceneState::Loading, split.load_progress(0.0));
        let provider_key = KeyNormalizer::normalize(key.as_str());
        let operation = self.provider.load_scene(&provider_key, mode);
        let (guard, result) = drive(&self.provider, operation, |op| {
            self.publish(split.load_progress(op.percent_complete()));
        })
        .await;

        let instance = match result {
            Ok(instance) => instance,
            Err(e) => {
                guard.release();
                return Err(self.fail(key, ContentError::from_provider(key, e)));
            }
        };

        let previous = {
            let mut slot = self.lock();
            slot.state = SceneState::Active;
            slot.current.replace(ActiveScene {
                guard,
                instance: instance.clone(),
            })
        };
        self.publish(1.0);

        let bytes = match downloaded {
            DownloadOutcome::AlreadyCached => 0,
            DownloadOutcome::Downloaded { bytes, .. } => bytes,
        };
        log::info!(
            "[SceneLoader] Loaded '{key}' in {} ms; deps: {bytes} bytes",
            stopwatch.elapsed_ms()
        );

        if let Some(previous) = previous {
            let previous_key = AssetKey::new(&previous.instance.key);
            if let Err(e) = self.unload(previous).await {
                log::warn!("[SceneLoader] Could not unload previous scene '{previous_key}': {e}");
            }
        }
        Ok(instance)
    }

    /// Unloads the active scene, if any, and reclaims unused provider resources.
    pub async fn unload_current_scene(&self) -> ContentResult<()> {
        let current = {
            let mut slot = self.lock();
            slot.state = SceneState::Idle;
            slot.current.take()
        };
        let Some(current) = current else {
            return Ok(());
        };
        self.publish(0.0);

        let result = self.unload(current).await;
        self.provider.unload_unused_resources().await;
        self.provider.collect_garbage();
        result
    }

    async fn unload(&self, scene: ActiveScene) -> ContentResult<()> {
        let key = AssetKey::new(&scene.instance.key);
        if !scene.guard.is_valid() {
            return Ok(());
        }
        let operation = self.provider.unload_scene(scene.guard.id());
        let (unload_guard, result) = drive(&self.provider, operation, |_| {}).await;
        unload_guard.release();
        scene.guard.release();
        result.map_err(|e| ContentError::Cleanup {
            key,
            message: e.to_string(),
        })
    }

    fn enter(&self, state: SceneState, progress: f32) {
        self.lock().state = state;
        self.publish(progress);
    }

    fn publish(&self, progress: f32) {
        self.progress.send_replace(progress.clamp(0.0, 1.0));
    }

    fn fail(&self, key: &AssetKey, error: ContentError) -> ContentError {
        log::error!("[SceneLoader] Failed to load '{key}': {error}");
        self.enter(SceneState::Idle, 0.0);
        error
    }
}

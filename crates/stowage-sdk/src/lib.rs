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

//! The public-facing entry point of stowage.
//!
//! [`ContentSystem`] builds every component from a [`StowageConfig`] and a
//! content provider, sharing one cache, one probe and one diagnostics hub
//! between them.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use stowage_agents::{AssetCache, ImageSwapCoordinator, ObjectSwapCoordinator, SceneTransitionManager};
use stowage_core::provider::ContentProvider;
use stowage_core::StowageConfig;
use stowage_io::{DownloadCoordinator, KeyCatalog, KeyFilter, ProviderInitializer, TypeProbe};
use stowage_telemetry::{Diagnostics, MetricsRegistry};

pub mod prelude {
    pub use stowage_agents::{
        derive_slot_id, ImageAnchor, ImageAsset, ObjectAnchor, ObjectAsset, SceneState, SwapAnchor,
        SwapOutcome,
    };
    pub use stowage_core::asset::{ResourceHandle, ResourceKind, SceneInstance, SceneLoadMode};
    pub use stowage_core::config::{ProgressSplit, Verbosity};
    pub use stowage_core::{AssetKey, ContentError, ContentResult, StowageConfig};
    pub use stowage_io::{DownloadOutcome, KeyGroup, KeyNormalizer, ProbeResult};
    pub use stowage_telemetry::AssetEvent;
}

/// Every stowage component, wired to one provider.
pub struct ContentSystem {
    config: StowageConfig,
    provider: Arc<dyn ContentProvider>,
    metrics: Arc<MetricsRegistry>,
    diagnostics: Arc<Diagnostics>,
    initializer: ProviderInitializer,
    downloads: DownloadCoordinator,
    catalog: KeyCatalog,
    probe: Arc<TypeProbe>,
    cache: Arc<AssetCache>,
    scenes: SceneTransitionManager,
    images: ImageSwapCoordinator,
    objects: ObjectSwapCoordinator,
}

impl ContentSystem {
    /// Builds the system described by `config` on top of `provider`.
    pub fn new(provider: Arc<dyn ContentProvider>, config: StowageConfig) -> Self {
        let metrics = Arc::new(MetricsRegistry::new());
        let diagnostics = Arc::new(Diagnostics::with_registry(Arc::clone(&metrics)));
        let downloads = DownloadCoordinator::new(Arc::clone(&provider));
        let probe = Arc::new(TypeProbe::from_config(Arc::clone(&provider), &config));
        let cache = Arc::new(
            AssetCache::new(
                Arc::clone(&provider),
                downloads.clone(),
                Arc::clone(&diagnostics),
            )
            .with_download_verbosity(config.download_verbosity),
        );

        Self {
            initializer: ProviderInitializer::new(Arc::clone(&provider)),
            catalog: KeyCatalog::new(Arc::clone(&provider), KeyFilter::from_config(&config)),
            scenes: SceneTransitionManager::new(
                Arc::clone(&provider),
                downloads.clone(),
                Arc::clone(&diagnostics),
                config.progress,
            ),
            images: ImageSwapCoordinator::new(Arc::clone(&cache), Arc::clone(&probe)),
            objects: ObjectSwapCoordinator::new(Arc::clone(&cache), Arc::clone(&probe)),
            downloads,
            probe,
            cache,
            diagnostics,
            metrics,
            provider,
            config,
        }
    }

    /// Builds the system from a TOML configuration file.
    pub fn from_config_file(provider: Arc<dyn ContentProvider>, path: impl AsRef<Path>) -> Result<Self> {
        let config = StowageConfig::load_from_file(path.as_ref())
            .context("Failed to configure the content system")?;
        Ok(Self::new(provider, config))
    }

    /// Enables diagnostics, then initializes the provider and applies catalog
    /// updates. Initialization failures are logged, not returned.
    ///
    /// Returns `true` if initialization succeeded.
    pub async fn bootstrap(&self) -> bool {
        self.diagnostics.enable(&self.provider);
        match self.initializer.initialize_and_update_catalogs().await {
            Ok(updated) => {
                log::info!(
                    "[ContentSystem] Ready ({} catalog update(s))",
                    updated.len()
                );
                true
            }
            Err(e) => {
                log::error!("[ContentSystem] Initialization failed: {e}");
                false
            }
        }
    }

    /// Unhooks diagnostics from the provider.
    pub fn shutdown(&self) {
        self.diagnostics.disable();
    }

    /// The configuration the system was built from.
    pub fn config(&self) -> &StowageConfig {
        &self.config
    }

    /// The underlying provider.
    pub fn provider(&self) -> &Arc<dyn ContentProvider> {
        &self.provider
    }

    /// The metrics recorded by the diagnostics hub.
    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// The diagnostics hub.
    pub fn diagnostics(&self) -> &Arc<Diagnostics> {
        &self.diagnostics
    }

    /// The dependency download coordinator.
    pub fn downloads(&self) -> &DownloadCoordinator {
        &self.downloads
    }

    /// The key catalog.
    pub fn catalog(&self) -> &KeyCatalog {
        &self.catalog
    }

    /// The capability probe.
    pub fn probe(&self) -> &TypeProbe {
        &self.probe
    }

    /// The asset cache.
    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    /// The scene transition manager.
    pub fn scenes(&self) -> &SceneTransitionManager {
        &self.scenes
    }

    /// Image overrides.
    pub fn images(&self) -> &ImageSwapCoordinator {
        &self.images
    }

    /// Object overrides.
    pub fn objects(&self) -> &ObjectSwapCoordinator {
        &self.objects
    }
}

impl Drop for ContentSystem {
    fn drop(&mut self) {
        self.shutdown();
    }
}

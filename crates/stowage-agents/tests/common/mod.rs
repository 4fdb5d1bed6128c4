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

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use stowage_agents::{AssetCache, SceneTransitionManager};
use stowage_core::asset::ResourceKind;
use stowage_core::config::ProgressSplit;
use stowage_core::provider::ContentProvider;
use stowage_core::StowageConfig;
use stowage_infra::{
    BundleManifest, ContentManifest, EntryManifest, LocatorManifest, MemoryContentProvider,
    TickConfig,
};
use stowage_io::{DownloadCoordinator, TypeProbe};
use stowage_telemetry::Diagnostics;

pub fn manifest() -> ContentManifest {
    let bundle = |size, cached| BundleManifest { size, cached };
    ContentManifest {
        bundles: BTreeMap::from([
            ("characters".to_string(), bundle(2048, false)),
            ("ui".to_string(), bundle(256, true)),
            ("level1".to_string(), bundle(1000, false)),
            ("level2".to_string(), bundle(1000, false)),
        ]),
        locators: vec![LocatorManifest {
            id: "main".into(),
            entries: vec![
                EntryManifest::new("characters/hero", Some(ResourceKind::Object), "Assets/Hero.prefab")
                    .in_bundle("characters")
                    .with_numeric_id(42)
                    .with_payload("hero"),
                EntryManifest::new(
                    "characters/hero/outfit_a",
                    Some(ResourceKind::Object),
                    "Assets/Outfits/A.prefab",
                )
                .in_bundle("characters"),
                EntryManifest::new("characters/hero/outfit_b", None, "Assets/Outfits/B.prefab"),
                EntryManifest::new(
                    "effects/spark/trail",
                    Some(ResourceKind::Object),
                    "Assets/Effects/Trail.prefab",
                ),
                EntryManifest::new("ui/icon", Some(ResourceKind::Image), "Assets/UI/Icon.png")
                    .in_bundle("ui"),
                EntryManifest::new("ui/icons/gem", Some(ResourceKind::Image), "Assets/UI/Gem.png")
                    .in_bundle("ui"),
                EntryManifest::new("scenes/level1", Some(ResourceKind::Scene), "Assets/Scenes/Level1.unity")
                    .in_bundle("level1"),
                EntryManifest::new("scenes/level2", Some(ResourceKind::Scene), "Assets/Scenes/Level2.unity")
                    .in_bundle("level2"),
            ],
        }],
    }
}

pub struct Fixture {
    pub concrete: Arc<MemoryContentProvider>,
    pub provider: Arc<dyn ContentProvider>,
    pub diagnostics: Arc<Diagnostics>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_ticks(TickConfig::default())
    }

    pub fn with_ticks(ticks: TickConfig) -> Self {
        let concrete = Arc::new(MemoryContentProvider::from_manifest(manifest()).with_ticks(ticks));
        let provider: Arc<dyn ContentProvider> = concrete.clone();
        Self {
            concrete,
            provider,
            diagnostics: Arc::new(Diagnostics::new()),
        }
    }

    pub fn downloads(&self) -> DownloadCoordinator {
        DownloadCoordinator::new(Arc::clone(&self.provider))
    }

    pub fn cache(&self) -> AssetCache {
        AssetCache::new(
            Arc::clone(&self.provider),
            self.downloads(),
            Arc::clone(&self.diagnostics),
        )
    }

    pub fn scenes(&self) -> SceneTransitionManager {
        SceneTransitionManager::new(
            Arc::clone(&self.provider),
            self.downloads(),
            Arc::clone(&self.diagnostics),
            ProgressSplit::default(),
        )
    }

    pub fn probe(&self) -> Arc<TypeProbe> {
        Arc::new(TypeProbe::from_config(
            Arc::clone(&self.provider),
            &StowageConfig::default(),
        ))
    }
}

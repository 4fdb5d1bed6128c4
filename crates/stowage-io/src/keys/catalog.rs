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

use super::KeyFilter;
use std::collections::HashSet;
use std::sync::Arc;
use stowage_core::asset::ResourceKind;
use stowage_core::provider::ContentProvider;
use stowage_core::ProviderError;

/// Enumerates the keys known to every resource locator.
pub struct KeyCatalog {
    provider: Arc<dyn ContentProvider>,
    filter: KeyFilter,
}

impl KeyCatalog {
    /// Creates a catalog over `provider`, listing only keys `filter` accepts.
    pub fn new(provider: Arc<dyn ContentProvider>, filter: KeyFilter) -> Self {
        Self { provider, filter }
    }

    /// The filter applied to listed keys.
    pub fn filter(&self) -> &KeyFilter {
        &self.filter
    }

    /// Every listable primary key, deduplicated and sorted ignoring case.
    pub async fn all_keys(&self) -> Result<Vec<String>, ProviderError> {
        self.collect(None, |key| self.filter.is_listable(key)).await
    }

    /// The keys offered to asset-picking consumers.
    pub async fn asset_keys(&self) -> Result<Vec<String>, ProviderError> {
        self.all_keys().await
    }

    /// Every key that locates as a scene, regardless of the allow-list.
    pub async fn scene_keys(&self) -> Result<Vec<String>, ProviderError> {
        self.collect(Some(ResourceKind::Scene), |_| true).await
    }

    async fn collect(
        &self,
        kind: Option<ResourceKind>,
        accept: impl Fn(&str) -> bool,
    ) -> Result<Vec<String>, ProviderError> {
        self.provider.initialize().await?;

        let mut unique = HashSet::new();
        let mut keys = Vec::new();
        for locator in self.provider.resource_locators() {
            for key in locator.keys() {
                let Some(locations) = locator.locate(&key, kind) else {
                    continue;
                };
                for location in locations {
                    let primary = location.primary_key;
                    if primary.is_empty() || !accept(&primary) {
                        continue;
                    }
                    if unique.insert(primary.clone()) {
                        keys.push(primary);
                    }
                }
            }
        }

        keys.sort_by_key(|key| key.to_lowercase());
        log::debug!("[KeyCatalog] Listed {} key(s) ({kind:?})", keys.len());
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_infra::{ContentManifest, EntryManifest, LocatorManifest, MemoryContentProvider};

    const HASH: &str = "0123456789abcdef0123456789abcdef";

    fn catalog() -> KeyCatalog {
        let manifest = ContentManifest {
            locators: vec![
                LocatorManifest {
                    id: "main".into(),
                    entries: vec![
                        EntryManifest::new("ui/Zebra", Some(ResourceKind::Image), "Zebra.png"),
                        EntryManifest::new("characters/hero", Some(ResourceKind::Object), "Hero.prefab")
                            .with_alias(HASH)
                            .with_label("heroes"),
                        EntryManifest::new("internal/shader", None, "Shader.bin"),
                        EntryManifest::new("scenes/level1", Some(ResourceKind::Scene), "Level1.unity"),
                        EntryManifest::new(HASH, None, "orphan.bin"),
                    ],
                },
                LocatorManifest {
                    id: "dlc".into(),
                    entries: vec![
                        EntryManifest::new("ui/apple", Some(ResourceKind::Image), "Apple.png"),
                        EntryManifest::new("UI/Apple", Some(ResourceKind::Image), "Apple2.png"),
                        EntryManifest::new("ui/Zebra", Some(ResourceKind::Image), "Zebra.png"),
                    ],
                },
            ],
            ..Default::default()
        };
        KeyCatalog::new(
            Arc::new(MemoryContentProvider::from_manifest(manifest)),
            KeyFilter::default(),
        )
    }

    #[tokio::test]
    async fn lists_allowed_keys_once_sorted_ignoring_case() {
        let keys = catalog().all_keys().await.unwrap();
        assert_eq!(
            keys,
            ["characters/hero", "scenes/level1", "ui/apple", "UI/Apple", "ui/Zebra"]
        );
    }

    #[tokio::test]
    async fn never_lists_filtered_or_hash_keys() {
        let catalog = catalog();
        let keys = catalog.all_keys().await.unwrap();
        assert!(keys.iter().all(|k| catalog.filter().is_allowed(k)));
        assert!(!keys.iter().any(|k| k == HASH || k == "internal/shader"));
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
    }

    #[tokio::test]
    async fn scene_keys_only_list_scenes() {
        let scenes = catalog().scene_keys().await.unwrap();
        assert_eq!(scenes, vec!["scenes/level1".to_string()]);
    }
}

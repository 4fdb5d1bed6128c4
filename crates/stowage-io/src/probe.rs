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

//! Capability probing and fuzzy key search.

use crate::keys::KeyFilter;
use std::collections::HashSet;
use std::sync::Arc;
use stowage_core::asset::{ResourceKind, ResourceLocation};
use stowage_core::provider::ContentProvider;
use stowage_core::{ProviderError, ProviderKey, StowageConfig};

/// Which structural capabilities a key resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProbeResult {
    /// The key has at least one displayable-image location.
    pub has_image: bool,
    /// The key has at least one composable-object location.
    pub has_object: bool,
}

/// Answers "what is this key" questions against the provider's locators.
pub struct TypeProbe {
    provider: Arc<dyn ContentProvider>,
    filter: KeyFilter,
    object_extension: String,
    fuzzy_limit: usize,
}

impl TypeProbe {
    /// Creates a probe with the default object extension and fuzzy limit.
    pub fn new(provider: Arc<dyn ContentProvider>, filter: KeyFilter) -> Self {
        let defaults = StowageConfig::default();
        Self {
            provider,
            filter,
            object_extension: defaults.object_extension,
            fuzzy_limit: defaults.fuzzy_limit,
        }
    }

    /// Creates a probe configured by `config`.
    pub fn from_config(provider: Arc<dyn ContentProvider>, config: &StowageConfig) -> Self {
        Self {
            provider,
            filter: KeyFilter::from_config(config),
            object_extension: config.object_extension.clone(),
            fuzzy_limit: config.fuzzy_limit,
        }
    }

    /// Probes `key` with an image-typed, an object-typed and an untyped lookup.
    ///
    /// An object match is accepted when the declared type is object-like or
    /// the backing path carries the object file extension, since declared
    /// types are not always recorded. A blank key probes as nothing.
    pub async fn probe_exact(&self, key: &ProviderKey) -> Result<ProbeResult, ProviderError> {
        if key.is_empty() {
            return Ok(ProbeResult::default());
        }
        self.provider.initialize().await?;

        let objects = self.provider.locate(key, Some(ResourceKind::Object)).await?;
        let untyped = self.provider.locate(key, None).await?;
        let images = self.provider.locate(key, Some(ResourceKind::Image)).await?;

        let result = ProbeResult {
            has_image: !images.is_empty(),
            has_object: self.has_object(&objects) || self.has_object(&untyped),
        };
        log::trace!("[TypeProbe] {key}: {result:?}");
        Ok(result)
    }

    /// Allowed keys containing `fragment` (ignoring case) that resolve to objects.
    ///
    /// Collection stops at the configured limit. Results are ranked: keys
    /// starting with the fragment first, then by how close their length is
    /// to the fragment's, then shortest first.
    pub async fn find_fuzzy_object_keys(&self, fragment: &str) -> Result<Vec<String>, ProviderError> {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return Ok(Vec::new());
        }
        self.provider.initialize().await?;

        let needle = fragment.to_lowercase();
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        'locators: for locator in self.provider.resource_locators() {
            for key in locator.keys() {
                let text = key.to_string();
                if text.is_empty() || !self.filter.is_allowed(&text) {
                    continue;
                }
                if !text.to_lowercase().contains(&needle) || seen.contains(&text) {
                    continue;
                }
                let is_object = locator
                    .locate(&key, Some(ResourceKind::Object))
                    .is_some_and(|locations| self.has_object(&locations))
                    || locator
                        .locate(&key, None)
                        .is_some_and(|locations| self.has_object(&locations));
                if is_object {
                    seen.insert(text.clone());
                    found.push(text);
                    if found.len() >= self.fuzzy_limit {
                        break 'locators;
                    }
                }
            }
        }

        rank_by_fragment(&mut found, fragment);
        Ok(found)
    }

    fn has_object(&self, locations: &[ResourceLocation]) -> bool {
        locations.iter().any(|location| {
            location.resource_type.is_some_and(ResourceKind::is_object_like)
                || location.has_extension(&self.object_extension)
        })
    }
}

fn rank_by_fragment(keys: &mut [String], fragment: &str) {
    let prefix = fragment.to_lowercase();
    let fragment_len = fragment.chars().count();
    keys.sort_by_key(|key| {
        let len = key.chars().count();
        (
            !key.to_lowercase().starts_with(&prefix),
            len.abs_diff(fragment_len),
            len,
        )
    });
}

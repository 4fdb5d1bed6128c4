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

use crate::manifest::{EntryManifest, LocatorManifest};
use stowage_core::asset::{ResourceKind, ResourceLocation};
use stowage_core::provider::ResourceLocator;
use stowage_core::ProviderKey;

/// A [`ResourceLocator`] over one in-memory catalog.
#[derive(Debug, Clone)]
pub struct MemoryLocator {
    id: String,
    entries: Vec<EntryManifest>,
}

impl MemoryLocator {
    /// Builds a locator from its manifest.
    pub fn new(manifest: LocatorManifest) -> Self {
        Self {
            id: manifest.id,
            entries: manifest.entries,
        }
    }

    /// The entries whose primary key, alias, label or numeric id is `key`.
    pub(crate) fn matching(&self, key: &ProviderKey) -> impl Iterator<Item = &EntryManifest> + '_ {
        let key = key.clone();
        self.entries.iter().filter(move |entry| match &key {
            ProviderKey::Int(v) => entry.numeric_ids.contains(&i64::from(*v)),
            ProviderKey::Long(v) => entry.numeric_ids.contains(v),
            ProviderKey::Str(s) => {
                entry.key == *s
                    || entry.aliases.iter().any(|a| a == s)
                    || entry.labels.iter().any(|l| l == s)
            }
        })
    }
}

fn accepts(entry: &EntryManifest, kind: Option<ResourceKind>) -> bool {
    match kind {
        None => true,
        Some(requested) => entry.kind == Some(requested),
    }
}

impl ResourceLocator for MemoryLocator {
    fn id(&self) -> &str {
        &self.id
    }

    fn keys(&self) -> Vec<ProviderKey> {
        let mut keys = Vec::new();
        for entry in &self.entries {
            keys.push(ProviderKey::Str(entry.key.clone()));
            keys.extend(entry.aliases.iter().cloned().map(ProviderKey::Str));
            keys.extend(entry.labels.iter().cloned().map(ProviderKey::Str));
            keys.extend(entry.numeric_ids.iter().map(|&id| match i32::try_from(id) {
                Ok(small) => ProviderKey::Int(small),
                Err(_) => ProviderKey::Long(id),
            }));
        }
        keys
    }

    fn locate(
        &self,
        key: &ProviderKey,
        kind: Option<ResourceKind>,
    ) -> Option<Vec<ResourceLocation>> {
        let found: Vec<ResourceLocation> = self
            .matching(key)
            .filter(|entry| accepts(entry, kind))
            .map(|entry| ResourceLocation {
                primary_key: entry.key.clone(),
                internal_id: entry.internal_id.clone(),
                resource_type: entry.kind,
            })
            .collect();
        (!found.is_empty()).then_some(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator() -> MemoryLocator {
        MemoryLocator::new(LocatorManifest {
            id: "main".into(),
            entries: vec![
                EntryManifest::new("characters/hero", Some(ResourceKind::Object), "Hero.prefab")
                    .with_label("heroes")
                    .with_alias("0123456789abcdef0123456789abcdef")
                    .with_numeric_id(42),
                EntryManifest::new("characters/hero_icon", Some(ResourceKind::Image), "Hero.png")
                    .with_label("heroes"),
            ],
        })
    }

    #[test]
    fn keys_include_aliases_labels_and_numeric_ids() {
        let keys = locator().keys();
        assert!(keys.contains(&ProviderKey::Str("characters/hero".into())));
        assert!(keys.contains(&ProviderKey::Str("heroes".into())));
        assert!(keys.contains(&ProviderKey::Int(42)));
        assert_eq!(keys.len(), 6);
    }

    #[test]
    fn labels_resolve_to_every_member() {
        let found = locator().locate(&"heroes".into(), None).unwrap();
        assert_eq!(found.len(), 2);
        let images = locator()
            .locate(&"heroes".into(), Some(ResourceKind::Image))
            .unwrap();
        assert_eq!(images[0].primary_key, "characters/hero_icon");
    }

    #[test]
    fn numeric_and_textual_keys_are_distinct() {
        assert!(locator().locate(&ProviderKey::Int(42), None).is_some());
        assert!(locator().locate(&"42".into(), None).is_none());
    }

    #[test]
    fn kind_mismatch_is_unknown() {
        assert!(locator()
            .locate(&"characters/hero".into(), Some(ResourceKind::Scene))
            .is_none());
    }
}

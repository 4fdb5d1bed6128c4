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

//! A RON description of the content an in-memory provider serves.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use stowage_core::asset::ResourceKind;

/// One addressable piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryManifest {
    /// The primary key the entry is addressed by.
    pub key: String,
    /// The declared type, when known.
    #[serde(default)]
    pub kind: Option<ResourceKind>,
    /// The backing path, e.g. `Assets/Characters/Hero.prefab`.
    pub internal_id: String,
    /// The remote bundle the entry depends on, if any.
    #[serde(default)]
    pub bundle: Option<String>,
    /// Labels that also resolve to this entry.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Additional textual keys (typically content hashes).
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Numeric identifiers that resolve to this entry.
    #[serde(default)]
    pub numeric_ids: Vec<i64>,
    /// The payload returned when the entry is loaded.
    #[serde(default)]
    pub payload: String,
}

impl EntryManifest {
    /// Creates an entry with no bundle, labels or aliases.
    pub fn new(key: impl Into<String>, kind: Option<ResourceKind>, internal_id: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind,
            internal_id: internal_id.into(),
            bundle: None,
            labels: Vec::new(),
            aliases: Vec::new(),
            numeric_ids: Vec::new(),
            payload: String::new(),
        }
    }

    /// Sets the dependency bundle.
    pub fn in_bundle(mut self, bundle: impl Into<String>) -> Self {
        self.bundle = Some(bundle.into());
        self
    }

    /// Adds a label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    /// Adds a textual alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Adds a numeric identifier.
    pub fn with_numeric_id(mut self, id: i64) -> Self {
        self.numeric_ids.push(id);
        self
    }

    /// Sets the payload.
    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }
}

/// A named group of entries, mirroring one catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocatorManifest {
    /// The catalog identifier.
    pub id: String,
    /// The entries this catalog resolves.
    #[serde(default)]
    pub entries: Vec<EntryManifest>,
}

/// A remote bundle and its size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleManifest {
    /// Size of the bundle in bytes.
    pub size: u64,
    /// Whether the bundle starts out in the local cache.
    #[serde(default)]
    pub cached: bool,
}

/// The complete description of the served content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContentManifest {
    /// Remote bundles, by name.
    #[serde(default)]
    pub bundles: BTreeMap<String, BundleManifest>,
    /// Catalogs, in registration order.
    #[serde(default)]
    pub locators: Vec<LocatorManifest>,
}

impl ContentManifest {
    /// Parses a manifest from RON text.
    pub fn from_ron_str(source: &str) -> anyhow::Result<Self> {
        ron::from_str(source).context("Failed to parse content manifest")
    }

    /// Reads and parses a manifest file.
    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read content manifest {}", path.display()))?;
        let manifest = Self::from_ron_str(&text)?;
        log::info!(
            "[ContentManifest] Loaded {} catalog(s) and {} bundle(s) from {}",
            manifest.locators.len(),
            manifest.bundles.len(),
            path.display()
        );
        Ok(manifest)
    }

    /// Bundles referenced by an entry but not declared in `bundles`.
    pub fn undeclared_bundles(&self) -> Vec<String> {
        let mut missing: Vec<String> = self
            .locators
            .iter()
            .flat_map(|l| l.entries.iter())
            .filter_map(|e| e.bundle.as_ref())
            .filter(|b| !self.bundles.contains_key(*b))
            .cloned()
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }
}

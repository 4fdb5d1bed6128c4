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

//! Provides the foundational types describing located and loaded content.
//!
//! The key components are:
//! - [`ResourceKind`]: the structural capability a location resolves to.
//! - [`ResourceLocation`]: one resolved location of a key, as reported by a locator.
//! - [`LoadedResource`] and [`SceneInstance`]: what a completed load yields.
//! - [`ResourceHandle`]: the shared, explicitly released reference the cache hands out.

mod handle;

pub use handle::*;

use serde::{Deserialize, Serialize};

/// The structural capability of a piece of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// A displayable image (sprites, icons, UI art).
    Image,
    /// A composable object that can be instantiated into a scene.
    Object,
    /// A base object type whose concrete type was not recorded.
    Generic,
    /// A loadable scene.
    Scene,
    /// Raw binary data with no structural capability.
    Binary,
}

impl ResourceKind {
    /// Returns `true` for kinds that may be instantiated as composable objects.
    pub fn is_object_like(self) -> bool {
        matches!(self, ResourceKind::Object | ResourceKind::Generic)
    }
}

/// One resolved location of a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLocation {
    /// The canonical key this location is addressed by.
    pub primary_key: String,
    /// The backing path or identifier inside the provider (e.g. `Assets/Hero.prefab`).
    pub internal_id: String,
    /// The declared type of the located resource, when the provider knows it.
    pub resource_type: Option<ResourceKind>,
}

impl ResourceLocation {
    /// Returns `true` if the backing path ends with `extension`, ignoring case.
    pub fn has_extension(&self, extension: &str) -> bool {
        if extension.is_empty() || self.internal_id.len() < extension.len() {
            return false;
        }
        let tail = &self.internal_id[self.internal_id.len() - extension.len()..];
        tail.eq_ignore_ascii_case(extension)
    }
}

/// The payload produced by a completed asset load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedResource {
    /// The capability the resource was loaded as.
    pub kind: ResourceKind,
    /// The backing path the bytes came from.
    pub internal_id: String,
    /// The decoded payload.
    pub bytes: Vec<u8>,
}

/// How a scene is brought in relative to already loaded scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SceneLoadMode {
    /// Replace all currently loaded scenes.
    #[default]
    Single,
    /// Load alongside currently loaded scenes.
    Additive,
}

/// A scene that a provider has loaded and activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneInstance {
    /// The key the scene was loaded by.
    pub key: String,
    /// The scene's display name.
    pub name: String,
    /// The mode the scene was loaded with.
    pub mode: SceneLoadMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(internal_id: &str) -> ResourceLocation {
        ResourceLocation {
            primary_key: "characters/hero".into(),
            internal_id: internal_id.into(),
            resource_type: None,
        }
    }

    #[test]
    fn extension_check_ignores_case() {
        assert!(location("Assets/Hero.PREFAB").has_extension(".prefab"));
        assert!(!location("Assets/Hero.png").has_extension(".prefab"));
        assert!(!location("ab").has_extension(".prefab"));
        assert!(!location("Assets/Hero.prefab").has_extension(""));
    }

    #[test]
    fn generic_objects_are_object_like() {
        assert!(ResourceKind::Object.is_object_like());
        assert!(ResourceKind::Generic.is_object_like());
        assert!(!ResourceKind::Image.is_object_like());
    }
}

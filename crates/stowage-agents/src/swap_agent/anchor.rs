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

use super::asset::{ImageAsset, ObjectAsset, SwapAsset};
use std::sync::{Mutex, MutexGuard};

/// A registered consumer of a slot's override.
pub trait SwapAnchor<A: SwapAsset>: Send + Sync {
    /// The slot this anchor belongs to.
    fn slot_id(&self) -> &str;

    /// Shows `asset` instead of the base content.
    fn apply_override(&self, asset: &A);

    /// Goes back to the base content.
    fn reset_to_base(&self);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// An image target, such as an icon or a portrait.
pub struct ImageAnchor {
    slot_id: String,
    base: Option<ImageAsset>,
    current: Mutex<Option<ImageAsset>>,
}

impl ImageAnchor {
    /// Creates an anchor that shows `base` until overridden.
    pub fn new(slot_id: impl Into<String>, base: Option<ImageAsset>) -> Self {
        Self {
            slot_id: slot_id.into(),
            current: Mutex::new(base.clone()),
            base,
        }
    }

    /// The image currently shown.
    pub fn current(&self) -> Option<ImageAsset> {
        lock(&self.current).clone()
    }

    /// Whether an override replaces the base image.
    pub fn is_overridden(&self) -> bool {
        *lock(&self.current) != self.base
    }
}

impl SwapAnchor<ImageAsset> for ImageAnchor {
    fn slot_id(&self) -> &str {
        &self.slot_id
    }

    fn apply_override(&self, asset: &ImageAsset) {
        *lock(&self.current) = Some(asset.clone());
    }

    fn reset_to_base(&self) {
        *lock(&self.current) = self.base.clone();
    }
}

/// An instance spawned from an [`ObjectAsset`].
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInstance {
    /// Instance name, `<slot>_Override`.
    pub name: String,
    /// The object it was spawned from.
    pub source: ObjectAsset,
}

#[derive(Default)]
struct ObjectAnchorState {
    base_visible: bool,
    instance: Option<ObjectInstance>,
    spawned: usize,
}

/// An object target: hides its base instance and spawns the override in its place.
pub struct ObjectAnchor {
    slot_id: String,
    has_base: bool,
    state: Mutex<ObjectAnchorState>,
}

impl ObjectAnchor {
    /// Creates an anchor. `has_base` says whether a base instance is shown by default.
    pub fn new(slot_id: impl Into<String>, has_base: bool) -> Self {
        Self {
            slot_id: slot_id.into(),
            has_base,
            state: Mutex::new(ObjectAnchorState {
                base_visible: has_base,
                ..Default::default()
            }),
        }
    }

    /// Whether the base instance is visible.
    pub fn base_visible(&self) -> bool {
        lock(&self.state).base_visible
    }

    /// The spawned override instance, if any.
    pub fn override_instance(&self) -> Option<ObjectInstance> {
        lock(&self.state).instance.clone()
    }

    /// How many override instances have been spawned over the anchor's life.
    pub fn spawn_count(&self) -> usize {
        lock(&self.state).spawned
    }
}

impl SwapAnchor<ObjectAsset> for ObjectAnchor {
    fn slot_id(&self) -> &str {
        &self.slot_id
    }

    fn apply_override(&self, asset: &ObjectAsset) {
        let mut state = lock(&self.state);
        if let Some(previous) = state.instance.take() {
            log::trace!("[ObjectAnchor] Destroying {}", previous.name);
        }
        state.base_visible = false;
        state.instance = Some(ObjectInstance {
            name: format!("{}_Override", self.slot_id),
            source: asset.clone(),
        });
        state.spawned += 1;
    }

    fn reset_to_base(&self) {
        let mut state = lock(&self.state);
        state.instance = None;
        state.base_visible = self.has_base;
    }
}

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

use super::anchor::SwapAnchor;
use super::asset::SwapAsset;
use crate::asset_agent::AssetCache;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};
use stowage_core::{AssetKey, ContentError, ContentResult};
use stowage_io::{KeyNormalizer, TypeProbe};

/// The slot of keys that have no path separator.
pub const DEFAULT_SLOT: &str = "DefaultSlot";

/// The slot `key` belongs to: everything before its last `/`.
///
/// Backslashes count as separators. Keys without a separator, or whose
/// only separator is leading, belong to [`DEFAULT_SLOT`].
pub fn derive_slot_id(key: &str) -> String {
    let normalized = key.replace('\\', "/");
    let trimmed = normalized.trim();
    match trimmed.rfind('/') {
        Some(index) if index > 0 => trimmed[..index].to_string(),
        _ => DEFAULT_SLOT.to_string(),
    }
}

/// What [`SwapCoordinator::apply_by_asset_key`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapOutcome {
    /// The key is blank or does not load as this coordinator's asset type.
    Skipped,
    /// The override reached this many anchors.
    Applied(usize),
    /// No anchor is registered for the slot yet; the key waits for one.
    Pending(String),
}

type AnchorRef<A> = Arc<dyn SwapAnchor<A>>;

struct SwapState<A: SwapAsset> {
    anchors: HashMap<String, Vec<AnchorRef<A>>>,
    pending: HashMap<String, AssetKey>,
}

impl<A: SwapAsset> Default for SwapState<A> {
    fn default() -> Self {
        Self {
            anchors: HashMap::new(),
            pending: HashMap::new(),
        }
    }
}

/// Routes loaded assets to the anchors of their slot.
pub struct SwapCoordinator<A: SwapAsset> {
    cache: Arc<AssetCache>,
    probe: Arc<TypeProbe>,
    state: Mutex<SwapState<A>>,
    _asset: PhantomData<fn() -> A>,
}

impl<A: SwapAsset> SwapCoordinator<A> {
    /// Creates a coordinator loading through `cache` and gating on `probe`.
    pub fn new(cache: Arc<AssetCache>, probe: Arc<TypeProbe>) -> Self {
        Self {
            cache,
            probe,
            state: Mutex::new(SwapState::default()),
            _asset: PhantomData,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SwapState<A>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds `anchor` to its slot. Registering the same anchor twice is a no-op.
    ///
    /// If a key is pending for the slot, it is applied now and forgotten.
    /// A pending key whose apply fails stays parked for the next registration.
    pub async fn register(&self, anchor: AnchorRef<A>) -> ContentResult<()> {
        let slot = anchor.slot_id().trim().to_string();
        if slot.is_empty() {
            return Ok(());
        }

        let pending = {
            let mut state = self.lock();
            let anchors = state.anchors.entry(slot.clone()).or_default();
            if !anchors.iter().any(|existing| Arc::ptr_eq(existing, &anchor)) {
                anchors.push(anchor);
            }
            state.pending.remove(&slot)
        };

        if let Some(key) = pending {
            log::debug!("[Swap] Applying pending {key} to slot {slot}");
            if let Err(e) = self.apply_by_asset_key(&key).await {
                log::warn!("[Swap] Pending {key} for slot {slot} failed to apply: {e}");
                self.lock().pending.entry(slot).or_insert(key);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Removes `anchor` from its slot. Pending keys are kept.
    pub fn unregister(&self, anchor: &AnchorRef<A>) -> bool {
        let slot = anchor.slot_id().trim();
        if slot.is_empty() {
            return false;
        }
        let mut state = self.lock();
        let Some(anchors) = state.anchors.get_mut(slot) else {
            return false;
        };
        let before = anchors.len();
        anchors.retain(|existing| !Arc::ptr_eq(existing, anchor));
        before != anchors.len()
    }

    /// Loads `key` and applies it to every anchor of its slot.
    ///
    /// Keys that do not probe as this coordinator's asset type are skipped.
    /// When the slot has no anchors the key is parked until one registers,
    /// replacing any key already parked there.
    pub async fn apply_by_asset_key(&self, key: &AssetKey) -> ContentResult<SwapOutcome> {
        if key.is_blank() {
            return Ok(SwapOutcome::Skipped);
        }

        let probe = self
            .probe
            .probe_exact(&KeyNormalizer::normalize(key.as_str()))
            .await
            .map_err(|e| ContentError::from_provider(key, e))?;
        if !A::is_loadable(&probe) {
            log::debug!("[Swap] {key} is not loadable as {:?}", A::KIND);
            return Ok(SwapOutcome::Skipped);
        }

        let slot = derive_slot_id(key.as_str());
        let asset = A::from_handle(self.cache.load(key, A::KIND).await?);

        let anchors = {
            let mut state = self.lock();
            let anchors = state.anchors.get(&slot).cloned().unwrap_or_default();
            if anchors.is_empty() {
                state.pending.insert(slot.clone(), key.clone());
            }
            anchors
        };
        if anchors.is_empty() {
            log::debug!("[Swap] {key} pending for slot {slot}");
            return Ok(SwapOutcome::Pending(slot));
        }

        for anchor in &anchors {
            anchor.apply_override(&asset);
        }
        log::info!("[Swap] Applied {key} to {} anchor(s) in {slot}", anchors.len());
        Ok(SwapOutcome::Applied(anchors.len()))
    }

    /// Resets every anchor to its base content and forgets pending keys.
    pub fn reset_all(&self) {
        let anchors: Vec<AnchorRef<A>> = {
            let mut state = self.lock();
            state.pending.clear();
            state.anchors.values().flatten().cloned().collect()
        };
        for anchor in anchors {
            anchor.reset_to_base();
        }
    }

    /// Number of anchors registered for `slot`.
    pub fn anchor_count(&self, slot: &str) -> usize {
        self.lock().anchors.get(slot).map_or(0, Vec::len)
    }

    /// The key parked for `slot`, if any.
    pub fn pending_key(&self, slot: &str) -> Option<AssetKey> {
        self.lock().pending.get(slot).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_is_the_key_without_its_last_segment() {
        assert_eq!(derive_slot_id("characters/hero/outfit_a"), "characters/hero");
        assert_eq!(derive_slot_id(" ui\\icons\\gem "), "ui/icons");
    }

    #[test]
    fn keys_without_a_separator_use_the_default_slot() {
        assert_eq!(derive_slot_id("outfit"), DEFAULT_SLOT);
        assert_eq!(derive_slot_id("/outfit"), DEFAULT_SLOT);
        assert_eq!(derive_slot_id("   "), DEFAULT_SLOT);
    }
}

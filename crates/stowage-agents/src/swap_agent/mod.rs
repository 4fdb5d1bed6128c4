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

//! Slot-keyed content overrides.
//!
//! A slot is the path of a key without its last segment
//! (`characters/hero/outfit_a` belongs to `characters/hero`). Anchors
//! register for a slot; applying a key loads the asset once and hands it
//! to every anchor of the slot, or parks it until the first anchor arrives.

mod anchor;
mod asset;
mod coordinator;

pub use anchor::{ImageAnchor, ObjectAnchor, ObjectInstance, SwapAnchor};
pub use asset::{ImageAsset, ObjectAsset, SwapAsset};
pub use coordinator::{derive_slot_id, SwapCoordinator, SwapOutcome, DEFAULT_SLOT};

/// Overrides gated on displayable images.
pub type ImageSwapCoordinator = SwapCoordinator<ImageAsset>;

/// Overrides gated on composable objects.
pub type ObjectSwapCoordinator = SwapCoordinator<ObjectAsset>;

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

//! # Stowage Agents
//!
//! The stateful components of stowage. Each agent owns its state outright
//! and mutates it only between suspension points:
//!
//! - [`AssetCache`]: at most one live handle per key, with load/unload events.
//! - [`SceneTransitionManager`]: exactly one active scene, with blended progress.
//! - [`SwapCoordinator`]: slot-keyed overrides with deferred application.

pub mod asset_agent;
pub mod scene_agent;
pub mod swap_agent;

pub use asset_agent::AssetCache;
pub use scene_agent::{SceneState, SceneTransitionManager};
pub use swap_agent::{
    derive_slot_id, ImageAnchor, ImageAsset, ImageSwapCoordinator, ObjectAnchor, ObjectAsset,
    ObjectInstance, ObjectSwapCoordinator, SwapAnchor, SwapAsset, SwapCoordinator, SwapOutcome,
};

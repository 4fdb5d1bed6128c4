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

use stowage_core::asset::{ResourceHandle, ResourceKind};
use stowage_core::AssetKey;
use stowage_io::ProbeResult;

/// A payload type that can be swapped into a slot.
pub trait SwapAsset: Clone + Send + Sync + 'static {
    /// The capability the asset is loaded as.
    const KIND: ResourceKind;

    /// Whether a key with the given capabilities can be loaded as this asset.
    fn is_loadable(probe: &ProbeResult) -> bool;

    /// Wraps a loaded handle.
    fn from_handle(handle: ResourceHandle) -> Self;
}

/// A displayable image.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    handle: ResourceHandle,
}

impl ImageAsset {
    /// The key the image was loaded by.
    pub fn key(&self) -> &AssetKey {
        self.handle.key()
    }

    /// The underlying handle.
    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

impl PartialEq for ImageAsset {
    fn eq(&self, other: &Self) -> bool {
        ResourceHandle::ptr_eq(&self.handle, &other.handle)
    }
}

impl SwapAsset for ImageAsset {
    const KIND: ResourceKind = ResourceKind::Image;

    fn is_loadable(probe: &ProbeResult) -> bool {
        probe.has_image
    }

    fn from_handle(handle: ResourceHandle) -> Self {
        Self { handle }
    }
}

/// A composable object that anchors instantiate.
#[derive(Debug, Clone)]
pub struct ObjectAsset {
    handle: ResourceHandle,
}

impl ObjectAsset {
    /// The key the object was loaded by.
    pub fn key(&self) -> &AssetKey {
        self.handle.key()
    }

    /// The underlying handle.
    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

impl PartialEq for ObjectAsset {
    fn eq(&self, other: &Self) -> bool {
        ResourceHandle::ptr_eq(&self.handle, &other.handle)
    }
}

impl SwapAsset for ObjectAsset {
    const KIND: ResourceKind = ResourceKind::Object;

    fn is_loadable(probe: &ProbeResult) -> bool {
        probe.has_object
    }

    fn from_handle(handle: ResourceHandle) -> Self {
        Self { handle }
    }
}

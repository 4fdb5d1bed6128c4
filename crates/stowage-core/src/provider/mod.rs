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

//! The content-provider boundary.
//!
//! [`ContentProvider`] is the sole I/O seam of stowage: resolving locations,
//! sizing and downloading dependency bundles, loading assets and scenes,
//! and releasing what it handed out. A concrete implementation lives in
//! `stowage-infra`; everything in `stowage-io` and `stowage-agents` is
//! orchestration on top of this trait.

mod guard;
mod operation;

pub use guard::*;
pub use operation::*;

use crate::asset::{LoadedResource, ResourceKind, ResourceLocation, SceneInstance, SceneLoadMode};
use crate::error::ProviderError;
use crate::key::ProviderKey;
use async_trait::async_trait;
use std::sync::Arc;

/// A hook invoked by the provider whenever an operation faults.
pub type ExceptionHandler = Arc<dyn Fn(HandleId, &ProviderError) + Send + Sync>;

/// A hook invoked by the provider whenever an operation changes state.
pub type DiagnosticCallback = Arc<dyn Fn(&OperationEvent) + Send + Sync>;

/// Identifies a registered [`DiagnosticCallback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(pub u64);

/// What happened to an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationEventKind {
    /// The operation completed successfully.
    Complete,
    /// The operation completed with a failure.
    Failed,
}

/// A state change reported through a [`DiagnosticCallback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationEvent {
    /// The handle of the operation.
    pub handle: HandleId,
    /// A debug name such as `LoadAsset(characters/hero)`.
    pub name: String,
    /// The kind of change.
    pub kind: OperationEventKind,
}

/// One source of key-to-location mappings.
pub trait ResourceLocator: Send + Sync {
    /// A stable identifier for the locator, used in logs.
    fn id(&self) -> &str;

    /// Every key this locator knows about, including labels and hashes.
    fn keys(&self) -> Vec<ProviderKey>;

    /// Resolves `key` to its locations, optionally restricted to `kind`.
    ///
    /// Returns `None` when the key is unknown to this locator.
    fn locate(&self, key: &ProviderKey, kind: Option<ResourceKind>)
        -> Option<Vec<ResourceLocation>>;
}

/// The interface contract for a content-delivery provider.
///
/// Every method that returns a [`BoxedOperation`] allocates a provider handle.
/// Callers drive the operation with [`drive`], which hands back a
/// [`HandleGuard`] that releases the handle exactly once.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Brings the provider up. Idempotent.
    async fn initialize(&self) -> Result<(), ProviderError>;

    /// Returns the ids of catalogs that have a newer remote version.
    async fn check_for_catalog_updates(&self) -> Result<Vec<String>, ProviderError>;

    /// Applies the given catalog updates.
    async fn update_catalogs(&self, catalogs: &[String]) -> Result<(), ProviderError>;

    /// Every locator currently registered with the provider.
    fn resource_locators(&self) -> Vec<Arc<dyn ResourceLocator>>;

    /// Resolves `key` across all locators, optionally restricted to `kind`.
    async fn locate(
        &self,
        key: &ProviderKey,
        kind: Option<ResourceKind>,
    ) -> Result<Vec<ResourceLocation>, ProviderError>;

    /// Starts computing how many bytes a key or label still needs to download.
    fn download_size(&self, key: &ProviderKey) -> BoxedOperation<u64>;

    /// Starts downloading the dependency bundle of a key or label.
    fn download_dependencies(&self, key: &ProviderKey) -> BoxedOperation<()>;

    /// Starts loading an asset of the given capability.
    fn load_asset(&self, key: &ProviderKey, kind: ResourceKind) -> BoxedOperation<LoadedResource>;

    /// Starts loading and activating a scene.
    fn load_scene(&self, key: &ProviderKey, mode: SceneLoadMode) -> BoxedOperation<SceneInstance>;

    /// Starts unloading the scene held by `scene`.
    fn unload_scene(&self, scene: HandleId) -> BoxedOperation<()>;

    /// Starts clearing the locally cached dependency bundle of a key or label.
    fn clear_dependency_cache(&self, key: &ProviderKey) -> BoxedOperation<()>;

    /// Releases a handle. Releasing an unknown handle is a no-op.
    fn release(&self, handle: HandleId);

    /// Returns `true` while `handle` is live.
    fn is_valid(&self, handle: HandleId) -> bool;

    /// Reclaims resources no longer referenced by any live handle.
    async fn unload_unused_resources(&self);

    /// Forces a collection of unreachable memory.
    fn collect_garbage(&self);

    /// Installs `handler`, returning the one previously installed.
    fn swap_exception_handler(&self, handler: Option<ExceptionHandler>)
        -> Option<ExceptionHandler>;

    /// Registers a callback for operation state changes.
    fn register_diagnostic_callback(&self, callback: DiagnosticCallback) -> CallbackId;

    /// Removes a previously registered callback.
    fn unregister_diagnostic_callback(&self, id: CallbackId);
}

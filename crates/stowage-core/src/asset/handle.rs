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

use super::{LoadedResource, ResourceKind};
use crate::key::AssetKey;
use crate::provider::{HandleGuard, HandleId};
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex};

/// A thread-safe, reference-counted handle to a loaded resource.
///
/// Cloning a handle is cheap and every clone refers to the same provider
/// handle. The provider handle is released exactly once: either explicitly
/// through [`ResourceHandle::release`] (what the cache does on unload), or
/// when the last clone is dropped. A released handle still derefs to its
/// payload but reports itself as no longer valid.
#[derive(Clone)]
pub struct ResourceHandle(Arc<HandleInner>);

struct HandleInner {
    key: AssetKey,
    resource: LoadedResource,
    guard: Mutex<Option<HandleGuard>>,
}

impl ResourceHandle {
    /// Creates a handle that owns `guard` and shares `resource`.
    ///
    /// This is typically called by the asset cache once a load has completed.
    pub fn new(key: AssetKey, resource: LoadedResource, guard: HandleGuard) -> Self {
        Self(Arc::new(HandleInner {
            key,
            resource,
            guard: Mutex::new(Some(guard)),
        }))
    }

    /// The key this resource was loaded by.
    pub fn key(&self) -> &AssetKey {
        &self.0.key
    }

    /// The capability this resource was loaded as.
    pub fn kind(&self) -> ResourceKind {
        self.0.resource.kind
    }

    /// The provider handle backing this resource, if it is still held.
    pub fn handle_id(&self) -> Option<HandleId> {
        self.lock_guard().as_ref().map(HandleGuard::id)
    }

    /// Returns `true` while the provider handle is held and valid.
    pub fn is_valid(&self) -> bool {
        self.lock_guard().as_ref().is_some_and(HandleGuard::is_valid)
    }

    /// Releases the provider handle. Returns `false` if it was already released.
    pub fn release(&self) -> bool {
        let guard = self.lock_guard().take();
        match guard {
            Some(guard) => {
                guard.release();
                true
            }
            None => false,
        }
    }

    /// Returns `true` if both handles refer to the same cached instance.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    fn lock_guard(&self) -> std::sync::MutexGuard<'_, Option<HandleGuard>> {
        self.0
            .guard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Deref for ResourceHandle {
    type Target = LoadedResource;

    fn deref(&self) -> &Self::Target {
        &self.0.resource
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("key", &self.0.key)
            .field("kind", &self.0.resource.kind)
            .field("valid", &self.is_valid())
            .finish()
    }
}

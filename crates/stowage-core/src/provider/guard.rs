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

use super::ContentProvider;
use std::fmt;
use std::sync::Arc;

/// An opaque, provider-issued handle identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owns one provider handle and releases it exactly once.
///
/// The handle is released either through [`HandleGuard::release`] or when
/// the guard is dropped, so every exit path (including `?` and panics)
/// gives the handle back to the provider.
pub struct HandleGuard {
    id: HandleId,
    provider: Arc<dyn ContentProvider>,
    released: bool,
}

impl HandleGuard {
    /// Takes ownership of `id`, which must have been issued by `provider`.
    pub fn new(id: HandleId, provider: Arc<dyn ContentProvider>) -> Self {
        Self {
            id,
            provider,
            released: false,
        }
    }

    /// The guarded handle.
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// Returns `true` while the provider still considers the handle live.
    pub fn is_valid(&self) -> bool {
        !self.released && self.provider.is_valid(self.id)
    }

    /// Gives the handle back to the provider now.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if !self.released {
            self.released = true;
            self.provider.release(self.id);
        }
    }
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl fmt::Debug for HandleGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleGuard")
            .field("id", &self.id)
            .field("released", &self.released)
            .finish()
    }
}

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

//! # Stowage Infra
//!
//! Concrete implementations of the `stowage-core` provider contract.
//!
//! [`MemoryContentProvider`] keeps its whole catalog in process and advances
//! every operation by a fixed number of scheduling ticks, which makes it the
//! reference provider for tests and for the sandbox binary.

pub mod manifest;
pub mod memory;

pub use manifest::{BundleManifest, ContentManifest, EntryManifest, LocatorManifest};
pub use memory::{FailurePoint, MemoryContentProvider, TickConfig};

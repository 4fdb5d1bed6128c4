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

//! # Stowage IO
//!
//! Services that talk to the content provider on behalf of the agents:
//! key discovery and filtering, capability probing, dependency downloads
//! and provider initialization.

pub mod download;
pub mod initializer;
pub mod keys;
pub mod probe;

pub use download::{DownloadCoordinator, DownloadOutcome};
pub use initializer::ProviderInitializer;
pub use keys::{KeyCatalog, KeyFilter, KeyGroup, KeyNormalizer};
pub use probe::{ProbeResult, TypeProbe};

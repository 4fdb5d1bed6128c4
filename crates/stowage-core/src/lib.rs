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

//! # Stowage Core
//!
//! Foundational crate containing keys, handles, provider contracts and the
//! error taxonomy shared by every other stowage crate.
//!
//! Nothing in here performs I/O on its own. The [`provider::ContentProvider`]
//! trait is the single boundary to the content-delivery layer, and everything
//! above it is orchestration.

#![warn(missing_docs)]

pub mod asset;
pub mod config;
pub mod error;
pub mod event;
pub mod key;
pub mod provider;
pub mod telemetry;
pub mod utils;

pub use config::StowageConfig;
pub use error::{ContentError, ContentResult, ProviderError};
pub use key::{AssetKey, ProviderKey};
pub use utils::timer::Stopwatch;

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

//! Identifiers for content items.
//!
//! An [`AssetKey`] is the human-facing string a caller asks for. A
//! [`ProviderKey`] is the primitive form handed to the content provider,
//! which distinguishes numeric identifiers from textual ones.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// An immutable, cheaply clonable string identifying a content item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetKey(Arc<str>);

impl AssetKey {
    /// Creates a key from any string-like value.
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the key is empty or only whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AssetKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for AssetKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AssetKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for AssetKey {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl From<&AssetKey> for AssetKey {
    fn from(value: &AssetKey) -> Self {
        value.clone()
    }
}

/// The primitive form of a key as the content provider expects it.
///
/// Providers index numeric identifiers separately from textual ones, so
/// `"42"` and `42` are not the same lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKey {
    /// A key that fits in a 32-bit signed integer.
    Int(i32),
    /// A key that only fits in a 64-bit signed integer.
    Long(i64),
    /// Any other key, including labels.
    Str(String),
}

impl ProviderKey {
    /// Returns `true` for an empty textual key.
    pub fn is_empty(&self) -> bool {
        matches!(self, ProviderKey::Str(s) if s.is_empty())
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKey::Int(v) => write!(f, "{v}"),
            ProviderKey::Long(v) => write!(f, "{v}"),
            ProviderKey::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ProviderKey {
    fn from(value: &str) -> Self {
        ProviderKey::Str(value.to_string())
    }
}

impl From<String> for ProviderKey {
    fn from(value: String) -> Self {
        ProviderKey::Str(value)
    }
}

impl From<i32> for ProviderKey {
    fn from(value: i32) -> Self {
        ProviderKey::Int(value)
    }
}

impl From<i64> for ProviderKey {
    fn from(value: i64) -> Self {
        ProviderKey::Long(value)
    }
}

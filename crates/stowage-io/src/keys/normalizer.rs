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

use stowage_core::ProviderKey;

/// Maps raw text to the primitive key form the provider indexes it under.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyNormalizer;

impl KeyNormalizer {
    /// `i32` if the trimmed text parses as one, then `i64`, else the trimmed text.
    pub fn normalize(raw: &str) -> ProviderKey {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return ProviderKey::Str(String::new());
        }
        if let Ok(value) = trimmed.parse::<i32>() {
            return ProviderKey::Int(value);
        }
        if let Ok(value) = trimmed.parse::<i64>() {
            return ProviderKey::Long(value);
        }
        ProviderKey::Str(trimmed.to_string())
    }
}

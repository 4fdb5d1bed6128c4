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

use stowage_core::StowageConfig;

/// The well-known key groups content is organised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyGroup {
    /// `characters/`
    Characters,
    /// `character/`
    Character,
    /// `ui/`
    Ui,
    /// `buildings/`
    Buildings,
    /// `effects/`
    Effects,
    /// `scenes/`
    Scenes,
}

impl KeyGroup {
    /// Every group, in declaration order.
    pub const ALL: [KeyGroup; 6] = [
        KeyGroup::Characters,
        KeyGroup::Character,
        KeyGroup::Ui,
        KeyGroup::Buildings,
        KeyGroup::Effects,
        KeyGroup::Scenes,
    ];

    /// The key prefix of the group, lowercase with a trailing `/`.
    pub fn prefix(self) -> &'static str {
        match self {
            KeyGroup::Characters => "characters/",
            KeyGroup::Character => "character/",
            KeyGroup::Ui => "ui/",
            KeyGroup::Buildings => "buildings/",
            KeyGroup::Effects => "effects/",
            KeyGroup::Scenes => "scenes/",
        }
    }

    /// The group `key` belongs to, ignoring case.
    pub fn of(key: &str) -> Option<KeyGroup> {
        Self::ALL
            .into_iter()
            .find(|group| starts_with_ignore_case(key.trim(), group.prefix()))
    }
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.is_char_boundary(prefix.len())
        && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Returns `true` iff `key` is at least `min_length` long and made only of hex digits.
pub fn is_hex_like(key: &str, min_length: usize) -> bool {
    !key.is_empty() && key.len() >= min_length && key.chars().all(|c| c.is_ascii_hexdigit())
}

/// Decides which keys may be surfaced to key-listing consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFilter {
    prefixes: Vec<String>,
    hex_min_length: usize,
}

impl KeyFilter {
    /// Creates a filter over `prefixes`. Blank prefixes are dropped.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|p| p.as_ref().trim().to_ascii_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
            hex_min_length: 32,
        }
    }

    /// Creates the filter described by `config`.
    pub fn from_config(config: &StowageConfig) -> Self {
        Self::new(&config.allowed_prefixes).with_hex_min_length(config.hex_min_length)
    }

    /// Overrides the length at which an all-hex key counts as a content hash.
    pub fn with_hex_min_length(mut self, min_length: usize) -> Self {
        self.hex_min_length = min_length;
        self
    }

    /// The normalized allow-list.
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// `true` if `key` starts with an allowed prefix, ignoring case.
    pub fn is_allowed(&self, key: &str) -> bool {
        if key.trim().is_empty() {
            return false;
        }
        self.prefixes
            .iter()
            .any(|prefix| starts_with_ignore_case(key, prefix))
    }

    /// `true` if `key` looks like an auto-generated content hash.
    pub fn is_hex_like(&self, key: &str) -> bool {
        is_hex_like(key, self.hex_min_length)
    }

    /// `true` if `key` is allowed and not hash-shaped.
    pub fn is_listable(&self, key: &str) -> bool {
        self.is_allowed(key) && !self.is_hex_like(key)
    }
}

impl Default for KeyFilter {
    fn default() -> Self {
        Self::new(KeyGroup::ALL.iter().map(|g| g.prefix()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn hex_detection_respects_length_and_alphabet() {
        assert!(is_hex_like(HASH, 32));
        let mut tainted = HASH.to_string();
        tainted.replace_range(5..6, "g");
        assert!(!is_hex_like(&tainted, 32));
        assert!(!is_hex_like(&HASH[..31], 32));
        assert!(is_hex_like(&HASH.to_uppercase(), 32));
        assert!(!is_hex_like("", 0));
    }

    #[test]
    fn prefixes_match_ignoring_case() {
        let filter = KeyFilter::default();
        assert!(filter.is_allowed("Characters/Hero"));
        assert!(filter.is_allowed("ui/icon"));
        assert!(!filter.is_allowed("internal/shader"));
        assert!(!filter.is_allowed("   "));
    }

    #[test]
    fn blank_prefixes_are_ignored() {
        let filter = KeyFilter::new(["", "  ", "UI/"]);
        assert_eq!(filter.prefixes(), ["ui/".to_string()]);
        assert!(!filter.is_allowed("characters/hero"));
    }

    #[test]
    fn empty_allow_list_rejects_everything() {
        let filter = KeyFilter::new(Vec::<String>::new());
        assert!(!filter.is_allowed("ui/icon"));
    }

    #[test]
    fn config_controls_the_filter() {
        let config = StowageConfig {
            allowed_prefixes: vec!["props/".into()],
            hex_min_length: 8,
            ..Default::default()
        };
        let filter = KeyFilter::from_config(&config);
        assert!(filter.is_allowed("props/crate"));
        assert!(filter.is_hex_like("deadbeef"));
    }

    #[test]
    fn groups_resolve_from_keys() {
        assert_eq!(KeyGroup::of("Scenes/Level1"), Some(KeyGroup::Scenes));
        assert_eq!(KeyGroup::of("character/npc"), Some(KeyGroup::Character));
        assert_eq!(KeyGroup::of("props/crate"), None);
    }
}

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

//! Runtime configuration for the stowage components.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The prefixes a fresh configuration allows.
pub const DEFAULT_ALLOWED_PREFIXES: [&str; 6] = [
    "characters/",
    "character/",
    "ui/",
    "buildings/",
    "effects/",
    "scenes/",
];

/// How chatty dependency downloads are in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// One line when the download completes.
    #[default]
    Quiet,
    /// One line every time the downloaded byte count changes.
    Verbose,
}

/// How scene-transition progress is split between downloading and loading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressSplit {
    /// Share of the unified progress spent downloading dependencies.
    pub download_portion: f32,
}

impl ProgressSplit {
    /// Creates a split, clamping the download share to `[0, 1]`.
    pub fn new(download_portion: f32) -> Self {
        Self {
            download_portion: download_portion.clamp(0.0, 1.0),
        }
    }

    /// Share of the unified progress spent loading the scene.
    pub fn load_portion(&self) -> f32 {
        1.0 - self.download_portion
    }

    /// Unified progress while the dependency download is at `percent`.
    pub fn download_progress(&self, percent: f32) -> f32 {
        (self.download_portion * percent.clamp(0.0, 1.0)).clamp(0.0, 1.0)
    }

    /// Unified progress while the scene load is at `percent`.
    pub fn load_progress(&self, percent: f32) -> f32 {
        (self.download_portion + self.load_portion() * percent.clamp(0.0, 1.0)).clamp(0.0, 1.0)
    }
}

impl Default for ProgressSplit {
    fn default() -> Self {
        Self {
            download_portion: 0.20,
        }
    }
}

/// Top-level configuration, usually read from a `Stowage.toml` file.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StowageConfig {
    /// Group prefixes a key must start with (ignoring case) to be listed.
    pub allowed_prefixes: Vec<String>,
    /// Minimum length at which an all-hex key is treated as a content hash.
    pub hex_min_length: usize,
    /// Maximum number of candidates a fuzzy key search collects.
    pub fuzzy_limit: usize,
    /// File extension that marks a backing path as a composable object.
    pub object_extension: String,
    /// Download/load split of the scene progress value.
    pub progress: ProgressSplit,
    /// Log verbosity of dependency downloads triggered by the asset cache.
    pub download_verbosity: Verbosity,
}

impl Default for StowageConfig {
    fn default() -> Self {
        Self {
            allowed_prefixes: DEFAULT_ALLOWED_PREFIXES
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
            hex_min_length: 32,
            fuzzy_limit: 20,
            object_extension: ".prefab".to_string(),
            progress: ProgressSplit::default(),
            download_verbosity: Verbosity::Verbose,
        }
    }
}

impl StowageConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(text).context("Failed to parse stowage configuration")?;
        config.progress = ProgressSplit::new(config.progress.download_portion);
        Ok(config)
    }

    /// Reads and parses a configuration file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = StowageConfig::from_toml_str("").unwrap();
        assert_eq!(config, StowageConfig::default());
        assert_eq!(config.hex_min_length, 32);
        assert_eq!(config.fuzzy_limit, 20);
    }

    #[test]
    fn overrides_are_applied() {
        let text = r#"
            allowed_prefixes = ["props/"]
            download_verbosity = "quiet"

            [progress]
            download_portion = 0.5
        "#;
        let config = StowageConfig::from_toml_str(text).unwrap();
        assert_eq!(config.allowed_prefixes, vec!["props/".to_string()]);
        assert_eq!(config.download_verbosity, Verbosity::Quiet);
        assert!((config.progress.download_portion - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn out_of_range_split_is_clamped() {
        let config = StowageConfig::from_toml_str("[progress]\ndownload_portion = 3.0").unwrap();
        assert_eq!(config.progress.download_portion, 1.0);
        assert_eq!(config.progress.load_portion(), 0.0);
    }

    #[test]
    fn default_split_blends_twenty_eighty() {
        let split = ProgressSplit::default();
        assert!((split.download_progress(0.5) - 0.10).abs() < 1e-6);
        assert!((split.load_progress(0.5) - 0.60).abs() < 1e-6);
        assert!((split.load_progress(1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn load_from_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Stowage.toml");
        std::fs::write(&path, "fuzzy_limit = 5").unwrap();
        assert_eq!(StowageConfig::load_from_file(&path).unwrap().fuzzy_limit, 5);

        let missing = dir.path().join("missing.toml");
        let err = StowageConfig::load_from_file(&missing).unwrap_err();
        assert!(format!("{err:#}").contains("missing.toml"));
    }
}

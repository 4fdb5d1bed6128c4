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

//! Dependency-bundle downloads.
//!
//! Asking how many bytes a key still needs is kept separate from fetching
//! them, so callers can skip progress feedback for content that is local.

use std::sync::Arc;
use std::time::Duration;
use stowage_core::config::Verbosity;
use stowage_core::provider::{drive, ContentProvider, DownloadStatus};
use stowage_core::{AssetKey, ContentError, ContentResult, Stopwatch};

use crate::keys::KeyNormalizer;

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// What [`DownloadCoordinator::ensure_downloaded`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Nothing was missing locally.
    AlreadyCached,
    /// The bundle was fetched.
    Downloaded {
        /// Bytes the provider reported as downloaded.
        bytes: u64,
        /// Wall time spent downloading.
        elapsed: Duration,
    },
}

/// Drives dependency downloads to completion and gives every handle back.
#[derive(Clone)]
pub struct DownloadCoordinator {
    provider: Arc<dyn ContentProvider>,
}

impl DownloadCoordinator {
    /// Creates a coordinator over `provider`.
    pub fn new(provider: Arc<dyn ContentProvider>) -> Self {
        Self { provider }
    }

    /// Bytes `key` (a key or a label) still needs to download. Zero means cached.
    pub async fn expected_bytes(&self, key: &AssetKey) -> ContentResult<u64> {
        let provider_key = KeyNormalizer::normalize(key.as_str());
        let operation = self.provider.download_size(&provider_key);
        let (guard, result) = drive(&self.provider, operation, |_| {}).await;
        guard.release();
        result.map_err(|e| ContentError::from_provider(key, e))
    }

    /// Makes sure the dependency bundle of `key` is local.
    pub async fn ensure_downloaded(
        &self,
        key: &AssetKey,
        verbosity: Verbosity,
    ) -> ContentResult<DownloadOutcome> {
        let mut last_bytes = None;
        self.download(key, |status| {
            if verbosity == Verbosity::Verbose
                && status.total_bytes > 0
                && last_bytes != Some(status.downloaded_bytes)
            {
                last_bytes = Some(status.downloaded_bytes);
                log::info!(
                    "[Download] {key} {}/{} B",
                    status.downloaded_bytes,
                    status.total_bytes
                );
            }
        })
        .await
    }

    /// Makes sure the dependency bundle of `key` is local, reporting every tick to `observer`.
    pub async fn ensure_downloaded_with_progress<F>(
        &self,
        key: &AssetKey,
        observer: F,
    ) -> ContentResult<DownloadOutcome>
    where
        F: FnMut(DownloadStatus) + Send,
    {
        self.download(key, observer).await
    }

    /// Removes the locally cached dependency bundle of `key`.
    pub async fn clear_cache(&self, key: &AssetKey) -> ContentResult<()> {
        let provider_key = KeyNormalizer::normalize(key.as_str());
        let operation = self.provider.clear_dependency_cache(&provider_key);
        let (guard, result) = drive(&self.provider, operation, |_| {}).await;
        guard.release();
        result.map_err(|e| ContentError::from_provider(key, e))?;
        log::info!("[Download] Cleared cached dependencies of {key}");
        Ok(())
    }

    async fn download<F>(&self, key: &AssetKey, mut observer: F) -> ContentResult<DownloadOutcome>
    where
        F: FnMut(DownloadStatus) + Send,
    {
        let expected = self.expected_bytes(key).await?;
        if expected == 0 {
            log::debug!("[Download] {key} expected 0 B (cached)");
            return Ok(DownloadOutcome::AlreadyCached);
        }

        let stopwatch = Stopwatch::new();
        let provider_key = KeyNormalizer::normalize(key.as_str());
        let operation = self.provider.download_dependencies(&provider_key);
        let (guard, result) = drive(&self.provider, operation, |op| {
            observer(op.download_status());
        })
        .await;
        guard.release();

        if let Err(e) = result {
            log::error!("[Download] {key} failed: {e}");
            return Err(ContentError::from_provider(key, e));
        }

        let elapsed = stopwatch.elapsed();
        log::info!(
            "[Download][Done] {key} downloaded {:.2} MB in {} ms",
            expected as f64 / BYTES_PER_MEGABYTE,
            elapsed.as_millis()
        );
        Ok(DownloadOutcome::Downloaded {
            bytes: expected,
            elapsed,
        })
    }
}

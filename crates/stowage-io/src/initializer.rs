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

use std::sync::Arc;
use stowage_core::provider::ContentProvider;
use stowage_core::ProviderError;

/// Brings the provider up and applies any pending catalog updates.
pub struct ProviderInitializer {
    provider: Arc<dyn ContentProvider>,
}

impl ProviderInitializer {
    /// Creates an initializer for `provider`.
    pub fn new(provider: Arc<dyn ContentProvider>) -> Self {
        Self { provider }
    }

    /// Initializes the provider, then updates every catalog that reports a
    /// newer version. Returns the ids of the updated catalogs.
    pub async fn initialize_and_update_catalogs(&self) -> Result<Vec<String>, ProviderError> {
        self.provider.initialize().await?;

        let catalogs = self.provider.check_for_catalog_updates().await?;
        if catalogs.is_empty() {
            log::debug!("[Initializer] All catalogs are up to date");
            return Ok(catalogs);
        }

        self.provider.update_catalogs(&catalogs).await?;
        log::info!("[Initializer] Updated {} catalog(s): {}", catalogs.len(), catalogs.join(", "));
        Ok(catalogs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stowage_core::asset::ResourceKind;
    use stowage_infra::{EntryManifest, LocatorManifest, MemoryContentProvider};

    #[tokio::test]
    async fn applies_staged_updates() {
        let provider = Arc::new(MemoryContentProvider::new());
        provider.stage_catalog_update(LocatorManifest {
            id: "remote".into(),
            entries: vec![EntryManifest::new("ui/new", Some(ResourceKind::Image), "New.png")],
        });
        let initializer = ProviderInitializer::new(provider.clone());

        let updated = initializer.initialize_and_update_catalogs().await.unwrap();
        assert_eq!(updated, vec!["remote".to_string()]);
        assert!(provider.is_initialized());
        assert_eq!(provider.resource_locators().len(), 1);

        let again = initializer.initialize_and_update_catalogs().await.unwrap();
        assert!(again.is_empty());
    }
}

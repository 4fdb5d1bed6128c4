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

//! The error taxonomy shared across stowage.

use crate::asset::ResourceKind;
use crate::key::AssetKey;
use crate::provider::HandleId;
use thiserror::Error;

/// A fault reported by the content provider itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The key resolves to no location of the requested capability.
    #[error("key '{key}' has no location of type {kind:?}")]
    InvalidKey {
        /// The textual form of the key that failed to resolve.
        key: String,
        /// The capability that was requested, if any.
        kind: Option<ResourceKind>,
    },
    /// The transfer or load finished with a failed status.
    #[error("operation failed: {0}")]
    Failed(String),
    /// The provider has not been initialized yet.
    #[error("content provider is not initialized")]
    NotInitialized,
    /// The handle is unknown or was already released.
    #[error("handle {0} is not valid")]
    InvalidHandle(HandleId),
}

/// A fault surfaced to callers of the orchestration layer.
///
/// This is `Clone` so that a single in-flight result can be handed to
/// every requester that was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    /// The key resolved to zero locations of the requested capability.
    #[error("invalid key '{key}': no location of type {kind:?}")]
    InvalidKey {
        /// The key that was requested.
        key: AssetKey,
        /// The capability that was requested, if any.
        kind: Option<ResourceKind>,
    },
    /// A download or load reported a failed status.
    #[error("transfer of '{key}' failed: {source}")]
    Transfer {
        /// The key whose transfer failed.
        key: AssetKey,
        /// The provider's failure.
        #[source]
        source: ProviderError,
    },
    /// Tearing down a previous resource failed after the new one succeeded.
    ///
    /// Only ever logged by the components in this workspace; the variant
    /// exists so the failure can be described uniformly.
    #[error("cleanup of '{key}' failed: {message}")]
    Cleanup {
        /// The key of the resource that could not be torn down.
        key: AssetKey,
        /// The provider's failure message.
        message: String,
    },
}

impl ContentError {
    /// Wraps a provider fault for `key`, promoting invalid-key faults.
    pub fn from_provider(key: &AssetKey, error: ProviderError) -> Self {
        match error {
            ProviderError::InvalidKey { kind, .. } => ContentError::InvalidKey {
                key: key.clone(),
                kind,
            },
            other => ContentError::Transfer {
                key: key.clone(),
                source: other,
            },
        }
    }

    /// Returns the key the fault relates to.
    pub fn key(&self) -> &AssetKey {
        match self {
            ContentError::InvalidKey { key, .. }
            | ContentError::Transfer { key, .. }
            | ContentError::Cleanup { key, .. } => key,
        }
    }
}

/// A specialized `Result` for orchestration operations.
pub type ContentResult<T> = Result<T, ContentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_key_is_promoted() {
        let key = AssetKey::new("ui/logo");
        let err = ContentError::from_provider(
            &key,
            ProviderError::InvalidKey {
                key: "ui/logo".into(),
                kind: Some(ResourceKind::Scene),
            },
        );
        assert_eq!(
            err,
            ContentError::InvalidKey {
                key,
                kind: Some(ResourceKind::Scene)
            }
        );
    }

    #[test]
    fn other_faults_become_transfer_failures() {
        let key = AssetKey::new("ui/logo");
        let err = ContentError::from_provider(&key, ProviderError::Failed("timeout".into()));
        assert!(matches!(err, ContentError::Transfer { .. }));
        assert_eq!(err.key().as_str(), "ui/logo");
        assert!(err.to_string().contains("timeout"));
    }
}

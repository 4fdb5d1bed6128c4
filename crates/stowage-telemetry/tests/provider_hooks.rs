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

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use stowage_core::asset::ResourceKind;
use stowage_core::provider::{drive, ContentProvider, HandleId};
use stowage_core::ProviderError;
use stowage_infra::memory::FailurePoint;
use stowage_infra::{ContentManifest, EntryManifest, LocatorManifest, MemoryContentProvider};
use stowage_telemetry::Diagnostics;

fn provider() -> (Arc<MemoryContentProvider>, Arc<dyn ContentProvider>) {
    let manifest = ContentManifest {
        locators: vec![LocatorManifest {
            id: "main".into(),
            entries: vec![EntryManifest::new(
                "ui/icon",
                Some(ResourceKind::Image),
                "Assets/UI/Icon.png",
            )],
        }],
        ..Default::default()
    };
    let concrete = Arc::new(MemoryContentProvider::from_manifest(manifest));
    let shared: Arc<dyn ContentProvider> = concrete.clone();
    (concrete, shared)
}

#[tokio::test]
async fn enabling_chains_the_previous_fault_handler() {
    let (concrete, shared) = provider();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    shared.swap_exception_handler(Some(Arc::new(move |_: HandleId, _: &ProviderError| {
        counter.fetch_add(1, Ordering::SeqCst);
    })));

    let diagnostics = Diagnostics::new();
    diagnostics.enable(&shared);
    assert!(diagnostics.is_enabled());
    assert_eq!(concrete.diagnostic_callback_count(), 1);

    concrete.inject_failure(FailurePoint::Load, "ui/icon", "corrupt bundle");
    let op = shared.load_asset(&"ui/icon".into(), ResourceKind::Image);
    let (_guard, result) = drive(&shared, op, |_| {}).await;
    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn disabling_restores_the_provider() {
    let (concrete, shared) = provider();
    let diagnostics = Diagnostics::new();

    diagnostics.enable(&shared);
    diagnostics.enable(&shared);
    assert_eq!(concrete.diagnostic_callback_count(), 1);
    assert!(concrete.has_exception_handler());

    diagnostics.disable();
    assert!(!diagnostics.is_enabled());
    assert_eq!(concrete.diagnostic_callback_count(), 0);
    assert!(!concrete.has_exception_handler());
}

#[tokio::test]
async fn dropping_diagnostics_unhooks_it() {
    let (concrete, shared) = provider();
    {
        let diagnostics = Diagnostics::new();
        diagnostics.enable(&shared);
    }
    assert_eq!(concrete.diagnostic_callback_count(), 0);
}

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

mod common;

use common::Fixture;
use stowage_agents::AssetCache;
use stowage_core::asset::{ResourceHandle, ResourceKind};
use stowage_core::telemetry::MetricId;
use stowage_core::{AssetKey, ContentError};
use stowage_infra::FailurePoint;
use stowage_telemetry::AssetEvent;

fn hero() -> AssetKey {
    AssetKey::new("characters/hero")
}

#[tokio::test]
async fn second_load_reuses_the_cached_handle() {
    let fixture = Fixture::new();
    let cache = fixture.cache();

    let first = cache.load(&hero(), ResourceKind::Object).await.unwrap();
    let second = cache.load(&hero(), ResourceKind::Object).await.unwrap();

    assert!(ResourceHandle::ptr_eq(&first, &second));
    assert_eq!(fixture.concrete.load_calls("characters/hero"), 1);
    assert_eq!(fixture.concrete.download_calls("characters/hero"), 1);
    assert_eq!(first.bytes, b"hero".to_vec());
    assert!(cache.is_loaded("characters/hero"));
    assert_eq!(fixture.concrete.live_handle_count(), 1);
}

#[tokio::test]
async fn concurrent_loads_share_one_transfer() {
    let fixture = Fixture::new();
    let cache = fixture.cache();
    let key = hero();

    let (a, b) = tokio::join!(
        cache.load(&key, ResourceKind::Object),
        cache.load(&key, ResourceKind::Object)
    );

    assert!(ResourceHandle::ptr_eq(&a.unwrap(), &b.unwrap()));
    assert_eq!(fixture.concrete.load_calls("characters/hero"), 1);
    assert_eq!(fixture.concrete.download_calls("characters/hero"), 1);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn concurrent_waiters_receive_the_failure() {
    let fixture = Fixture::new();
    fixture
        .concrete
        .inject_failure(FailurePoint::Load, "characters/hero", "bundle corrupted");
    let cache = fixture.cache();
    let key = hero();

    let (a, b) = tokio::join!(
        cache.load(&key, ResourceKind::Object),
        cache.load(&key, ResourceKind::Object)
    );

    assert!(matches!(a, Err(ContentError::Transfer { .. })));
    assert_eq!(a.unwrap_err(), b.unwrap_err());
    assert_eq!(fixture.concrete.load_calls("characters/hero"), 1);
}

#[tokio::test]
async fn unload_emits_exactly_one_event() {
    let fixture = Fixture::new();
    let events = fixture.diagnostics.subscribe();
    let cache = fixture.cache();

    let handle = cache.load(&hero(), ResourceKind::Object).await.unwrap();
    assert!(cache.unload(&hero()));
    assert!(!cache.unload(&hero()));

    assert!(!cache.is_loaded("characters/hero"));
    assert!(!handle.is_valid());
    assert_eq!(fixture.concrete.live_handle_count(), 0);

    let received: Vec<AssetEvent> = events.try_iter().collect();
    assert_eq!(
        received,
        vec![AssetEvent::Loaded(hero()), AssetEvent::Unloaded(hero())]
    );
}

#[tokio::test]
async fn unloading_an_unknown_key_is_silent() {
    let fixture = Fixture::new();
    let events = fixture.diagnostics.subscribe();
    let cache = fixture.cache();

    assert!(!cache.unload(&AssetKey::new("ui/never_loaded")));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn unload_all_releases_everything_and_reclaims() {
    let fixture = Fixture::new();
    let events = fixture.diagnostics.subscribe();
    let cache = fixture.cache();
    let icon = AssetKey::new("ui/icon");

    cache.load(&hero(), ResourceKind::Object).await.unwrap();
    cache.load(&icon, ResourceKind::Image).await.unwrap();
    assert_eq!(cache.loaded_keys(), vec![hero(), icon.clone()]);

    cache.unload_all().await;

    assert!(!cache.is_loaded("characters/hero"));
    assert!(!cache.is_loaded("ui/icon"));
    assert!(cache.is_empty());
    assert_eq!(fixture.concrete.live_handle_count(), 0);
    assert_eq!(fixture.concrete.reclaim_passes(), 1);
    assert_eq!(fixture.concrete.collections(), 1);

    let unloaded: Vec<AssetEvent> = events
        .try_iter()
        .filter(|e| matches!(e, AssetEvent::Unloaded(_)))
        .collect();
    assert_eq!(
        unloaded,
        vec![AssetEvent::Unloaded(hero()), AssetEvent::Unloaded(icon)]
    );
}

#[tokio::test]
async fn failed_load_leaves_no_partial_state() {
    let fixture = Fixture::new();
    fixture
        .concrete
        .inject_failure(FailurePoint::Load, "ui/icon", "decode error");
    let events = fixture.diagnostics.subscribe();
    let cache = fixture.cache();

    let err = cache
        .load(&AssetKey::new("ui/icon"), ResourceKind::Image)
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::Transfer { .. }));
    assert!(cache.is_empty());
    assert_eq!(fixture.concrete.live_handle_count(), 0);
    assert!(events.try_recv().is_err());

    fixture.concrete.clear_failure(FailurePoint::Load, "ui/icon");
    cache
        .load(&AssetKey::new("ui/icon"), ResourceKind::Image)
        .await
        .unwrap();
    assert!(cache.is_loaded("ui/icon"));
}

#[tokio::test]
async fn invalid_keys_are_rejected() {
    let fixture = Fixture::new();
    let cache = fixture.cache();

    let missing = cache
        .load(&AssetKey::new("ui/missing"), ResourceKind::Image)
        .await
        .unwrap_err();
    assert!(matches!(missing, ContentError::InvalidKey { .. }));

    let blank = cache
        .load(&AssetKey::new(" "), ResourceKind::Image)
        .await
        .unwrap_err();
    assert!(matches!(blank, ContentError::InvalidKey { .. }));
    assert_eq!(fixture.concrete.live_handle_count(), 0);
}

#[tokio::test]
async fn reloading_after_unload_goes_back_to_the_provider() {
    let fixture = Fixture::new();
    let cache: AssetCache = fixture.cache();

    let first = cache.load(&hero(), ResourceKind::Object).await.unwrap();
    cache.unload(&hero());
    let second = cache.load(&hero(), ResourceKind::Object).await.unwrap();

    assert!(!ResourceHandle::ptr_eq(&first, &second));
    assert_eq!(fixture.concrete.load_calls("characters/hero"), 2);
    assert_eq!(fixture.concrete.download_calls("characters/hero"), 1);
}

#[tokio::test]
async fn numeric_keys_load_by_numeric_id() {
    let fixture = Fixture::new();
    let cache = fixture.cache();
    let key = AssetKey::new("42");

    let handle = cache.load(&key, ResourceKind::Object).await.unwrap();

    assert_eq!(handle.bytes, b"hero".to_vec());
    assert_eq!(handle.internal_id, "Assets/Hero.prefab");
    assert_eq!(fixture.concrete.load_calls("42"), 1);
    assert!(fixture.concrete.is_bundle_cached("characters"));
    assert!(cache.is_loaded("42"));
}

#[tokio::test]
async fn released_handles_drop_out_of_the_loaded_set() {
    let fixture = Fixture::new();
    let events = fixture.diagnostics.subscribe();
    let cache = fixture.cache();

    let handle = cache.load(&hero(), ResourceKind::Object).await.unwrap();
    assert!(handle.release());

    assert!(!cache.is_loaded("characters/hero"));
    assert!(cache.loaded_keys().is_empty());

    let reloaded = cache.load(&hero(), ResourceKind::Object).await.unwrap();
    assert!(reloaded.is_valid());
    assert_eq!(cache.loaded_keys(), vec![hero()]);

    let received: Vec<AssetEvent> = events.try_iter().collect();
    assert_eq!(
        received,
        vec![
            AssetEvent::Loaded(hero()),
            AssetEvent::Unloaded(hero()),
            AssetEvent::Loaded(hero()),
        ]
    );
    let resident = fixture
        .diagnostics
        .metrics_registry()
        .get(&MetricId::new("assets", "resident"))
        .unwrap();
    assert_eq!(resident.as_gauge(), Some(1.0));
}

#[tokio::test]
async fn stale_handle_is_replaced_on_next_load() {
    let fixture = Fixture::new();
    let events = fixture.diagnostics.subscribe();
    let cache = fixture.cache();

    let first = cache.load(&hero(), ResourceKind::Object).await.unwrap();
    first.release();
    let second = cache.load(&hero(), ResourceKind::Object).await.unwrap();

    assert!(!ResourceHandle::ptr_eq(&first, &second));
    assert_eq!(fixture.concrete.load_calls("characters/hero"), 2);
    let unloaded = events
        .try_iter()
        .filter(|e| matches!(e, AssetEvent::Unloaded(_)))
        .count();
    assert_eq!(unloaded, 1);
}

#[tokio::test]
async fn cached_handle_is_not_served_for_another_kind() {
    let fixture = Fixture::new();
    let cache = fixture.cache();
    let icon = AssetKey::new("ui/icon");

    cache.load(&icon, ResourceKind::Image).await.unwrap();
    let err = cache.load(&icon, ResourceKind::Object).await.unwrap_err();

    assert!(matches!(
        err,
        ContentError::InvalidKey {
            kind: Some(ResourceKind::Object),
            ..
        }
    ));
    assert_eq!(fixture.concrete.load_calls("ui/icon"), 1);
    assert!(cache.is_loaded("ui/icon"));

    let outfit = AssetKey::new("characters/hero/outfit_a");
    let object = cache.load(&outfit, ResourceKind::Object).await.unwrap();
    let generic = cache.load(&outfit, ResourceKind::Generic).await.unwrap();
    assert!(ResourceHandle::ptr_eq(&object, &generic));
}

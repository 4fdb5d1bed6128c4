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
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use stowage_agents::SceneState;
use stowage_core::asset::SceneLoadMode;
use stowage_core::provider::OperationEvent;
use stowage_core::{AssetKey, ContentError};
use stowage_infra::{FailurePoint, TickConfig};

fn level(n: u8) -> AssetKey {
    AssetKey::new(format!("scenes/level{n}"))
}

#[tokio::test]
async fn switching_scenes_keeps_exactly_one_active() {
    let fixture = Fixture::new();
    let scenes = fixture.scenes();

    scenes.load_scene(&level(1), SceneLoadMode::Single).await.unwrap();
    let active = scenes.load_scene(&level(2), SceneLoadMode::Single).await.unwrap();

    assert_eq!(active.key, "scenes/level2");
    assert_eq!(active.name, "Level2");
    assert_eq!(scenes.current_scene(), Some(active));
    assert_eq!(fixture.concrete.loaded_scenes(), vec!["scenes/level2".to_string()]);
    assert_eq!(fixture.concrete.live_handle_count(), 1);
    assert_eq!(scenes.state(), SceneState::Active);
    assert_eq!(scenes.progress(), 1.0);
}

#[tokio::test]
async fn previous_scene_is_unloaded_after_the_new_one_succeeds() {
    let fixture = Fixture::new();
    let scenes = fixture.scenes();
    scenes.load_scene(&level(1), SceneLoadMode::Single).await.unwrap();

    let order = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&order);
    fixture
        .provider
        .register_diagnostic_callback(Arc::new(move |event: &OperationEvent| {
            sink.lock().unwrap().push(event.name.clone());
        }));

    scenes.load_scene(&level(2), SceneLoadMode::Single).await.unwrap();

    let order = order.lock().unwrap();
    let loaded = order
        .iter()
        .position(|name| name == "LoadScene(scenes/level2)")
        .unwrap();
    let unloaded = order
        .iter()
        .position(|name| name.starts_with("UnloadScene("))
        .unwrap();
    assert!(loaded < unloaded);
}

#[tokio::test]
async fn failed_load_keeps_the_previous_scene() {
    let fixture = Fixture::new();
    let scenes = fixture.scenes();
    scenes.load_scene(&level(1), SceneLoadMode::Single).await.unwrap();
    fixture
        .concrete
        .inject_failure(FailurePoint::SceneLoad, "scenes/level2", "out of memory");

    let err = scenes
        .load_scene(&level(2), SceneLoadMode::Single)
        .await
        .unwrap_err();

    assert!(matches!(err, ContentError::Transfer { .. }));
    assert_eq!(scenes.current_scene().unwrap().key, "scenes/level1");
    assert_eq!(fixture.concrete.loaded_scenes(), vec!["scenes/level1".to_string()]);
    assert_eq!(scenes.progress(), 0.0);
    assert_eq!(scenes.state(), SceneState::Idle);
    assert_eq!(fixture.concrete.live_handle_count(), 1);
}

#[tokio::test]
async fn failed_download_keeps_the_previous_scene() {
    let fixture = Fixture::new();
    let scenes = fixture.scenes();
    scenes.load_scene(&level(1), SceneLoadMode::Single).await.unwrap();
    fixture
        .concrete
        .inject_failure(FailurePoint::Download, "scenes/level2", "timeout");

    let err = scenes
        .load_scene(&level(2), SceneLoadMode::Single)
        .await
        .unwrap_err();

    assert!(matches!(err, ContentError::Transfer { .. }));
    assert_eq!(scenes.current_scene().unwrap().key, "scenes/level1");
    assert_eq!(scenes.progress(), 0.0);
}

#[tokio::test]
async fn non_scene_keys_are_rejected_before_any_transfer() {
    let fixture = Fixture::new();
    let scenes = fixture.scenes();

    let err = scenes
        .load_scene(&AssetKey::new("characters/hero"), SceneLoadMode::Single)
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::InvalidKey { .. }));
    assert_eq!(fixture.concrete.download_calls("characters/hero"), 0);

    let blank = scenes
        .load_scene(&AssetKey::new(""), SceneLoadMode::Single)
        .await
        .unwrap_err();
    assert!(matches!(blank, ContentError::InvalidKey { .. }));
    assert_eq!(fixture.concrete.live_handle_count(), 0);
}

#[tokio::test]
async fn cleanup_failure_is_swallowed() {
    let fixture = Fixture::new();
    let scenes = fixture.scenes();
    scenes.load_scene(&level(1), SceneLoadMode::Single).await.unwrap();
    fixture
        .concrete
        .inject_failure(FailurePoint::SceneUnload, "scenes/level1", "still referenced");

    let active = scenes.load_scene(&level(2), SceneLoadMode::Additive).await.unwrap();
    assert_eq!(active.key, "scenes/level2");
    assert_eq!(scenes.current_scene().unwrap().key, "scenes/level2");
    assert_eq!(fixture.concrete.live_handle_count(), 1);
}

#[tokio::test]
async fn progress_blends_download_and_load_phases() {
    let fixture = Fixture::with_ticks(TickConfig {
        download: 2,
        load: 2,
        scene: 2,
    });
    let scenes = fixture.scenes();
    let done = AtomicBool::new(false);
    let mut samples = Vec::new();

    let (result, ()) = tokio::join!(
        async {
            let result = scenes.load_scene(&level(1), SceneLoadMode::Single).await;
            done.store(true, Ordering::SeqCst);
            result
        },
        async {
            while !done.load(Ordering::SeqCst) {
                samples.push(scenes.progress());
                tokio::task::yield_now().await;
            }
        }
    );
    result.unwrap();

    let near = |target: f32| samples.iter().any(|p| (p - target).abs() < 1e-5);
    assert!(near(0.10), "samples: {samples:?}");
    assert!(near(0.60), "samples: {samples:?}");
    assert!(samples.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*scenes.watch_progress().borrow(), 1.0);
}

#[tokio::test]
async fn unloading_the_current_scene_resets_and_reclaims() {
    let fixture = Fixture::new();
    let scenes = fixture.scenes();
    scenes.load_scene(&level(1), SceneLoadMode::Single).await.unwrap();

    scenes.unload_current_scene().await.unwrap();

    assert!(scenes.current_scene().is_none());
    assert!(fixture.concrete.loaded_scenes().is_empty());
    assert_eq!(scenes.progress(), 0.0);
    assert_eq!(fixture.concrete.live_handle_count(), 0);
    assert_eq!(fixture.concrete.reclaim_passes(), 1);
    assert_eq!(fixture.concrete.collections(), 1);

    scenes.unload_current_scene().await.unwrap();
    assert_eq!(fixture.concrete.reclaim_passes(), 1);
}

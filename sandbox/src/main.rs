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

//! Command-line sandbox for poking at a content manifest through the full
//! stowage stack.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use stowage_core::provider::ContentProvider;
use stowage_infra::MemoryContentProvider;
use stowage_sdk::prelude::*;
use stowage_sdk::ContentSystem;

#[derive(Parser)]
#[command(name = "sandbox")]
#[command(about = "Explore a content manifest with the stowage content system", long_about = None)]
struct Cli {
    /// RON manifest describing the served content
    #[arg(short, long, global = true, default_value = "sandbox/assets/manifest.ron")]
    manifest: PathBuf,

    /// Optional Stowage.toml configuration
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the listable keys of every catalog
    Keys {
        /// Only list scene keys
        #[arg(long)]
        scenes: bool,
    },
    /// Report which capabilities a key resolves to
    Probe { key: String },
    /// Search object keys containing a fragment
    Search { fragment: String },
    /// Load an asset through the cache
    Load {
        key: String,
        #[arg(short, long, value_enum, default_value_t = KindArg::Object)]
        kind: KindArg,
    },
    /// Transition to a scene, printing progress along the way
    Scene {
        key: String,
        /// Load alongside the current scene instead of replacing it
        #[arg(long)]
        additive: bool,
    },
    /// Apply a swap to a freshly registered anchor
    Swap { key: String },
    /// Run a scripted tour of every component
    Demo,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Image,
    Object,
    Generic,
    Binary,
}

impl From<KindArg> for ResourceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Image => ResourceKind::Image,
            KindArg::Object => ResourceKind::Object,
            KindArg::Generic => ResourceKind::Generic,
            KindArg::Binary => ResourceKind::Binary,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    use env_logger::{Builder, Env};
    Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let provider: Arc<dyn ContentProvider> = Arc::new(
        MemoryContentProvider::load_manifest(&cli.manifest)
            .with_context(|| format!("Cannot start without a manifest ({})", cli.manifest.display()))?,
    );
    let system = match &cli.config {
        Some(path) => ContentSystem::from_config_file(provider, path)?,
        None => ContentSystem::new(provider, StowageConfig::default()),
    };

    if !system.bootstrap().await {
        anyhow::bail!("Content provider failed to initialize");
    }

    match cli.command {
        Command::Keys { scenes } => list_keys(&system, scenes).await?,
        Command::Probe { key } => probe(&system, &key).await?,
        Command::Search { fragment } => search(&system, &fragment).await?,
        Command::Load { key, kind } => load(&system, &key, kind.into()).await?,
        Command::Scene { key, additive } => {
            let mode = if additive {
                SceneLoadMode::Additive
            } else {
                SceneLoadMode::Single
            };
            scene(&system, &key, mode).await?;
        }
        Command::Swap { key } => swap(&system, &key).await?,
        Command::Demo => demo(&system).await?,
    }

    system.cache().unload_all().await;
    print_metrics(&system);
    system.shutdown();
    Ok(())
}

async fn list_keys(system: &ContentSystem, scenes_only: bool) -> Result<()> {
    let keys = if scenes_only {
        system.catalog().scene_keys().await?
    } else {
        system.catalog().all_keys().await?
    };
    for key in &keys {
        println!("{key}");
    }
    log::info!("[Sandbox] {} key(s) listed", keys.len());
    Ok(())
}

async fn probe(system: &ContentSystem, key: &str) -> Result<()> {
    let result = system.probe().probe_exact(&KeyNormalizer::normalize(key)).await?;
    println!(
        "{key}: image={} object={}",
        result.has_image, result.has_object
    );
    Ok(())
}

async fn search(system: &ContentSystem, fragment: &str) -> Result<()> {
    let matches = system.probe().find_fuzzy_object_keys(fragment).await?;
    if matches.is_empty() {
        println!("no object keys contain '{fragment}'");
    }
    for key in matches {
        println!("{key}");
    }
    Ok(())
}

async fn load(system: &ContentSystem, key: &str, kind: ResourceKind) -> Result<()> {
    let key = AssetKey::new(key);
    let expected = system.downloads().expected_bytes(&key).await?;
    if expected > 0 {
        println!("{key} needs {expected} bytes of dependencies");
    }
    let handle = system.cache().load(&key, kind).await?;
    println!("loaded {} as {:?} (resident: {})", handle.key(), handle.kind(), system.cache().len());
    Ok(())
}

async fn scene(system: &ContentSystem, key: &str, mode: SceneLoadMode) -> Result<()> {
    let key = AssetKey::new(key);
    if !system.scenes().is_scene_key(&key).await? {
        anyhow::bail!("'{key}' is not a scene key");
    }

    let mut progress = system.scenes().watch_progress();
    let reporter = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let value = *progress.borrow_and_update();
            println!("  progress {:>5.1}%", value * 100.0);
        }
    });

    let result = system.scenes().load_scene(&key, mode).await;
    reporter.abort();
    let instance = result?;
    println!(
        "active scene '{}' ({:?}), state {:?}",
        instance.name,
        instance.mode,
        system.scenes().state()
    );
    Ok(())
}

async fn swap(system: &ContentSystem, key: &str) -> Result<()> {
    let key = AssetKey::new(key);
    let slot = derive_slot_id(key.as_str());
    let probe = system.probe().probe_exact(&KeyNormalizer::normalize(key.as_str())).await?;

    if probe.has_image {
        let anchor = Arc::new(ImageAnchor::new(slot.clone(), None));
        system.images().register(anchor.clone()).await?;
        let outcome = system.images().apply_by_asset_key(&key).await?;
        println!("image swap on '{slot}': {outcome:?} (overridden: {})", anchor.is_overridden());
    } else {
        let anchor = Arc::new(ObjectAnchor::new(slot.clone(), true));
        system.objects().register(anchor.clone()).await?;
        let outcome = system.objects().apply_by_asset_key(&key).await?;
        println!(
            "object swap on '{slot}': {outcome:?} (instance: {:?}, base visible: {})",
            anchor.override_instance().map(|instance| instance.name),
            anchor.base_visible()
        );
    }
    Ok(())
}

async fn demo(system: &ContentSystem) -> Result<()> {
    println!("== keys");
    list_keys(system, false).await?;

    let scenes = system.catalog().scene_keys().await?;
    if let Some(first) = scenes.first() {
        println!("== scene {first}");
        scene(system, first, SceneLoadMode::Single).await?;
    }

    let objects = system.probe().find_fuzzy_object_keys("outfit").await?;
    println!("== swaps over {} outfit(s)", objects.len());
    let anchor = Arc::new(ObjectAnchor::new(
        objects.first().map(|key| derive_slot_id(key)).unwrap_or_default(),
        true,
    ));
    system.objects().register(anchor.clone()).await?;
    for key in &objects {
        let outcome = system.objects().apply_by_asset_key(&AssetKey::new(key)).await?;
        println!("  {key}: {outcome:?}");
    }
    println!("  spawned {} instance(s) in total", anchor.spawn_count());
    system.objects().reset_all();

    if let Some(second) = scenes.get(1) {
        println!("== scene {second}");
        scene(system, second, SceneLoadMode::Single).await?;
    }
    system.scenes().unload_current_scene().await?;
    Ok(())
}

fn print_metrics(system: &ContentSystem) {
    for (id, value) in system.metrics().namespace_metrics("assets") {
        log::info!("[Sandbox] {id} = {value:?}");
    }
}

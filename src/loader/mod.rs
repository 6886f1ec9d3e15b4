//! Asset loader module.
//!
//! The [`AssetLoader`] fetches and decodes the assets of one catalog category
//! at a time, caching every decoded asset by path for the rest of the session.
//! Each category loads sequentially so progress moves forward one asset at a
//! time; a category is marked loaded (and never reloaded) only once every one
//! of its assets succeeded.

pub mod decode;
pub mod source;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use image::DynamicImage;
use kira::sound::static_sound::StaticSoundData;
use parking_lot::RwLock;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, error, info};

use crate::assets::{AssetCatalog, AssetCategory, AssetDefinition, AssetKind};
use crate::error::AssetLoadError;

pub use decode::LoadedAsset;
pub use source::{AssetSource, FileSource, HttpAssetSource, MemorySource, source_for};

const PROGRESS_CHANNEL_CAPACITY: usize = 64;

/// Progress of the most recent preload run of a category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadingProgress {
    pub total: usize,
    pub loaded: usize,
    /// `round(loaded / total * 100)`; 100 only once every asset resolved.
    pub percentage: u8,
    /// Path of the asset that completed last.
    pub current_asset: String,
}

impl LoadingProgress {
    fn after(loaded: usize, total: usize, current_asset: &str) -> Self {
        let percentage = if total == 0 {
            100
        } else {
            ((loaded as f64 / total as f64) * 100.0).round() as u8
        };
        Self {
            total,
            loaded,
            percentage,
            current_asset: current_asset.to_string(),
        }
    }
}

/// Broadcast after every completed asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub category: AssetCategory,
    pub progress: LoadingProgress,
}

struct Stage {
    /// Sticky: set once the whole category loaded.
    loaded: AtomicBool,
    /// Serializes preload runs of this category.
    guard: Mutex<()>,
    progress: RwLock<LoadingProgress>,
}

impl Stage {
    fn new() -> Self {
        Self {
            loaded: AtomicBool::new(false),
            guard: Mutex::new(()),
            progress: RwLock::new(LoadingProgress::default()),
        }
    }
}

pub struct AssetLoader {
    catalog: AssetCatalog,
    source: Arc<dyn AssetSource>,
    cache: RwLock<HashMap<String, LoadedAsset>>,
    stages: HashMap<AssetCategory, Stage>,
    progress_tx: broadcast::Sender<ProgressUpdate>,
}

impl AssetLoader {
    pub fn new(catalog: AssetCatalog, source: Arc<dyn AssetSource>) -> Self {
        let stages = AssetCategory::ALL
            .into_iter()
            .map(|category| (category, Stage::new()))
            .collect();
        let (progress_tx, _) = broadcast::channel(PROGRESS_CHANNEL_CAPACITY);
        Self {
            catalog,
            source,
            cache: RwLock::new(HashMap::new()),
            stages,
            progress_tx,
        }
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    /// Fetch and decode every asset of `category` that is not cached yet.
    ///
    /// Returns immediately once the category has fully loaded in this session.
    /// The first failing asset aborts the run; assets decoded before it stay
    /// cached and the category stays unloaded so the caller can try again.
    /// Concurrent callers for the same category wait for the running preload
    /// and then see its outcome.
    pub async fn preload_category(&self, category: AssetCategory) -> Result<(), AssetLoadError> {
        let stage = self.stage(category);
        if stage.loaded.load(Ordering::Acquire) {
            debug!("{} assets already loaded", category);
            return Ok(());
        }

        let _guard = stage.guard.lock().await;
        if stage.loaded.load(Ordering::Acquire) {
            debug!("{} assets loaded by a concurrent preload", category);
            return Ok(());
        }

        let assets: Vec<AssetDefinition> = self
            .catalog
            .in_category(category)
            .into_iter()
            .cloned()
            .collect();
        let total = assets.len();
        info!("loading {} {} assets", total, category);

        if total == 0 {
            self.publish(category, LoadingProgress::after(0, 0, ""));
        }

        for (i, asset) in assets.iter().enumerate() {
            if let Err(e) = self.load_asset(asset).await {
                error!("failed to load {} asset {}: {}", category, asset.path, e);
                return Err(e);
            }
            self.publish(category, LoadingProgress::after(i + 1, total, &asset.path));
        }

        stage.loaded.store(true, Ordering::Release);
        info!("{} assets loaded", category);
        Ok(())
    }

    /// Decoded audio for `path`, loading it on demand if it was not preloaded.
    pub async fn ensure_audio(&self, path: &str) -> Result<StaticSoundData, AssetLoadError> {
        let asset = self
            .catalog
            .find(path)
            .cloned()
            .ok_or_else(|| AssetLoadError::Unknown(path.to_string()))?;
        if asset.kind != AssetKind::Audio {
            return Err(AssetLoadError::Decode {
                path: asset.path,
                kind: asset.kind,
                reason: "not an audio asset".to_string(),
            });
        }

        match self.load_asset(&asset).await? {
            LoadedAsset::Audio(data) => Ok(data),
            LoadedAsset::Image(_) => Err(AssetLoadError::Decode {
                path: asset.path,
                kind: AssetKind::Audio,
                reason: "cached entry is an image".to_string(),
            }),
        }
    }

    async fn load_asset(&self, asset: &AssetDefinition) -> Result<LoadedAsset, AssetLoadError> {
        let cached = self.cache.read().get(&asset.path).cloned();
        if let Some(hit) = cached {
            debug!("cache hit {}", asset.path);
            return Ok(hit);
        }

        let bytes = self.source.fetch(&asset.path).await?;
        let loaded = decode::decode(asset, bytes).await?;
        debug!("decoded {} asset {}", asset.kind, asset.path);

        let mut cache = self.cache.write();
        Ok(cache.entry(asset.path.clone()).or_insert(loaded).clone())
    }

    fn publish(&self, category: AssetCategory, progress: LoadingProgress) {
        debug!(
            "{} progress {}% ({}/{})",
            category, progress.percentage, progress.loaded, progress.total
        );
        *self.stage(category).progress.write() = progress.clone();
        // No subscribers is fine.
        let _ = self.progress_tx.send(ProgressUpdate { category, progress });
    }

    fn stage(&self, category: AssetCategory) -> &Stage {
        &self.stages[&category]
    }

    pub fn is_category_loaded(&self, category: AssetCategory) -> bool {
        self.stage(category).loaded.load(Ordering::Acquire)
    }

    /// Latest progress published for `category`.
    pub fn progress(&self, category: AssetCategory) -> LoadingProgress {
        self.stage(category).progress.read().clone()
    }

    /// Receive a [`ProgressUpdate`] for every asset completed from now on.
    pub fn subscribe_progress(&self) -> broadcast::Receiver<ProgressUpdate> {
        self.progress_tx.subscribe()
    }

    pub fn audio(&self, path: &str) -> Option<StaticSoundData> {
        self.cache.read().get(path).and_then(|a| a.as_audio().cloned())
    }

    pub fn image(&self, path: &str) -> Option<Arc<DynamicImage>> {
        self.cache.read().get(path).and_then(|a| a.as_image().cloned())
    }

    pub fn is_cached(&self, path: &str) -> bool {
        self.cache.read().contains_key(path)
    }

    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }

    /// Drop every cached asset and forget which categories loaded.
    ///
    /// Meant for starting a fresh session; do not call while a preload runs.
    pub fn reset(&self) {
        self.cache.write().clear();
        for stage in self.stages.values() {
            stage.loaded.store(false, Ordering::Release);
            *stage.progress.write() = LoadingProgress::default();
        }
        info!("asset cache cleared");
    }
}

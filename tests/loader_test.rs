mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{CountingSource, counting_loader, source_for_catalog, wav_bytes};
use daily_cover::assets::{AssetCatalog, AssetCategory, AssetDefinition};
use daily_cover::error::AssetLoadError;
use daily_cover::loader::{AssetLoader, FileSource, ProgressUpdate};
use tokio::sync::broadcast;

const MENU: &str = "audio/menu.mp3";
const MOUSE_CLICK: &str = "audio/mouse-click.wav";
const CORRECT: &str = "audio/correct.mp3";
const WRONG: &str = "audio/wrong-2.wav";
const LOGO: &str = "img/logo.png";

/// Two critical assets and three game assets.
fn small_catalog() -> AssetCatalog {
    use AssetCategory::{Critical, Game};
    AssetCatalog::new(vec![
        AssetDefinition::audio(MENU, Critical),
        AssetDefinition::audio(MOUSE_CLICK, Critical),
        AssetDefinition::audio(CORRECT, Game),
        AssetDefinition::audio(WRONG, Game),
        AssetDefinition::image(LOGO, Game),
    ])
}

fn drain(rx: &mut broadcast::Receiver<ProgressUpdate>, category: AssetCategory) -> Vec<u8> {
    let mut seen = Vec::new();
    while let Ok(update) = rx.try_recv() {
        if update.category == category {
            seen.push(update.progress.percentage);
        }
    }
    seen
}

#[tokio::test]
async fn preloading_twice_fetches_each_path_once() {
    let (loader, source) = counting_loader(small_catalog());

    loader.preload_category(AssetCategory::Critical).await.unwrap();
    loader.preload_category(AssetCategory::Critical).await.unwrap();

    assert!(loader.is_category_loaded(AssetCategory::Critical));
    assert_eq!(source.fetches(MENU), 1);
    assert_eq!(source.fetches(MOUSE_CLICK), 1);
    assert_eq!(source.total_fetches(), 2);
    assert!(!loader.is_category_loaded(AssetCategory::Game));
}

#[tokio::test]
async fn critical_progress_reports_half_then_full() {
    let (loader, _source) = counting_loader(small_catalog());
    let mut rx = loader.subscribe_progress();

    loader.preload_category(AssetCategory::Critical).await.unwrap();

    assert_eq!(drain(&mut rx, AssetCategory::Critical), vec![50, 100]);
    let progress = loader.progress(AssetCategory::Critical);
    assert_eq!((progress.loaded, progress.total), (2, 2));
    assert_eq!(progress.current_asset, MOUSE_CLICK);
}

#[tokio::test]
async fn game_progress_is_monotonic() {
    let (loader, _source) = counting_loader(small_catalog());
    let mut rx = loader.subscribe_progress();

    loader.preload_category(AssetCategory::Game).await.unwrap();

    let seen = drain(&mut rx, AssetCategory::Game);
    assert_eq!(seen, vec![33, 67, 100]);
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn failed_asset_keeps_category_open_for_retry() {
    let (loader, source) = counting_loader(small_catalog());
    source.fail(WRONG);

    let err = loader
        .preload_category(AssetCategory::Game)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, AssetLoadError::Fetch { .. }));
    assert_eq!(err.path(), WRONG);
    assert!(!loader.is_category_loaded(AssetCategory::Game));
    assert!(loader.is_cached(CORRECT));
    assert!(!loader.is_cached(LOGO));
    assert!(loader.progress(AssetCategory::Game).percentage < 100);

    source.heal(WRONG);
    loader.preload_category(AssetCategory::Game).await.unwrap();

    assert!(loader.is_category_loaded(AssetCategory::Game));
    assert_eq!(loader.progress(AssetCategory::Game).percentage, 100);
    assert_eq!(source.fetches(CORRECT), 1);
    assert_eq!(source.fetches(WRONG), 2);
    assert_eq!(source.fetches(LOGO), 1);
}

#[tokio::test]
async fn undecodable_asset_rejects_the_category() {
    let catalog = small_catalog();
    let mut memory = source_for_catalog(&catalog);
    memory.insert(MOUSE_CLICK, &b"definitely not audio"[..]);
    let loader = AssetLoader::new(catalog, Arc::new(memory));

    let err = loader
        .preload_category(AssetCategory::Critical)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, AssetLoadError::Decode { .. }));
    assert!(loader.is_cached(MENU));
    assert!(!loader.is_category_loaded(AssetCategory::Critical));
}

#[tokio::test]
async fn concurrent_preloads_wait_for_the_same_run() {
    let catalog = small_catalog();
    let source = Arc::new(
        CountingSource::new(source_for_catalog(&catalog)).with_delay(Duration::from_millis(20)),
    );
    let loader = AssetLoader::new(catalog, source.clone());

    let (a, b) = tokio::join!(
        loader.preload_category(AssetCategory::Critical),
        loader.preload_category(AssetCategory::Critical)
    );

    assert!(a.is_ok() && b.is_ok());
    assert!(loader.is_category_loaded(AssetCategory::Critical));
    assert_eq!(source.fetches(MENU), 1);
    assert_eq!(source.fetches(MOUSE_CLICK), 1);
}

#[tokio::test]
async fn assets_are_readable_from_the_cache() {
    let (loader, _source) = counting_loader(small_catalog());
    loader.preload_category(AssetCategory::Game).await.unwrap();

    let logo = loader.image(LOGO).unwrap();
    assert_eq!((logo.width(), logo.height()), (2, 2));
    assert!(loader.audio(CORRECT).is_some());
    assert!(loader.audio(LOGO).is_none());
    assert!(loader.image(CORRECT).is_none());
    assert_eq!(loader.cached_count(), 3);
}

#[tokio::test]
async fn ensure_audio_loads_on_demand_and_caches() {
    let (loader, source) = counting_loader(small_catalog());

    loader.ensure_audio(CORRECT).await.unwrap();
    loader.ensure_audio(CORRECT).await.unwrap();
    assert_eq!(source.fetches(CORRECT), 1);

    // A later preload of the category reuses the cached entry.
    loader.preload_category(AssetCategory::Game).await.unwrap();
    assert_eq!(source.fetches(CORRECT), 1);

    let err = loader.ensure_audio(LOGO).await.err().unwrap();
    assert!(matches!(err, AssetLoadError::Decode { .. }));
}

#[tokio::test]
async fn reset_forgets_everything() {
    let (loader, source) = counting_loader(small_catalog());
    loader.preload_category(AssetCategory::Critical).await.unwrap();

    loader.reset();
    assert_eq!(loader.cached_count(), 0);
    assert!(!loader.is_category_loaded(AssetCategory::Critical));
    assert_eq!(loader.progress(AssetCategory::Critical).percentage, 0);

    loader.preload_category(AssetCategory::Critical).await.unwrap();
    assert_eq!(source.fetches(MENU), 2);
}

#[tokio::test]
async fn loads_from_an_asset_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("audio")).unwrap();
    std::fs::write(dir.path().join(MENU), wav_bytes(441)).unwrap();
    std::fs::write(dir.path().join(MOUSE_CLICK), wav_bytes(441)).unwrap();

    let loader = AssetLoader::new(small_catalog(), Arc::new(FileSource::new(dir.path())));
    loader.preload_category(AssetCategory::Critical).await.unwrap();
    assert!(loader.audio(MENU).is_some());

    // Game assets were never written.
    let err = loader
        .preload_category(AssetCategory::Game)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, AssetLoadError::Fetch { .. }));
}

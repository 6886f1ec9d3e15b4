use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use image::DynamicImage;
use kira::sound::static_sound::StaticSoundData;

use crate::assets::{AssetDefinition, AssetKind};
use crate::error::AssetLoadError;

/// A decoded asset held by the loader cache.
#[derive(Clone)]
pub enum LoadedAsset {
    Audio(StaticSoundData),
    Image(Arc<DynamicImage>),
}

impl LoadedAsset {
    pub fn kind(&self) -> AssetKind {
        match self {
            LoadedAsset::Audio(_) => AssetKind::Audio,
            LoadedAsset::Image(_) => AssetKind::Image,
        }
    }

    pub fn as_audio(&self) -> Option<&StaticSoundData> {
        match self {
            LoadedAsset::Audio(data) => Some(data),
            LoadedAsset::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&Arc<DynamicImage>> {
        match self {
            LoadedAsset::Image(image) => Some(image),
            LoadedAsset::Audio(_) => None,
        }
    }
}

/// Decodes fetched bytes on the blocking pool.
pub async fn decode(asset: &AssetDefinition, bytes: Bytes) -> Result<LoadedAsset, AssetLoadError> {
    let kind = asset.kind;
    let path = asset.path.clone();
    let decode_error = move |reason: String| AssetLoadError::Decode {
        path: path.clone(),
        kind,
        reason,
    };

    let result = tokio::task::spawn_blocking(move || decode_blocking(kind, bytes))
        .await
        .map_err(|e| decode_error(e.to_string()))?;
    result.map_err(decode_error)
}

fn decode_blocking(kind: AssetKind, bytes: Bytes) -> Result<LoadedAsset, String> {
    match kind {
        AssetKind::Audio => StaticSoundData::from_cursor(Cursor::new(bytes))
            .map(LoadedAsset::Audio)
            .map_err(|e| e.to_string()),
        AssetKind::Image => image::load_from_memory(&bytes)
            .map(|image| LoadedAsset::Image(Arc::new(image)))
            .map_err(|e| e.to_string()),
    }
}

// Where asset bytes come from: local files, an HTTP(S) base URL or memory.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::debug;

use crate::error::AssetLoadError;

#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Fetch the raw bytes for an asset path relative to the asset root.
    async fn fetch(&self, path: &str) -> Result<Bytes, AssetLoadError>;
}

/// Reads assets from a directory on disk.
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl AssetSource for FileSource {
    async fn fetch(&self, path: &str) -> Result<Bytes, AssetLoadError> {
        let full = self.root.join(path);
        debug!("reading asset {}", full.display());
        let data = tokio::fs::read(&full)
            .await
            .map_err(|e| AssetLoadError::Fetch {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Bytes::from(data))
    }
}

/// Downloads assets from a static server or CDN.
pub struct HttpAssetSource {
    client: Client,
    base: String,
}

impl HttpAssetSource {
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base)
    }

    pub fn with_client(client: Client, base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { client, base }
    }
}

#[async_trait]
impl AssetSource for HttpAssetSource {
    async fn fetch(&self, path: &str) -> Result<Bytes, AssetLoadError> {
        let url = format!("{}/{}", self.base, path.trim_start_matches('/'));
        let fail = |reason: String| AssetLoadError::Fetch {
            path: path.to_string(),
            reason,
        };

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;
        let status = resp.status();
        debug!("asset GET {} status={}", url, status.as_u16());
        if !status.is_success() {
            return Err(fail(format!("HTTP {}", status.as_u16())));
        }
        resp.bytes().await.map_err(|e| fail(e.to_string()))
    }
}

/// Serves assets from memory, e.g. bytes embedded with `include_bytes!`.
#[derive(Default)]
pub struct MemorySource {
    files: HashMap<String, Bytes>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.insert(path, data);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, data: impl Into<Bytes>) {
        self.files.insert(path.into(), data.into());
    }
}

#[async_trait]
impl AssetSource for MemorySource {
    async fn fetch(&self, path: &str) -> Result<Bytes, AssetLoadError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| AssetLoadError::Fetch {
                path: path.to_string(),
                reason: "not found".to_string(),
            })
    }
}

/// Picks the source matching the configured asset root.
pub fn source_for(asset_root: &str) -> Arc<dyn AssetSource> {
    if asset_root.starts_with("http://") || asset_root.starts_with("https://") {
        Arc::new(HttpAssetSource::new(asset_root))
    } else {
        Arc::new(FileSource::new(asset_root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_source_reads_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("audio")).unwrap();
        std::fs::write(dir.path().join("audio/a.wav"), b"abc").unwrap();

        let source = FileSource::new(dir.path());
        let data = source.fetch("audio/a.wav").await.unwrap();
        assert_eq!(&data[..], b"abc");

        let err = source.fetch("audio/missing.wav").await.unwrap_err();
        assert_eq!(err.path(), "audio/missing.wav");
    }

    #[tokio::test]
    async fn memory_source_misses_are_fetch_errors() {
        let source = MemorySource::new().with("img/cover.png", vec![1u8, 2, 3]);
        assert_eq!(source.fetch("img/cover.png").await.unwrap().len(), 3);
        assert!(matches!(
            source.fetch("img/other.png").await,
            Err(AssetLoadError::Fetch { .. })
        ));
    }
}

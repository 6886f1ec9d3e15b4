#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use daily_cover::assets::{AssetCatalog, AssetKind};
use daily_cover::audio::AudioEngine;
use daily_cover::error::{AssetLoadError, AudioUnlockError, FetchError};
use daily_cover::fetch::Transport;
use daily_cover::loader::{AssetLoader, AssetSource, MemorySource};
use kira::backend::mock::MockBackend;
use kira::{AudioManager, AudioManagerSettings};
use parking_lot::Mutex;

/// A short 16-bit mono WAV tone.
pub fn wav_bytes(frames: usize) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44_100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..frames {
            let sample = ((i as f32 * 0.05).sin() * 8000.0) as i16;
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([200, 30, 30, 255]));
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    png
}

/// A memory source holding valid bytes for every asset of `catalog`.
pub fn source_for_catalog(catalog: &AssetCatalog) -> MemorySource {
    let wav = Bytes::from(wav_bytes(441));
    let png = Bytes::from(png_bytes());
    let mut source = MemorySource::new();
    for category in daily_cover::AssetCategory::ALL {
        for asset in catalog.in_category(category) {
            let data = match asset.kind {
                AssetKind::Audio => wav.clone(),
                AssetKind::Image => png.clone(),
            };
            source.insert(asset.path.clone(), data);
        }
    }
    source
}

/// Wraps a source, counting fetches per path and failing chosen paths.
pub struct CountingSource {
    inner: MemorySource,
    fetches: Mutex<HashMap<String, usize>>,
    failing: Mutex<HashSet<String>>,
    delay: Duration,
}

impl CountingSource {
    pub fn new(inner: MemorySource) -> Self {
        Self {
            inner,
            fetches: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fail(&self, path: &str) {
        self.failing.lock().insert(path.to_string());
    }

    pub fn heal(&self, path: &str) {
        self.failing.lock().remove(path);
    }

    pub fn fetches(&self, path: &str) -> usize {
        self.fetches.lock().get(path).copied().unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.fetches.lock().values().sum()
    }
}

#[async_trait]
impl AssetSource for CountingSource {
    async fn fetch(&self, path: &str) -> Result<Bytes, AssetLoadError> {
        *self.fetches.lock().entry(path.to_string()).or_insert(0) += 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.lock().contains(path) {
            return Err(AssetLoadError::Fetch {
                path: path.to_string(),
                reason: "connection reset".to_string(),
            });
        }
        self.inner.fetch(path).await
    }
}

/// A loader over `catalog` with every asset available, plus the counting
/// source behind it.
pub fn counting_loader(catalog: AssetCatalog) -> (AssetLoader, Arc<CountingSource>) {
    let source = Arc::new(CountingSource::new(source_for_catalog(&catalog)));
    let loader = AssetLoader::new(catalog, source.clone());
    (loader, source)
}

pub fn mock_engine() -> AudioEngine<MockBackend> {
    AudioEngine::<MockBackend>::new(0.1, 0.6)
}

/// A mock engine whose output refuses to open the first `failures` times.
pub fn flaky_engine(failures: usize) -> AudioEngine<MockBackend> {
    let attempts = AtomicUsize::new(0);
    AudioEngine::<MockBackend>::with_opener(
        0.1,
        0.6,
        Box::new(move || {
            if attempts.fetch_add(1, Ordering::SeqCst) < failures {
                return Err(AudioUnlockError::Output("no output device".to_string()));
            }
            AudioManager::<MockBackend>::new(AudioManagerSettings::default())
                .map_err(|e| AudioUnlockError::Output(format!("{:?}", e)))
        }),
    )
}

/// Run the mock renderer long enough for short clips to finish.
pub fn drive_output(engine: &AudioEngine<MockBackend>) {
    engine.with_backend(|backend| {
        for _ in 0..4 {
            backend.on_start_processing();
            backend.process();
        }
    });
}

/// Transport that answers from a script, then repeats the last entry.
pub struct ScriptedTransport {
    script: Mutex<Vec<Result<Bytes, FetchError>>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<Bytes, FetchError>>) -> Self {
        Self {
            script: Mutex::new(script),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn always_failing() -> Self {
        Self::new(vec![Err(unavailable("http://test/api"))])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, _url: &str) -> Result<Bytes, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock();
        if script.len() > 1 {
            script.remove(0)
        } else {
            script[0].clone()
        }
    }
}

pub fn unavailable(url: &str) -> FetchError {
    FetchError::Status {
        url: url.to_string(),
        status: 503,
    }
}

pub fn questions_json(count: usize) -> String {
    let questions: Vec<String> = (0..count)
        .map(|i| {
            format!(
                r#"{{"id":"q{i}","albumCover":"https://covers.test/{i}.jpg","albumName":"Album {i}","correctAnswer":"Artist {i}","options":["Artist {i}","Other A","Other B","Other C"]}}"#
            )
        })
        .collect();
    format!(
        r#"{{"questions":[{}],"totalQuestions":{}}}"#,
        questions.join(","),
        count
    )
}

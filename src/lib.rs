//! Daily Cover - guess the artist behind today's album covers
//!
//! Library half of the daily trivia game. The interesting parts are the asset
//! pipeline and the audio layer that have to be ready, in order, before the
//! player gets to interact with anything:
//!
//! # Features
//! - **Asset preloading**: category-based preloading (critical before the home
//!   screen, game before the quiz) with per-path caching and progress events
//! - **Audio**: kira-backed engine with an unlock-on-first-input gate, pre-decoded
//!   sound effects, looping music, fades, volume and mute
//! - **Question feed**: daily question fetch with exponential-backoff retries and
//!   observable retry state
//! - **Game flow**: home screen, loading screen and a timed quiz driven by an
//!   explicit session state
//!
//! # Architecture
//! - `assets`: static catalog of loadable assets
//! - `loader/`: asset sources, decoding, caching and progress
//! - `audio/`: the audio engine and the closed set of sound identifiers
//! - `fetch/`: HTTP transport and the retrying fetcher
//! - `game/`: questions, quiz session, tips, countdowns and timelines
//! - `app/`: the game-flow controller and terminal input mapping

pub mod app;
pub mod assets;
pub mod audio;
pub mod config;
pub mod error;
pub mod fetch;
pub mod game;
pub mod loader;

pub use app::{FlowHooks, GameFlow};
pub use assets::{AssetCatalog, AssetCategory, AssetDefinition, AssetKind};
pub use audio::{AudioEngine, MusicTrack, SoundId};
pub use config::GameConfig;
pub use fetch::{RetryState, RetryingFetcher};
pub use loader::{AssetLoader, LoadingProgress};

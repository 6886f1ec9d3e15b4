//! Error types shared across the loader, audio engine, fetcher and game flow.

use thiserror::Error;

use crate::assets::AssetKind;

/// A single asset could not be fetched or decoded.
#[derive(Debug, Clone, Error)]
pub enum AssetLoadError {
    #[error("failed to fetch asset {path}: {reason}")]
    Fetch { path: String, reason: String },
    #[error("failed to decode {kind} asset {path}: {reason}")]
    Decode {
        path: String,
        kind: AssetKind,
        reason: String,
    },
    #[error("asset {0} is not in the catalog")]
    Unknown(String),
}

impl AssetLoadError {
    pub fn path(&self) -> &str {
        match self {
            AssetLoadError::Fetch { path, .. }
            | AssetLoadError::Decode { path, .. }
            | AssetLoadError::Unknown(path) => path,
        }
    }
}

/// The audio output could not be activated.
#[derive(Debug, Clone, Error)]
pub enum AudioUnlockError {
    #[error("audio output unavailable: {0}")]
    Output(String),
    #[error("audio output rejected the validation sound: {0}")]
    Validation(String),
}

/// One failed request attempt.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("response from {url} could not be parsed: {reason}")]
    Parse { url: String, reason: String },
}

/// Every attempt of a retried request failed.
#[derive(Debug, Clone, Error)]
#[error("giving up after {attempts} retries: {last}")]
pub struct FetchRetryExhausted {
    /// Retries performed after the initial attempt.
    pub attempts: u32,
    /// Error from the final attempt.
    #[source]
    pub last: FetchError,
}

/// Failures that stop the game flow from moving to the next screen.
#[derive(Debug, Clone, Error)]
pub enum FlowError {
    #[error(transparent)]
    Assets(#[from] AssetLoadError),
    #[error(transparent)]
    Questions(#[from] FetchRetryExhausted),
    #[error("cannot {0} yet")]
    NotReady(&'static str),
}

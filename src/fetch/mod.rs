//! Retrying JSON fetcher.
//!
//! [`RetryingFetcher::fetch_with_retry`] issues a GET and, on failure, retries
//! with exponential backoff (1 s, 2 s, 4 s, ... by default). The retry
//! progress is published on a `watch` channel so a loading screen can show
//! "retrying 2/3" without the fetch logic knowing about it.

pub mod transport;

use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::error::{FetchError, FetchRetryExhausted};

pub use transport::{HttpTransport, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry `retry` (1-indexed): `base_delay * 2^(retry - 1)`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay * 2u32.pow(exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl From<&GameConfig> for RetryPolicy {
    fn from(config: &GameConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.retry_base_delay,
        }
    }
}

/// Live view of the fetch in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    pub current_attempt: u32,
    pub max_attempts: u32,
    pub is_retrying: bool,
    pub has_failed: bool,
}

impl RetryState {
    fn initial(max_attempts: u32) -> Self {
        Self {
            current_attempt: 0,
            max_attempts,
            is_retrying: false,
            has_failed: false,
        }
    }
}

pub struct RetryingFetcher<T: Transport = HttpTransport> {
    transport: T,
    policy: RetryPolicy,
    state: watch::Sender<RetryState>,
}

impl RetryingFetcher<HttpTransport> {
    pub fn http(policy: RetryPolicy) -> Self {
        Self::new(HttpTransport::new(), policy)
    }
}

impl<T: Transport> RetryingFetcher<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        let (state, _) = watch::channel(RetryState::initial(policy.max_retries));
        Self {
            transport,
            policy,
            state,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn state(&self) -> RetryState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RetryState> {
        self.state.subscribe()
    }

    /// GET `url` and parse the JSON body, retrying failed attempts.
    ///
    /// Resets the retry state first. The error of the last attempt is
    /// returned once every retry has failed.
    pub async fn fetch_with_retry<R: DeserializeOwned>(&self, url: &str) -> Result<R, FetchRetryExhausted> {
        let max = self.policy.max_retries;
        self.state.send_replace(RetryState::initial(max));

        let mut retry = 0;
        loop {
            match self.attempt::<R>(url).await {
                Ok(payload) => {
                    self.state.send_modify(|s| s.is_retrying = false);
                    if retry > 0 {
                        info!("fetched {} after {} retries", url, retry);
                    }
                    return Ok(payload);
                }
                Err(e) if retry >= max => {
                    self.state.send_modify(|s| {
                        s.is_retrying = false;
                        s.has_failed = true;
                    });
                    warn!("giving up on {} after {} retries: {}", url, retry, e);
                    return Err(FetchRetryExhausted {
                        attempts: retry,
                        last: e,
                    });
                }
                Err(e) => {
                    retry += 1;
                    let delay = self.policy.delay_for(retry);
                    self.state.send_modify(|s| {
                        s.current_attempt = retry;
                        s.is_retrying = true;
                    });
                    warn!(
                        "request failed ({}), retry {}/{} in {:?}",
                        e, retry, max, delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn attempt<R: DeserializeOwned>(&self, url: &str) -> Result<R, FetchError> {
        let body = self.transport.get(url).await?;
        debug!("received {} bytes from {}", body.len(), url);
        serde_json::from_slice(&body).map_err(|e| FetchError::Parse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

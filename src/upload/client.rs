//! # Upload Client
//!
//! Executes one upload against the retry/backoff protocol.
//!
//! ## State Machine
//!
//! ```text
//!             ┌──────────────── MissingArtifact ───────────────┐
//!             │                                                ▼
//! Building ───┴──▶ Sending(n) ──2xx──────────▶ Succeeded   FailedPermanent
//!                     │  ▲                                     ▲   ▲
//!                     │  └── wait n × step ── Retrying(n)      │   │
//!                     │                          ▲   │ n = max │   │
//!                     ├──5xx / transport ────────┘   └─────────┘   │
//!                     └──4xx───────────────────────────────────────┘
//! ```
//!
//! - One network call per `Sending`; attempts never overlap.
//! - Backoff is linear: 1 s after the first failure, 2 s after the second.
//! - Artifacts are read once in `Building`; every attempt gets a freshly built body.
//! - A started attempt always runs to a response or a transport error.

// Standard library imports
use std::time::Duration;

// External crate imports
use tracing::{debug, info, warn};

// Internal module imports
use crate::error::{Retryable, ScanError, ScanResult};
use crate::store::FrameStore;
use crate::upload::request::{LoadedArtifacts, UploadRequest};
use crate::upload::transport::{HttpResponse, ReqwestTransport, UploadTransport};

/// Path appended to the base URI.
pub const PROCESS_PATH: &str = "/process";

/// Settings consumed by [`UploadClient`]; see [`crate::config::ScanConfig::upload_config`].
#[derive(Clone, Debug, PartialEq)]
pub struct UploadConfig {
    /// Service root without trailing slash
    pub base_uri: String,
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Linear backoff unit
    pub backoff_step: Duration,
    /// Whole-request timeout
    pub request_timeout: Duration,
    /// Connection setup timeout
    pub connect_timeout: Duration,
}

impl UploadConfig {
    /// Full URL of the processing endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.base_uri.trim_end_matches('/'), PROCESS_PATH)
    }

    /// Wait inserted after failed attempt `attempt` (1-based).
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}

/// Result of a successful upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadOutcome {
    pub status: u16,
    pub body: String,
    /// Attempts used, 1-based
    pub attempts: u32,
}

/// Upload protocol states.
#[derive(Debug)]
pub enum UploadState {
    /// Reading artifacts and assembling the body
    Building,
    /// Attempt `attempt` is on the wire
    Sending { attempt: u32 },
    /// Attempt `attempt` failed with a retryable error; backing off
    Retrying { attempt: u32, error: ScanError },
    Succeeded(UploadOutcome),
    FailedPermanent(ScanError),
}

impl UploadState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::FailedPermanent(_))
    }

    /// Transition out of `Sending { attempt }` given what the attempt produced.
    pub fn after_attempt(attempt: u32, max_attempts: u32, result: ScanResult<HttpResponse>) -> Self {
        let error = match result {
            Ok(response) if response.is_success() => {
                return Self::Succeeded(UploadOutcome {
                    status: response.status,
                    body: response.body,
                    attempts: attempt,
                });
            }
            Ok(response) => ScanError::from_status(response.status, response.body),
            Err(error) => error,
        };

        if !error.is_retryable() {
            Self::FailedPermanent(error)
        } else if attempt < max_attempts {
            Self::Retrying { attempt, error }
        } else {
            Self::FailedPermanent(ScanError::RetriesExhausted {
                attempts: attempt,
                last: Box::new(error),
            })
        }
    }
}

/// Packages frame artifacts into a multipart request and sends it with bounded retries.
pub struct UploadClient<T = ReqwestTransport> {
    config: UploadConfig,
    transport: T,
}

impl UploadClient<ReqwestTransport> {
    /// Client backed by reqwest with the configured timeouts.
    pub fn new(config: UploadConfig) -> ScanResult<Self> {
        let transport = ReqwestTransport::new(config.request_timeout, config.connect_timeout)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: UploadTransport> UploadClient<T> {
    pub fn with_transport(config: UploadConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run the state machine to a terminal state.
    ///
    /// `Ok` carries the success body for the response mapper; `Err` is the single
    /// terminal failure (`MissingArtifact`, `Client`, `RetriesExhausted`, ...).
    pub async fn upload(&self, request: &UploadRequest, store: &dyn FrameStore) -> ScanResult<UploadOutcome> {
        let url = self.config.endpoint();
        let max_attempts = self.config.max_attempts.max(1);
        let mut artifacts: Option<LoadedArtifacts> = None;
        let mut state = UploadState::Building;

        loop {
            state = match state {
                UploadState::Building => match request.load(store).await {
                    Ok(loaded) => {
                        debug!(key = %request.key(), bytes = loaded.total_bytes(), "upload artifacts loaded");
                        artifacts = Some(loaded);
                        UploadState::Sending { attempt: 1 }
                    }
                    Err(error) => UploadState::FailedPermanent(error),
                },
                UploadState::Sending { attempt } => match &artifacts {
                    Some(loaded) => {
                        info!(key = %request.key(), attempt, max_attempts, %url, "sending upload");
                        let result = self.transport.post_multipart(&url, loaded.to_multipart()).await;
                        UploadState::after_attempt(attempt, max_attempts, result)
                    }
                    None => UploadState::Building,
                },
                UploadState::Retrying { attempt, error } => {
                    let wait = self.config.backoff_after(attempt);
                    warn!(
                        key = %request.key(),
                        attempt,
                        error = %error,
                        wait_ms = wait.as_millis() as u64,
                        "upload attempt failed, backing off"
                    );
                    tokio::time::sleep(wait).await;
                    UploadState::Sending { attempt: attempt + 1 }
                }
                UploadState::Succeeded(outcome) => {
                    info!(key = %request.key(), status = outcome.status, attempts = outcome.attempts, "upload succeeded");
                    return Ok(outcome);
                }
                UploadState::FailedPermanent(error) => {
                    warn!(key = %request.key(), error = %error, "upload failed permanently");
                    return Err(error);
                }
            };
        }
    }
}

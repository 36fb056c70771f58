//! # Capture Orchestration
//!
//! Sequences one capture → encode → store → upload → map cycle and makes sure at most
//! one cycle runs per orchestrator.
//!
//! ## Flow
//!
//! ```text
//! try_acquire ──busy──▶ Err(CaptureBusy)
//!      │
//!      ▼
//! new FrameKey ─▶ ┌ depth capture ┐ (concurrent, both awaited)
//!                 └ rgb capture   ┘
//!      │
//!      ▼
//! settle delay (fixed) ─▶ UploadClient::upload ─▶ response::map ─▶ CaptureReport
//! ```
//!
//! ## Single-Flight
//!
//! The busy flag is a compare-and-swap on an `AtomicBool`, taken before the captures
//! start and released by a guard once the upload reached a terminal state and the
//! body was mapped. A caller arriving in between is rejected, never queued.
//!
//! ## Partial Capture Failure
//!
//! A sensor that fails to deliver an image (`ScanError::Capture`) does not stop the
//! cycle: the upload is still attempted and reports `MissingArtifact` if the pair is
//! absent. The sensor errors are kept and the terminal error comes back wrapped in
//! `IncompleteCapture`, so the caller sees both. Codec and storage errors abort the
//! cycle immediately.

// Standard library imports
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

// External crate imports
use futures_util::future::join;
use scan_codec::meta::{DepthFrameMetadata, RgbFrameMetadata};
use tokio::sync::Mutex;
use tracing::{info, warn};

// Internal module imports
use crate::capture::{CaptureSource, capture_depth, capture_rgb};
use crate::config::ScanConfig;
use crate::error::{ScanError, ScanResult};
use crate::response::{self, NutritionRecord};
use crate::store::{FileStore, FrameKey, FrameStore};
use crate::upload::{ReqwestTransport, UploadClient, UploadRequest, UploadTransport};

/// Everything one successful cycle produced.
#[derive(Clone, Debug)]
pub struct CaptureReport {
    pub key: FrameKey,
    /// `None` if the depth sensor failed but artifacts were present anyway
    pub depth: Option<DepthFrameMetadata>,
    /// `None` if the color sensor failed but artifacts were present anyway
    pub rgb: Option<RgbFrameMetadata>,
    pub attempts: u32,
    pub records: Vec<NutritionRecord>,
}

/// Releases the busy flag when dropped.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Drives capture and upload for one depth + color sensor pair.
pub struct CaptureOrchestrator<T = ReqwestTransport> {
    depth_source: Mutex<Box<dyn CaptureSource>>,
    rgb_source: Mutex<Box<dyn CaptureSource>>,
    store: Arc<dyn FrameStore>,
    client: UploadClient<T>,
    settle_delay: Duration,
    mirror_rgb: bool,
    busy: AtomicBool,
    last_key_ms: AtomicU64,
}

impl CaptureOrchestrator<ReqwestTransport> {
    /// Orchestrator writing to a [`FileStore`] and uploading with reqwest, as configured.
    pub fn from_config(
        config: &ScanConfig,
        depth_source: Box<dyn CaptureSource>,
        rgb_source: Box<dyn CaptureSource>,
    ) -> ScanResult<Self> {
        config
            .validate()
            .map_err(|reason| ScanError::config("scan config", reason))?;
        let client = UploadClient::new(config.upload_config())?;
        let store: Arc<dyn FrameStore> = Arc::new(FileStore::new(&config.artifact_dir));
        Ok(Self::new(depth_source, rgb_source, store, client)
            .with_settle_delay(config.settle_delay)
            .with_mirror_rgb(config.mirror_rgb))
    }
}

impl<T: UploadTransport> CaptureOrchestrator<T> {
    pub fn new(
        depth_source: Box<dyn CaptureSource>,
        rgb_source: Box<dyn CaptureSource>,
        store: Arc<dyn FrameStore>,
        client: UploadClient<T>,
    ) -> Self {
        Self {
            depth_source: Mutex::new(depth_source),
            rgb_source: Mutex::new(rgb_source),
            store,
            client,
            settle_delay: ScanConfig::default().settle_delay,
            mirror_rgb: true,
            busy: AtomicBool::new(false),
            last_key_ms: AtomicU64::new(0),
        }
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn with_mirror_rgb(mut self, mirror_rgb: bool) -> Self {
        self.mirror_rgb = mirror_rgb;
        self
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn client(&self) -> &UploadClient<T> {
        &self.client
    }

    pub fn store(&self) -> &Arc<dyn FrameStore> {
        &self.store
    }

    fn try_acquire(&self) -> ScanResult<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard { flag: &self.busy })
            .map_err(|_| ScanError::CaptureBusy)
    }

    /// Wall-clock key, strictly increasing per orchestrator.
    fn next_key(&self) -> FrameKey {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        let previous = self
            .last_key_ms
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| Some(now.max(last + 1)))
            .unwrap_or(now);
        FrameKey::from_millis(now.max(previous + 1) as u128)
    }

    /// Run one full cycle. Exactly one terminal result per call.
    pub async fn capture_and_upload(&self) -> ScanResult<CaptureReport> {
        let _guard = self.try_acquire()?;
        let key = self.next_key();
        info!(key = %key, "capture started");

        let (depth, rgb) = join(self.run_depth(&key), self.run_rgb(&key)).await;
        let mut sensor_failures = Vec::new();
        let depth = tolerate_sensor_failure(depth, &mut sensor_failures)?;
        let rgb = tolerate_sensor_failure(rgb, &mut sensor_failures)?;

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        let request = UploadRequest::for_key(key.clone());
        let mapped = match self.client.upload(&request, self.store.as_ref()).await {
            Ok(outcome) => response::map(&outcome.body).map(|records| (outcome, records)),
            Err(error) => Err(error),
        };
        let (outcome, records) = mapped.map_err(|cause| {
            if sensor_failures.is_empty() {
                cause
            } else {
                ScanError::IncompleteCapture {
                    sensors: sensor_failures,
                    cause: Box::new(cause),
                }
            }
        })?;
        info!(key = %key, records = records.len(), attempts = outcome.attempts, "capture cycle complete");

        Ok(CaptureReport {
            key,
            depth,
            rgb,
            attempts: outcome.attempts,
            records,
        })
    }

    async fn run_depth(&self, key: &FrameKey) -> ScanResult<DepthFrameMetadata> {
        let mut source = self.depth_source.lock().await;
        capture_depth(source.as_mut(), self.store.as_ref(), key).await
    }

    async fn run_rgb(&self, key: &FrameKey) -> ScanResult<RgbFrameMetadata> {
        let mut source = self.rgb_source.lock().await;
        capture_rgb(source.as_mut(), self.store.as_ref(), key, self.mirror_rgb).await
    }
}

/// Sensor failures are set aside in `failures` for the upload's artifact check;
/// anything else aborts.
fn tolerate_sensor_failure<M>(result: ScanResult<M>, failures: &mut Vec<ScanError>) -> ScanResult<Option<M>> {
    match result {
        Ok(metadata) => Ok(Some(metadata)),
        Err(error @ ScanError::Capture { .. }) => {
            warn!(error = %error, "sensor failed, upload will check for artifacts");
            failures.push(error);
            Ok(None)
        }
        Err(error) => Err(error),
    }
}

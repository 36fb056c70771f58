//! # Nutriscan
//!
//! Captures a depth frame and a color frame of a plate of food, stores them as
//! artifacts, uploads them to an analysis service and turns the answer into
//! nutrition records.
//!
//! ## Architecture
//!
//! - `capture`: sensor capability trait, depth/color capture steps, synthetic sources
//! - `store`: artifact persistence keyed by capture timestamp
//! - `upload`: multipart request assembly and the bounded-retry client
//! - `response`: JSON body → [`NutritionRecord`]s
//! - `orchestrator`: single-flight capture → upload → map cycle
//! - `config`, `error`, `logging`: ambient plumbing
//!
//! Pixel decoding and image encoding live in the `scan-codec` workspace crate.
//!
//! ## Example
//!
//! ```rust,no_run
//! use nutriscan::capture::{SyntheticColorSource, SyntheticDepthSource};
//! use nutriscan::{CaptureOrchestrator, ScanConfig};
//! use scan_codec::PixelFormat;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = CaptureOrchestrator::from_config(
//!     &ScanConfig::default(),
//!     Box::new(SyntheticDepthSource::new(640, 480, PixelFormat::DepthUint16)),
//!     Box::new(SyntheticColorSource::new(640, 480)),
//! )?;
//! for record in orchestrator.capture_and_upload().await?.records {
//!     println!("{record}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod response;
pub mod store;
pub mod upload;

/// Re-export error types for convenience
pub use error::{ErrorSeverity, HasSeverity, Retryable, ScanError, ScanResult};

pub use config::ScanConfig;
pub use orchestrator::{CaptureOrchestrator, CaptureReport};
pub use response::{NutritionRecord, NutritionSummary};
pub use store::{FileStore, FrameKey, FrameStore, MemoryStore};
pub use upload::{UploadClient, UploadOutcome, UploadRequest};

/// Upload an already-captured artifact set and map the answer.
///
/// Used to retry a capture whose cycle ended in a terminal upload failure.
pub async fn upload_stored(config: &ScanConfig, key: FrameKey) -> ScanResult<(UploadOutcome, Vec<NutritionRecord>)> {
    config
        .validate()
        .map_err(|reason| ScanError::config("scan config", reason))?;
    let store = FileStore::new(&config.artifact_dir);
    let client = UploadClient::new(config.upload_config())?;
    let outcome = client.upload(&UploadRequest::for_key(key), &store).await?;
    let records = response::map(&outcome.body)?;
    Ok((outcome, records))
}

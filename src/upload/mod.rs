//! # Upload Module
//!
//! Packages one depth + color frame pair into a multipart request and delivers it to
//! the analysis service under a bounded retry/backoff protocol.

pub mod client;
pub mod request;
pub mod transport;

// Re-export commonly used types for convenience
pub use client::{PROCESS_PATH, UploadClient, UploadConfig, UploadOutcome, UploadState};
pub use request::{LoadedArtifacts, UploadRequest, fields};
pub use transport::{FormPart, HttpResponse, MultipartBody, PartBody, ReqwestTransport, UploadTransport};

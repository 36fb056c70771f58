//! # Error Handling
//!
//! One error type for the whole capture → encode → store → upload → map pipeline.
//!
//! ## Error Classification
//!
//! | Kind | Raised by | Retried |
//! |------|-----------|---------|
//! | `UnsupportedFormat` | DepthCodec / RgbCodec | no |
//! | `EncodeFailed` | RgbCodec | no |
//! | `InvalidLayout`, `MalformedMetadata` | codecs, artifact reads | no |
//! | `MissingArtifact` | UploadClient (building) | no, no network call |
//! | `Transport` | UploadClient (sending) | yes, up to the attempt bound |
//! | `Server` (5xx) | UploadClient | yes, up to the attempt bound |
//! | `Client` (4xx) | UploadClient | no |
//! | `RetriesExhausted` | UploadClient | terminal wrapper around the last retryable error |
//! | `MalformedResponse` | ResponseMapper | no |
//! | `CaptureBusy` | CaptureOrchestrator | no, caller may try again later |
//! | `IncompleteCapture` | CaptureOrchestrator | terminal wrapper: sensor failures plus the upload error they caused |
//!
//! Errors are classified through the [`Retryable`] and [`HasSeverity`] traits and the
//! [`classify`] helpers rather than by matching on variants at every call site.
//!
//! ## Usage
//!
//! ```rust
//! use nutriscan::error::{Retryable, ScanError};
//!
//! let error = ScanError::server(503, "upstream busy");
//! assert!(error.is_retryable());
//! assert_eq!(error.category(), "server");
//! ```

use std::{error::Error as StdError, fmt};

use scan_codec::CodecError;

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Expected contention, the caller can simply try later
    Warning,
    /// Failure of one attempt that the pipeline may still recover from
    Error,
    /// Failure that ends the current capture cycle
    Fatal,
}

/// Base error type for the nutriscan pipeline
#[derive(Debug)]
pub enum ScanError {
    /// A codec was asked to interpret a pixel format it does not handle
    UnsupportedFormat { detail: String },
    /// Image conversion or compression produced no output
    EncodeFailed { detail: String },
    /// A plane's stride descriptor or buffer length is inconsistent
    InvalidLayout { detail: String },
    /// A metadata artifact could not be parsed
    MalformedMetadata { detail: String },
    /// A required artifact is absent from the frame store
    MissingArtifact { name: String },
    /// Connection, timeout or body transfer failure
    Transport { operation: String, reason: String },
    /// The service answered with a 5xx status
    Server { status: u16, body: String },
    /// The service rejected the request with a 4xx status
    Client { status: u16, body: String },
    /// Every attempt failed with a retryable error
    RetriesExhausted { attempts: u32, last: Box<ScanError> },
    /// A success body did not match the expected schema
    MalformedResponse { reason: String },
    /// Another capture is already in flight on this orchestrator
    CaptureBusy,
    /// The sensor capability failed to deliver an image
    Capture { stream: String, reason: String },
    /// One or both sensors failed and the cycle then ended with `cause`
    IncompleteCapture { sensors: Vec<ScanError>, cause: Box<ScanError> },
    /// Local file I/O failures
    Io {
        operation: String,
        path: Option<String>,
        source: std::io::Error,
    },
    /// Configuration validation errors
    Config { field: String, reason: String },
}

impl ScanError {
    pub fn missing_artifact(name: impl Into<String>) -> Self {
        Self::MissingArtifact { name: name.into() }
    }

    pub fn transport(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn server(status: u16, body: impl Into<String>) -> Self {
        Self::Server {
            status,
            body: body.into(),
        }
    }

    pub fn client(status: u16, body: impl Into<String>) -> Self {
        Self::Client {
            status,
            body: body.into(),
        }
    }

    pub fn malformed_response(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }

    pub fn capture(stream: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Capture {
            stream: stream.into(),
            reason: reason.into(),
        }
    }

    pub fn io(operation: impl Into<String>, path: Option<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path,
            source,
        }
    }

    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Map an HTTP status that is not a success to its error kind.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        if status >= 500 {
            Self::server(status, body)
        } else {
            Self::client(status, body)
        }
    }

    /// Short machine-friendly category name.
    pub fn category(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::EncodeFailed { .. } => "encode_failed",
            Self::InvalidLayout { .. } => "invalid_layout",
            Self::MalformedMetadata { .. } => "malformed_metadata",
            Self::MissingArtifact { .. } => "missing_artifact",
            Self::Transport { .. } => "transport",
            Self::Server { .. } => "server",
            Self::Client { .. } => "client",
            Self::RetriesExhausted { .. } => "retries_exhausted",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::CaptureBusy => "capture_busy",
            Self::Capture { .. } => "capture",
            Self::IncompleteCapture { .. } => "incomplete_capture",
            Self::Io { .. } => "io",
            Self::Config { .. } => "config",
        }
    }

    /// The error that ended the pipeline, looking through `RetriesExhausted`.
    pub fn root(&self) -> &ScanError {
        match self {
            Self::RetriesExhausted { last, .. } => last.root(),
            Self::IncompleteCapture { cause, .. } => cause.root(),
            other => other,
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat { detail } => write!(f, "Unsupported format: {}", detail),
            Self::EncodeFailed { detail } => write!(f, "Encoding failed: {}", detail),
            Self::InvalidLayout { detail } => write!(f, "Invalid plane layout: {}", detail),
            Self::MalformedMetadata { detail } => write!(f, "Malformed metadata: {}", detail),
            Self::MissingArtifact { name } => write!(f, "Missing artifact '{}'", name),
            Self::Transport { operation, reason } => {
                write!(f, "Transport error during {}: {}", operation, reason)
            }
            Self::Server { status, body } => write!(f, "Server error {}: {}", status, body),
            Self::Client { status, body } => write!(f, "Request rejected with {}: {}", status, body),
            Self::RetriesExhausted { attempts, last } => {
                write!(f, "Upload failed after {} attempts: {}", attempts, last)
            }
            Self::MalformedResponse { reason } => write!(f, "Malformed response: {}", reason),
            Self::CaptureBusy => write!(f, "A capture is already in progress"),
            Self::Capture { stream, reason } => write!(f, "{} capture failed: {}", stream, reason),
            Self::IncompleteCapture { sensors, cause } => {
                write!(f, "{}", cause)?;
                for sensor in sensors {
                    write!(f, " (after {})", sensor)?;
                }
                Ok(())
            }
            Self::Io {
                operation,
                path,
                source,
            } => match path {
                Some(p) => write!(f, "I/O error during {} on {}: {}", operation, p, source),
                None => write!(f, "I/O error during {}: {}", operation, source),
            },
            Self::Config { field, reason } => write!(f, "Invalid configuration '{}': {}", field, reason),
        }
    }
}

impl StdError for ScanError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::RetriesExhausted { last, .. } => Some(last.as_ref()),
            Self::IncompleteCapture { cause, .. } => Some(cause.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias using our custom error type
pub type ScanResult<T> = Result<T, ScanError>;

/// Trait for errors that can be retried
pub trait Retryable {
    /// Check if this error can be retried
    fn is_retryable(&self) -> bool;
}

impl Retryable for ScanError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Server { .. })
    }
}

/// Trait for errors with severity levels
pub trait HasSeverity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for ScanError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::CaptureBusy => ErrorSeverity::Warning,
            Self::Transport { .. } | Self::Server { .. } | Self::Capture { .. } => ErrorSeverity::Error,
            _ => ErrorSeverity::Fatal,
        }
    }
}

/// Error classification utilities
pub mod classify {
    use super::*;

    /// Check if an error is transient (may resolve itself)
    pub fn is_transient(error: &ScanError) -> bool {
        error.is_retryable() || matches!(error, ScanError::CaptureBusy)
    }

    /// Check if an error ends the capture cycle without any further attempt
    pub fn is_fatal(error: &ScanError) -> bool {
        error.severity() == ErrorSeverity::Fatal
    }

    /// Check if an error came from the frame itself rather than the network
    pub fn is_frame_error(error: &ScanError) -> bool {
        matches!(
            error,
            ScanError::UnsupportedFormat { .. }
                | ScanError::EncodeFailed { .. }
                | ScanError::InvalidLayout { .. }
                | ScanError::MalformedMetadata { .. }
        )
    }
}

/// Error conversion implementations
impl From<CodecError> for ScanError {
    fn from(error: CodecError) -> Self {
        match error {
            CodecError::UnsupportedFormat(detail) => Self::UnsupportedFormat { detail },
            CodecError::EncodeFailed(detail) => Self::EncodeFailed { detail },
            CodecError::InvalidLayout(detail) => Self::InvalidLayout { detail },
            CodecError::MalformedMetadata(detail) => Self::MalformedMetadata { detail },
        }
    }
}

impl From<std::io::Error> for ScanError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", None, error)
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(error: serde_json::Error) -> Self {
        Self::malformed_response(error.to_string())
    }
}

impl From<reqwest::Error> for ScanError {
    fn from(error: reqwest::Error) -> Self {
        let operation = if error.is_timeout() {
            "request (timed out)"
        } else if error.is_connect() {
            "connect"
        } else if error.is_body() || error.is_decode() {
            "response body"
        } else {
            "request"
        };
        Self::transport(operation, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(ScanError::from_status(404, ""), ScanError::Client { status: 404, .. }));
        assert!(matches!(ScanError::from_status(503, ""), ScanError::Server { status: 503, .. }));
        assert!(matches!(ScanError::from_status(500, ""), ScanError::Server { .. }));
    }

    #[test]
    fn test_retry_classification() {
        assert!(ScanError::server(502, "bad gateway").is_retryable());
        assert!(ScanError::transport("connect", "refused").is_retryable());
        assert!(!ScanError::client(400, "bad form").is_retryable());
        assert!(!ScanError::missing_artifact("a_rgb.png").is_retryable());
        assert!(!ScanError::malformed_response("no data").is_retryable());
    }

    #[test]
    fn test_codec_conversion_keeps_kind() {
        let err: ScanError = CodecError::UnsupportedFormat("RGB24".into()).into();
        assert_eq!(err.category(), "unsupported_format");
        assert!(classify::is_frame_error(&err));
        assert!(classify::is_fatal(&err));
    }

    #[test]
    fn test_exhausted_exposes_last_error() {
        let err = ScanError::RetriesExhausted {
            attempts: 3,
            last: Box::new(ScanError::server(503, "busy")),
        };
        assert_eq!(err.root().category(), "server");
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "Upload failed after 3 attempts: Server error 503: busy");
    }

    #[test]
    fn test_incomplete_capture_names_sensor_and_cause() {
        let err = ScanError::IncompleteCapture {
            sensors: vec![ScanError::capture("rgb", "rgb sensor disconnected")],
            cause: Box::new(ScanError::missing_artifact("k_rgb.png")),
        };
        assert_eq!(err.root().category(), "missing_artifact");
        assert_eq!(
            err.to_string(),
            "Missing artifact 'k_rgb.png' (after rgb capture failed: rgb sensor disconnected)"
        );
        assert!(classify::is_fatal(&err));
    }

    #[test]
    fn test_busy_is_transient_warning() {
        assert!(classify::is_transient(&ScanError::CaptureBusy));
        assert_eq!(ScanError::CaptureBusy.severity(), ErrorSeverity::Warning);
    }
}

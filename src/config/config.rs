//! # Configuration Module
//!
//! This module provides configuration structures and validation for the capture and
//! upload pipeline. It is the common interface between the CLI and the library; no
//! value here is process-global, every component receives its configuration through
//! its constructor.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Type | Default | Description |
//! |-----------|------|---------|-------------|
//! | `base_uri` | `String` | [`DEFAULT_BASE_URI`] | Analysis service root, `/process` is appended |
//! | `artifact_dir` | `PathBuf` | `$TMP/nutriscan` | Where frame artifacts are written |
//! | `max_attempts` | `u32` | 3 | Upload attempts in total, first one included |
//! | `backoff_step` | `Duration` | 1 s | Wait before attempt `n + 1` is `n × backoff_step` |
//! | `request_timeout` | `Duration` | 5 min | Whole-request timeout sized for large bodies |
//! | `connect_timeout` | `Duration` | 10 s | TCP/TLS connect timeout |
//! | `settle_delay` | `Duration` | 500 ms | Fixed wait between capture completion and upload |
//! | `mirror_rgb` | `bool` | true | Flip color rows (sensor origin is bottom-left) |
//!
//! The base URI is the only value the user is expected to edit (CLI `--server`). It
//! is not persisted: every process starts from the compiled-in default.
//!
//! ## Examples
//!
//! ```rust
//! use nutriscan::config::ScanConfig;
//!
//! let mut config = ScanConfig::default();
//! config.base_uri = "http://10.0.0.7:8000".to_string();
//! assert!(config.validate().is_ok());
//!
//! let upload = config.upload_config();
//! assert_eq!(upload.endpoint(), "http://10.0.0.7:8000/process");
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::upload::UploadConfig;

/// Compiled-in analysis service address.
pub const DEFAULT_BASE_URI: &str = "http://127.0.0.1:8000";

/// Configuration for one capture-and-upload pipeline.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Root URI of the analysis service.
    ///
    /// Must start with `http://` or `https://`. A trailing slash is tolerated.
    pub base_uri: String,

    /// Directory holding frame artifacts.
    ///
    /// Created on first write. Artifacts are namespaced by capture key and never
    /// reused, so nothing here is cleaned up automatically.
    pub artifact_dir: PathBuf,

    /// Total upload attempts, including the first one. Must be at least 1.
    pub max_attempts: u32,

    /// Linear backoff unit between attempts.
    pub backoff_step: Duration,

    /// Overall per-attempt timeout, covering connect, upload and response.
    pub request_timeout: Duration,

    /// Connect timeout, distinct from and shorter than `request_timeout`.
    pub connect_timeout: Duration,

    /// Fixed delay after both captures completed and before the upload starts.
    pub settle_delay: Duration,

    /// Flip color frames vertically while converting.
    pub mirror_rgb: bool,
}

impl Default for ScanConfig {
    /// Creates the reference configuration.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nutriscan::config::{DEFAULT_BASE_URI, ScanConfig};
    ///
    /// let config = ScanConfig::default();
    /// assert_eq!(config.base_uri, DEFAULT_BASE_URI);
    /// assert_eq!(config.max_attempts, 3);
    /// ```
    fn default() -> Self {
        Self {
            base_uri: DEFAULT_BASE_URI.to_string(),
            artifact_dir: std::env::temp_dir().join("nutriscan"),
            max_attempts: 3,
            backoff_step: Duration::from_secs(1),
            request_timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(10),
            settle_delay: Duration::from_millis(500),
            mirror_rgb: true,
        }
    }
}

impl ScanConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), String> {
        let uri = self.base_uri.trim();
        let host = uri
            .strip_prefix("http://")
            .or_else(|| uri.strip_prefix("https://"))
            .ok_or_else(|| format!("Server URI must start with http:// or https:// (got '{}')", uri))?;
        if host.trim_matches('/').is_empty() {
            return Err("Server URI has no host".to_string());
        }
        if self.max_attempts == 0 {
            return Err("Upload attempts must be at least 1".to_string());
        }
        if self.request_timeout.is_zero() {
            return Err("Request timeout must be greater than 0".to_string());
        }
        if self.connect_timeout > self.request_timeout {
            return Err("Connect timeout cannot exceed the request timeout".to_string());
        }
        Ok(())
    }

    /// Convert to the UploadClient's configuration.
    pub fn upload_config(&self) -> UploadConfig {
        UploadConfig {
            base_uri: self.base_uri.trim().trim_end_matches('/').to_string(),
            max_attempts: self.max_attempts,
            backoff_step: self.backoff_step,
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();
        assert_eq!(config.base_uri, DEFAULT_BASE_URI);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.backoff_step, Duration::from_secs(1));
        assert_eq!(config.request_timeout, Duration::from_secs(300));
        assert!(config.mirror_rgb);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ScanConfig::default();

        // Invalid scheme
        config.base_uri = "ftp://host".to_string();
        assert!(config.validate().is_err());
        config.base_uri = "http://".to_string();
        assert!(config.validate().is_err());
        config.base_uri = "https://".to_string();
        assert!(config.validate().is_err());
        config.base_uri = "https://nutrition.example".to_string(); // Reset

        // No attempts
        config.max_attempts = 0;
        assert!(config.validate().is_err());
        config.max_attempts = 3; // Reset

        // Connect timeout longer than whole request
        config.connect_timeout = Duration::from_secs(600);
        assert!(config.validate().is_err());
        config.connect_timeout = Duration::from_secs(10); // Reset

        // Valid again
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_upload_config_trims_trailing_slash() {
        let config = ScanConfig {
            base_uri: "http://192.168.1.5:8000/".to_string(),
            ..ScanConfig::default()
        };
        let upload = config.upload_config();
        assert_eq!(upload.base_uri, "http://192.168.1.5:8000");
        assert_eq!(upload.max_attempts, 3);
    }
}

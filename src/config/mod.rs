//! # Configuration Module
//!
//! This module provides the configuration structure shared by the CLI and the pipeline.

pub mod config;

pub use config::{DEFAULT_BASE_URI, ScanConfig};

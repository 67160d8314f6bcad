//! Error types for the ingestion pipeline.
//!
//! Only the pipeline's edges can fail: loading configuration and loading
//! scraped-record files. Per-source problems never surface as errors; the
//! aggregator tallies them and the run continues.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors raised while setting up a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Failed to read a configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadConfig {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("failed to parse config file {path}: {source}")]
    ParseConfig {
        /// Path to the file that could not be parsed.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },

    /// Failed to read a scraped-records file.
    #[error("failed to read scraped records {path}: {source}")]
    ReadScraped {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to decode a scraped-records file as JSON.
    #[error("failed to parse scraped records {path}: {source}")]
    ParseScraped {
        /// Path to the file that could not be parsed.
        path: PathBuf,
        /// Underlying JSON parse error.
        source: serde_json::Error,
    },
}

//! Typed errors for the configuration, task and dataset layers.
//!
//! Export backends report through `anyhow` with context, see [`crate::export`].

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised while loading the batch configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON format: {0}")]
    Json(#[from] serde_json::Error),
}

/// A task object that cannot be turned into a runnable conversion.
#[derive(Debug, Error, PartialEq)]
pub enum TaskError {
    #[error("task missing '{field}'")]
    MissingField { field: &'static str },

    #[error("unknown mode '{0}'. Use 'point' or 'line'")]
    UnknownMode(String),

    #[error("downscale_hour must be a positive number, got {0}")]
    InvalidDownscale(f64),

    #[error("fill_tolerance must be a non-negative number, got {0}")]
    InvalidTolerance(f64),

    #[error("task entry is not a JSON object")]
    NotAnObject,

    #[error("malformed task: {0}")]
    Malformed(String),
}

/// Problems opening or decoding the particle tracking dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("NetCDF file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("variable '{name}' not found in {}", path.display())]
    MissingVariable { name: String, path: PathBuf },

    #[error("{name}: expected {expected} dimensions, got {got}")]
    DimensionMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("invalid time axis: {reason}")]
    InvalidTime { reason: String },

    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),
}

/// Failure of a single conversion, split by where it happened.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("export failed: {0:#}")]
    Export(anyhow::Error),
}

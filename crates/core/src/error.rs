//! Error types for the coastlines pipeline

use thiserror::Error;

/// Main error type for raster, vector and algorithm operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),

    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("No valid observations in the query window")]
    NoObservations,

    #[error("Insufficient tide anchors: found {found} unique location(s), need at least 2")]
    InsufficientTideAnchors { found: usize },

    #[error("No shorelines could be extracted at threshold {threshold}")]
    NoShorelines { threshold: f64 },

    #[error("Malformed vector data: {0}")]
    Vector(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

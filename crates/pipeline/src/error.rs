//! Error types for pipeline orchestration

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while configuring or running pipeline stages
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] coastlines_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Tide model files not found: {}", .0.display())]
    TideFilesMissing(PathBuf),

    #[error("Input not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Tile {0} is not in the analysis grid")]
    UnknownTile(String),

    #[error("Malformed observation manifest: {0}")]
    Manifest(String),
}

impl PipelineError {
    /// Process exit code for this error: 2 when tide files are missing,
    /// 1 for every other failure
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::TideFilesMissing(_) => 2,
            _ => 1,
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

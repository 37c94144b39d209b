//! Error types for track generation

use thiserror::Error;

/// Everything that can go wrong while generating or persisting a track
#[derive(Debug, Error)]
pub enum TrackError {
    /// Two lines that should meet are parallel (e.g. a collinear Bezier)
    #[error("degenerate geometry: {context}")]
    DegenerateGeometry { context: &'static str },

    /// Backtracking gave up; the parameters cannot produce a valid track
    #[error("rollback limit exceeded after {rollbacks} rollbacks")]
    RetryLimitExceeded { rollbacks: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TrackError>;

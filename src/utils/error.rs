//! Error handling for tubequeue

use thiserror::Error;

/// Main error type for tubequeue
#[derive(Debug, Error)]
pub enum TubeQueueError {
    #[error("yt-dlp not found. Please install yt-dlp")]
    YtDlpNotFound,

    /// Rejected before anything was queued or spawned
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Failed to resolve {url}: {message}")]
    Resolution { url: String, message: String },

    #[error("No suitable {0} track found")]
    Selection(&'static str),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Engine is not running")]
    EngineStopped,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TubeQueueError {
    /// Cancellation is a normal shutdown transition and is never reported to the user.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, TubeQueueError::Cancelled)
    }

    pub fn resolution(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        TubeQueueError::Resolution {
            url: url.into(),
            message: err.to_string(),
        }
    }
}

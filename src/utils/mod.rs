//! Utility modules for error handling, configuration and formatting

pub mod config;
pub mod error;
pub mod paths;
pub mod size;

// Re-export for convenience
pub use config::{AppSettings, PLACEHOLDER_ITEM_SIZE};
pub use error::TubeQueueError;
pub use paths::{dated_download_dir, default_config_path, default_download_dir, ensure_dated_download_dir};
pub use size::format_size;

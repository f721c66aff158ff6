//! Download execution: request building, progress state and the per-item task

pub mod progress;
pub mod request;
pub mod task;

pub use progress::{format_eta, DownloadState, DownloadStatus, ProgressReport};
pub use request::{format_selector, sanitize_title, DownloadRequest, OutputKind, MAX_TITLE_LEN};
pub use task::{DownloadTask, TaskEvent};

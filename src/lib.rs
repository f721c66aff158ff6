//! TubeQueue library
//!
//! A sequential download queue engine on top of yt-dlp: metadata resolution,
//! automatic track selection, batch and playlist expansion, and a
//! one-at-a-time processor reporting through channels.

pub mod backend;
pub mod downloader;
pub mod extractor;
pub mod queue;
pub mod selection;
pub mod thumbnail;
pub mod utils;

// Re-export main types for easier use
pub use backend::{EngineEvent, EngineHandle, JobOutcome, SubmitMode};
pub use downloader::{DownloadState, DownloadStatus, ProgressReport};
pub use extractor::{Extractor, MediaInfo, PlaylistInfo, Track, TrackKind, YtDlpExtractor};
pub use queue::{DownloadQueue, QueueItem, Selection};
pub use selection::{parse_selection, TrackSelector};
pub use utils::{format_size, AppSettings, TubeQueueError};

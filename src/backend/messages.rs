use crate::backend::expander::ExpansionReport;
use crate::downloader::ProgressReport;
use crate::extractor::{MediaInfo, PlaylistInfo};
use crate::queue::QueueItem;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tokio::sync::oneshot;
use uuid::Uuid;

/// Identifies one background job in its progress and result events
pub type JobId = Uuid;

/// Commands sent from the handle to the engine actor
#[derive(Debug)]
pub enum EngineCommand {
    // Resolution and expansion jobs
    Resolve {
        job: JobId,
        url: String,
    },
    ResolvePlaylist {
        job: JobId,
        url: String,
    },
    ExpandBatch {
        job: JobId,
        urls: Vec<String>,
    },
    ExpandPlaylist {
        job: JobId,
        playlist: PlaylistInfo,
        indices: BTreeSet<usize>,
    },
    FetchThumbnail {
        job: JobId,
        media_id: String,
        url: String,
    },

    // Queue
    /// `ack` receives the queue length once the item is appended
    Enqueue {
        item: QueueItem,
        ack: oneshot::Sender<usize>,
    },
    Remove(Vec<Uuid>),
    MoveItem {
        from: usize,
        to: usize,
    },
    Clear,
    Start,

    // System
    SetBaseDir(PathBuf),
    Shutdown,
}

/// What a finished job produced
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Info(MediaInfo),
    Playlist(PlaylistInfo),
    Expanded(ExpansionReport),
    /// The thumbnail is now in the shared cache
    Thumbnail { media_id: String },
}

/// Events sent from the engine to its observer
#[derive(Debug, Clone)]
pub enum EngineEvent {
    // Jobs
    JobProgress {
        job: JobId,
        processed: usize,
        total: usize,
        status: String,
    },
    JobFinished {
        job: JobId,
        outcome: JobOutcome,
    },
    JobFailed {
        job: JobId,
        error: String,
    },

    // Queue
    ItemsQueued {
        count: usize,
        queue_len: usize,
    },
    QueueChanged {
        queue_len: usize,
    },
    /// A queue command could not be applied
    Rejected {
        error: String,
    },

    // Download life-cycle
    DownloadStarted {
        item_id: Uuid,
        title: String,
        url: String,
    },
    DownloadProgress {
        item_id: Uuid,
        report: ProgressReport,
    },
    DownloadStatus {
        item_id: Uuid,
        message: String,
    },
    DownloadCompleted {
        item_id: Uuid,
        title: String,
        path: PathBuf,
    },
    DownloadFailed {
        item_id: Uuid,
        title: String,
        error: String,
    },
    QueueDrained {
        completed: usize,
        failed: usize,
    },

    Stopped,
}

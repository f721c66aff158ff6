//! Sequential queue processing
//!
//! The processor pops one item at a time, runs it as a [`DownloadTask`] and
//! advances when the task reports a terminal event. It is owned by the engine
//! actor, so every method runs on the actor task and needs no locking.

use crate::backend::messages::EngineEvent;
use crate::downloader::{DownloadState, DownloadTask, TaskEvent};
use crate::extractor::{Extractor, ExtractorOptions, TransferEvent};
use crate::queue::{DownloadQueue, EventLog, QueueEvent, QueueItem};
use crate::utils::config::AppSettings;
use crate::utils::paths::ensure_dated_download_dir;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Status text when the collaborator finishes a stream
pub const MERGING_STATUS: &str = "Merging formats...";

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessorState {
    Idle,
    /// Task spawned, no progress yet
    Starting(QueueItem),
    Downloading(QueueItem, DownloadState),
    Merging(QueueItem),
    /// Shut down; nothing else will run
    Halted,
}

impl ProcessorState {
    pub fn item(&self) -> Option<&QueueItem> {
        match self {
            ProcessorState::Starting(item)
            | ProcessorState::Downloading(item, _)
            | ProcessorState::Merging(item) => Some(item),
            ProcessorState::Idle | ProcessorState::Halted => None,
        }
    }
}

/// Distinguishes "never started" from "ran and drained"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    NeverStarted,
    Active,
    Finished { completed: usize, failed: usize },
}

struct ActiveDownload {
    item_id: Uuid,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Debug, Default, Clone, Copy)]
struct RunStats {
    completed: usize,
    failed: usize,
}

impl RunStats {
    fn processed(&self) -> usize {
        self.completed + self.failed
    }
}

pub struct QueueProcessor {
    queue: DownloadQueue,
    extractor: Arc<dyn Extractor>,
    base_dir: PathBuf,
    options: ExtractorOptions,
    grace: Duration,

    task_tx: mpsc::Sender<TaskEvent>,
    events: mpsc::Sender<EngineEvent>,

    log: Option<EventLog>,
    log_dir: Option<PathBuf>,

    state: ProcessorState,
    active: Option<ActiveDownload>,
    stats: RunStats,
    finished: bool,
}

impl QueueProcessor {
    pub fn new(
        queue: DownloadQueue,
        extractor: Arc<dyn Extractor>,
        settings: &AppSettings,
        task_tx: mpsc::Sender<TaskEvent>,
        events: mpsc::Sender<EngineEvent>,
    ) -> Self {
        Self {
            queue,
            extractor,
            base_dir: settings.base_download_dir.clone(),
            options: ExtractorOptions::with_cookies(settings.cookie_file.as_deref()),
            grace: settings.shutdown_grace(),
            task_tx,
            events,
            log: None,
            log_dir: None,
            state: ProcessorState::Idle,
            active: None,
            stats: RunStats::default(),
            finished: false,
        }
    }

    pub fn state(&self) -> &ProcessorState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    pub fn outcome(&self) -> RunOutcome {
        if self.active.is_some() {
            RunOutcome::Active
        } else if self.finished {
            RunOutcome::Finished {
                completed: self.stats.completed,
                failed: self.stats.failed,
            }
        } else {
            RunOutcome::NeverStarted
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Takes effect from the next item
    pub fn set_base_dir(&mut self, dir: PathBuf) {
        info!("Download directory set to {}", dir.display());
        self.base_dir = dir;
    }

    /// Begin processing; no-op when busy, halted or the queue is empty
    pub async fn start(&mut self) {
        if self.state == ProcessorState::Halted || self.is_busy() {
            debug!("start ignored: processor busy or halted");
            return;
        }
        if self.queue.is_empty().await {
            debug!("start ignored: queue empty");
            return;
        }

        self.stats = RunStats::default();
        self.finished = false;
        self.advance().await;
    }

    pub async fn handle_task_event(&mut self, event: TaskEvent) {
        if self.state == ProcessorState::Halted {
            return;
        }
        let is_current = self
            .active
            .as_ref()
            .map_or(false, |a| a.item_id == event.item_id());
        if !is_current {
            debug!("Ignoring stale event for {}", event.item_id());
            return;
        }

        match event {
            TaskEvent::Progress { event, .. } => self.on_progress(event).await,
            TaskEvent::Completed { title, path, .. } => self.on_completed(title, path).await,
            TaskEvent::Failed { title, error, .. } => self.on_failed(title, error).await,
        }
    }

    async fn on_progress(&mut self, event: TransferEvent) {
        let (item, mut progress) = match std::mem::replace(&mut self.state, ProcessorState::Idle) {
            ProcessorState::Starting(item) | ProcessorState::Merging(item) => {
                (item, DownloadState::new())
            }
            ProcessorState::Downloading(item, progress) => (item, progress),
            other => {
                self.state = other;
                return;
            }
        };
        progress.apply(&event);
        let item_id = item.id();

        match event {
            TransferEvent::Finished => {
                self.state = ProcessorState::Merging(item);
                self.write_log(&QueueEvent::Status {
                    message: MERGING_STATUS.to_string(),
                })
                .await;
                self.emit(EngineEvent::DownloadStatus {
                    item_id,
                    message: MERGING_STATUS.to_string(),
                })
                .await;
            }
            TransferEvent::Downloading { .. } => {
                let report = progress.report();
                self.state = ProcessorState::Downloading(item, progress);
                // Progress is lossy; a full channel drops the update
                let _ = self
                    .events
                    .try_send(EngineEvent::DownloadProgress { item_id, report });
            }
        }
    }

    async fn on_completed(&mut self, title: String, path: PathBuf) {
        let Some(active) = self.active.take() else {
            return;
        };
        info!("Completed: {} -> {}", title, path.display());
        self.stats.completed += 1;
        self.write_log(&QueueEvent::Completed {
            title: title.clone(),
            path: path.clone(),
        })
        .await;
        self.emit(EngineEvent::DownloadCompleted {
            item_id: active.item_id,
            title,
            path,
        })
        .await;
        self.state = ProcessorState::Idle;
        self.advance().await;
    }

    async fn on_failed(&mut self, title: String, error: String) {
        let Some(active) = self.active.take() else {
            return;
        };
        self.record_failure(active.item_id, title, error).await;
        self.state = ProcessorState::Idle;
        self.advance().await;
    }

    async fn record_failure(&mut self, item_id: Uuid, title: String, error: String) {
        warn!("Failed: {} - {}", title, error);
        self.stats.failed += 1;
        self.write_log(&QueueEvent::Failed {
            title: title.clone(),
            error: error.clone(),
        })
        .await;
        self.emit(EngineEvent::DownloadFailed {
            item_id,
            title,
            error,
        })
        .await;
    }

    /// Launch the next item, or report the drain when the queue is empty
    async fn advance(&mut self) {
        loop {
            let Some(item) = self.queue.pop_front().await else {
                self.drained().await;
                return;
            };

            let item_id = item.id();
            let title = item.title().to_string();
            match self.launch(item).await {
                Ok(()) => return,
                Err(e) => {
                    // Could not even prepare the destination; treat as a failed item
                    self.record_failure(item_id, title, e.to_string()).await;
                    self.state = ProcessorState::Idle;
                }
            }
        }
    }

    async fn launch(&mut self, item: QueueItem) -> std::io::Result<()> {
        // Recomputed per item; the date may have changed since the last one
        let destination = ensure_dated_download_dir(&self.base_dir).await?;
        self.rotate_log(&destination).await;

        info!("Starting download: {}", item.title());
        self.write_log(&QueueEvent::Started {
            title: item.title().to_string(),
        })
        .await;
        self.emit(EngineEvent::DownloadStarted {
            item_id: item.id(),
            title: item.title().to_string(),
            url: item.url().to_string(),
        })
        .await;

        let cancel = CancellationToken::new();
        let task = DownloadTask::new(
            item.clone(),
            destination,
            self.options.clone(),
            cancel.clone(),
        );
        let handle = task.spawn(self.extractor.clone(), self.task_tx.clone());

        self.active = Some(ActiveDownload {
            item_id: item.id(),
            cancel,
            handle,
        });
        self.state = ProcessorState::Starting(item);
        Ok(())
    }

    async fn drained(&mut self) {
        self.state = ProcessorState::Idle;
        if self.stats.processed() == 0 || self.finished {
            return;
        }
        self.finished = true;
        info!(
            "Queue drained: {} completed, {} failed",
            self.stats.completed, self.stats.failed
        );
        self.write_log(&QueueEvent::Drained).await;
        self.emit(EngineEvent::QueueDrained {
            completed: self.stats.completed,
            failed: self.stats.failed,
        })
        .await;
    }

    /// Stop the active download and halt.
    ///
    /// Waits up to the grace period for the task to exit, then aborts it.
    pub async fn cancel(&mut self) {
        if let Some(mut active) = self.active.take() {
            info!("Cancelling active download {}", active.item_id);
            active.cancel.cancel();
            if tokio::time::timeout(self.grace, &mut active.handle)
                .await
                .is_err()
            {
                warn!(
                    "Download {} did not stop within {:?}, aborting",
                    active.item_id, self.grace
                );
                active.handle.abort();
            }
        }
        self.state = ProcessorState::Halted;
    }

    async fn rotate_log(&mut self, dir: &Path) {
        if self.log_dir.as_deref() == Some(dir) && self.log.is_some() {
            return;
        }
        match EventLog::new(dir).await {
            Ok(log) => {
                debug!("Logging to {}", log.path().display());
                self.log = Some(log);
            }
            Err(e) => {
                warn!("Could not open download log in {}: {:#}", dir.display(), e);
                self.log = None;
            }
        }
        self.log_dir = Some(dir.to_path_buf());
    }

    async fn write_log(&self, event: &QueueEvent) {
        if let Some(log) = &self.log {
            if let Err(e) = log.log(event).await {
                warn!("Failed to write download log: {:#}", e);
            }
        }
    }

    async fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event).await;
    }
}

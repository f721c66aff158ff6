//! Running one queued item through the download collaborator

use crate::downloader::request::DownloadRequest;
use crate::extractor::{Extractor, ExtractorOptions, TransferEvent};
use crate::queue::QueueItem;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Events a download task sends back to the processor; all carry the item id
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    Progress {
        item_id: Uuid,
        event: TransferEvent,
    },
    Completed {
        item_id: Uuid,
        title: String,
        path: PathBuf,
    },
    Failed {
        item_id: Uuid,
        title: String,
        error: String,
    },
}

impl TaskEvent {
    pub fn item_id(&self) -> Uuid {
        match self {
            TaskEvent::Progress { item_id, .. }
            | TaskEvent::Completed { item_id, .. }
            | TaskEvent::Failed { item_id, .. } => *item_id,
        }
    }
}

/// One item's download.
///
/// Sends any number of `Progress` events followed by exactly one `Completed`
/// or `Failed`, unless the token fires first, in which case it goes silent.
pub struct DownloadTask {
    item: QueueItem,
    destination: PathBuf,
    options: ExtractorOptions,
    cancel: CancellationToken,
}

impl DownloadTask {
    pub fn new(
        item: QueueItem,
        destination: PathBuf,
        options: ExtractorOptions,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            item,
            destination,
            options,
            cancel,
        }
    }

    pub fn item(&self) -> &QueueItem {
        &self.item
    }

    /// Run on its own tokio task
    pub fn spawn(
        self,
        extractor: Arc<dyn Extractor>,
        events: mpsc::Sender<TaskEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(extractor.as_ref(), events).await })
    }

    pub async fn run(self, extractor: &dyn Extractor, events: mpsc::Sender<TaskEvent>) {
        let item_id = self.item.id();
        let title = self.item.title().to_string();
        let request = DownloadRequest::for_item(&self.item, &self.destination, self.options.clone());
        info!(
            "Downloading {} with format {} -> {}",
            title,
            request.format,
            request.output_path.display()
        );

        let (progress_tx, mut progress_rx) = mpsc::channel(64);
        let download = extractor.download(&request, progress_tx);
        tokio::pin!(download);

        let result = loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("Download of {} cancelled", title);
                    return;
                }
                Some(event) = progress_rx.recv() => {
                    if events.send(TaskEvent::Progress { item_id, event }).await.is_err() {
                        return;
                    }
                }
                result = &mut download => break result,
            }
        };

        // Progress the collaborator sent just before finishing
        while let Ok(event) = progress_rx.try_recv() {
            if self.cancel.is_cancelled() {
                return;
            }
            if events.send(TaskEvent::Progress { item_id, event }).await.is_err() {
                return;
            }
        }

        if self.cancel.is_cancelled() {
            return;
        }

        let outcome = match result {
            Ok(path) => TaskEvent::Completed {
                item_id,
                title,
                path,
            },
            Err(e) => {
                warn!("Download of {} failed: {:#}", title, e);
                TaskEvent::Failed {
                    item_id,
                    title,
                    error: format!("{:#}", e),
                }
            }
        };
        let _ = events.send(outcome).await;
    }
}

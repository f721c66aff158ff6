//! Turning batches of URLs and playlist selections into queue items

use crate::backend::resolver::InfoResolver;
use crate::extractor::PlaylistInfo;
use crate::queue::QueueItem;
use crate::selection::TrackSelector;
use crate::utils::error::TubeQueueError;
use std::collections::BTreeSet;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Sent after every processed element
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionProgress {
    pub processed: usize,
    pub total: usize,
    pub status: String,
}

/// Result of an expansion run
#[derive(Debug, Clone, Default)]
pub struct ExpansionReport {
    /// Built items in input order
    pub items: Vec<QueueItem>,
    pub skipped: usize,
    /// One message per skipped element
    pub errors: Vec<String>,
    pub total: usize,
}

impl ExpansionReport {
    fn with_total(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    fn skip(&mut self, message: String) {
        warn!("{}", message);
        self.skipped += 1;
        self.errors.push(message);
    }

    pub fn summary(&self) -> String {
        format!("Added {} videos to queue", self.items.len())
    }
}

/// Resolve each URL and select tracks automatically; failures are skipped
pub async fn expand_batch(
    resolver: &InfoResolver,
    urls: &[String],
    progress: Option<&mpsc::Sender<ExpansionProgress>>,
    cancel: &CancellationToken,
) -> Result<ExpansionReport, TubeQueueError> {
    let total = urls.len();
    let mut report = ExpansionReport::with_total(total);
    info!("Expanding batch of {} URLs", total);

    for (i, url) in urls.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(TubeQueueError::Cancelled);
        }

        match build_cancellable(resolver, url, cancel).await? {
            Ok(item) => report.items.push(item),
            Err(e) => report.skip(format!("{}: {}", url, e)),
        }

        report_progress(progress, i + 1, total, format!("Processed {}/{} videos", i + 1, total)).await;
    }

    debug!("{}", report.summary());
    Ok(report)
}

/// Expand the selected 1-based playlist positions
pub async fn expand_playlist(
    resolver: &InfoResolver,
    playlist: &PlaylistInfo,
    indices: &BTreeSet<usize>,
    progress: Option<&mpsc::Sender<ExpansionProgress>>,
    cancel: &CancellationToken,
) -> Result<ExpansionReport, TubeQueueError> {
    let total = indices.len();
    let playlist_len = playlist.entries.len();
    let mut report = ExpansionReport::with_total(total);
    info!(
        "Expanding {} of {} entries from playlist {}",
        total, playlist_len, playlist.title
    );

    for (i, idx) in indices.iter().copied().enumerate() {
        if cancel.is_cancelled() {
            return Err(TubeQueueError::Cancelled);
        }

        let entry = playlist.entries.iter().find(|e| e.index == idx);
        match entry.and_then(|e| e.url.as_deref()) {
            Some(url) => match build_cancellable(resolver, url, cancel).await? {
                Ok(item) => report.items.push(item),
                Err(e) => report.skip(format!("Error processing video {}: {}", idx, e)),
            },
            None => report.skip(format!("Error processing video {}: no URL", idx)),
        }

        report_progress(
            progress,
            i + 1,
            total,
            format!("Processing video {}/{}", idx, playlist_len),
        )
        .await;
    }

    debug!("{}", report.summary());
    Ok(report)
}

/// [`build_item`] unless shutdown fires first or while it runs.
///
/// The outer error is `Cancelled`; the inner result is the element's own outcome.
async fn build_cancellable(
    resolver: &InfoResolver,
    url: &str,
    cancel: &CancellationToken,
) -> Result<Result<QueueItem, TubeQueueError>, TubeQueueError> {
    let built = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(TubeQueueError::Cancelled),
        built = build_item(resolver, url) => built,
    };
    if cancel.is_cancelled() {
        return Err(TubeQueueError::Cancelled);
    }
    Ok(built)
}

/// Resolve one URL and pick the best video + audio pair
async fn build_item(resolver: &InfoResolver, url: &str) -> Result<QueueItem, TubeQueueError> {
    let info = resolver.resolve(url).await?;
    let (video, audio) = TrackSelector::select_pair(&info)?;
    QueueItem::video_audio(&info, video, audio)
}

async fn report_progress(
    progress: Option<&mpsc::Sender<ExpansionProgress>>,
    processed: usize,
    total: usize,
    status: String,
) {
    if let Some(tx) = progress {
        let _ = tx
            .send(ExpansionProgress {
                processed,
                total,
                status,
            })
            .await;
    }
}

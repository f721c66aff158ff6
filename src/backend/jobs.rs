//! Background jobs spawned by the engine actor
//!
//! Resolution, expansion and thumbnail work all run as independent tokio
//! tasks that report through the engine's event channel.

use crate::backend::expander::{self, ExpansionProgress, ExpansionReport};
use crate::backend::messages::{EngineEvent, JobId, JobOutcome};
use crate::backend::resolver::InfoResolver;
use crate::extractor::PlaylistInfo;
use crate::queue::{DownloadQueue, QueueItem};
use crate::thumbnail::ThumbnailCache;
use crate::utils::error::TubeQueueError;
use std::collections::BTreeSet;
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// One unit of background work
#[derive(Debug, Clone)]
pub enum Job {
    ResolveInfo {
        url: String,
    },
    ResolvePlaylist {
        url: String,
    },
    ExpandBatch {
        urls: Vec<String>,
    },
    ExpandPlaylist {
        playlist: PlaylistInfo,
        indices: BTreeSet<usize>,
    },
    FetchThumbnail {
        media_id: String,
        url: String,
    },
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::ResolveInfo { .. } => "resolve",
            Job::ResolvePlaylist { .. } => "resolve-playlist",
            Job::ExpandBatch { .. } => "expand-batch",
            Job::ExpandPlaylist { .. } => "expand-playlist",
            Job::FetchThumbnail { .. } => "thumbnail",
        }
    }
}

/// Shared handles every job gets
#[derive(Clone)]
pub struct JobContext {
    pub resolver: InfoResolver,
    pub queue: DownloadQueue,
    pub thumbnails: ThumbnailCache,
    pub http: reqwest::Client,
    pub events: mpsc::Sender<EngineEvent>,
    /// Parent token; fires on shutdown
    pub cancel: CancellationToken,
}

/// Run `job` on its own task, reporting `JobFinished` or `JobFailed`.
///
/// A cancelled job reports nothing.
pub fn spawn_job(id: JobId, job: Job, ctx: JobContext) -> JoinHandle<()> {
    tokio::spawn(async move {
        let name = job.name();
        debug!("Job {} ({}) started", id, name);

        let result = match run_job(id, job, &ctx).await {
            Ok(_) if ctx.cancel.is_cancelled() => Err(TubeQueueError::Cancelled),
            other => other,
        };
        let event = match result {
            Ok(outcome) => EngineEvent::JobFinished { job: id, outcome },
            Err(e) if e.is_cancellation() => {
                debug!("Job {} ({}) cancelled", id, name);
                return;
            }
            Err(e) => {
                warn!("Job {} ({}) failed: {}", id, name, e);
                EngineEvent::JobFailed {
                    job: id,
                    error: e.to_string(),
                }
            }
        };
        let _ = ctx.events.send(event).await;
    })
}

async fn run_job(id: JobId, job: Job, ctx: &JobContext) -> Result<JobOutcome, TubeQueueError> {
    match job {
        Job::ResolveInfo { url } => {
            let info = cancellable(&ctx.cancel, ctx.resolver.resolve(&url)).await?;
            if let Some(thumb) = &info.thumbnail {
                prefetch_thumbnails(ctx, vec![(info.id.clone(), thumb.clone())]);
            }
            Ok(JobOutcome::Info(info))
        }
        Job::ResolvePlaylist { url } => {
            let playlist = cancellable(&ctx.cancel, ctx.resolver.resolve_playlist(&url)).await?;
            info!(
                "Playlist {} has {} entries",
                playlist.title,
                playlist.entries.len()
            );
            Ok(JobOutcome::Playlist(playlist))
        }
        Job::ExpandBatch { urls } => {
            let report = with_progress(id, ctx, |tx| async move {
                expander::expand_batch(&ctx.resolver, &urls, Some(&tx), &ctx.cancel).await
            })
            .await?;
            enqueue(ctx, &report).await?;
            Ok(JobOutcome::Expanded(report))
        }
        Job::ExpandPlaylist { playlist, indices } => {
            let report = with_progress(id, ctx, |tx| async move {
                expander::expand_playlist(&ctx.resolver, &playlist, &indices, Some(&tx), &ctx.cancel)
                    .await
            })
            .await?;
            enqueue(ctx, &report).await?;
            Ok(JobOutcome::Expanded(report))
        }
        Job::FetchThumbnail { media_id, url } => {
            cancellable(&ctx.cancel, async {
                ctx.thumbnails.fetch(&ctx.http, &media_id, &url).await;
                Ok(())
            })
            .await?;
            Ok(JobOutcome::Thumbnail { media_id })
        }
    }
}

/// Race `fut` against shutdown
async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, TubeQueueError>
where
    F: Future<Output = Result<T, TubeQueueError>>,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(TubeQueueError::Cancelled),
        result = fut => result,
    }
}

/// Run an expansion while forwarding its progress as `JobProgress` events.
///
/// All progress events are delivered before this returns.
async fn with_progress<'a, F, Fut>(
    id: JobId,
    ctx: &'a JobContext,
    expand: F,
) -> Result<ExpansionReport, TubeQueueError>
where
    F: FnOnce(mpsc::Sender<ExpansionProgress>) -> Fut,
    Fut: Future<Output = Result<ExpansionReport, TubeQueueError>> + 'a,
{
    let (tx, mut rx) = mpsc::channel::<ExpansionProgress>(32);
    let events = ctx.events.clone();
    let forwarder = tokio::spawn(async move {
        while let Some(p) = rx.recv().await {
            let _ = events
                .send(EngineEvent::JobProgress {
                    job: id,
                    processed: p.processed,
                    total: p.total,
                    status: p.status,
                })
                .await;
        }
    });

    let result = expand(tx).await;
    let _ = forwarder.await;
    result
}

/// Append expanded items to the queue and start loading their thumbnails.
///
/// Nothing is appended once shutdown has fired.
async fn enqueue(ctx: &JobContext, report: &ExpansionReport) -> Result<(), TubeQueueError> {
    if ctx.cancel.is_cancelled() {
        return Err(TubeQueueError::Cancelled);
    }
    if report.items.is_empty() {
        return Ok(());
    }
    let count = ctx.queue.append_all(report.items.clone()).await;
    let queue_len = ctx.queue.len().await;
    let _ = ctx
        .events
        .send(EngineEvent::ItemsQueued { count, queue_len })
        .await;

    prefetch_thumbnails(ctx, thumbnail_sources(&report.items));
    Ok(())
}

pub(crate) fn thumbnail_sources(items: &[QueueItem]) -> Vec<(String, String)> {
    items
        .iter()
        .filter_map(|item| {
            item.thumbnail()
                .map(|url| (item.media_id().to_string(), url.to_string()))
        })
        .collect()
}

/// Detached prefetch; stops on shutdown
pub(crate) fn prefetch_thumbnails(ctx: &JobContext, entries: Vec<(String, String)>) {
    if entries.is_empty() {
        return;
    }
    let cache = ctx.thumbnails.clone();
    let http = ctx.http.clone();
    let cancel = ctx.cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = cache.prefetch(&http, entries) => {}
        }
    });
}

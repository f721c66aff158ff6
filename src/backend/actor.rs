use super::jobs::{self, spawn_job, Job, JobContext};
use super::messages::{EngineCommand, EngineEvent, JobId};
use super::processor::QueueProcessor;
use super::resolver::{split_urls, InfoResolver};
use crate::downloader::TaskEvent;
use crate::extractor::{Extractor, MediaInfo, PlaylistInfo};
use crate::queue::{DownloadQueue, QueueItem};
use crate::selection::{require_selection, TrackSelector};
use crate::thumbnail::{self, ThumbnailCache};
use crate::utils::config::{absolutize, AppSettings};
use crate::utils::error::TubeQueueError;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

/// How the single-item flow picks tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    AudioOnly,
    BestVideo,
    /// Video at this exact height
    Resolution(u32),
}

/// Owns the processor; the only task that mutates download state
pub struct EngineActor {
    commands: mpsc::Receiver<EngineCommand>,
    task_rx: mpsc::Receiver<TaskEvent>,
    events: mpsc::Sender<EngineEvent>,
    processor: QueueProcessor,
    jobs: JobContext,
}

enum Input {
    Command(Option<EngineCommand>),
    Task(TaskEvent),
}

impl EngineActor {
    pub async fn run(mut self) {
        info!("Engine started");

        loop {
            let input = tokio::select! {
                cmd = self.commands.recv() => Input::Command(cmd),
                Some(event) = self.task_rx.recv() => Input::Task(event),
            };

            match input {
                Input::Command(None) | Input::Command(Some(EngineCommand::Shutdown)) => break,
                Input::Command(Some(cmd)) => self.handle_command(cmd).await,
                Input::Task(event) => self.processor.handle_task_event(event).await,
            }
        }

        info!("Engine shutting down");
        self.jobs.cancel.cancel();
        self.processor.cancel().await;
        let _ = self.events.send(EngineEvent::Stopped).await;
    }

    async fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::Resolve { job, url } => {
                self.spawn(job, Job::ResolveInfo { url });
            }
            EngineCommand::ResolvePlaylist { job, url } => {
                self.spawn(job, Job::ResolvePlaylist { url });
            }
            EngineCommand::ExpandBatch { job, urls } => {
                self.spawn(job, Job::ExpandBatch { urls });
            }
            EngineCommand::ExpandPlaylist {
                job,
                playlist,
                indices,
            } => {
                self.spawn(job, Job::ExpandPlaylist { playlist, indices });
            }
            EngineCommand::FetchThumbnail {
                job,
                media_id,
                url,
            } => {
                self.spawn(job, Job::FetchThumbnail { media_id, url });
            }
            EngineCommand::Enqueue { item, ack } => {
                let sources = jobs::thumbnail_sources(std::slice::from_ref(&item));
                self.jobs.queue.append(item).await;
                let queue_len = self.jobs.queue.len().await;
                let _ = ack.send(queue_len);
                self.emit(EngineEvent::ItemsQueued {
                    count: 1,
                    queue_len,
                })
                .await;
                jobs::prefetch_thumbnails(&self.jobs, sources);
            }
            EngineCommand::Remove(ids) => {
                self.jobs.queue.remove_ids(&ids).await;
                self.queue_changed().await;
            }
            EngineCommand::MoveItem { from, to } => match self.jobs.queue.move_item(from, to).await {
                Ok(()) => self.queue_changed().await,
                Err(e) => {
                    self.emit(EngineEvent::Rejected {
                        error: e.to_string(),
                    })
                    .await
                }
            },
            EngineCommand::Clear => {
                self.jobs.queue.clear().await;
                self.queue_changed().await;
            }
            EngineCommand::Start => self.processor.start().await,
            EngineCommand::SetBaseDir(dir) => self.processor.set_base_dir(dir),
            EngineCommand::Shutdown => {}
        }
    }

    fn spawn(&self, job: JobId, work: Job) {
        debug!("Spawning {} job {}", work.name(), job);
        spawn_job(job, work, self.jobs.clone());
    }

    async fn queue_changed(&self) {
        let queue_len = self.jobs.queue.len().await;
        self.emit(EngineEvent::QueueChanged { queue_len }).await;
    }

    async fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event).await;
    }
}

/// Cloneable front door to the engine.
///
/// Input is validated before anything is sent, so bad URLs or empty
/// selections never reach the actor.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<EngineCommand>,
    queue: DownloadQueue,
    thumbnails: ThumbnailCache,
}

impl EngineHandle {
    /// Start the engine actor; returns the handle, the event stream and the actor task
    pub fn spawn(
        settings: AppSettings,
        extractor: Arc<dyn Extractor>,
    ) -> (Self, mpsc::Receiver<EngineEvent>, JoinHandle<()>) {
        let capacity = settings.channel_capacity.max(1);
        let (cmd_tx, cmd_rx) = mpsc::channel(capacity);
        let (event_tx, event_rx) = mpsc::channel(capacity);
        let (task_tx, task_rx) = mpsc::channel(capacity);

        let queue = DownloadQueue::new(settings.placeholder_item_size);
        let thumbnails = ThumbnailCache::new();

        let processor = QueueProcessor::new(
            queue.clone(),
            extractor.clone(),
            &settings,
            task_tx,
            event_tx.clone(),
        );
        let jobs = JobContext {
            resolver: InfoResolver::new(extractor),
            queue: queue.clone(),
            thumbnails: thumbnails.clone(),
            http: thumbnail::http_client(),
            events: event_tx.clone(),
            cancel: CancellationToken::new(),
        };

        let actor = EngineActor {
            commands: cmd_rx,
            task_rx,
            events: event_tx,
            processor,
            jobs,
        };
        let join = tokio::spawn(actor.run());

        (
            Self {
                commands: cmd_tx,
                queue,
                thumbnails,
            },
            event_rx,
            join,
        )
    }

    async fn send(&self, cmd: EngineCommand) -> Result<(), TubeQueueError> {
        self.commands
            .send(cmd)
            .await
            .map_err(|_| TubeQueueError::EngineStopped)
    }

    /// Resolve one URL; the result arrives as `JobOutcome::Info`
    pub async fn resolve(&self, url: &str) -> Result<JobId, TubeQueueError> {
        let url = non_blank_url(url)?;
        let job = Uuid::new_v4();
        self.send(EngineCommand::Resolve { job, url }).await?;
        Ok(job)
    }

    pub async fn resolve_playlist(&self, url: &str) -> Result<JobId, TubeQueueError> {
        let url = non_blank_url(url)?;
        let job = Uuid::new_v4();
        self.send(EngineCommand::ResolvePlaylist { job, url }).await?;
        Ok(job)
    }

    /// Expand pasted URL text (comma, semicolon or whitespace separated)
    pub async fn expand_batch(&self, text: &str) -> Result<JobId, TubeQueueError> {
        let urls = split_urls(text);
        if urls.is_empty() {
            return Err(TubeQueueError::Input(
                "Please enter at least one URL".to_string(),
            ));
        }
        let job = Uuid::new_v4();
        self.send(EngineCommand::ExpandBatch { job, urls }).await?;
        Ok(job)
    }

    /// Expand the entries of `playlist` chosen by `selection` ("1-5, 8" or "all")
    pub async fn expand_playlist(
        &self,
        playlist: PlaylistInfo,
        selection: &str,
    ) -> Result<JobId, TubeQueueError> {
        let indices = require_selection(selection, playlist.entries.len())?;
        let job = Uuid::new_v4();
        self.send(EngineCommand::ExpandPlaylist {
            job,
            playlist,
            indices,
        })
        .await?;
        Ok(job)
    }

    pub async fn fetch_thumbnail(&self, media_id: &str, url: &str) -> Result<JobId, TubeQueueError> {
        let url = non_blank_url(url)?;
        let job = Uuid::new_v4();
        self.send(EngineCommand::FetchThumbnail {
            job,
            media_id: media_id.to_string(),
            url,
        })
        .await?;
        Ok(job)
    }

    /// Queue a resolved item with the given track choice; returns the new item's id.
    ///
    /// Returns once the item is in the queue.
    pub async fn submit(&self, info: &MediaInfo, mode: SubmitMode) -> Result<Uuid, TubeQueueError> {
        let item = build_submission(info, mode)?;
        let id = item.id();
        let (ack, appended) = oneshot::channel();
        self.send(EngineCommand::Enqueue { item, ack }).await?;
        let queue_len = appended.await.map_err(|_| TubeQueueError::EngineStopped)?;
        debug!("Queued {} ({} in queue)", id, queue_len);
        Ok(id)
    }

    pub async fn remove(&self, ids: Vec<Uuid>) -> Result<(), TubeQueueError> {
        self.send(EngineCommand::Remove(ids)).await
    }

    pub async fn move_item(&self, from: usize, to: usize) -> Result<(), TubeQueueError> {
        self.send(EngineCommand::MoveItem { from, to }).await
    }

    pub async fn clear(&self) -> Result<(), TubeQueueError> {
        self.send(EngineCommand::Clear).await
    }

    pub async fn start(&self) -> Result<(), TubeQueueError> {
        self.send(EngineCommand::Start).await
    }

    /// Relative paths are resolved against the current directory
    pub async fn set_base_dir(&self, dir: impl AsRef<Path>) -> Result<(), TubeQueueError> {
        self.send(EngineCommand::SetBaseDir(absolutize(dir.as_ref())))
            .await
    }

    /// Ask the engine to stop; succeeds if it already has
    pub async fn shutdown(&self) -> Result<(), TubeQueueError> {
        match self.send(EngineCommand::Shutdown).await {
            Ok(()) | Err(TubeQueueError::EngineStopped) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn queue(&self) -> &DownloadQueue {
        &self.queue
    }

    pub fn thumbnails(&self) -> &ThumbnailCache {
        &self.thumbnails
    }
}

fn non_blank_url(url: &str) -> Result<String, TubeQueueError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(TubeQueueError::Input("Please enter a URL".to_string()));
    }
    Ok(url.to_string())
}

/// Single-item track choice
pub fn build_submission(info: &MediaInfo, mode: SubmitMode) -> Result<QueueItem, TubeQueueError> {
    let language = info.language.as_deref();
    match mode {
        SubmitMode::AudioOnly => {
            let audio = TrackSelector::select_audio(&info.tracks, language)
                .ok_or(TubeQueueError::Selection("audio"))?;
            Ok(QueueItem::audio_only(info, audio))
        }
        SubmitMode::BestVideo => {
            let (video, audio) = TrackSelector::select_pair(info)?;
            QueueItem::video_audio(info, video, audio)
        }
        SubmitMode::Resolution(height) => {
            let video = TrackSelector::select_video_at(&info.tracks, height)
                .ok_or(TubeQueueError::Selection("video"))?;
            let audio = TrackSelector::select_audio(&info.tracks, language)
                .ok_or(TubeQueueError::Selection("audio"))?;
            QueueItem::video_audio(info, video, audio)
        }
    }
}

//! Shared fixtures: a scripted extractor and sample metadata.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tubequeue::downloader::DownloadRequest;
use tubequeue::extractor::{
    Extractor, MediaInfo, PlaylistEntry, PlaylistInfo, Track, TrackKind, TransferEvent,
};

/// What a mocked download does
#[derive(Debug, Clone)]
pub enum DownloadScript {
    /// Two progress updates, a finished signal, then the output file is written
    Succeed,
    /// One progress update, then an error
    FailAfterProgress(String),
    /// One progress update, then never returns
    Hang,
}

#[derive(Default)]
pub struct MockExtractor {
    infos: HashMap<String, std::result::Result<MediaInfo, String>>,
    playlists: HashMap<String, PlaylistInfo>,
    downloads: HashMap<String, DownloadScript>,
    download_calls: Mutex<Vec<DownloadRequest>>,
    cancel_on_resolve: Option<CancellationToken>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_info(mut self, info: MediaInfo) -> Self {
        self.infos.insert(info.url.clone(), Ok(info));
        self
    }

    pub fn with_info_error(mut self, url: &str, message: &str) -> Self {
        self.infos.insert(url.to_string(), Err(message.to_string()));
        self
    }

    pub fn with_playlist(mut self, url: &str, playlist: PlaylistInfo) -> Self {
        self.playlists.insert(url.to_string(), playlist);
        self
    }

    pub fn with_download(mut self, url: &str, script: DownloadScript) -> Self {
        self.downloads.insert(url.to_string(), script);
        self
    }

    /// Fire `token` from inside every `extract_info`, as a shutdown mid-resolution would
    pub fn cancelling_on_resolve(mut self, token: CancellationToken) -> Self {
        self.cancel_on_resolve = Some(token);
        self
    }

    pub fn download_calls(&self) -> Vec<DownloadRequest> {
        self.download_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    fn id(&self) -> &'static str {
        "mock"
    }

    async fn extract_info(&self, url: &str) -> Result<MediaInfo> {
        if let Some(token) = &self.cancel_on_resolve {
            token.cancel();
        }
        match self.infos.get(url) {
            Some(Ok(info)) => Ok(info.clone()),
            Some(Err(message)) => anyhow::bail!("{}", message),
            None => anyhow::bail!("Unsupported URL: {}", url),
        }
    }

    async fn extract_playlist(&self, url: &str) -> Result<PlaylistInfo> {
        self.playlists
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Unsupported URL: {}", url))
    }

    async fn download(
        &self,
        request: &DownloadRequest,
        progress: mpsc::Sender<TransferEvent>,
    ) -> Result<PathBuf> {
        self.download_calls.lock().unwrap().push(request.clone());
        let script = self
            .downloads
            .get(&request.url)
            .cloned()
            .unwrap_or(DownloadScript::Succeed);

        let _ = progress.send(downloading(512, 1024)).await;
        match script {
            DownloadScript::Succeed => {
                let _ = progress.send(downloading(1024, 1024)).await;
                let _ = progress.send(TransferEvent::Finished).await;
                tokio::fs::write(&request.output_path, b"media").await?;
                Ok(request.output_path.clone())
            }
            DownloadScript::FailAfterProgress(message) => anyhow::bail!("{}", message),
            DownloadScript::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                anyhow::bail!("unreachable")
            }
        }
    }
}

pub fn downloading(done: u64, total: u64) -> TransferEvent {
    TransferEvent::Downloading {
        downloaded_bytes: Some(done),
        total_bytes: Some(total),
        speed: Some(1024.0 * 1024.0),
        eta: Some(3),
    }
}

pub fn url(id: &str) -> String {
    format!("https://video.example/watch?v={}", id)
}

pub fn video_track(id: &str, codec: &str, height: u32, size: Option<u64>) -> Track {
    Track {
        format_id: id.to_string(),
        codec: codec.to_string(),
        kind: TrackKind::VideoOnly,
        height: Some(height),
        abr: None,
        filesize: size,
        language: None,
    }
}

pub fn audio_track(id: &str, abr: f64, language: Option<&str>) -> Track {
    Track {
        format_id: id.to_string(),
        codec: "mp4a.40.2".to_string(),
        kind: TrackKind::AudioOnly,
        height: None,
        abr: Some(abr),
        filesize: Some(1_000),
        language: language.map(str::to_string),
    }
}

/// Info with 1080p/720p H.264 video and one AAC audio track
pub fn media(id: &str, title: &str) -> MediaInfo {
    MediaInfo {
        id: id.to_string(),
        title: title.to_string(),
        url: url(id),
        duration: Some(90),
        uploader: Some("Uploader".to_string()),
        view_count: Some(1_234),
        thumbnail: None,
        language: None,
        tracks: vec![
            video_track("137", "avc1.640028", 1080, Some(10_000)),
            video_track("136", "avc1.4d401f", 720, Some(5_000)),
            audio_track("140", 129.5, None),
        ],
    }
}

/// Info with no usable audio track
pub fn media_without_audio(id: &str) -> MediaInfo {
    let mut info = media(id, &format!("Silent {}", id));
    info.tracks.retain(|t| t.kind != TrackKind::AudioOnly);
    info
}

/// Info with no avc1/vp09 video
pub fn media_without_video(id: &str) -> MediaInfo {
    let mut info = media(id, &format!("Audio {}", id));
    info.tracks.retain(|t| t.kind == TrackKind::AudioOnly);
    info
}

pub fn playlist(title: &str, urls: &[Option<String>]) -> PlaylistInfo {
    PlaylistInfo {
        title: title.to_string(),
        uploader: None,
        entries: urls
            .iter()
            .enumerate()
            .map(|(i, url)| PlaylistEntry {
                index: i + 1,
                url: url.clone(),
                title: None,
            })
            .collect(),
    }
}

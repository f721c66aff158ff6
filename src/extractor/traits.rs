use crate::downloader::DownloadRequest;
use crate::extractor::models::{MediaInfo, PlaylistInfo, TransferEvent};
use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Core trait for the external extraction/download collaborator
///
/// This trait isolates the queue engine from the specific tool doing the work
/// (yt-dlp child process, test doubles, ...). Every method may block for a long
/// time and is only ever awaited from background tasks.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Returns a unique identifier for this extractor (e.g., "ytdlp")
    fn id(&self) -> &'static str;

    /// Resolves full metadata and the available tracks of a single URL
    async fn extract_info(&self, url: &str) -> Result<MediaInfo>;

    /// Flat playlist resolution: entry URLs and positions only
    async fn extract_playlist(&self, url: &str) -> Result<PlaylistInfo> {
        // Default implementation for extractors that don't support playlists
        Err(anyhow::anyhow!(
            "Playlist extraction not supported by {}",
            self.id()
        ))
    }

    /// Transfers and merges the requested formats, reporting progress on `progress`.
    ///
    /// Returns the final output path. Dropping the returned future must stop the transfer.
    async fn download(
        &self,
        request: &DownloadRequest,
        progress: mpsc::Sender<TransferEvent>,
    ) -> Result<PathBuf>;
}

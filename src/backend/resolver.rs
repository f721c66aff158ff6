//! Metadata resolution through the extraction collaborator

use crate::extractor::{Extractor, MediaInfo, PlaylistInfo};
use crate::utils::error::TubeQueueError;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves URLs into [`MediaInfo`] / [`PlaylistInfo`], one collaborator call each
#[derive(Clone)]
pub struct InfoResolver {
    extractor: Arc<dyn Extractor>,
}

impl InfoResolver {
    pub fn new(extractor: Arc<dyn Extractor>) -> Self {
        Self { extractor }
    }

    pub fn extractor(&self) -> &Arc<dyn Extractor> {
        &self.extractor
    }

    pub async fn resolve(&self, url: &str) -> Result<MediaInfo, TubeQueueError> {
        let url = require_url(url)?;
        debug!("Resolving {} via {}", url, self.extractor.id());

        self.extractor.extract_info(url).await.map_err(|e| {
            warn!("Resolution of {} failed: {:#}", url, e);
            TubeQueueError::resolution(url, format!("{:#}", e))
        })
    }

    /// Flat playlist resolution; entries are not resolved individually
    pub async fn resolve_playlist(&self, url: &str) -> Result<PlaylistInfo, TubeQueueError> {
        let url = require_url(url)?;
        debug!("Resolving playlist {} via {}", url, self.extractor.id());

        let playlist = self
            .extractor
            .extract_playlist(url)
            .await
            .map_err(|e| TubeQueueError::resolution(url, format!("{:#}", e)))?;

        if playlist.entries.is_empty() {
            return Err(TubeQueueError::resolution(
                url,
                "Invalid playlist or no videos found",
            ));
        }
        Ok(playlist)
    }
}

fn require_url(url: &str) -> Result<&str, TubeQueueError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(TubeQueueError::Input("Please enter a URL".to_string()));
    }
    Ok(url)
}

/// Split pasted batch text on commas, semicolons and whitespace
pub fn split_urls(text: &str) -> Vec<String> {
    text.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

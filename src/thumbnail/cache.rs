use futures::stream::{self, StreamExt};
use image::{DynamicImage, Rgb, RgbImage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::utils::error::TubeQueueError;

/// Decoded thumbnails are shared, never copied
pub type Thumbnail = Arc<DynamicImage>;

pub const PLACEHOLDER_WIDTH: u32 = 120;
pub const PLACEHOLDER_HEIGHT: u32 = 90;

/// Concurrent fetches during a prefetch
const PREFETCH_CONCURRENCY: usize = 4;

/// Process-wide thumbnail store keyed by media id
#[derive(Debug, Clone, Default)]
pub struct ThumbnailCache {
    entries: Arc<RwLock<HashMap<String, Thumbnail>>>,
}

impl ThumbnailCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &str) -> Option<Thumbnail> {
        self.entries.read().await.get(id).cloned()
    }

    /// Store `image` under `id`; a later put for the same id replaces it
    pub async fn put(&self, id: &str, image: Thumbnail) {
        self.entries.write().await.insert(id.to_string(), image);
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.entries.read().await.contains_key(id)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Cached image for `id`, downloading and decoding it on a miss.
    ///
    /// Any failure stores and returns the grey placeholder, so a broken
    /// thumbnail is only requested once.
    pub async fn fetch(&self, client: &reqwest::Client, id: &str, url: &str) -> Thumbnail {
        if let Some(hit) = self.get(id).await {
            return hit;
        }

        let image = match download_image(client, url).await {
            Ok(image) => Arc::new(image),
            Err(e) => {
                warn!("Thumbnail for {} unavailable: {}", id, e);
                Arc::new(placeholder())
            }
        };
        self.put(id, image.clone()).await;
        image
    }

    /// Fetch several `(id, url)` pairs with bounded fan-out
    pub async fn prefetch(&self, client: &reqwest::Client, entries: Vec<(String, String)>) {
        let pending: Vec<_> = {
            let cached = self.entries.read().await;
            entries
                .into_iter()
                .filter(|(id, _)| !cached.contains_key(id))
                .collect()
        };
        if pending.is_empty() {
            return;
        }
        debug!("Prefetching {} thumbnails", pending.len());

        stream::iter(pending)
            .map(|(id, url)| async move {
                self.fetch(client, &id, &url).await;
            })
            .buffer_unordered(PREFETCH_CONCURRENCY)
            .collect::<Vec<_>>()
            .await;
    }
}

async fn download_image(client: &reqwest::Client, url: &str) -> Result<DynamicImage, TubeQueueError> {
    let bytes = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    // Decoding is CPU bound
    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| TubeQueueError::Download(e.to_string()))?
        .map_err(|e| TubeQueueError::Download(format!("Invalid image data: {}", e)))
}

/// Solid grey 120x90 stand-in for thumbnails that could not be loaded
pub fn placeholder() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(
        PLACEHOLDER_WIDTH,
        PLACEHOLDER_HEIGHT,
        Rgb([60, 60, 60]),
    ))
}

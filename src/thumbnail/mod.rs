//! Thumbnail download and caching

pub mod cache;

pub use cache::{placeholder, Thumbnail, ThumbnailCache};

use std::time::Duration;

/// HTTP client used for thumbnail downloads
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

//! Application configuration

use crate::utils::error::TubeQueueError;
use crate::utils::paths;
use path_absolutize::Absolutize;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Size assumed for a queued item whose tracks reported no size (100 MiB)
pub const PLACEHOLDER_ITEM_SIZE: u64 = 100 * 1024 * 1024;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Base download location; each day gets its own `YYYY-MM-DD` subfolder
    pub base_download_dir: PathBuf,

    /// Netscape cookie file handed to yt-dlp when it exists on disk
    pub cookie_file: Option<PathBuf>,

    /// Explicit yt-dlp binary, otherwise it is searched for
    pub ytdlp_path: Option<PathBuf>,

    /// How long shutdown waits for the active download to stop (milliseconds)
    pub shutdown_grace_ms: u64,

    /// Size estimate for items with no known size (bytes)
    pub placeholder_item_size: u64,

    /// Capacity of the engine's command and event channels
    pub channel_capacity: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            base_download_dir: paths::default_download_dir(),
            cookie_file: None,
            ytdlp_path: None,
            shutdown_grace_ms: 1000,
            placeholder_item_size: PLACEHOLDER_ITEM_SIZE,
            channel_capacity: 100,
        }
    }
}

impl AppSettings {
    /// Load settings from a JSON file, falling back to defaults for missing keys
    pub async fn load(path: &Path) -> Result<Self, TubeQueueError> {
        let content = tokio::fs::read_to_string(path).await?;
        let mut settings: AppSettings = serde_json::from_str(&content)?;
        settings.normalize();
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings if the file exists, defaults otherwise
    pub async fn load_or_default(path: &Path) -> Result<Self, TubeQueueError> {
        if tokio::fs::try_exists(path).await? {
            Self::load(path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Persist settings as pretty JSON
    pub async fn save(&self, path: &Path) -> Result<(), TubeQueueError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Change the base download directory; relative paths are made absolute
    pub fn set_base_download_dir(&mut self, dir: impl AsRef<Path>) {
        self.base_download_dir = absolutize(dir.as_ref());
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Enforce sane minimums and absolute paths
    fn normalize(&mut self) {
        if self.channel_capacity == 0 {
            self.channel_capacity = 1;
        }
        self.base_download_dir = absolutize(&self.base_download_dir);
    }
}

pub(crate) fn absolutize(path: &Path) -> PathBuf {
    path.absolutize()
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| path.to_path_buf())
}

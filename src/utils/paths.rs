//! Download and configuration locations
//!
//! Downloads are partitioned by day: `<base>/<YYYY-MM-DD>/`. The directory is
//! only created when an item is about to be written into it.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the plain-text run log written into each dated directory
pub const LOG_FILE_NAME: &str = "download.log";

/// Returns the default base download directory
/// - All platforms: ~/Downloads/TubeQueue, or ./download when no home exists
pub fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .map(|d| d.join("TubeQueue"))
        .unwrap_or_else(|| PathBuf::from("download"))
}

/// Returns the settings file location
/// - Linux: ~/.config/tubequeue/settings.json
/// - macOS: ~/Library/Application Support/tubequeue/settings.json
/// - Windows: %APPDATA%\tubequeue\settings.json
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tubequeue")
        .join("settings.json")
}

/// `<base>/<YYYY-MM-DD>` for the given day
pub fn dated_download_dir(base: &Path, date: NaiveDate) -> PathBuf {
    base.join(date.format("%Y-%m-%d").to_string())
}

/// Create (if needed) and return today's download directory
pub async fn ensure_dated_download_dir(base: &Path) -> std::io::Result<PathBuf> {
    let dir = dated_download_dir(base, chrono::Local::now().date_naive());
    tokio::fs::create_dir_all(&dir).await?;
    debug!("Download directory: {:?}", dir);
    Ok(dir)
}

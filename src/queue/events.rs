use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

use crate::utils::paths::LOG_FILE_NAME;

/// Entries written to the plain-text run log
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    /// An item left the queue and its download began
    Started { title: String },
    /// Free-form status from the download (e.g. merging)
    Status { message: String },
    /// An item finished successfully
    Completed { title: String, path: PathBuf },
    /// An item failed; the queue moves on
    Failed { title: String, error: String },
    /// The queue ran dry after processing at least one item
    Drained,
}

impl fmt::Display for QueueEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueEvent::Started { title } => write!(f, "Starting download: {}", title),
            QueueEvent::Status { message } => write!(f, "{}", message),
            QueueEvent::Completed { title, path } => {
                write!(f, "Completed: {}\nSaved to: {}", title, path.display())
            }
            QueueEvent::Failed { title, error } => write!(f, "Failed: {} - {}", title, error),
            QueueEvent::Drained => write!(f, "All downloads completed successfully!"),
        }
    }
}

/// Append-only `download.log` inside a dated download directory
#[derive(Debug, Clone)]
pub struct EventLog {
    file_path: PathBuf,
    writer: Arc<Mutex<BufWriter<File>>>,
}

impl EventLog {
    pub async fn new(dir: &Path) -> Result<Self> {
        let file_path = dir.join(LOG_FILE_NAME);

        // Ensure directory exists
        tokio::fs::create_dir_all(dir).await?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)
            .await
            .context("Failed to open download log")?;

        Ok(Self {
            file_path,
            writer: Arc::new(Mutex::new(BufWriter::new(file))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Append an event, one timestamped line per message line
    pub async fn log(&self, event: &QueueEvent) -> Result<()> {
        self.log_at(event, Local::now()).await
    }

    async fn log_at(&self, event: &QueueEvent, at: DateTime<Local>) -> Result<()> {
        let stamp = at.format("%Y-%m-%d %H:%M:%S");
        let mut writer = self.writer.lock().await;
        for line in event.to_string().lines() {
            writer
                .write_all(format!("[{}] {}\n", stamp, line).as_bytes())
                .await?;
        }
        writer.flush().await?; // one flush per event
        Ok(())
    }

    /// Read all lines back, without their timestamps
    pub async fn read_messages(&self) -> Result<Vec<String>> {
        if !tokio::fs::try_exists(&self.file_path).await? {
            return Ok(Vec::new());
        }

        let content = tokio::fs::read_to_string(&self.file_path).await?;
        Ok(content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|line| match line.split_once("] ") {
                Some((stamp, message)) if stamp.starts_with('[') => message.to_string(),
                _ => line.to_string(),
            })
            .collect())
    }
}

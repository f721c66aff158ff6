//! yt-dlp wrapper for info extraction and downloads
//!
//! yt-dlp is driven as a child process. Info and playlist resolution parse its
//! JSON dump; downloads parse a custom `--progress-template` line by line.

use crate::downloader::{DownloadRequest, OutputKind};
use crate::extractor::models::{MediaInfo, PlaylistInfo, RawInfo, RawPlaylist, TransferEvent};
use crate::extractor::options::ExtractorOptions;
use crate::extractor::traits::Extractor;
use crate::utils::error::TubeQueueError;
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command as AsyncCommand;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Marker at the start of every progress line we ask yt-dlp to print
const PROGRESS_MARKER: &str = "tq|";

const PROGRESS_TEMPLATE: &str = "download:tq|%(progress.status)s|%(progress.downloaded_bytes)s|%(progress.total_bytes)s|%(progress.total_bytes_estimate)s|%(progress.speed)s|%(progress.eta)s";

/// Marker for the final file path printed after post-processing
const FILEPATH_MARKER: &str = "tq-file|";

const FILEPATH_TEMPLATE: &str = "after_move:tq-file|%(filepath)s";

/// Extractor backed by the yt-dlp command line tool
pub struct YtDlpExtractor {
    ytdlp_path: PathBuf,
    options: ExtractorOptions,
}

impl YtDlpExtractor {
    /// Locate yt-dlp and build the extractor
    ///
    /// Search order:
    /// 1. Explicit path from settings
    /// 2. Next to the current executable
    /// 3. System PATH
    /// 4. Common installation paths (Homebrew, pip --user, ...)
    pub fn new(explicit: Option<&Path>, options: ExtractorOptions) -> Result<Self, TubeQueueError> {
        let ytdlp_path = match explicit.map(Path::to_path_buf).or_else(find_ytdlp) {
            Some(path) => {
                info!("Found yt-dlp at: {}", path.display());
                path
            }
            None => {
                error!("yt-dlp not found anywhere!");
                return Err(TubeQueueError::YtDlpNotFound);
            }
        };

        Ok(Self {
            ytdlp_path,
            options,
        })
    }

    /// Get the path to yt-dlp being used
    pub fn ytdlp_path(&self) -> &Path {
        &self.ytdlp_path
    }

    /// `yt-dlp --version`
    pub async fn version(&self) -> Result<String> {
        let output = AsyncCommand::new(&self.ytdlp_path)
            .arg("--version")
            .output()
            .await
            .context("Failed to run yt-dlp")?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn base_command(&self) -> AsyncCommand {
        let mut cmd = AsyncCommand::new(&self.ytdlp_path);
        cmd.args(self.options.to_args()).kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn id(&self) -> &'static str {
        "ytdlp"
    }

    /// Uses: yt-dlp --dump-json --no-download --no-playlist
    async fn extract_info(&self, url: &str) -> Result<MediaInfo> {
        debug!("Extracting video info for URL: {}", url);

        let output = self
            .base_command()
            .arg("--dump-json")
            .arg("--no-download")
            .arg("--no-playlist")
            .arg(url)
            .output()
            .await?;

        let stdout = String::from_utf8(output.stdout)?;
        let first = stdout.lines().find(|l| !l.trim().is_empty());

        match first {
            Some(json) => {
                let raw: RawInfo = serde_json::from_str(json)?;
                Ok(raw.into_media_info(url))
            }
            None => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                error!("yt-dlp extraction failed: {}", stderr);
                Err(anyhow!(error_summary(&stderr, "No information returned")))
            }
        }
    }

    /// Uses: yt-dlp --flat-playlist --dump-single-json
    async fn extract_playlist(&self, url: &str) -> Result<PlaylistInfo> {
        debug!("Extracting playlist info for URL: {}", url);

        let output = self
            .base_command()
            .arg("--flat-playlist")
            .arg("--dump-single-json")
            .arg("--yes-playlist")
            .arg(url)
            .output()
            .await?;

        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("yt-dlp playlist extraction failed: {}", stderr);
            bail!(error_summary(&stderr, "No information returned"));
        }

        let raw: RawPlaylist = serde_json::from_slice(&output.stdout)?;
        raw.into_playlist_info()
            .ok_or_else(|| anyhow!("Invalid playlist or no videos found"))
    }

    async fn download(
        &self,
        request: &DownloadRequest,
        progress: mpsc::Sender<TransferEvent>,
    ) -> Result<PathBuf> {
        debug!("Downloading {} with format {}", request.url, request.format);

        let mut cmd = AsyncCommand::new(&self.ytdlp_path);
        cmd.kill_on_drop(true)
            .args(request.options.to_args())
            .args(download_args(request))
            .arg(&request.url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().context("Failed to start yt-dlp")?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("yt-dlp stdout unavailable"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("yt-dlp stderr unavailable"))?;

        let stderr_reader = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = BufReader::new(stderr).read_to_string(&mut buf).await;
            buf
        });

        let mut final_path = None;
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(event) = parse_progress_line(&line) {
                if progress.send(event).await.is_err() {
                    debug!("Progress receiver dropped for {}", request.url);
                }
            } else if let Some(path) = parse_filepath_line(&line) {
                final_path = Some(path);
            }
        }

        let status = child.wait().await?;
        let stderr_text = stderr_reader.await.unwrap_or_default();

        if !status.success() {
            warn!("yt-dlp exited with {}: {}", status, stderr_text);
            bail!(error_summary(
                &stderr_text,
                &format!("yt-dlp exited with {}", status)
            ));
        }

        let output = final_path.unwrap_or_else(|| request.output_path.clone());
        if output != request.output_path {
            info!("yt-dlp saved {} as {}", request.url, output.display());
        }
        if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
            bail!(error_summary(&stderr_text, "Output file was not created"));
        }

        Ok(output)
    }
}

/// Format, output and post-processing flags for one download
fn download_args(request: &DownloadRequest) -> Vec<String> {
    // yt-dlp fills in the real extension; `%` in titles must not be read as a template field
    let template = request
        .output_path
        .with_extension("%(ext)s")
        .to_string_lossy()
        .replace('%', "%%")
        .replace("%%(ext)s", "%(ext)s");

    let mut args = vec![
        "-f".to_string(),
        request.format.clone(),
        "-o".to_string(),
        template,
        "--no-playlist".to_string(),
        "--progress".to_string(),
        "--newline".to_string(),
        "--progress-template".to_string(),
        PROGRESS_TEMPLATE.to_string(),
        "--print".to_string(),
        FILEPATH_TEMPLATE.to_string(),
    ];

    match request.kind {
        OutputKind::Audio => args.extend([
            "-x".to_string(),
            "--audio-format".to_string(),
            "mp3".to_string(),
        ]),
        // The `/best` fallback may be a single non-mp4 file; remux covers it
        OutputKind::Video => args.extend([
            "--merge-output-format".to_string(),
            "mp4".to_string(),
            "--remux-video".to_string(),
            "mp4".to_string(),
        ]),
    }
    args
}

/// Final output path from a line printed through [`FILEPATH_TEMPLATE`]
pub fn parse_filepath_line(line: &str) -> Option<PathBuf> {
    let path = line.trim_end().strip_prefix(FILEPATH_MARKER)?;
    if path.is_empty() || path == "NA" {
        return None;
    }
    Some(PathBuf::from(path))
}

/// Parse one line printed through [`PROGRESS_TEMPLATE`].
///
/// yt-dlp prints `NA` for unknown values; those become `None`.
pub fn parse_progress_line(line: &str) -> Option<TransferEvent> {
    let rest = line.trim().strip_prefix(PROGRESS_MARKER)?;
    let fields: Vec<&str> = rest.split('|').collect();
    if fields.len() < 6 {
        return None;
    }

    let number = |s: &str| s.trim().parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0);

    match fields[0].trim() {
        "downloading" => Some(TransferEvent::Downloading {
            downloaded_bytes: number(fields[1]).map(|v| v as u64),
            total_bytes: number(fields[2])
                .or_else(|| number(fields[3]))
                .map(|v| v as u64),
            speed: number(fields[4]),
            eta: number(fields[5]).map(|v| v as u64),
        }),
        "finished" => Some(TransferEvent::Finished),
        _ => None,
    }
}

/// Last meaningful stderr line, or the fallback
fn error_summary(stderr: &str, fallback: &str) -> String {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

// ============================================================
// yt-dlp Detection Functions
// ============================================================

/// Find yt-dlp binary with priority:
/// 1. Next to the executable
/// 2. System PATH
/// 3. Common installation paths
pub fn find_ytdlp() -> Option<PathBuf> {
    if let Some(local) = find_next_to_executable() {
        info!("✓ Using bundled yt-dlp: {:?}", local);
        return Some(local);
    }

    if let Ok(system) = which::which("yt-dlp") {
        info!("✓ Using system yt-dlp: {:?}", system);
        return Some(system);
    }

    if let Some(common) = find_in_common_paths() {
        info!("✓ Using yt-dlp from common path: {:?}", common);
        return Some(common);
    }

    warn!("✗ yt-dlp not found anywhere!");
    None
}

fn find_next_to_executable() -> Option<PathBuf> {
    let exe_path = std::env::current_exe().ok()?;
    let exe_dir = exe_path.parent()?;
    let name = if cfg!(windows) { "yt-dlp.exe" } else { "yt-dlp" };
    let candidate = exe_dir.join(name);
    is_executable(&candidate).then_some(candidate)
}

fn find_in_common_paths() -> Option<PathBuf> {
    let mut candidates = vec![
        // macOS Homebrew (Apple Silicon)
        PathBuf::from("/opt/homebrew/bin/yt-dlp"),
        // macOS Homebrew (Intel)
        PathBuf::from("/usr/local/bin/yt-dlp"),
        PathBuf::from("/usr/bin/yt-dlp"),
    ];
    // pip --user
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".local/bin/yt-dlp"));
    }

    candidates.into_iter().find(|p| is_executable(p))
}

/// Check if a file is executable
fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        std::fs::metadata(path)
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        // On Windows, just check if file exists
        path.is_file()
    }
}

// ============================================================
// Tests
// ============================================================

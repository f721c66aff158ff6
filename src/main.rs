//! TubeQueue - sequential video download queue on top of yt-dlp
//!
//! Resolves single videos, URL batches or playlist selections into a queue
//! and downloads them one at a time into a dated folder.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn, Level};
use tubequeue::backend::{EngineEvent, EngineHandle, InfoResolver, JobId, JobOutcome, SubmitMode};
use tubequeue::extractor::{Extractor, ExtractorOptions, YtDlpExtractor};
use tubequeue::utils::{default_config_path, format_size, AppSettings};

#[derive(Parser)]
#[command(name = "tubequeue", version, about = "Queue and download videos with yt-dlp")]
struct Args {
    /// One URL downloads a single video, several are expanded as a batch
    urls: Vec<String>,

    /// Playlist URL to expand
    #[arg(long, conflicts_with = "urls")]
    playlist: Option<String>,

    /// Playlist entries to queue, e.g. "1-5, 8" or "all"
    #[arg(long, default_value = "all")]
    select: String,

    /// Download audio only as mp3 (single URL)
    #[arg(long, conflicts_with = "resolution")]
    audio_only: bool,

    /// Exact video height (single URL)
    #[arg(long)]
    resolution: Option<u32>,

    /// Base download directory
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Netscape cookie file passed to yt-dlp
    #[arg(long)]
    cookies: Option<PathBuf>,

    /// Settings file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print metadata and available resolutions without downloading
    #[arg(long)]
    info: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .with_target(false)
        .init();

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let mut settings = AppSettings::load_or_default(&config_path)
        .await
        .with_context(|| format!("Failed to load settings from {}", config_path.display()))?;
    if let Some(dir) = &args.dir {
        settings.set_base_download_dir(dir);
    }
    if let Some(cookies) = &args.cookies {
        settings.cookie_file = Some(cookies.clone());
    }

    let options = ExtractorOptions::with_cookies(settings.cookie_file.as_deref());
    let ytdlp = YtDlpExtractor::new(settings.ytdlp_path.as_deref(), options)?;
    match ytdlp.version().await {
        Ok(version) => info!("Using yt-dlp {} at {}", version, ytdlp.ytdlp_path().display()),
        Err(e) => warn!("Could not query yt-dlp version: {:#}", e),
    }
    let extractor: Arc<dyn Extractor> = Arc::new(ytdlp);

    if args.info {
        return print_info(extractor, &args.urls).await;
    }
    if args.urls.is_empty() && args.playlist.is_none() {
        bail!("Nothing to do: pass one or more URLs or --playlist");
    }

    let (handle, mut events, engine) = EngineHandle::spawn(settings, extractor);
    let result = run(&handle, &mut events, &args).await;

    handle.shutdown().await?;
    // Drain until the actor has exited
    while events.recv().await.is_some() {}
    let _ = engine.await;
    result
}

async fn run(handle: &EngineHandle, events: &mut mpsc::Receiver<EngineEvent>, args: &Args) -> Result<()> {
    if let Some(url) = &args.playlist {
        let job = handle.resolve_playlist(url).await?;
        let JobOutcome::Playlist(playlist) = wait_for_job(events, job).await? else {
            bail!("Unexpected result while resolving playlist");
        };
        println!(
            "Playlist: {} ({} videos)",
            playlist.title,
            playlist.entries.len()
        );
        let job = handle.expand_playlist(playlist, &args.select).await?;
        report_expansion(wait_for_job(events, job).await?);
    } else if let [url] = args.urls.as_slice() {
        let job = handle.resolve(url).await?;
        let JobOutcome::Info(info) = wait_for_job(events, job).await? else {
            bail!("Unexpected result while resolving {}", url);
        };
        let mode = if args.audio_only {
            SubmitMode::AudioOnly
        } else if let Some(height) = args.resolution {
            SubmitMode::Resolution(height)
        } else {
            SubmitMode::BestVideo
        };
        handle.submit(&info, mode).await?;
        println!("Queued: {}", info.title);
    } else {
        if args.audio_only || args.resolution.is_some() {
            warn!("--audio-only and --resolution apply to single URLs only");
        }
        let job = handle.expand_batch(&args.urls.join(" ")).await?;
        report_expansion(wait_for_job(events, job).await?);
    }

    let queue = handle.queue();
    if queue.is_empty().await {
        println!("Nothing to download");
        return Ok(());
    }
    println!(
        "{} videos queued, estimated {}",
        queue.len().await,
        format_size(Some(queue.estimated_total_size().await))
    );

    handle.start().await?;
    process_downloads(events).await
}

/// Wait for `job` to finish, printing its progress along the way
async fn wait_for_job(events: &mut mpsc::Receiver<EngineEvent>, job: JobId) -> Result<JobOutcome> {
    while let Some(event) = events.recv().await {
        match event {
            EngineEvent::JobProgress {
                job: id,
                processed,
                total,
                status,
            } if id == job => println!("[{}/{}] {}", processed, total, status),
            EngineEvent::JobFinished { job: id, outcome } if id == job => return Ok(outcome),
            EngineEvent::JobFailed { job: id, error } if id == job => bail!(error),
            EngineEvent::Stopped => break,
            _ => {}
        }
    }
    bail!("Engine stopped before the job finished")
}

fn report_expansion(outcome: JobOutcome) {
    if let JobOutcome::Expanded(report) = outcome {
        for error in &report.errors {
            eprintln!("Skipped: {}", error);
        }
        println!("{}", report.summary());
    }
}

/// Print download events until the queue drains or Ctrl-C
async fn process_downloads(events: &mut mpsc::Receiver<EngineEvent>) -> Result<()> {
    loop {
        let event = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\nInterrupted, stopping...");
                return Ok(());
            }
            event = events.recv() => event,
        };

        let Some(event) = event else {
            bail!("Engine stopped unexpectedly");
        };
        match event {
            EngineEvent::DownloadStarted { title, url, .. } => {
                println!("Starting download: {}\n  {}", title, url);
            }
            EngineEvent::DownloadProgress { report, .. } => {
                let percent = report
                    .percent
                    .map(|p| format!("{:.1}%", p))
                    .unwrap_or_else(|| "--".to_string());
                let speed = report
                    .speed_mbps
                    .map(|s| format!("{:.2} MB/s", s))
                    .unwrap_or_default();
                let eta = report.eta.unwrap_or_else(|| "Calculating...".to_string());
                print!(
                    "\r  {} of {}  {}  ETA {}    ",
                    percent,
                    report.total.unwrap_or_else(|| "?".to_string()),
                    speed,
                    eta
                );
                let _ = std::io::stdout().flush();
            }
            EngineEvent::DownloadStatus { message, .. } => println!("\n  {}", message),
            EngineEvent::DownloadCompleted { title, path, .. } => {
                println!("Completed: {}\nSaved to: {}", title, path.display());
            }
            EngineEvent::DownloadFailed { title, error, .. } => {
                println!("\nFailed: {} - {}", title, error);
            }
            EngineEvent::QueueDrained { completed, failed } => {
                println!(
                    "All downloads completed successfully! ({} completed, {} failed)",
                    completed, failed
                );
                return Ok(());
            }
            EngineEvent::Stopped => return Ok(()),
            _ => {}
        }
    }
}

/// `--info`: resolve each URL and print what could be downloaded
async fn print_info(extractor: Arc<dyn Extractor>, urls: &[String]) -> Result<()> {
    if urls.is_empty() {
        bail!("--info needs at least one URL");
    }
    let resolver = InfoResolver::new(extractor);
    for url in urls {
        let info = resolver.resolve(url).await?;
        println!("{}", info.title);
        println!("  {}", info.summary());
        for option in info.resolution_options() {
            println!(
                "  {}p {} ({})",
                option.height,
                option.codec.label(),
                format_size(option.filesize)
            );
        }
    }
    Ok(())
}

//! Translating a queued selection into a collaborator download request

use crate::extractor::ExtractorOptions;
use crate::queue::{QueueItem, Selection};
use std::path::{Path, PathBuf};

/// Titles are cut to this many characters before becoming file names
pub const MAX_TITLE_LEN: usize = 100;

/// Container produced by the collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Single audio stream converted to mp3
    Audio,
    /// Video + audio merged into mp4
    Video,
}

impl OutputKind {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputKind::Audio => "mp3",
            OutputKind::Video => "mp4",
        }
    }
}

/// Everything the collaborator needs to transfer one item
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    pub url: String,
    /// yt-dlp format selector expression
    pub format: String,
    pub output_path: PathBuf,
    pub kind: OutputKind,
    pub options: ExtractorOptions,
}

impl DownloadRequest {
    pub fn for_item(item: &QueueItem, destination: &Path, options: ExtractorOptions) -> Self {
        let kind = match item.selection() {
            Selection::AudioOnly { .. } => OutputKind::Audio,
            Selection::VideoAudio { .. } => OutputKind::Video,
        };
        let file_name = format!("{}.{}", sanitize_title(item.title()), kind.extension());

        Self {
            url: item.url().to_string(),
            format: format_selector(item.selection()),
            output_path: destination.join(file_name),
            kind,
            options,
        }
    }
}

/// Build the format selector for a stored selection.
///
/// Video requests fall back to `best` when the exact pair is gone by the time
/// the download runs.
pub fn format_selector(selection: &Selection) -> String {
    match selection {
        Selection::AudioOnly { audio } => {
            format!("bestaudio[abr>={}]", audio.abr.unwrap_or(0.0))
        }
        Selection::VideoAudio { height, codec, abr } => format!(
            "bestvideo[height={}][vcodec^={}]+bestaudio[abr>={}]/best",
            height,
            codec.prefix(),
            abr
        ),
    }
}

/// Make a title safe to use as a file name on the destination filesystem.
///
/// Path separators become `_` and the result is capped at [`MAX_TITLE_LEN`]
/// characters.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .take(MAX_TITLE_LEN)
        .collect();

    if cleaned.trim().is_empty() {
        "download".to_string()
    } else {
        cleaned
    }
}

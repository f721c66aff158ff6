//! Data structures for media information
//!
//! yt-dlp's JSON is deserialized into the `Raw*` shapes first and converted into
//! the immutable [`MediaInfo`] / [`Track`] model the rest of the crate works on.

use crate::selection::{CodecFamily, TrackSelector};
use serde::{Deserialize, Serialize};

/// What a track carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    VideoOnly,
    AudioOnly,
    Muxed,
}

/// One selectable encoded stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub format_id: String,
    /// Video codec for video and muxed tracks, audio codec for audio-only tracks
    pub codec: String,
    pub kind: TrackKind,
    pub height: Option<u32>,
    /// Average audio bitrate (kbps)
    pub abr: Option<f64>,
    /// Exact size when known, approximate otherwise
    pub filesize: Option<u64>,
    pub language: Option<String>,
}

/// Resolved metadata for one URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub id: String,
    pub title: String,
    pub url: String,
    pub duration: Option<u64>,
    pub uploader: Option<String>,
    pub view_count: Option<u64>,
    pub thumbnail: Option<String>,
    /// Original audio language, used to avoid picking dubbed audio
    pub language: Option<String>,
    pub tracks: Vec<Track>,
}

/// A resolution the single-item flow can offer
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionOption {
    pub height: u32,
    pub codec: CodecFamily,
    pub filesize: Option<u64>,
}

/// Flat playlist resolution result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistInfo {
    pub title: String,
    pub uploader: Option<String>,
    pub entries: Vec<PlaylistEntry>,
}

/// One playlist entry; entries are not resolved any deeper at this stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    /// 1-based position in the playlist
    pub index: usize,
    pub url: Option<String>,
    pub title: Option<String>,
}

/// Progress callback payload from the download collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    Downloading {
        downloaded_bytes: Option<u64>,
        total_bytes: Option<u64>,
        /// bytes per second
        speed: Option<f64>,
        /// seconds
        eta: Option<u64>,
    },
    /// A stream finished transferring; merging/conversion follows
    Finished,
}

impl MediaInfo {
    /// "By: uploader | Views: 1,234 | Duration: 3:07"
    pub fn summary(&self) -> String {
        let duration = self.duration.unwrap_or(0);
        format!(
            "By: {} | Views: {} | Duration: {}:{:02}",
            self.uploader.as_deref().unwrap_or("Unknown"),
            group_thousands(self.view_count.unwrap_or(0)),
            duration / 60,
            duration % 60
        )
    }

    /// Distinct selectable heights, highest first
    pub fn resolution_options(&self) -> Vec<ResolutionOption> {
        let mut heights: Vec<u32> = self
            .tracks
            .iter()
            .filter(|t| t.kind == TrackKind::VideoOnly)
            .filter_map(|t| t.height)
            .collect();
        heights.sort_unstable_by(|a, b| b.cmp(a));
        heights.dedup();

        heights
            .into_iter()
            .filter_map(|height| {
                let track = TrackSelector::select_video_at(&self.tracks, height)?;
                Some(ResolutionOption {
                    height,
                    codec: CodecFamily::of(&track.codec)?,
                    filesize: track.filesize,
                })
            })
            .collect()
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ============================================================
// yt-dlp JSON shapes
// ============================================================

#[derive(Debug, Deserialize)]
pub(crate) struct RawInfo {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub webpage_url: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawFormat {
    pub format_id: String,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub abr: Option<f64>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub filesize_approx: Option<f64>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPlaylist {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub entries: Option<Vec<Option<RawEntry>>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawEntry {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

fn codec_present(codec: &Option<String>) -> Option<&str> {
    codec
        .as_deref()
        .filter(|c| !c.is_empty() && *c != "none")
}

impl RawFormat {
    /// Storyboards and other formats without any codec are not tracks
    pub(crate) fn into_track(self) -> Option<Track> {
        let vcodec = codec_present(&self.vcodec).map(str::to_string);
        let acodec = codec_present(&self.acodec).map(str::to_string);
        let (kind, codec) = match (vcodec, acodec) {
            (Some(v), Some(_)) => (TrackKind::Muxed, v),
            (Some(v), None) => (TrackKind::VideoOnly, v),
            (None, Some(a)) => (TrackKind::AudioOnly, a),
            (None, None) => return None,
        };

        Some(Track {
            format_id: self.format_id,
            codec,
            kind,
            height: self.height,
            abr: self.abr,
            filesize: self
                .filesize
                .or_else(|| self.filesize_approx.map(|s| s.max(0.0) as u64)),
            language: self.language,
        })
    }
}

impl RawInfo {
    pub(crate) fn into_media_info(self, requested_url: &str) -> MediaInfo {
        MediaInfo {
            title: self.title.unwrap_or_else(|| "Untitled Video".to_string()),
            url: self.webpage_url.unwrap_or_else(|| requested_url.to_string()),
            duration: self.duration.map(|d| d.max(0.0) as u64),
            uploader: self.uploader,
            view_count: self.view_count,
            thumbnail: self.thumbnail.filter(|t| !t.is_empty()),
            language: self.language,
            tracks: self
                .formats
                .into_iter()
                .filter_map(RawFormat::into_track)
                .collect(),
            id: self.id,
        }
    }
}

impl RawPlaylist {
    /// `None` when yt-dlp returned no entry list at all
    pub(crate) fn into_playlist_info(self) -> Option<PlaylistInfo> {
        let entries = self.entries?;
        Some(PlaylistInfo {
            title: self.title.unwrap_or_else(|| "Untitled Playlist".to_string()),
            uploader: self.uploader,
            entries: entries
                .into_iter()
                .enumerate()
                .map(|(i, entry)| {
                    let (url, title) = entry.map(|e| (e.url, e.title)).unwrap_or((None, None));
                    PlaylistEntry {
                        index: i + 1,
                        url,
                        title,
                    }
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_INFO: &str = r#"{
        "id": "abc123",
        "title": "Sample",
        "webpage_url": "https://www.youtube.com/watch?v=abc123",
        "duration": 187.0,
        "uploader": "Someone",
        "view_count": 1234567,
        "thumbnail": "https://i.ytimg.com/vi/abc123/hqdefault.jpg",
        "language": "en",
        "formats": [
            {"format_id": "sb0", "vcodec": "none", "acodec": "none"},
            {"format_id": "140", "vcodec": "none", "acodec": "mp4a.40.2", "abr": 129.5, "filesize": 3000000, "language": "en"},
            {"format_id": "137", "vcodec": "avc1.640028", "acodec": "none", "height": 1080, "filesize_approx": 52000000.0},
            {"format_id": "248", "vcodec": "vp09.00.40.08", "acodec": "none", "height": 1080},
            {"format_id": "18", "vcodec": "avc1.42001E", "acodec": "mp4a.40.2", "height": 360}
        ]
    }"#;

    fn sample() -> MediaInfo {
        let raw: RawInfo = serde_json::from_str(SAMPLE_INFO).unwrap();
        raw.into_media_info("https://youtu.be/abc123")
    }

    #[test]
    fn test_raw_info_conversion() {
        let info = sample();
        assert_eq!(info.id, "abc123");
        assert_eq!(info.duration, Some(187));
        assert_eq!(info.language.as_deref(), Some("en"));
        // storyboard dropped
        assert_eq!(info.tracks.len(), 4);
    }

    #[test]
    fn test_track_kinds_and_sizes() {
        let info = sample();
        let audio = &info.tracks[0];
        assert_eq!(audio.kind, TrackKind::AudioOnly);
        assert_eq!(audio.codec, "mp4a.40.2");
        assert_eq!(audio.filesize, Some(3_000_000));

        let video = &info.tracks[1];
        assert_eq!(video.kind, TrackKind::VideoOnly);
        assert_eq!(video.filesize, Some(52_000_000));

        assert_eq!(info.tracks[3].kind, TrackKind::Muxed);
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(
            sample().summary(),
            "By: Someone | Views: 1,234,567 | Duration: 3:07"
        );
    }

    #[test]
    fn test_resolution_options_prefer_avc1() {
        let options = sample().resolution_options();
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].height, 1080);
        assert_eq!(options[0].codec, CodecFamily::Avc1);
        assert_eq!(options[0].filesize, Some(52_000_000));
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(12345678), "12,345,678");
    }

    #[test]
    fn test_missing_fields_fall_back() {
        let raw: RawInfo = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        let info = raw.into_media_info("https://example.com/x");
        assert_eq!(info.title, "Untitled Video");
        assert_eq!(info.url, "https://example.com/x");
        assert!(info.tracks.is_empty());
    }

    #[test]
    fn test_playlist_with_null_entries_keeps_indices() {
        let raw: RawPlaylist = serde_json::from_str(
            r#"{"title": "Mix", "entries": [{"url": "https://a"}, null, {"url": "https://c", "title": "C"}]}"#,
        )
        .unwrap();
        let playlist = raw.into_playlist_info().unwrap();
        assert_eq!(playlist.entries.len(), 3);
        assert_eq!(playlist.entries[1].index, 2);
        assert!(playlist.entries[1].url.is_none());
        assert_eq!(playlist.entries[2].title.as_deref(), Some("C"));
    }

    #[test]
    fn test_playlist_without_entries_is_none() {
        let raw: RawPlaylist = serde_json::from_str(r#"{"title": "Video"}"#).unwrap();
        assert!(raw.into_playlist_info().is_none());
    }
}

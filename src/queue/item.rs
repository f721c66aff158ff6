//! Queued download requests

use crate::extractor::{MediaInfo, Track};
use crate::selection::CodecFamily;
use crate::utils::error::TubeQueueError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The track choice stored with a queued item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Selection {
    /// Best audio only, converted to mp3
    AudioOnly { audio: Track },
    /// Video at a fixed height and codec family plus audio of at least `abr`
    VideoAudio {
        height: u32,
        codec: CodecFamily,
        abr: f64,
    },
}

/// A download request with its track selection already decided.
///
/// Items are immutable once built; the queue reorders and removes them but
/// never edits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    id: Uuid,
    url: String,
    title: String,
    media_id: String,
    thumbnail: Option<String>,
    selection: Selection,
    estimated_size: Option<u64>,
    added_at: DateTime<Utc>,
}

impl QueueItem {
    /// Audio-only item from a track of `info`
    pub fn audio_only(info: &MediaInfo, audio: &Track) -> Self {
        Self::build(
            info,
            Selection::AudioOnly {
                audio: audio.clone(),
            },
            audio.filesize,
        )
    }

    /// Video + audio item from two tracks of `info`.
    ///
    /// Fails when the video track has no height or is not of a known codec family.
    pub fn video_audio(info: &MediaInfo, video: &Track, audio: &Track) -> Result<Self, TubeQueueError> {
        let height = video.height.ok_or(TubeQueueError::Selection("video"))?;
        let codec = CodecFamily::of(&video.codec).ok_or(TubeQueueError::Selection("video"))?;

        let estimated_size = match (video.filesize, audio.filesize) {
            (None, None) => None,
            (v, a) => Some(v.unwrap_or(0) + a.unwrap_or(0)),
        };

        Ok(Self::build(
            info,
            Selection::VideoAudio {
                height,
                codec,
                abr: audio.abr.unwrap_or(0.0),
            },
            estimated_size,
        ))
    }

    fn build(info: &MediaInfo, selection: Selection, estimated_size: Option<u64>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: info.url.clone(),
            title: info.title.clone(),
            media_id: info.id.clone(),
            thumbnail: info.thumbnail.clone(),
            selection,
            estimated_size,
            added_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Stable media id, also the thumbnail cache key
    pub fn media_id(&self) -> &str {
        &self.media_id
    }

    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail.as_deref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_audio_only(&self) -> bool {
        matches!(self.selection, Selection::AudioOnly { .. })
    }

    /// Combined size of the selected tracks, when any of them reported one
    pub fn estimated_size(&self) -> Option<u64> {
        self.estimated_size
    }

    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    /// Title as shown in queue listings
    pub fn display_title(&self) -> String {
        if self.is_audio_only() {
            format!("{} (Audio Only)", self.title)
        } else {
            self.title.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::TrackKind;

    fn info() -> MediaInfo {
        MediaInfo {
            id: "vid123".into(),
            title: "Sample Video".into(),
            url: "https://example.com/watch?v=vid123".into(),
            duration: Some(60),
            uploader: None,
            view_count: None,
            thumbnail: Some("https://example.com/t.jpg".into()),
            language: None,
            tracks: Vec::new(),
        }
    }

    fn track(codec: &str, kind: TrackKind, height: Option<u32>, abr: Option<f64>, size: Option<u64>) -> Track {
        Track {
            format_id: "f".into(),
            codec: codec.into(),
            kind,
            height,
            abr,
            filesize: size,
            language: None,
        }
    }

    #[test]
    fn test_video_audio_item() {
        let video = track("avc1.4d401f", TrackKind::VideoOnly, Some(720), None, Some(1000));
        let audio = track("mp4a.40.2", TrackKind::AudioOnly, None, Some(128.0), None);
        let item = QueueItem::video_audio(&info(), &video, &audio).unwrap();

        assert_eq!(
            item.selection(),
            &Selection::VideoAudio {
                height: 720,
                codec: CodecFamily::Avc1,
                abr: 128.0
            }
        );
        assert_eq!(item.estimated_size(), Some(1000));
        assert_eq!(item.display_title(), "Sample Video");
        assert_eq!(item.media_id(), "vid123");
    }

    #[test]
    fn test_audio_only_item() {
        let audio = track("mp4a.40.2", TrackKind::AudioOnly, None, Some(128.0), Some(500));
        let item = QueueItem::audio_only(&info(), &audio);
        assert!(item.is_audio_only());
        assert_eq!(item.estimated_size(), Some(500));
        assert_eq!(item.display_title(), "Sample Video (Audio Only)");
    }

    #[test]
    fn test_unknown_sizes_stay_unknown() {
        let video = track("vp09.00.40.08", TrackKind::VideoOnly, Some(1080), None, None);
        let audio = track("aac", TrackKind::AudioOnly, None, None, None);
        let item = QueueItem::video_audio(&info(), &video, &audio).unwrap();
        assert_eq!(item.estimated_size(), None);
    }

    #[test]
    fn test_video_without_family_is_rejected() {
        let video = track("av01.0.08M.08", TrackKind::VideoOnly, Some(1080), None, None);
        let audio = track("aac", TrackKind::AudioOnly, None, Some(96.0), None);
        assert!(matches!(
            QueueItem::video_audio(&info(), &video, &audio),
            Err(TubeQueueError::Selection("video"))
        ));
    }

    #[test]
    fn test_items_get_distinct_ids() {
        let audio = track("aac", TrackKind::AudioOnly, None, Some(96.0), None);
        let a = QueueItem::audio_only(&info(), &audio);
        let b = QueueItem::audio_only(&info(), &audio);
        assert_ne!(a.id(), b.id());
    }
}

//! Best video/audio track selection
//!
//! Video: H.264 (`avc1`) is preferred for compatibility, VP9 (`vp09`) is the
//! fallback, and the highest resolution wins inside the chosen family.
//! Audio: AAC only, original language first when known, highest `abr` wins.
//!
//! Ties always go to the track that appears first in the input.

use crate::extractor::{MediaInfo, Track, TrackKind};
use crate::utils::error::TubeQueueError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Audio codecs accepted for the audio half of a download
pub const AAC_CODECS: [&str; 3] = ["mp4a.40.2", "mp4a.40.5", "aac"];

/// Video codec families in preference order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodecFamily {
    Avc1,
    Vp9,
}

impl CodecFamily {
    pub const PREFERENCE: [CodecFamily; 2] = [CodecFamily::Avc1, CodecFamily::Vp9];

    /// Codec string prefix identifying the family
    pub fn prefix(&self) -> &'static str {
        match self {
            CodecFamily::Avc1 => "avc1",
            CodecFamily::Vp9 => "vp09",
        }
    }

    pub fn of(codec: &str) -> Option<CodecFamily> {
        Self::PREFERENCE
            .into_iter()
            .find(|family| codec.starts_with(family.prefix()))
    }

    pub fn label(&self) -> &'static str {
        match self {
            CodecFamily::Avc1 => "H.264",
            CodecFamily::Vp9 => "VP9",
        }
    }
}

/// The single implementation of track selection used by every flow
pub struct TrackSelector;

impl TrackSelector {
    /// Highest video-only track of the preferred codec family
    pub fn select_video(tracks: &[Track]) -> Option<&Track> {
        CodecFamily::PREFERENCE.into_iter().find_map(|family| {
            first_max_by(video_tracks(tracks, family), |a, b| a.height.cmp(&b.height))
        })
    }

    /// Video-only track at exactly `height`, same family preference
    pub fn select_video_at(tracks: &[Track], height: u32) -> Option<&Track> {
        CodecFamily::PREFERENCE.into_iter().find_map(|family| {
            video_tracks(tracks, family).find(|t| t.height == Some(height))
        })
    }

    /// Highest-bitrate AAC track, restricted to `preferred_language` when that matches anything
    pub fn select_audio<'a>(
        tracks: &'a [Track],
        preferred_language: Option<&str>,
    ) -> Option<&'a Track> {
        if let Some(lang) = preferred_language {
            let in_language = aac_tracks(tracks).filter(|t| t.language.as_deref() == Some(lang));
            if let Some(best) = first_max_by(in_language, compare_abr) {
                return Some(best);
            }
        }
        first_max_by(aac_tracks(tracks), compare_abr)
    }

    /// Best video and audio for an item, using the item's original language hint
    pub fn select_pair(info: &MediaInfo) -> Result<(&Track, &Track), TubeQueueError> {
        let video =
            Self::select_video(&info.tracks).ok_or(TubeQueueError::Selection("video"))?;
        let audio = Self::select_audio(&info.tracks, info.language.as_deref())
            .ok_or(TubeQueueError::Selection("audio"))?;
        Ok((video, audio))
    }
}

fn video_tracks(tracks: &[Track], family: CodecFamily) -> impl Iterator<Item = &Track> {
    tracks.iter().filter(move |t| {
        t.kind == TrackKind::VideoOnly
            && t.height.is_some()
            && t.codec.starts_with(family.prefix())
    })
}

fn aac_tracks(tracks: &[Track]) -> impl Iterator<Item = &Track> {
    tracks.iter().filter(|t| {
        t.kind == TrackKind::AudioOnly && AAC_CODECS.iter().any(|c| t.codec.starts_with(c))
    })
}

fn compare_abr(a: &Track, b: &Track) -> Ordering {
    a.abr.unwrap_or(0.0).total_cmp(&b.abr.unwrap_or(0.0))
}

/// Like `Iterator::max_by` but keeps the first of equal elements
fn first_max_by<'a, I, F>(iter: I, mut compare: F) -> Option<&'a Track>
where
    I: Iterator<Item = &'a Track>,
    F: FnMut(&Track, &Track) -> Ordering,
{
    iter.fold(None, |best, candidate| match best {
        Some(current) if compare(candidate, current) != Ordering::Greater => Some(current),
        _ => Some(candidate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str, codec: &str, height: u32) -> Track {
        Track {
            format_id: id.into(),
            codec: codec.into(),
            kind: TrackKind::VideoOnly,
            height: Some(height),
            abr: None,
            filesize: None,
            language: None,
        }
    }

    fn audio(id: &str, codec: &str, abr: f64, lang: Option<&str>) -> Track {
        Track {
            format_id: id.into(),
            codec: codec.into(),
            kind: TrackKind::AudioOnly,
            height: None,
            abr: Some(abr),
            filesize: None,
            language: lang.map(str::to_string),
        }
    }

    // ============================================================
    // VIDEO SELECTION
    // ============================================================

    #[test]
    fn test_family_preference_beats_height() {
        let tracks = vec![
            video("134", "avc1.4d401e", 360),
            video("136", "avc1.4d401f", 720),
            video("248", "vp09.00.40.08", 1080),
        ];
        let best = TrackSelector::select_video(&tracks).unwrap();
        assert_eq!(best.format_id, "136");
    }

    #[test]
    fn test_vp9_fallback_picks_highest() {
        let tracks = vec![video("244", "vp09.00.30.08", 480), video("248", "vp09.00.40.08", 1080)];
        assert_eq!(TrackSelector::select_video(&tracks).unwrap().format_id, "248");
    }

    #[test]
    fn test_no_video_only_tracks() {
        let mut muxed = video("18", "avc1.42001E", 360);
        muxed.kind = TrackKind::Muxed;
        let tracks = vec![muxed, audio("140", "mp4a.40.2", 128.0, None)];
        assert!(TrackSelector::select_video(&tracks).is_none());
    }

    #[test]
    fn test_unknown_height_is_ignored() {
        let mut no_height = video("x", "avc1.640028", 0);
        no_height.height = None;
        let tracks = vec![no_height, video("y", "vp09.00.40.08", 720)];
        assert_eq!(TrackSelector::select_video(&tracks).unwrap().format_id, "y");
    }

    #[test]
    fn test_other_codecs_are_never_chosen() {
        let tracks = vec![video("399", "av01.0.08M.08", 1080)];
        assert!(TrackSelector::select_video(&tracks).is_none());
    }

    #[test]
    fn test_video_tie_goes_to_first() {
        let tracks = vec![video("a", "avc1.64001F", 720), video("b", "avc1.4d401f", 720)];
        assert_eq!(TrackSelector::select_video(&tracks).unwrap().format_id, "a");
    }

    #[test]
    fn test_select_video_at_height() {
        let tracks = vec![
            video("248", "vp09.00.40.08", 1080),
            video("136", "avc1.4d401f", 720),
            video("247", "vp09.00.31.08", 720),
        ];
        assert_eq!(TrackSelector::select_video_at(&tracks, 720).unwrap().format_id, "136");
        assert_eq!(TrackSelector::select_video_at(&tracks, 1080).unwrap().format_id, "248");
        assert!(TrackSelector::select_video_at(&tracks, 480).is_none());
    }

    // ============================================================
    // AUDIO SELECTION
    // ============================================================

    #[test]
    fn test_language_match_beats_bitrate() {
        let tracks = vec![
            audio("en", "mp4a.40.2", 128.0, Some("en")),
            audio("es", "mp4a.40.2", 160.0, Some("es")),
        ];
        let best = TrackSelector::select_audio(&tracks, Some("en")).unwrap();
        assert_eq!(best.format_id, "en");
    }

    #[test]
    fn test_unmatched_language_falls_back_to_best() {
        let tracks = vec![
            audio("en", "mp4a.40.2", 128.0, Some("en")),
            audio("es", "mp4a.40.2", 160.0, Some("es")),
        ];
        let best = TrackSelector::select_audio(&tracks, Some("fr")).unwrap();
        assert_eq!(best.format_id, "es");
        assert_eq!(best.abr, Some(160.0));
    }

    #[test]
    fn test_no_language_picks_best_abr() {
        let tracks = vec![
            audio("139", "mp4a.40.5", 48.0, None),
            audio("140", "mp4a.40.2", 129.0, None),
        ];
        assert_eq!(TrackSelector::select_audio(&tracks, None).unwrap().format_id, "140");
    }

    #[test]
    fn test_non_aac_audio_is_ignored() {
        let tracks = vec![audio("251", "opus", 160.0, Some("en"))];
        assert!(TrackSelector::select_audio(&tracks, Some("en")).is_none());
        assert!(TrackSelector::select_audio(&tracks, None).is_none());
    }

    #[test]
    fn test_missing_abr_ranks_lowest() {
        let mut unknown = audio("a", "aac", 0.0, None);
        unknown.abr = None;
        let tracks = vec![unknown, audio("b", "mp4a.40.2", 64.0, None)];
        assert_eq!(TrackSelector::select_audio(&tracks, None).unwrap().format_id, "b");
    }

    #[test]
    fn test_audio_tie_goes_to_first() {
        let tracks = vec![
            audio("first", "mp4a.40.2", 128.0, None),
            audio("second", "mp4a.40.2", 128.0, None),
        ];
        assert_eq!(TrackSelector::select_audio(&tracks, None).unwrap().format_id, "first");
    }

    // ============================================================
    // CODEC FAMILY
    // ============================================================

    #[test]
    fn test_codec_family_of() {
        assert_eq!(CodecFamily::of("avc1.640028"), Some(CodecFamily::Avc1));
        assert_eq!(CodecFamily::of("vp09.00.51.08"), Some(CodecFamily::Vp9));
        assert_eq!(CodecFamily::of("av01.0.05M.08"), None);
    }
}

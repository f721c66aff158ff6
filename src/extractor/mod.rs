pub mod models;
pub mod options;
pub mod traits;
pub mod ytdlp;

pub use models::{
    MediaInfo, PlaylistEntry, PlaylistInfo, ResolutionOption, Track, TrackKind, TransferEvent,
};
pub use options::ExtractorOptions;
pub use traits::Extractor;
pub use ytdlp::YtDlpExtractor;

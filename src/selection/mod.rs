//! Format and index selection heuristics

pub mod range;
pub mod tracks;

pub use range::{parse_selection, require_selection};
pub use tracks::{CodecFamily, TrackSelector, AAC_CODECS};

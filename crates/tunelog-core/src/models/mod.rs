//! Data models for Tunelog

mod play;
mod signature;
mod watermark;

pub use play::{NormalizedPlay, PlayEvent, RawPlayEvent};
pub use signature::{EntrySignature, PlaySpan};
pub use watermark::Watermark;

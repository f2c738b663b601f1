//! Incremental reconciliation of fetched plays with a stored day document.
//!
//! Everything in here is pure: plays go in, document text comes out.

mod document;
mod filter;
mod format;
pub mod grammar;
mod merge;
mod normalize;

pub use document::LogDocument;
pub use filter::{plays_on_date, select_new_plays};
pub use format::{group_plays, render_entries, PlayGroup, RenderedEntry};
pub use merge::{merge_entries, MergedDocument};
pub use normalize::{normalize_event, normalize_events};

//! Duplicate-free merge of rendered entries into an existing day document.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};

use super::document::LogDocument;
use super::format::RenderedEntry;
use super::grammar;
use crate::models::{EntrySignature, Watermark};

/// Result of merging one batch into a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedDocument {
    /// Full document text, ready to persist
    pub content: String,
    pub appended: usize,
    pub duplicates: usize,
    pub watermark: Watermark,
}

/// Merge `entries` into `existing` for `date`.
///
/// Entries whose signature is already present in the body are dropped. The
/// watermark advances to `newest_considered` even when every entry was a
/// duplicate, so the same plays are not inspected again on the next run.
#[must_use]
pub fn merge_entries(
    existing: Option<&LogDocument>,
    date: NaiveDate,
    entries: &[RenderedEntry],
    newest_considered: DateTime<Utc>,
) -> MergedDocument {
    let empty = LogDocument::default();
    let existing = existing.unwrap_or(&empty);

    let parsed = existing.entry_signatures();
    if parsed.malformed > 0 {
        tracing::warn!(
            "{} malformed entries in {} document were left untouched",
            parsed.malformed,
            date
        );
    }
    let mut seen: HashSet<EntrySignature> = parsed.signatures.into_iter().collect();

    let mut appended_text = String::new();
    let mut appended = 0;
    let mut duplicates = 0;
    for entry in entries {
        if seen.insert(entry.signature.clone()) {
            appended_text.push_str(&entry.text);
            appended += 1;
        } else {
            tracing::debug!("Skipping duplicate entry {}", entry.signature);
            duplicates += 1;
        }
    }

    let watermark = Watermark::advance(existing.last_synced, newest_considered);
    let metadata = LogDocument {
        last_synced: Some(watermark),
        ..existing.clone()
    }
    .metadata_fields(date);

    let mut content = grammar::render_front_matter(&metadata);
    content.push('\n');
    if !existing.has_day_header(date) {
        content.push_str(&grammar::day_header(date));
        content.push_str("\n\n");
    }
    if !existing.body.is_empty() {
        content.push_str(&existing.body);
        if !existing.body.ends_with('\n') {
            content.push('\n');
        }
    }
    content.push_str(&appended_text);

    MergedDocument {
        content,
        appended,
        duplicates,
        watermark,
    }
}

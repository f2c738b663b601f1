//! Parsed form of a stored day document.

use chrono::NaiveDate;
use chrono_tz::Tz;

use super::grammar::{
    self, ParsedEntries, KEY_DATE, KEY_LAST_SYNCED, KEY_SOURCE, KEY_TYPE, SOURCE_TAG, TYPE_TAG,
};
use crate::models::Watermark;

/// A day document split into metadata and body.
///
/// Parsing never fails: unreadable metadata values are logged and dropped so a
/// damaged document degrades to "no watermark" instead of aborting the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogDocument {
    pub last_synced: Option<Watermark>,
    /// Metadata keys other than the standard four, in document order
    pub extra_metadata: Vec<(String, String)>,
    /// Everything after the metadata block, leading blank lines removed
    pub body: String,
}

impl LogDocument {
    #[must_use]
    pub fn parse(text: &str, timezone: Tz) -> Self {
        let (fields, body) = grammar::split_front_matter(text);
        let mut document = Self {
            body: body.to_string(),
            ..Self::default()
        };

        for (key, value) in fields.unwrap_or_default() {
            match key.as_str() {
                KEY_LAST_SYNCED => match Watermark::parse(&value, timezone) {
                    Ok(watermark) => document.last_synced = Some(watermark),
                    Err(error) => tracing::warn!("Ignoring stored watermark: {}", error),
                },
                KEY_DATE | KEY_SOURCE | KEY_TYPE => {}
                _ => document.extra_metadata.push((key, value)),
            }
        }

        document
    }

    /// Signatures of the entries already present in the body.
    #[must_use]
    pub fn entry_signatures(&self) -> ParsedEntries {
        grammar::parse_entries(&self.body)
    }

    #[must_use]
    pub fn has_day_header(&self, date: NaiveDate) -> bool {
        grammar::has_day_header(&self.body, date)
    }

    /// Metadata fields for a rebuilt document, standard keys first.
    #[must_use]
    pub fn metadata_fields(&self, date: NaiveDate) -> Vec<(String, String)> {
        let mut fields = vec![
            (KEY_DATE.to_string(), date.to_string()),
            (KEY_SOURCE.to_string(), SOURCE_TAG.to_string()),
            (KEY_TYPE.to_string(), TYPE_TAG.to_string()),
        ];
        if let Some(watermark) = self.last_synced {
            fields.push((KEY_LAST_SYNCED.to_string(), watermark.to_string()));
        }
        fields.extend(self.extra_metadata.iter().cloned());
        fields
    }
}

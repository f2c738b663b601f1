//! Play event models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Separator used whenever an ordered artist list is flattened to text.
pub const ARTIST_SEPARATOR: &str = ", ";

/// A play event as delivered by a history source, timestamp not yet parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPlayEvent {
    /// Track title
    pub track_name: String,
    /// Credited artists, in source order
    pub artist_names: Vec<String>,
    /// Absolute play time as an RFC 3339 string
    pub played_at: String,
}

/// A play event with a parsed UTC instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayEvent {
    pub track_name: String,
    pub artist_names: Vec<String>,
    pub played_at_utc: DateTime<Utc>,
}

impl PlayEvent {
    /// Artist names joined in their original order.
    #[must_use]
    pub fn artists_label(&self) -> String {
        self.artist_names.join(ARTIST_SEPARATOR)
    }
}

/// A play event projected into the reference timezone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPlay {
    pub event: PlayEvent,
    /// Calendar day of the play in the reference timezone
    pub local_date: NaiveDate,
    /// Wall-clock time of the play in the reference timezone, `HH:MM`
    pub local_time: String,
}

impl NormalizedPlay {
    #[must_use]
    pub const fn played_at_utc(&self) -> DateTime<Utc> {
        self.event.played_at_utc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artists_label_keeps_source_order() {
        let event = PlayEvent {
            track_name: "Windowlicker".to_string(),
            artist_names: vec!["Zed".to_string(), "Aphex Twin".to_string()],
            played_at_utc: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
        };
        assert_eq!(event.artists_label(), "Zed, Aphex Twin");
    }

    #[test]
    fn raw_play_event_deserializes_from_json() {
        let raw: RawPlayEvent = serde_json::from_str(
            r#"{"track_name":"A","artist_names":["X"],"played_at":"2024-05-01T08:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(raw.artist_names, vec!["X"]);
    }
}

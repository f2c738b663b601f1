//! Projection of raw play events into the reference timezone.

use chrono::{DateTime, SubsecRound, Utc};
use chrono_tz::Tz;

use crate::models::{NormalizedPlay, PlayEvent, RawPlayEvent};
use crate::{Error, Result};

/// Parse a raw play event and derive its local date and `HH:MM` time.
///
/// Track and artist names are collapsed onto a single line with single spaces,
/// which is the only form an entry header can carry. The instant is truncated
/// to milliseconds, the precision a stored watermark keeps.
pub fn normalize_event(raw: &RawPlayEvent, timezone: Tz) -> Result<NormalizedPlay> {
    let played_at_utc = DateTime::parse_from_rfc3339(raw.played_at.trim())
        .map_err(|error| {
            Error::Parse(format!(
                "unparseable played_at '{}' for '{}': {error}",
                raw.played_at, raw.track_name
            ))
        })?
        .with_timezone(&Utc)
        .trunc_subsecs(3);

    let local = played_at_utc.with_timezone(&timezone);

    Ok(NormalizedPlay {
        event: PlayEvent {
            track_name: canonical_name(&raw.track_name),
            artist_names: raw
                .artist_names
                .iter()
                .map(|artist| canonical_name(artist))
                .collect(),
            played_at_utc,
        },
        local_date: local.date_naive(),
        local_time: local.format("%H:%M").to_string(),
    })
}

fn canonical_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a batch, dropping (and logging) events whose timestamp cannot be parsed.
pub fn normalize_events(raw_events: &[RawPlayEvent], timezone: Tz) -> Vec<NormalizedPlay> {
    raw_events
        .iter()
        .filter_map(|raw| match normalize_event(raw, timezone) {
            Ok(play) => Some(play),
            Err(error) => {
                tracing::warn!("Dropping play event: {}", error);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use chrono_tz::America::New_York;
    use chrono_tz::Europe::Budapest;

    use super::*;

    fn raw(track: &str, played_at: &str) -> RawPlayEvent {
        RawPlayEvent {
            track_name: track.to_string(),
            artist_names: vec!["Artist".to_string()],
            played_at: played_at.to_string(),
        }
    }

    #[test]
    fn projects_into_reference_timezone() {
        let play = normalize_event(&raw("A", "2024-05-01T22:30:00.123Z"), Budapest).unwrap();
        assert_eq!(play.local_date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(play.local_time, "00:30");
        assert_eq!(
            play.played_at_utc().to_rfc3339(),
            "2024-05-01T22:30:00.123+00:00"
        );
    }

    #[test]
    fn sub_millisecond_precision_is_dropped() {
        let play = normalize_event(&raw("A", "2024-05-01T08:00:00.123456789Z"), Budapest).unwrap();
        assert_eq!(
            play.played_at_utc().to_rfc3339(),
            "2024-05-01T08:00:00.123+00:00"
        );
    }

    #[test]
    fn timezone_is_configurable() {
        let play = normalize_event(&raw("A", "2024-05-01T02:30:00Z"), New_York).unwrap();
        assert_eq!(play.local_date, NaiveDate::from_ymd_opt(2024, 4, 30).unwrap());
        assert_eq!(play.local_time, "22:30");
    }

    #[test]
    fn names_are_collapsed_onto_one_line() {
        let event = RawPlayEvent {
            track_name: " Line1\r\nLine2 ".to_string(),
            artist_names: vec!["Artist ".to_string(), "\tOther  Band".to_string()],
            played_at: "2024-05-01T08:00:00Z".to_string(),
        };
        let play = normalize_event(&event, Budapest).unwrap();
        assert_eq!(play.event.track_name, "Line1 Line2");
        assert_eq!(play.event.artist_names, vec!["Artist", "Other Band"]);
    }

    #[test]
    fn unparseable_timestamps_are_dropped() {
        let plays = normalize_events(
            &[
                raw("good", "2024-05-01T08:00:00Z"),
                raw("bad", "not a time"),
                raw("also good", "2024-05-01T09:00:00+02:00"),
            ],
            Budapest,
        );
        let names: Vec<_> = plays
            .iter()
            .map(|play| play.event.track_name.as_str())
            .collect();
        assert_eq!(names, vec!["good", "also good"]);
    }
}

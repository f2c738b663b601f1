//! Last-synced watermark stored in document metadata

use std::fmt;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Serialize, Serializer};

use crate::{Error, Result};

/// Offset-less layouts written by older documents, read in the reference timezone.
const LEGACY_LOCAL_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Instant up to which plays have been inspected.
///
/// Rendered as UTC RFC 3339 with millisecond precision so the stored value is
/// sortable and free of offset ambiguity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Watermark(DateTime<Utc>);

impl Watermark {
    #[must_use]
    pub const fn new(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }

    #[must_use]
    pub const fn instant(&self) -> DateTime<Utc> {
        self.0
    }

    /// Parse a stored watermark.
    ///
    /// Any RFC 3339 offset is accepted. Values without an offset are taken as
    /// wall-clock time in `timezone`; inside a DST fold the earlier instant wins.
    pub fn parse(value: &str, timezone: Tz) -> Result<Self> {
        let value = value.trim();
        if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
            return Ok(Self(instant.with_timezone(&Utc)));
        }

        for format in LEGACY_LOCAL_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
                return timezone
                    .from_local_datetime(&naive)
                    .earliest()
                    .map(|local| Self(local.with_timezone(&Utc)))
                    .ok_or_else(|| {
                        Error::Parse(format!(
                            "watermark '{value}' does not exist in timezone {timezone}"
                        ))
                    });
            }
        }

        Err(Error::Parse(format!("unrecognised watermark '{value}'")))
    }

    /// Later of an optional previous watermark and a newly inspected instant.
    #[must_use]
    pub fn advance(previous: Option<Self>, inspected: DateTime<Utc>) -> Self {
        let candidate = Self(inspected);
        previous.map_or(candidate, |previous| previous.max(candidate))
    }
}

impl Serialize for Watermark {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl From<DateTime<Utc>> for Watermark {
    fn from(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }
}

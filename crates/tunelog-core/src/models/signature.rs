//! Entry signature model used for duplicate detection

use std::fmt;

/// Wall-clock span covered by one rendered entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlaySpan {
    /// A single play at `HH:MM`
    At(String),
    /// Several plays from the first to the last `HH:MM`
    Between { first: String, last: String },
}

impl fmt::Display for PlaySpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(time) => write!(f, "{time}"),
            Self::Between { first, last } => write!(f, "{first}..{last}"),
        }
    }
}

/// Identity of a rendered entry: two entries with equal signatures are duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntrySignature {
    pub track_name: String,
    /// Artist names already joined with the canonical separator
    pub artists: String,
    pub span: PlaySpan,
}

impl EntrySignature {
    #[must_use]
    pub fn new(track_name: impl Into<String>, artists: impl Into<String>, span: PlaySpan) -> Self {
        Self {
            track_name: track_name.into(),
            artists: artists.into(),
            span,
        }
    }
}

impl fmt::Display for EntrySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}__{}__{}", self.track_name, self.artists, self.span)
    }
}

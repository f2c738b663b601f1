//! Text grammar of a day document.
//!
//! Rendering and parsing live side by side so that every entry written by
//! [`render_entry`] is recognised by [`parse_entries`] with the same signature.
//!
//! ```text
//! ---
//! date: 2024-05-01
//! source: spotify
//! type: listening-history
//! lastSynced: 2024-05-01T08:30:00.000Z
//! ---
//!
//! # 🎧 Listening history for 2024-05-01
//!
//! - *“Track”* by Artist A, Artist B
//!   ⏱️ Played 2 times between 10:00 and 10:30
//! ```

use std::fmt::Write as _;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::models::{EntrySignature, PlaySpan};

pub const FRONT_MATTER_FENCE: &str = "---";
pub const KEY_DATE: &str = "date";
pub const KEY_SOURCE: &str = "source";
pub const KEY_TYPE: &str = "type";
pub const KEY_LAST_SYNCED: &str = "lastSynced";
pub const SOURCE_TAG: &str = "spotify";
pub const TYPE_TAG: &str = "listening-history";

static ENTRY_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^- \*“(?P<track>.*)”\* by (?P<artists>.*?)[ \t]*$").expect("Invalid regex")
});

// The count is optional so pre-grouping entries ("⏱️ Played at 10:00") still parse.
static ENTRY_DETAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[ \t]*(?:⏱\x{FE0F}?[ \t]*)?Played (?:\d+ times? )?(?:at (?P<at>\d{2}:\d{2})|between (?P<first>\d{2}:\d{2}) and (?P<last>\d{2}:\d{2}))[ \t]*$",
    )
    .expect("Invalid regex")
});

/// Render one entry, terminated by a newline.
#[must_use]
pub fn render_entry(signature: &EntrySignature, play_count: usize) -> String {
    let detail = match &signature.span {
        PlaySpan::At(time) => format!("Played {play_count} time at {time}"),
        PlaySpan::Between { first, last } => {
            format!("Played {play_count} times between {first} and {last}")
        }
    };
    format!(
        "- *“{}”* by {}  \n  ⏱️ {detail}\n",
        signature.track_name, signature.artists
    )
}

/// Signatures recovered from previously rendered text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEntries {
    pub signatures: Vec<EntrySignature>,
    /// Entry headers whose detail line could not be read
    pub malformed: usize,
}

/// Recover the signature of every entry in `body`.
///
/// Non-entry lines are ignored. An entry header without a readable detail line
/// is counted as malformed and skipped.
#[must_use]
pub fn parse_entries(body: &str) -> ParsedEntries {
    let mut parsed = ParsedEntries::default();
    let mut lines = body.lines().map(|line| line.trim_end_matches('\r')).peekable();

    while let Some(line) = lines.next() {
        let Some(header) = ENTRY_HEADER.captures(line) else {
            continue;
        };

        let span = lines.peek().and_then(|detail| parse_span(detail));
        let Some(span) = span else {
            tracing::warn!("Skipping malformed entry without play detail: {}", line);
            parsed.malformed += 1;
            continue;
        };
        lines.next();

        parsed.signatures.push(EntrySignature::new(
            &header["track"],
            &header["artists"],
            span,
        ));
    }

    parsed
}

fn parse_span(line: &str) -> Option<PlaySpan> {
    let captures = ENTRY_DETAIL.captures(line)?;
    if let Some(at) = captures.name("at") {
        return Some(PlaySpan::At(at.as_str().to_string()));
    }
    Some(PlaySpan::Between {
        first: captures.name("first")?.as_str().to_string(),
        last: captures.name("last")?.as_str().to_string(),
    })
}

/// Heading line placed once at the top of a day's body.
#[must_use]
pub fn day_header(date: NaiveDate) -> String {
    format!("# 🎧 Listening history for {date}")
}

/// Whether `body` already carries the heading for `date`.
#[must_use]
pub fn has_day_header(body: &str, date: NaiveDate) -> bool {
    let header = day_header(date);
    body.lines().any(|line| line.trim() == header)
}

/// Render the metadata block, terminated by a newline after the closing fence.
#[must_use]
pub fn render_front_matter(fields: &[(String, String)]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{FRONT_MATTER_FENCE}");
    for (key, value) in fields {
        let _ = writeln!(output, "{key}: {value}");
    }
    let _ = writeln!(output, "{FRONT_MATTER_FENCE}");
    output
}

/// Split a document into its metadata fields and body.
///
/// Returns `None` for the fields when the document has no (closed) metadata
/// block; the whole text is then body. Blank lines between the block and the
/// body are dropped.
#[must_use]
pub fn split_front_matter(text: &str) -> (Option<Vec<(String, String)>>, &str) {
    let mut offset = 0;
    let mut lines = text.split_inclusive('\n');

    match lines.next() {
        Some(first) if first.trim_end() == FRONT_MATTER_FENCE => offset += first.len(),
        _ => return (None, text),
    }

    let mut fields = Vec::new();
    for line in lines {
        offset += line.len();
        let trimmed = line.trim();
        if trimmed == FRONT_MATTER_FENCE {
            let body = text[offset..].trim_start_matches(['\n', '\r']);
            return (Some(fields), body);
        }
        if trimmed.is_empty() {
            continue;
        }
        match trimmed.split_once(':') {
            Some((key, value)) => fields.push((key.trim().to_string(), value.trim().to_string())),
            None => tracing::warn!("Ignoring malformed metadata line: {}", trimmed),
        }
    }

    tracing::warn!("Metadata block is not closed; treating document as plain body");
    (None, text)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn at(time: &str) -> PlaySpan {
        PlaySpan::At(time.to_string())
    }

    fn between(first: &str, last: &str) -> PlaySpan {
        PlaySpan::Between {
            first: first.to_string(),
            last: last.to_string(),
        }
    }

    #[test]
    fn renders_single_and_range_entries() {
        let single = EntrySignature::new("Song", "X, Y", at("10:00"));
        let range = EntrySignature::new("Other", "Z", between("10:00", "10:30"));

        assert_eq!(
            render_entry(&single, 1),
            "- *“Song”* by X, Y  \n  ⏱️ Played 1 time at 10:00\n"
        );
        assert_eq!(
            render_entry(&range, 3),
            "- *“Other”* by Z  \n  ⏱️ Played 3 times between 10:00 and 10:30\n"
        );
    }

    #[test]
    fn parse_recovers_rendered_signatures() {
        let signatures = vec![
            EntrySignature::new("Song", "X, Y", at("10:00")),
            EntrySignature::new("Other", "Z", between("10:00", "10:30")),
        ];
        let body = format!(
            "# 🎧 Listening history for 2024-05-01\n\n{}{}",
            render_entry(&signatures[0], 1),
            render_entry(&signatures[1], 2)
        );

        let parsed = parse_entries(&body);
        assert_eq!(parsed.signatures, signatures);
        assert_eq!(parsed.malformed, 0);
    }

    #[test]
    fn parse_accepts_legacy_entries() {
        let body = "- *“Old”* by Someone  \n  ⏱️ Played at 07:45\n";
        let parsed = parse_entries(body);
        assert_eq!(
            parsed.signatures,
            vec![EntrySignature::new("Old", "Someone", at("07:45"))]
        );
    }

    #[test]
    fn parse_keeps_quotes_inside_track_names() {
        let signature = EntrySignature::new("Say “Hi”", "Band", at("09:00"));
        let parsed = parse_entries(&render_entry(&signature, 1));
        assert_eq!(parsed.signatures, vec![signature]);
    }

    #[test]
    fn parse_counts_headers_without_detail() {
        let body = "- *“Broken”* by Nobody  \nsome unrelated note\n- *“Fine”* by A  \r\n  ⏱️ Played 1 time at 11:00\r\n";
        let parsed = parse_entries(body);
        assert_eq!(parsed.malformed, 1);
        assert_eq!(
            parsed.signatures,
            vec![EntrySignature::new("Fine", "A", at("11:00"))]
        );
    }

    #[test]
    fn split_front_matter_separates_fields_and_body() {
        let text = "---\ndate: 2024-05-01\nlastSynced: 2024-05-01T08:00:00.000Z\n---\n\n\nbody line\n";
        let (fields, body) = split_front_matter(text);
        assert_eq!(
            fields.unwrap(),
            vec![
                ("date".to_string(), "2024-05-01".to_string()),
                (
                    "lastSynced".to_string(),
                    "2024-05-01T08:00:00.000Z".to_string()
                ),
            ]
        );
        assert_eq!(body, "body line\n");
    }

    #[test]
    fn split_front_matter_without_block_returns_whole_text() {
        let (fields, body) = split_front_matter("just text\n");
        assert!(fields.is_none());
        assert_eq!(body, "just text\n");

        let (fields, body) = split_front_matter("---\ndate: 2024-05-01\n");
        assert!(fields.is_none());
        assert_eq!(body, "---\ndate: 2024-05-01\n");
    }

    #[test]
    fn front_matter_roundtrips() {
        let fields = vec![
            (KEY_DATE.to_string(), "2024-05-01".to_string()),
            (KEY_SOURCE.to_string(), SOURCE_TAG.to_string()),
        ];
        let rendered = render_front_matter(&fields);
        assert_eq!(rendered, "---\ndate: 2024-05-01\nsource: spotify\n---\n");
        assert_eq!(split_front_matter(&rendered).0.unwrap(), fields);
    }

    #[test]
    fn day_header_detection_ignores_surrounding_whitespace() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert!(has_day_header(
            "  # 🎧 Listening history for 2024-05-01  \n",
            date
        ));
        assert!(!has_day_header(
            "# 🎧 Listening history for 2024-05-02\n",
            date
        ));
    }
}

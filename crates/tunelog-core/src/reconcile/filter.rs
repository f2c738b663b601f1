//! Incremental selection of plays that belong in a day document.

use chrono::NaiveDate;

use crate::models::{NormalizedPlay, Watermark};

/// Plays that fall on `date` and are strictly newer than `watermark`.
///
/// Lazy and order-preserving. Instants are compared in UTC, which is the same
/// ordering as comparing them in the reference timezone but immune to offset
/// transitions.
pub fn select_new_plays<'a>(
    plays: &'a [NormalizedPlay],
    date: NaiveDate,
    watermark: Option<Watermark>,
) -> impl Iterator<Item = &'a NormalizedPlay> + 'a {
    plays.iter().filter(move |play| {
        play.local_date == date
            && watermark.is_none_or(|watermark| play.played_at_utc() > watermark.instant())
    })
}

/// Plays that fall on `date`, regardless of any watermark.
pub fn plays_on_date(plays: &[NormalizedPlay], date: NaiveDate) -> Vec<NormalizedPlay> {
    select_new_plays(plays, date, None).cloned().collect()
}

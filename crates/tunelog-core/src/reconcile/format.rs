//! Grouping of plays by track identity and deterministic entry rendering.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::grammar;
use crate::models::{EntrySignature, NormalizedPlay, PlaySpan};

/// All plays of one (track, artists) pair, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayGroup {
    pub track_name: String,
    pub artists: String,
    /// UTC instant and local `HH:MM` of each play
    pub plays: Vec<(DateTime<Utc>, String)>,
}

impl PlayGroup {
    #[must_use]
    pub fn signature(&self) -> EntrySignature {
        let first = self.plays.first().map(|(_, time)| time.clone()).unwrap_or_default();
        let span = if self.plays.len() > 1 {
            let last = self.plays.last().map(|(_, time)| time.clone()).unwrap_or_default();
            PlaySpan::Between { first, last }
        } else {
            PlaySpan::At(first)
        };
        EntrySignature::new(&self.track_name, &self.artists, span)
    }

    fn first_played(&self) -> Option<DateTime<Utc>> {
        self.plays.first().map(|(instant, _)| *instant)
    }
}

/// A rendered entry paired with the signature it will be recognised by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEntry {
    pub signature: EntrySignature,
    pub play_count: usize,
    pub text: String,
}

/// Group plays by track name and joined artist list.
///
/// Groups are ordered by their earliest play, then by track and artists, so the
/// result does not depend on input order or hash iteration.
pub fn group_plays<'a>(plays: impl IntoIterator<Item = &'a NormalizedPlay>) -> Vec<PlayGroup> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut groups: Vec<PlayGroup> = Vec::new();

    for play in plays {
        let key = (play.event.track_name.clone(), play.event.artists_label());
        let slot = *index.entry(key).or_insert_with_key(|(track_name, artists)| {
            groups.push(PlayGroup {
                track_name: track_name.clone(),
                artists: artists.clone(),
                plays: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot]
            .plays
            .push((play.played_at_utc(), play.local_time.clone()));
    }

    for group in &mut groups {
        group.plays.sort();
    }
    groups.sort_by(|left, right| {
        left.first_played()
            .cmp(&right.first_played())
            .then_with(|| left.track_name.cmp(&right.track_name))
            .then_with(|| left.artists.cmp(&right.artists))
    });
    groups
}

/// Group plays and render one entry per group.
pub fn render_entries<'a>(
    plays: impl IntoIterator<Item = &'a NormalizedPlay>,
) -> Vec<RenderedEntry> {
    group_plays(plays)
        .into_iter()
        .map(|group| {
            let signature = group.signature();
            let play_count = group.plays.len();
            RenderedEntry {
                text: grammar::render_entry(&signature, play_count),
                signature,
                play_count,
            }
        })
        .collect()
}

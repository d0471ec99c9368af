use chrono::{Duration, NaiveDateTime};

use crate::error::ArchiveError;
use crate::hot::index::{self, Sighting};
use crate::hot::snapshot::STAMP_FORMAT;

/// Days a title stays "the same topic" after it was last indexed.
pub const DEFAULT_WINDOW_DAYS: u64 = 7;

/// A parsed entry awaiting the keep-or-drop decision.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub title: &'a str,
    pub observed_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Fresh,
    Repeat,
}

/// Read seam over the durable index so the decision logic can be exercised
/// against a fake store.
pub trait TitleLookup {
    fn sightings(&self, title: &str) -> Result<Vec<Sighting>, ArchiveError>;
}

impl TitleLookup for rusqlite::Connection {
    fn sightings(&self, title: &str) -> Result<Vec<Sighting>, ArchiveError> {
        index::find_by_title(self, title)
    }
}

/// Decide whether a candidate is a fresh topic or a recent repeat.
///
/// Every stored sighting of the exact title is compared against the
/// candidate's observed time; a signed difference below `window` makes it
/// a repeat. A sighting later than the candidate gives a negative
/// difference, which also lands below the window and reads as a repeat.
/// A stored date that no longer parses is a fatal error, never a silent
/// accept.
pub fn decide(
    lookup: &impl TitleLookup,
    candidate: &Candidate<'_>,
    window: Duration,
) -> Result<Verdict, ArchiveError> {
    for sighting in lookup.sightings(candidate.title)? {
        let seen_at = NaiveDateTime::parse_from_str(&sighting.date, STAMP_FORMAT).map_err(
            |source| ArchiveError::MalformedRow {
                title: sighting.title.clone(),
                value: sighting.date.clone(),
                source,
            },
        )?;
        if candidate.observed_at - seen_at < window {
            return Ok(Verdict::Repeat);
        }
    }
    Ok(Verdict::Fresh)
}

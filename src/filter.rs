use crate::model::StreamingRecord;
use anyhow::{Context, Result};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use time::UtcOffset;

pub const MIN_LISTEN_MS: u64 = 30_000;
pub const MIN_PLAYS_FOR_SKIP_RANKING: u64 = 10;

/// Counts toward listening aggregates: named track, played at least 30s.
pub fn is_listenable(record: &StreamingRecord) -> bool {
    record.track_name().is_some() && record.ms_played >= MIN_LISTEN_MS
}

/// Counts toward skip statistics. No duration floor, since a skipped
/// track is usually a short play.
pub fn is_skip_qualifying(record: &StreamingRecord) -> bool {
    record.track_name().is_some()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum YearFilter {
    #[default]
    All,
    Year(i32),
}

impl YearFilter {
    pub fn label(self) -> String {
        match self {
            Self::All => String::from("All time"),
            Self::Year(year) => year.to_string(),
        }
    }
}

impl fmt::Display for YearFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Year(year) => write!(f, "{year}"),
        }
    }
}

impl FromStr for YearFilter {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        let year = trimmed
            .parse::<i32>()
            .with_context(|| format!("expected a year or \"all\", got {trimmed:?}"))?;
        Ok(Self::Year(year))
    }
}

/// Keeps the records of one calendar year as seen from `offset`. `All`
/// borrows the input as-is. Records with an unparsable timestamp never
/// match a specific year.
pub fn filter_by_year(
    records: &[StreamingRecord],
    year: YearFilter,
    offset: UtcOffset,
) -> Cow<'_, [StreamingRecord]> {
    let YearFilter::Year(wanted) = year else {
        return Cow::Borrowed(records);
    };

    Cow::Owned(
        records
            .iter()
            .filter(|record| {
                record
                    .played_at_in(offset)
                    .is_some_and(|at| at.year() == wanted)
            })
            .cloned()
            .collect(),
    )
}

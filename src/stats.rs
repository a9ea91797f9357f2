use crate::filter::{self, MIN_PLAYS_FOR_SKIP_RANKING, YearFilter, is_listenable};
use crate::model::{
    ArtistAggregate, ArtistSkips, DateRange, HourlyListening, MonthlyListening, OverviewStats,
    PlatformStats, SkipStats, StreamingRecord, TrackAggregate, TrackKey, YearlyStats,
};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use time::{OffsetDateTime, UtcOffset};

const MOST_SKIPPED_LIMIT: usize = 10;
const MS_PER_DAY: f64 = 86_400_000.0;
const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Derives every listening view from a record slice.
///
/// The only state is the UTC offset that decides which calendar year,
/// month and hour a play falls into. Each call folds its input from
/// scratch; nothing is cached between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsEngine {
    offset: UtcOffset,
}

impl Default for StatsEngine {
    fn default() -> Self {
        Self::utc()
    }
}

impl StatsEngine {
    pub fn utc() -> Self {
        Self::with_offset(UtcOffset::UTC)
    }

    pub fn with_offset(offset: UtcOffset) -> Self {
        Self { offset }
    }

    /// Uses the machine's current offset, or UTC when it cannot be read
    /// (e.g. from a multithreaded process on some unix targets).
    pub fn local() -> Self {
        match UtcOffset::current_local_offset() {
            Ok(offset) => Self::with_offset(offset),
            Err(err) => {
                log::warn!("local UTC offset unavailable ({err}), bucketing in UTC");
                Self::utc()
            }
        }
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }

    pub fn filter_by_year<'a>(
        &self,
        records: &'a [StreamingRecord],
        year: YearFilter,
    ) -> Cow<'a, [StreamingRecord]> {
        filter::filter_by_year(records, year, self.offset)
    }

    fn local_time(&self, record: &StreamingRecord) -> Option<OffsetDateTime> {
        record.played_at_in(self.offset)
    }

    /// Listening totals over listenable plays. The date range spans every
    /// input record with a readable timestamp, listenable or not.
    pub fn overview(&self, records: &[StreamingRecord]) -> OverviewStats {
        let totals = records
            .iter()
            .filter(|record| is_listenable(record))
            .fold(OverviewAccumulator::default(), |mut acc, record| {
                acc.add(record);
                acc
            });

        let span = records
            .iter()
            .filter_map(|record| self.local_time(record))
            .fold(None, |span: Option<(OffsetDateTime, OffsetDateTime)>, at| {
                Some(match span {
                    Some((min, max)) => (min.min(at), max.max(at)),
                    None => (at, at),
                })
            });

        let (date_range, average_daily_ms) = match span {
            Some((min, max)) => {
                let days = (max - min).as_seconds_f64() * 1000.0 / MS_PER_DAY;
                let average = if days > 0.0 {
                    totals.total_ms as f64 / days
                } else {
                    0.0
                };
                let range = DateRange {
                    start: min.date(),
                    end: max.date(),
                };
                (Some(range), average)
            }
            None => (None, 0.0),
        };

        OverviewStats {
            total_listening_ms: totals.total_ms,
            total_plays: totals.plays,
            unique_tracks: totals.tracks.len(),
            unique_artists: totals.artists.len(),
            unique_albums: totals.albums.len(),
            date_range,
            average_daily_ms,
        }
    }

    pub fn top_tracks(&self, records: &[StreamingRecord], limit: usize) -> Vec<TrackAggregate> {
        let by_track = records
            .iter()
            .filter(|record| is_listenable(record))
            .fold(
                HashMap::<TrackKey, TrackAggregate>::new(),
                |mut by_track, record| {
                    let Some(key) = record.track_key() else {
                        return by_track;
                    };
                    let row = by_track
                        .entry(key)
                        .or_insert_with_key(|key: &TrackKey| TrackAggregate {
                            name: key.name.clone(),
                            artist: key.artist.clone(),
                            album: record.album_name().map(str::to_string),
                            play_count: 0,
                            total_ms: 0,
                            spotify_uri: record.spotify_track_uri.clone(),
                        });
                    row.play_count = row.play_count.saturating_add(1);
                    row.total_ms = row.total_ms.saturating_add(record.ms_played);
                    by_track
                },
            );

        let mut rows: Vec<TrackAggregate> = by_track.into_values().collect();
        rows.sort_by(compare_tracks);
        rows.truncate(limit);
        rows
    }

    pub fn top_artists(&self, records: &[StreamingRecord], limit: usize) -> Vec<ArtistAggregate> {
        let by_artist = records
            .iter()
            .filter(|record| is_listenable(record))
            .fold(
                HashMap::<&str, ArtistAccumulator>::new(),
                |mut by_artist, record| {
                    let (Some(artist), Some(track)) = (record.artist_name(), record.track_name())
                    else {
                        return by_artist;
                    };
                    let acc = by_artist.entry(artist).or_default();
                    acc.play_count = acc.play_count.saturating_add(1);
                    acc.total_ms = acc.total_ms.saturating_add(record.ms_played);
                    acc.tracks.insert(track);
                    by_artist
                },
            );

        let mut rows: Vec<ArtistAggregate> = by_artist
            .into_iter()
            .map(|(name, acc)| ArtistAggregate {
                name: name.to_string(),
                play_count: acc.play_count,
                total_ms: acc.total_ms,
                track_count: acc.tracks.len(),
            })
            .collect();
        rows.sort_by(compare_artists);
        rows.truncate(limit);
        rows
    }

    /// Chronological, one entry per month that has listenable plays.
    pub fn monthly_listening(&self, records: &[StreamingRecord]) -> Vec<MonthlyListening> {
        let by_month = records
            .iter()
            .filter(|record| is_listenable(record))
            .filter_map(|record| Some((self.local_time(record)?, record.ms_played)))
            .fold(
                BTreeMap::<(i32, u8), (u64, u64)>::new(),
                |mut by_month, (at, ms)| {
                    let bucket = by_month.entry((at.year(), u8::from(at.month()))).or_default();
                    bucket.0 = bucket.0.saturating_add(ms);
                    bucket.1 = bucket.1.saturating_add(1);
                    by_month
                },
            );

        by_month
            .into_iter()
            .map(|((year, month), (total_ms, play_count))| MonthlyListening {
                month: month_label(year, month),
                year,
                month_number: month,
                total_ms,
                play_count,
            })
            .collect()
    }

    /// Always 24 buckets, hour 0 first.
    pub fn hourly_listening(&self, records: &[StreamingRecord]) -> Vec<HourlyListening> {
        let seeded: [HourlyListening; 24] = std::array::from_fn(|hour| HourlyListening {
            hour: hour as u8,
            ..HourlyListening::default()
        });

        records
            .iter()
            .filter(|record| is_listenable(record))
            .filter_map(|record| Some((self.local_time(record)?.hour(), record.ms_played)))
            .fold(seeded, |mut hours, (hour, ms)| {
                let bucket = &mut hours[usize::from(hour)];
                bucket.total_ms = bucket.total_ms.saturating_add(ms);
                bucket.play_count = bucket.play_count.saturating_add(1);
                hours
            })
            .to_vec()
    }

    pub fn platform_stats(&self, records: &[StreamingRecord]) -> Vec<PlatformStats> {
        let (by_platform, total_ms) = records
            .iter()
            .filter(|record| is_listenable(record))
            .fold(
                (HashMap::<String, (u64, u64)>::new(), 0_u64),
                |(mut by_platform, total_ms), record| {
                    let bucket = by_platform
                        .entry(canonical_platform(&record.platform))
                        .or_default();
                    bucket.0 = bucket.0.saturating_add(record.ms_played);
                    bucket.1 = bucket.1.saturating_add(1);
                    (by_platform, total_ms.saturating_add(record.ms_played))
                },
            );

        let mut rows: Vec<PlatformStats> = by_platform
            .into_iter()
            .map(|(platform, (platform_ms, play_count))| PlatformStats {
                platform,
                total_ms: platform_ms,
                play_count,
                percentage: percentage(platform_ms, total_ms),
            })
            .collect();
        rows.sort_by(|a, b| {
            b.total_ms
                .cmp(&a.total_ms)
                .then(b.play_count.cmp(&a.play_count))
                .then_with(|| a.platform.cmp(&b.platform))
        });
        rows
    }

    /// Skip counts over every play of a named track, however short. Only
    /// artists with at least ten such plays are ranked, by skip count.
    pub fn skip_stats(&self, records: &[StreamingRecord]) -> SkipStats {
        let acc = records
            .iter()
            .filter(|record| filter::is_skip_qualifying(record))
            .fold(SkipAccumulator::default(), |mut acc, record| {
                acc.add(record);
                acc
            });

        let mut most_skipped_artists: Vec<ArtistSkips> = acc
            .by_artist
            .into_iter()
            .filter(|(_, (total, _))| *total >= MIN_PLAYS_FOR_SKIP_RANKING)
            .map(|(name, (total, skipped))| ArtistSkips {
                name: name.to_string(),
                skip_count: skipped,
                skip_rate: percentage(skipped, total),
            })
            .collect();
        most_skipped_artists.sort_by(|a, b| {
            b.skip_count
                .cmp(&a.skip_count)
                .then(b.skip_rate.total_cmp(&a.skip_rate))
                .then_with(|| a.name.cmp(&b.name))
        });
        most_skipped_artists.truncate(MOST_SKIPPED_LIMIT);

        SkipStats {
            total_plays: acc.total,
            skipped_plays: acc.skipped,
            skip_rate: percentage(acc.skipped, acc.total),
            most_skipped_artists,
        }
    }

    pub fn yearly_stats(&self, records: &[StreamingRecord]) -> Vec<YearlyStats> {
        let by_year = records
            .iter()
            .filter(|record| is_listenable(record))
            .filter_map(|record| Some((self.local_time(record)?.year(), record)))
            .fold(
                BTreeMap::<i32, YearAccumulator>::new(),
                |mut by_year, (year, record)| {
                    by_year.entry(year).or_default().add(record);
                    by_year
                },
            );

        by_year
            .into_iter()
            .map(|(year, acc)| YearlyStats {
                year,
                total_ms: acc.total_ms,
                play_count: acc.plays,
                unique_artists: acc.artists.len(),
                unique_tracks: acc.tracks.len(),
            })
            .collect()
    }

    /// Every year with at least one readable timestamp, newest first.
    /// Short and trackless plays count here.
    pub fn available_years(&self, records: &[StreamingRecord]) -> Vec<i32> {
        let mut years: Vec<i32> = records
            .iter()
            .filter_map(|record| self.local_time(record))
            .map(|at| at.year())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years
    }
}

#[derive(Default)]
struct OverviewAccumulator<'a> {
    total_ms: u64,
    plays: u64,
    tracks: HashSet<TrackKey>,
    artists: HashSet<&'a str>,
    albums: HashSet<&'a str>,
}

impl<'a> OverviewAccumulator<'a> {
    fn add(&mut self, record: &'a StreamingRecord) {
        self.total_ms = self.total_ms.saturating_add(record.ms_played);
        self.plays = self.plays.saturating_add(1);
        if let Some(key) = record.track_key() {
            self.tracks.insert(key);
        }
        if let Some(artist) = record.artist_name() {
            self.artists.insert(artist);
        }
        if let Some(album) = record.album_name() {
            self.albums.insert(album);
        }
    }
}

#[derive(Default)]
struct ArtistAccumulator<'a> {
    play_count: u64,
    total_ms: u64,
    tracks: HashSet<&'a str>,
}

#[derive(Default)]
struct SkipAccumulator<'a> {
    total: u64,
    skipped: u64,
    by_artist: HashMap<&'a str, (u64, u64)>,
}

impl<'a> SkipAccumulator<'a> {
    fn add(&mut self, record: &'a StreamingRecord) {
        let skipped = u64::from(record.skipped);
        self.total = self.total.saturating_add(1);
        self.skipped = self.skipped.saturating_add(skipped);
        if let Some(artist) = record.artist_name() {
            let counts = self.by_artist.entry(artist).or_default();
            counts.0 = counts.0.saturating_add(1);
            counts.1 = counts.1.saturating_add(skipped);
        }
    }
}

#[derive(Default)]
struct YearAccumulator<'a> {
    total_ms: u64,
    plays: u64,
    artists: HashSet<&'a str>,
    tracks: HashSet<TrackKey>,
}

impl<'a> YearAccumulator<'a> {
    fn add(&mut self, record: &'a StreamingRecord) {
        self.total_ms = self.total_ms.saturating_add(record.ms_played);
        self.plays = self.plays.saturating_add(1);
        if let Some(artist) = record.artist_name() {
            self.artists.insert(artist);
        }
        if let Some(key) = record.track_key() {
            self.tracks.insert(key);
        }
    }
}

fn compare_tracks(a: &TrackAggregate, b: &TrackAggregate) -> Ordering {
    b.total_ms
        .cmp(&a.total_ms)
        .then(b.play_count.cmp(&a.play_count))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.artist.cmp(&b.artist))
}

fn compare_artists(a: &ArtistAggregate, b: &ArtistAggregate) -> Ordering {
    b.total_ms
        .cmp(&a.total_ms)
        .then(b.play_count.cmp(&a.play_count))
        .then_with(|| a.name.cmp(&b.name))
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

fn month_label(year: i32, month: u8) -> String {
    let name = MONTH_ABBREVIATIONS
        .get(usize::from(month.saturating_sub(1)))
        .copied()
        .unwrap_or("???");
    format!("{name} {year}")
}

/// Display name for a raw platform string. Known identifiers map to their
/// product names, anything else is title-cased.
pub fn canonical_platform(raw: &str) -> String {
    let trimmed = raw.trim();
    let known = match trimmed.to_ascii_lowercase().as_str() {
        "windows" => Some("Windows"),
        "android" => Some("Android"),
        "ios" => Some("iOS"),
        "osx" => Some("macOS"),
        "web_player" => Some("Web Player"),
        "cast_to_device" => Some("Cast Device"),
        "" | "unknown" => Some("Unknown"),
        _ => None,
    };
    match known {
        Some(name) => name.to_string(),
        None => title_case(trimmed),
    }
}

fn title_case(text: &str) -> String {
    text.split(|ch: char| ch.is_whitespace() || ch == '_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// One play event as it appears in a streaming history export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub ts: String,
    #[serde(deserialize_with = "null_as_default")]
    pub platform: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ms_played: u64,
    pub conn_country: Option<String>,
    pub ip_addr: Option<String>,
    pub master_metadata_track_name: Option<String>,
    pub master_metadata_album_artist_name: Option<String>,
    pub master_metadata_album_album_name: Option<String>,
    pub spotify_track_uri: Option<String>,
    pub episode_name: Option<String>,
    pub episode_show_name: Option<String>,
    pub spotify_episode_uri: Option<String>,
    pub audiobook_title: Option<String>,
    pub audiobook_uri: Option<String>,
    pub audiobook_chapter_uri: Option<String>,
    pub audiobook_chapter_title: Option<String>,
    pub reason_start: Option<String>,
    pub reason_end: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub shuffle: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub skipped: bool,
    pub offline: Option<bool>,
    pub offline_timestamp: Option<i64>,
    pub incognito_mode: Option<bool>,
}

impl StreamingRecord {
    /// Play time with offset-less timestamps read as UTC.
    pub fn played_at(&self) -> Option<OffsetDateTime> {
        self.played_at_in(UtcOffset::UTC)
    }

    /// Play time as wall-clock time at `offset`. A date-time without an
    /// offset is taken to already be wall-clock time at `offset`; a bare
    /// date is midnight UTC.
    pub fn played_at_in(&self, offset: UtcOffset) -> Option<OffsetDateTime> {
        parse_timestamp(self.ts.trim(), offset)?.checked_to_offset(offset)
    }

    pub fn track_name(&self) -> Option<&str> {
        non_empty(self.master_metadata_track_name.as_deref())
    }

    pub fn artist_name(&self) -> Option<&str> {
        non_empty(self.master_metadata_album_artist_name.as_deref())
    }

    pub fn album_name(&self) -> Option<&str> {
        non_empty(self.master_metadata_album_album_name.as_deref())
    }

    /// Identity of the played track, if the record names one.
    pub fn track_key(&self) -> Option<TrackKey> {
        self.track_name().map(|name| TrackKey::new(name, self.artist_name()))
    }
}

fn parse_timestamp(raw: &str, offset: UtcOffset) -> Option<OffsetDateTime> {
    if let Ok(at) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(at);
    }
    if let Ok(at) = OffsetDateTime::parse(raw, &Iso8601::DEFAULT) {
        return Some(at);
    }
    if let Ok(local) = PrimitiveDateTime::parse(raw, &Iso8601::DEFAULT) {
        return Some(local.assume_offset(offset));
    }
    Date::parse(raw, &Iso8601::DEFAULT)
        .ok()
        .map(|date| date.midnight().assume_utc())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.is_empty())
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Track identity shared by every view that counts distinct tracks: the
/// same title by two artists is two tracks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackKey {
    pub name: String,
    pub artist: Option<String>,
}

impl TrackKey {
    pub fn new(name: &str, artist: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            artist: artist.map(str::to_string),
        }
    }
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.name, self.artist.as_deref().unwrap_or("null"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackAggregate {
    pub name: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub play_count: u64,
    pub total_ms: u64,
    pub spotify_uri: Option<String>,
}

impl TrackAggregate {
    pub fn artist_label(&self) -> &str {
        self.artist.as_deref().unwrap_or("Unknown Artist")
    }

    pub fn album_label(&self) -> &str {
        self.album.as_deref().unwrap_or("Unknown Album")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistAggregate {
    pub name: String,
    pub play_count: u64,
    pub total_ms: u64,
    pub track_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyListening {
    pub month: String,
    pub year: i32,
    pub month_number: u8,
    pub total_ms: u64,
    pub play_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct HourlyListening {
    pub hour: u8,
    pub total_ms: u64,
    pub play_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformStats {
    pub platform: String,
    pub total_ms: u64,
    pub play_count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistSkips {
    pub name: String,
    pub skip_count: u64,
    pub skip_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct SkipStats {
    pub total_plays: u64,
    pub skipped_plays: u64,
    pub skip_rate: f64,
    pub most_skipped_artists: Vec<ArtistSkips>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyStats {
    pub year: i32,
    pub total_ms: u64,
    pub play_count: u64,
    pub unique_artists: usize,
    pub unique_tracks: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    #[serde(serialize_with = "as_display")]
    pub start: Date,
    #[serde(serialize_with = "as_display")]
    pub end: Date,
}

fn as_display<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(date)
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct OverviewStats {
    pub total_listening_ms: u64,
    pub total_plays: u64,
    pub unique_tracks: usize,
    pub unique_artists: usize,
    pub unique_albums: usize,
    pub date_range: Option<DateRange>,
    pub average_daily_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nulls_and_missing_fields_decode_to_defaults() {
        let record: StreamingRecord = serde_json::from_str(
            r#"{"ts":"2023-04-01T10:00:00Z","ms_played":null,"skipped":null,"master_metadata_track_name":"Song"}"#,
        )
        .expect("decode");

        assert_eq!(record.ms_played, 0);
        assert!(!record.skipped);
        assert!(!record.shuffle);
        assert!(record.platform.is_empty());
        assert_eq!(record.track_name(), Some("Song"));
        assert_eq!(record.artist_name(), None);
    }

    #[test]
    fn empty_track_name_counts_as_missing() {
        let record = StreamingRecord {
            master_metadata_track_name: Some(String::new()),
            ..StreamingRecord::default()
        };
        assert!(record.track_key().is_none());
    }

    #[test]
    fn played_at_rejects_garbage() {
        let mut record = StreamingRecord {
            ts: String::from("2022-12-31T23:59:59Z"),
            ..StreamingRecord::default()
        };
        assert_eq!(record.played_at().map(|at| at.year()), Some(2022));

        record.ts = String::from("yesterday");
        assert!(record.played_at().is_none());

        record.ts = String::from("2023-13-40T10:00:00Z");
        assert!(record.played_at().is_none());
    }

    fn at(ts: &str, offset: UtcOffset) -> Option<OffsetDateTime> {
        StreamingRecord {
            ts: ts.to_string(),
            ..StreamingRecord::default()
        }
        .played_at_in(offset)
    }

    #[test]
    fn offset_less_date_time_is_wall_clock_time() {
        let minus_five = UtcOffset::from_hms(-5, 0, 0).expect("offset");

        let local = at("2023-01-01T00:30:00", minus_five).expect("parsed");
        assert_eq!((local.year(), local.hour()), (2023, 0));
        assert_eq!(local.offset(), minus_five);

        let utc = at("2023-01-01T00:30:00Z", minus_five).expect("parsed");
        assert_eq!((utc.year(), utc.hour()), (2022, 19));
    }

    #[test]
    fn minute_precision_with_zulu_parses() {
        let parsed = at("2023-05-01T10:00Z", UtcOffset::UTC).expect("parsed");
        assert_eq!((parsed.year(), parsed.hour(), parsed.minute()), (2023, 10, 0));
    }

    #[test]
    fn bare_date_is_utc_midnight() {
        let parsed = at("2023-05-01", UtcOffset::UTC).expect("parsed");
        assert_eq!(parsed.date().to_string(), "2023-05-01");
        assert_eq!(parsed.hour(), 0);

        let west = UtcOffset::from_hms(-3, 0, 0).expect("offset");
        let shifted = at("2023-01-01", west).expect("parsed");
        assert_eq!(shifted.date().to_string(), "2022-12-31");
    }

    #[test]
    fn explicit_offset_is_honoured() {
        let parsed = at("2023-05-01T10:00:00+02:00", UtcOffset::UTC).expect("parsed");
        assert_eq!(parsed.hour(), 8);
    }

    #[test]
    fn track_key_keeps_artist_in_identity() {
        let a = TrackKey::new("Intro", Some("X"));
        let b = TrackKey::new("Intro", Some("Y"));
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "Intro|X");
        assert_eq!(TrackKey::new("Intro", None).to_string(), "Intro|null");
    }

    #[test]
    fn date_range_serializes_as_iso_dates() {
        let range = DateRange {
            start: Date::from_calendar_date(2023, time::Month::January, 1).expect("date"),
            end: Date::from_calendar_date(2023, time::Month::June, 1).expect("date"),
        };
        let json = serde_json::to_string(&range).expect("json");
        assert_eq!(json, r#"{"start":"2023-01-01","end":"2023-06-01"}"#);
    }
}

use crate::filter::YearFilter;
use crate::format::{
    format_date_range, format_duration, format_number, format_percent, ms_to_hours,
};
use crate::model::{
    ArtistAggregate, HourlyListening, MonthlyListening, OverviewStats, PlatformStats, SkipStats,
    StreamingRecord, TrackAggregate, YearlyStats,
};
use crate::stats::StatsEngine;
use serde::Serialize;
use std::fmt;

const SKIPPED_ARTISTS_SHOWN: usize = 5;

/// Every view for one year selection. Yearly totals and the year list
/// always cover the whole history so the selector can offer every year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub year: String,
    pub overview: OverviewStats,
    pub top_tracks: Vec<TrackAggregate>,
    pub top_artists: Vec<ArtistAggregate>,
    pub monthly: Vec<MonthlyListening>,
    pub hourly: Vec<HourlyListening>,
    pub platforms: Vec<PlatformStats>,
    pub skips: SkipStats,
    pub yearly: Vec<YearlyStats>,
    pub available_years: Vec<i32>,
}

impl Report {
    pub fn build(
        engine: &StatsEngine,
        records: &[StreamingRecord],
        year: YearFilter,
        limit: usize,
    ) -> Self {
        let selected = engine.filter_by_year(records, year);
        Self {
            year: year.to_string(),
            overview: engine.overview(&selected),
            top_tracks: engine.top_tracks(&selected, limit),
            top_artists: engine.top_artists(&selected, limit),
            monthly: engine.monthly_listening(&selected),
            hourly: engine.hourly_listening(&selected),
            platforms: engine.platform_stats(&selected),
            skips: engine.skip_stats(&selected),
            yearly: engine.yearly_stats(records),
            available_years: engine.available_years(records),
        }
    }
}

/// Plain-text summary, one section per view.
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let overview = &self.overview;
        let year_label = match self.year.parse::<YearFilter>() {
            Ok(year) => year.label(),
            Err(_) => self.year.clone(),
        };

        writeln!(f, "Listening stats ({year_label})")?;
        writeln!(f, "  Period        {}", format_date_range(overview.date_range))?;
        writeln!(
            f,
            "  Listened      {} ({} hours)",
            format_duration(overview.total_listening_ms),
            ms_to_hours(overview.total_listening_ms)
        )?;
        writeln!(
            f,
            "  Daily avg     {:.1} hours",
            overview.average_daily_ms / 3_600_000.0
        )?;
        writeln!(
            f,
            "  Plays         {} ({} unique tracks)",
            format_number(overview.total_plays),
            format_number(overview.unique_tracks as u64)
        )?;
        writeln!(
            f,
            "  Artists       {}",
            format_number(overview.unique_artists as u64)
        )?;
        writeln!(
            f,
            "  Albums        {}",
            format_number(overview.unique_albums as u64)
        )?;

        writeln!(f, "\nTop tracks")?;
        for (rank, track) in self.top_tracks.iter().enumerate() {
            writeln!(
                f,
                "  {:>2}. {} - {} ({})  {} · {} plays",
                rank + 1,
                track.name,
                track.artist_label(),
                track.album_label(),
                format_duration(track.total_ms),
                format_number(track.play_count)
            )?;
        }

        writeln!(f, "\nTop artists")?;
        for (rank, artist) in self.top_artists.iter().enumerate() {
            writeln!(
                f,
                "  {:>2}. {}  {} · {} plays · {} tracks",
                rank + 1,
                artist.name,
                format_duration(artist.total_ms),
                format_number(artist.play_count),
                artist.track_count
            )?;
        }

        writeln!(f, "\nBy month")?;
        for month in &self.monthly {
            writeln!(
                f,
                "  {:<9} {:>8} h  {:>6} plays",
                month.month,
                ms_to_hours(month.total_ms),
                format_number(month.play_count)
            )?;
        }

        writeln!(f, "\nBy hour of day")?;
        for hour in &self.hourly {
            writeln!(
                f,
                "  {:02}:00 {:>8} h  {:>6} plays",
                hour.hour,
                ms_to_hours(hour.total_ms),
                format_number(hour.play_count)
            )?;
        }

        writeln!(f, "\nPlatforms")?;
        for platform in &self.platforms {
            writeln!(
                f,
                "  {:<12} {:>6}  {} · {} plays",
                platform.platform,
                format_percent(platform.percentage),
                format_duration(platform.total_ms),
                format_number(platform.play_count)
            )?;
        }

        let skips = &self.skips;
        writeln!(
            f,
            "\nSkips: {} of {} plays ({})",
            format_number(skips.skipped_plays),
            format_number(skips.total_plays),
            format_percent(skips.skip_rate)
        )?;
        for artist in skips.most_skipped_artists.iter().take(SKIPPED_ARTISTS_SHOWN) {
            writeln!(
                f,
                "  {}  {} skips ({} skip rate)",
                artist.name,
                format_number(artist.skip_count),
                format_percent(artist.skip_rate)
            )?;
        }

        writeln!(f, "\nBy year")?;
        for year in &self.yearly {
            writeln!(
                f,
                "  {}  {}  {} plays · {} artists · {} tracks",
                year.year,
                format_duration(year.total_ms),
                format_number(year.play_count),
                format_number(year.unique_artists as u64),
                format_number(year.unique_tracks as u64)
            )?;
        }

        Ok(())
    }
}

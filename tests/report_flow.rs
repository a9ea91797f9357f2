use std::fs;

use replay::filter::YearFilter;
use replay::history;
use replay::report::Report;
use replay::stats::StatsEngine;
use tempfile::tempdir;

const EXPORT_2022: &str = r#"[
  {"ts":"2022-12-31T22:00:00Z","platform":"android","ms_played":180000,
   "conn_country":"DE","ip_addr":"10.0.0.1",
   "master_metadata_track_name":"Snow","master_metadata_album_artist_name":"Aurora",
   "master_metadata_album_album_name":"Winter","spotify_track_uri":"spotify:track:snow",
   "episode_name":null,"episode_show_name":null,"spotify_episode_uri":null,
   "reason_start":"clickrow","reason_end":"trackdone",
   "shuffle":false,"skipped":false,"offline":false,"offline_timestamp":0,"incognito_mode":false},
  {"ts":"2022-07-04T09:15:00Z","platform":"web_player","ms_played":2000,
   "master_metadata_track_name":"Heat","master_metadata_album_artist_name":"Aurora",
   "shuffle":true,"skipped":true},
  {"ts":"2022-08-01T12:00:00Z","platform":"android","ms_played":900000,
   "master_metadata_track_name":null,"episode_name":"Podcast",
   "shuffle":false,"skipped":null}
]"#;

const EXPORT_2023: &str = r#"[
  {"ts":"2023-01-15T20:00:00Z","platform":"osx","ms_played":240000,
   "master_metadata_track_name":"Snow","master_metadata_album_artist_name":"Aurora",
   "master_metadata_album_album_name":"Winter","shuffle":false,"skipped":false},
  {"ts":"2023-03-02T07:30:00Z","platform":"OSX","ms_played":120000,
   "master_metadata_track_name":"Snow","master_metadata_album_artist_name":"Cover Band",
   "master_metadata_album_album_name":"Covers","shuffle":false,"skipped":false},
  {"ts":"broken","platform":"ios","ms_played":60000,
   "master_metadata_track_name":"Lost","master_metadata_album_artist_name":"Nobody"},
  "not a record"
]"#;

#[test]
fn exports_flow_into_full_report() {
    let dir = tempdir().expect("tempdir");
    fs::write(dir.path().join("Streaming_History_Audio_2023_1.json"), EXPORT_2023)
        .expect("write");
    fs::write(dir.path().join("Streaming_History_Audio_2022_0.json"), EXPORT_2022)
        .expect("write");

    let records = history::load_history_dir(dir.path()).expect("load");
    assert_eq!(records.len(), 6);
    assert_eq!(records[0].ts, "2022-07-04T09:15:00Z");
    assert_eq!(records[5].ts, "broken");

    let engine = StatsEngine::utc();
    let report = Report::build(&engine, &records, YearFilter::All, 10);

    assert_eq!(report.overview.total_plays, 4);
    assert_eq!(report.overview.total_listening_ms, 600_000);
    assert_eq!(report.overview.unique_tracks, 3);
    assert_eq!(report.overview.unique_artists, 3);
    assert_eq!(report.overview.unique_albums, 2);
    let range = report.overview.date_range.expect("range");
    assert_eq!(range.start.to_string(), "2022-07-04");
    assert_eq!(range.end.to_string(), "2023-03-02");

    assert_eq!(report.top_tracks[0].name, "Snow");
    assert_eq!(report.top_tracks[0].artist.as_deref(), Some("Aurora"));
    assert_eq!(report.top_tracks[0].total_ms, 420_000);
    assert_eq!(report.top_artists[0].name, "Aurora");
    assert_eq!(report.top_artists[0].track_count, 1);

    let platforms: Vec<&str> = report
        .platforms
        .iter()
        .map(|platform| platform.platform.as_str())
        .collect();
    assert_eq!(platforms, vec!["macOS", "Android", "iOS"]);

    assert_eq!(report.skips.total_plays, 5);
    assert_eq!(report.skips.skipped_plays, 1);
    assert!(report.skips.most_skipped_artists.is_empty());

    assert_eq!(report.available_years, vec![2023, 2022]);
    assert_eq!(report.yearly.len(), 2);
    assert_eq!(report.yearly[1].unique_tracks, 2);

    let text = report.to_string();
    assert!(text.contains("Snow - Aurora (Winter)"));
}

#[test]
fn single_year_report_keeps_history_wide_year_views() {
    let dir = tempdir().expect("tempdir");
    let older = dir.path().join("Streaming_History_Audio_2022_0.json");
    let newer = dir.path().join("Streaming_History_Audio_2023_1.json");
    fs::write(&older, EXPORT_2022).expect("write");
    fs::write(&newer, EXPORT_2023).expect("write");

    let records = history::load_history(&[newer, older]).expect("load");
    let report = Report::build(&StatsEngine::utc(), &records, YearFilter::Year(2022), 10);

    assert_eq!(report.overview.total_plays, 1);
    let range = report.overview.date_range.expect("range");
    assert_eq!(range.start.to_string(), "2022-07-04");
    assert_eq!(range.end.to_string(), "2022-12-31");
    assert_eq!(report.monthly.len(), 1);
    assert_eq!(report.monthly[0].month, "Dec 2022");
    assert_eq!(report.yearly.len(), 2);

    let json = serde_json::to_value(&report).expect("json");
    assert_eq!(json["year"], "2022");
    assert_eq!(json["overview"]["date_range"]["start"], "2022-07-04");
}

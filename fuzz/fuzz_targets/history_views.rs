#![no_main]

use libfuzzer_sys::fuzz_target;
use replay::filter::YearFilter;
use replay::history::parse_history;
use replay::report::Report;
use replay::stats::StatsEngine;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(records) = parse_history(raw) else {
        return;
    };

    let engine = StatsEngine::utc();
    let report = Report::build(&engine, &records, YearFilter::All, 20);
    assert_eq!(report.hourly.len(), 24);
    assert!((0.0..=100.0).contains(&report.skips.skip_rate));

    for year in &report.available_years {
        let yearly = Report::build(&engine, &records, YearFilter::Year(*year), 5);
        assert!(yearly.top_tracks.len() <= 5);
    }
    let _ = report.to_string();
});

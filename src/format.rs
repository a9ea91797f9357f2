use crate::model::DateRange;

const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_HOUR: u64 = 3_600_000;

/// `"2d 3h"` from a day up, otherwise `"3h 12m"` or `"12m"`.
pub fn format_duration(ms: u64) -> String {
    let hours = ms / MS_PER_HOUR;
    let minutes = (ms % MS_PER_HOUR) / MS_PER_MINUTE;

    if hours >= 24 {
        return format!("{}d {}h", hours / 24, hours % 24);
    }
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Thousands separated with commas.
pub fn format_number(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn ms_to_hours(ms: u64) -> f64 {
    (ms as f64 / MS_PER_HOUR as f64 * 10.0).round() / 10.0
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

pub fn format_date_range(range: Option<DateRange>) -> String {
    match range {
        Some(range) => format!("{} - {}", range.start, range.end),
        None => String::from("N/A"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Month};

    #[test]
    fn duration_picks_largest_units() {
        assert_eq!(format_duration(0), "0m");
        assert_eq!(format_duration(59_999), "0m");
        assert_eq!(format_duration(12 * MS_PER_MINUTE), "12m");
        assert_eq!(format_duration(3 * MS_PER_HOUR + 12 * MS_PER_MINUTE), "3h 12m");
        assert_eq!(format_duration(24 * MS_PER_HOUR), "1d 0h");
        assert_eq!(format_duration(51 * MS_PER_HOUR + 59 * MS_PER_MINUTE), "2d 3h");
    }

    #[test]
    fn numbers_get_grouping_commas() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_000), "1,000");
        assert_eq!(format_number(1_234_567), "1,234,567");
    }

    #[test]
    fn hours_round_to_one_decimal() {
        assert_eq!(ms_to_hours(0), 0.0);
        assert_eq!(ms_to_hours(MS_PER_HOUR), 1.0);
        assert_eq!(ms_to_hours(5_700_000), 1.6);
        assert_eq!(ms_to_hours(5_400_000), 1.5);
    }

    #[test]
    fn percent_and_range_text() {
        assert_eq!(format_percent(33.333), "33.3%");
        assert_eq!(format_date_range(None), "N/A");

        let range = DateRange {
            start: Date::from_calendar_date(2021, Month::March, 4).expect("date"),
            end: Date::from_calendar_date(2025, Month::January, 9).expect("date"),
        };
        assert_eq!(format_date_range(Some(range)), "2021-03-04 - 2025-01-09");
    }
}

//! Day-name and time-of-day parsing shared by the doctor directory and
//! the consultation scheduler.

use std::sync::LazyLock;

use chrono::{NaiveTime, Weekday};
use regex::Regex;

static TIME_OF_DAY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\d{2}:\d{2}$").ok());

/// True iff `pattern` compiled and matches. A pattern that failed to compile
/// matches nothing.
pub fn matches_pattern(pattern: &LazyLock<Option<Regex>>, value: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(value))
}

/// Parses a strict `HH:MM` string. `9:00`, `09:00:00` and `24:00` are rejected.
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    if !matches_pattern(&TIME_OF_DAY, value) {
        return None;
    }
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

/// Resolves a working-day name. English and Indonesian names are accepted,
/// compared case-insensitively.
pub fn weekday_from_name(name: &str) -> Option<Weekday> {
    let weekday = match name.trim().to_lowercase().as_str() {
        "monday" | "senin" => Weekday::Mon,
        "tuesday" | "selasa" => Weekday::Tue,
        "wednesday" | "rabu" => Weekday::Wed,
        "thursday" | "kamis" => Weekday::Thu,
        "friday" | "jumat" => Weekday::Fri,
        "saturday" | "sabtu" => Weekday::Sat,
        "sunday" | "minggu" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}

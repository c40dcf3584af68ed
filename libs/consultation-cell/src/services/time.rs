use std::sync::LazyLock;

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;

use doctor_cell::calendar::{matches_pattern, parse_time_of_day};

use crate::models::ConsultationError;

pub const LOCAL_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static CIVIL_DATE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").ok());

/// A requested consultation window, resolved to absolute instants.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedWindow {
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub start_local: String,
    pub end_local: String,
}

impl NormalizedWindow {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Interprets civil dates and times under the clinic timezone.
#[derive(Debug, Clone, Copy)]
pub struct TimeNormalizer {
    tz: Tz,
}

impl TimeNormalizer {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Combines `date` with each time-of-day under the clinic's wall-clock
    /// rules and converts both to UTC.
    pub fn normalize(
        &self,
        date: &str,
        start_time: &str,
        end_time: &str,
    ) -> Result<NormalizedWindow, ConsultationError> {
        let date = parse_civil_date(date)?;
        let start = self.localize(date, parse_clock_time(start_time)?)?;
        let end = self.localize(date, parse_clock_time(end_time)?)?;

        Ok(NormalizedWindow {
            date,
            start,
            end,
            start_local: self.to_local_display(start),
            end_local: self.to_local_display(end),
        })
    }

    pub fn to_local_display(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.tz)
            .format(LOCAL_DISPLAY_FORMAT)
            .to_string()
    }

    fn localize(&self, date: NaiveDate, time: NaiveTime) -> Result<DateTime<Utc>, ConsultationError> {
        let naive = date.and_time(time);
        match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(local) => Ok(local.with_timezone(&Utc)),
            LocalResult::Ambiguous(_, _) | LocalResult::None => {
                Err(ConsultationError::InvalidTimeFormat(format!(
                    "{} does not name a single instant in {}",
                    naive, self.tz
                )))
            }
        }
    }
}

pub fn to_utc_display(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_civil_date(value: &str) -> Result<NaiveDate, ConsultationError> {
    if !matches_pattern(&CIVIL_DATE, value) {
        return Err(ConsultationError::InvalidTimeFormat(format!(
            "date '{}' must be YYYY-MM-DD",
            value
        )));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        ConsultationError::InvalidTimeFormat(format!("date '{}' is not a calendar date", value))
    })
}

fn parse_clock_time(value: &str) -> Result<NaiveTime, ConsultationError> {
    parse_time_of_day(value).ok_or_else(|| {
        ConsultationError::InvalidTimeFormat(format!("time '{}' must be HH:MM", value))
    })
}

/// Basic sanity on a normalized window: not in the past, `end > start`,
/// and at least `min_duration` long.
pub fn check_interval(
    window: &NormalizedWindow,
    now: DateTime<Utc>,
    min_duration: Duration,
) -> Result<(), ConsultationError> {
    if window.start < now {
        return Err(ConsultationError::ConsultationPastDate);
    }
    if window.end <= window.start {
        return Err(ConsultationError::InvalidInterval);
    }
    if window.duration() < min_duration {
        return Err(ConsultationError::DurationTooShort {
            minimum: min_duration.num_minutes(),
        });
    }
    Ok(())
}

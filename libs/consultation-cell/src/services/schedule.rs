use chrono::{DateTime, Datelike, Utc, Weekday};
use chrono_tz::Tz;

use doctor_cell::calendar::{parse_time_of_day, weekday_from_name};
use doctor_cell::models::DoctorSchedule;

use crate::models::ConsultationError;

/// Checks an absolute interval against a doctor's working days and hours,
/// reading both ends on the clinic's local calendar.
pub fn validate_schedule(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    schedule: &DoctorSchedule,
    tz: Tz,
) -> Result<(), ConsultationError> {
    let local_start = start.with_timezone(&tz);
    let local_end = end.with_timezone(&tz);

    let weekday = local_start.weekday();
    let works_that_day = schedule
        .working_days
        .iter()
        .any(|day| weekday_from_name(day) == Some(weekday));

    if !works_that_day {
        return Err(ConsultationError::InvalidWorkingDay(
            english_name(weekday).to_string(),
        ));
    }

    let hours = &schedule.working_hours;
    let day_start = parse_time_of_day(&hours.start).ok_or_else(|| {
        ConsultationError::InvalidWorkingHours(format!("start '{}' is not HH:MM", hours.start))
    })?;
    let day_end = parse_time_of_day(&hours.end).ok_or_else(|| {
        ConsultationError::InvalidWorkingHours(format!("end '{}' is not HH:MM", hours.end))
    })?;
    if day_start >= day_end {
        return Err(ConsultationError::InvalidWorkingHours(format!(
            "{} is not before {}",
            hours.start, hours.end
        )));
    }

    let same_day = local_start.date_naive() == local_end.date_naive();
    if !same_day || local_start.time() < day_start || local_end.time() > day_end {
        return Err(ConsultationError::OutsideWorkingHours(format!(
            "{}-{}",
            hours.start, hours.end
        )));
    }

    Ok(())
}

fn english_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

use crate::calendar::{parse_time_of_day, weekday_from_name};
use crate::models::{CreateDoctorRequest, DoctorError};

pub fn validate_working_hours(start: &str, end: &str) -> Result<(), DoctorError> {
    let start_time = parse_time_of_day(start)
        .ok_or_else(|| DoctorError::InvalidWorkingHours(format!("'{}' is not HH:MM", start)))?;
    let end_time = parse_time_of_day(end)
        .ok_or_else(|| DoctorError::InvalidWorkingHours(format!("'{}' is not HH:MM", end)))?;

    if end_time <= start_time {
        return Err(DoctorError::InvalidWorkingHours(
            "end time must be after start time".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_working_days(days: &[String]) -> Result<(), DoctorError> {
    if days.is_empty() {
        return Err(DoctorError::InvalidWorkingDay(
            "at least one working day is required".to_string(),
        ));
    }

    match days.iter().find(|day| weekday_from_name(day).is_none()) {
        Some(unknown) => Err(DoctorError::InvalidWorkingDay(unknown.clone())),
        None => Ok(()),
    }
}

pub fn validate_profile_numbers(
    years_of_experience: Option<i32>,
    price_per_hour: Option<f64>,
) -> Result<(), DoctorError> {
    if years_of_experience.is_some_and(|y| y < 0) {
        return Err(DoctorError::ValidationError(
            "years_of_experience cannot be negative".to_string(),
        ));
    }
    if price_per_hour.is_some_and(|p| !p.is_finite() || p < 0.0) {
        return Err(DoctorError::ValidationError(
            "price_per_hour cannot be negative".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_create_request(request: &CreateDoctorRequest) -> Result<(), DoctorError> {
    let required = [
        ("full_name", &request.full_name),
        ("last_education", &request.last_education),
        ("specialist_at", &request.specialist_at),
        ("hospital_name", &request.hospital_name),
        ("gmeet_link", &request.gmeet_link),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(DoctorError::ValidationError(format!("{} is required", field)));
    }

    validate_profile_numbers(Some(request.years_of_experience), Some(request.price_per_hour))?;
    validate_working_days(&request.working_days)?;
    validate_working_hours(&request.working_hours_start, &request.working_hours_end)
}

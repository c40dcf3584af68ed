use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::pagination::PageMeta;

// ==============================================================================
// DOCTOR PROFILE
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub last_education: String,
    pub specialist_at: String,
    pub profile_image: Option<String>,
    pub birth_date: NaiveDate,
    pub hospital_name: String,
    pub years_of_experience: i32,
    pub price_per_hour: f64,
    pub gmeet_link: String,
    pub working_days: Vec<String>,
    pub working_hours_start: String,
    pub working_hours_end: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Doctor {
    pub fn schedule(&self) -> DoctorSchedule {
        DoctorSchedule {
            meet_link: self.gmeet_link.clone(),
            price_per_hour: self.price_per_hour,
            working_days: self.working_days.clone(),
            working_hours: WorkingHours {
                start: self.working_hours_start.clone(),
                end: self.working_hours_end.clone(),
            },
        }
    }
}

// ==============================================================================
// SCHEDULE READ MODEL
// ==============================================================================

/// Working hours as local `HH:MM` strings in the clinic timezone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub start: String,
    pub end: String,
}

/// What a booking needs to know about a doctor's week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorSchedule {
    pub meet_link: String,
    pub price_per_hour: f64,
    pub working_days: Vec<String>,
    pub working_hours: WorkingHours,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScheduleRow {
    pub gmeet_link: String,
    pub price_per_hour: f64,
    pub working_days: Vec<String>,
    pub working_hours_start: String,
    pub working_hours_end: String,
}

impl From<ScheduleRow> for DoctorSchedule {
    fn from(row: ScheduleRow) -> Self {
        Self {
            meet_link: row.gmeet_link,
            price_per_hour: row.price_per_hour,
            working_days: row.working_days,
            working_hours: WorkingHours {
                start: row.working_hours_start,
                end: row.working_hours_end,
            },
        }
    }
}

// ==============================================================================
// REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctorRequest {
    pub user_id: Uuid,
    pub full_name: String,
    pub last_education: String,
    pub specialist_at: String,
    pub profile_image: Option<String>,
    pub birth_date: NaiveDate,
    pub hospital_name: String,
    pub years_of_experience: i32,
    pub price_per_hour: f64,
    pub gmeet_link: String,
    pub working_days: Vec<String>,
    pub working_hours_start: String,
    pub working_hours_end: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDoctorRequest {
    pub full_name: Option<String>,
    pub last_education: Option<String>,
    pub specialist_at: Option<String>,
    pub profile_image: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub hospital_name: Option<String>,
    pub years_of_experience: Option<i32>,
    pub price_per_hour: Option<f64>,
    pub gmeet_link: Option<String>,
    pub working_days: Option<Vec<String>>,
    pub working_hours_start: Option<String>,
    pub working_hours_end: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorPage {
    pub data: Vec<Doctor>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("User is already registered as a doctor")]
    AlreadyRegistered,

    #[error("Invalid working hours: {0}")]
    InvalidWorkingHours(String),

    #[error("Invalid working day: {0}")]
    InvalidWorkingDay(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound | DoctorError::UserNotFound => AppError::NotFound(err.to_string()),
            DoctorError::AlreadyRegistered => AppError::Conflict(err.to_string()),
            DoctorError::InvalidWorkingHours(_)
            | DoctorError::InvalidWorkingDay(_)
            | DoctorError::ValidationError(_) => AppError::ValidationError(err.to_string()),
            DoctorError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

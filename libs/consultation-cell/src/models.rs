use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::pagination::PageMeta;

pub const MIN_DESCRIPTION_CHARS: usize = 10;
pub const MAX_DESCRIPTION_CHARS: usize = 2000;
pub const MAX_PET_AGE: i32 = 30;

// ==============================================================================
// PERSISTED BOOKING
// ==============================================================================

/// A consultation row as stored. Never mutated after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consultation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub doctor_id: Uuid,
    pub pet_type: String,
    pub pet_name: String,
    pub pet_age: i32,
    pub disease_description: String,
    pub consultation_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub payment_proof: String,
    pub created_at: DateTime<Utc>,
}

/// A validated booking ready for insert. The store assigns `id` and
/// `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewConsultation {
    pub user_id: Uuid,
    pub doctor_id: Uuid,
    pub pet_type: String,
    pub pet_name: String,
    pub pet_age: i32,
    pub disease_description: String,
    pub consultation_date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub payment_proof: String,
}

impl NewConsultation {
    pub fn into_persisted(self, identity: PersistedIdentity) -> Consultation {
        Consultation {
            id: identity.id,
            user_id: self.user_id,
            doctor_id: self.doctor_id,
            pet_type: self.pet_type,
            pet_name: self.pet_name,
            pet_age: self.pet_age,
            disease_description: self.disease_description,
            consultation_date: self.consultation_date,
            start_time: self.start_time,
            end_time: self.end_time,
            payment_proof: self.payment_proof,
            created_at: identity.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PersistedIdentity {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

// ==============================================================================
// REQUEST / RESPONSE
// ==============================================================================

/// One booking attempt. Dates and times are civil strings in the clinic
/// timezone; `payment_proof` is the raw uploaded file.
#[derive(Debug, Clone)]
pub struct CreateConsultationRequest {
    pub user_id: Uuid,
    pub doctor_id: Uuid,
    pub pet_type: String,
    pub pet_name: String,
    pub pet_age: i32,
    pub disease_description: String,
    pub consultation_date: String,
    pub start_time: String,
    pub end_time: String,
    pub payment_proof: Vec<u8>,
}

impl CreateConsultationRequest {
    pub fn validate(&self) -> Result<(), ConsultationError> {
        if self.pet_type.trim().is_empty() {
            return Err(ConsultationError::Validation("pet_type is required".to_string()));
        }
        if self.pet_name.trim().is_empty() {
            return Err(ConsultationError::Validation("pet_name is required".to_string()));
        }
        if !(0..=MAX_PET_AGE).contains(&self.pet_age) {
            return Err(ConsultationError::Validation(format!(
                "pet_age must be between 0 and {}",
                MAX_PET_AGE
            )));
        }

        let description_len = self.disease_description.chars().count();
        if !(MIN_DESCRIPTION_CHARS..=MAX_DESCRIPTION_CHARS).contains(&description_len) {
            return Err(ConsultationError::Validation(format!(
                "disease_description must be between {} and {} characters",
                MIN_DESCRIPTION_CHARS, MAX_DESCRIPTION_CHARS
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub doctor_id: Uuid,
    pub pet_type: String,
    pub pet_name: String,
    pub pet_age: i32,
    pub disease_description: String,
    pub consultation_date: String,
    pub start_time_utc: String,
    pub end_time_utc: String,
    pub start_time_local: String,
    pub end_time_local: String,
    pub payment_proof: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meet_link: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsultationPage {
    pub data: Vec<ConsultationResponse>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsultationListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum ConsultationError {
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),

    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("File is {size} bytes, the limit is {limit} bytes")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Consultation time cannot be in the past")]
    ConsultationPastDate,

    #[error("End time must be after start time")]
    InvalidInterval,

    #[error("Consultation must last at least {minimum} minutes")]
    DurationTooShort { minimum: i64 },

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Doctor does not work on {0}")]
    InvalidWorkingDay(String),

    #[error("Doctor has invalid working hours: {0}")]
    InvalidWorkingHours(String),

    #[error("Requested time is outside the doctor's working hours ({0})")]
    OutsideWorkingHours(String),

    #[error("Doctor is not available at the requested time")]
    DoctorNotAvailable,

    #[error("You already have a consultation at the requested time")]
    DuplicateBooking,

    #[error("Failed to upload payment proof: {0}")]
    UploadFailure(String),

    #[error("Failed to save consultation: {0}")]
    PersistenceFailure(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cannot book a consultation for another user")]
    Forbidden,

    #[error("Request timed out")]
    Timeout,
}

impl From<ConsultationError> for AppError {
    fn from(err: ConsultationError) -> Self {
        let message = err.to_string();
        match err {
            ConsultationError::DoctorNotFound => AppError::NotFound(message),
            ConsultationError::DoctorNotAvailable | ConsultationError::DuplicateBooking => {
                AppError::Conflict(message)
            }
            ConsultationError::UploadFailure(_) => AppError::ExternalService(message),
            ConsultationError::PersistenceFailure(_) => AppError::Database(message),
            ConsultationError::Forbidden => AppError::Forbidden(message),
            ConsultationError::Timeout => AppError::Timeout(message),
            ConsultationError::Validation(_) => AppError::ValidationError(message),
            ConsultationError::InvalidTimeFormat(_)
            | ConsultationError::InvalidFileType(_)
            | ConsultationError::FileTooLarge { .. }
            | ConsultationError::ConsultationPastDate
            | ConsultationError::InvalidInterval
            | ConsultationError::DurationTooShort { .. }
            | ConsultationError::InvalidWorkingDay(_)
            | ConsultationError::InvalidWorkingHours(_)
            | ConsultationError::OutsideWorkingHours(_) => AppError::BadRequest(message),
        }
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone_number: String,
    pub date_of_birth: NaiveDate,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// One page of users. `from_item` and `to_item` are 1-based positions and
/// both are 0 when there are no users.
#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub page_number: u32,
    pub page_size: u32,
    pub total_pages: u64,
    pub from_item: u64,
    pub to_item: u64,
    pub total_items: u64,
    pub data: Vec<UserSummary>,
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("{0}")]
    InvalidPagination(String),

    #[error("Requested page {page} is out of range ({total_pages} pages)")]
    PageOutOfRange { page: u32, total_pages: u64 },

    #[error("Failed to query users: {0}")]
    DatabaseError(String),
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        let message = err.to_string();
        match err {
            UserError::InvalidPagination(_) => AppError::ValidationError(message),
            UserError::PageOutOfRange { .. } => AppError::BadRequest(message),
            UserError::DatabaseError(_) => AppError::Database(message),
        }
    }
}

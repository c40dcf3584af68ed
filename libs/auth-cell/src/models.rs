use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::auth::TokenResponse;
use shared_models::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone_number: String,
    pub date_of_birth: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// A user row without its password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone_number: String,
    pub date_of_birth: NaiveDate,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Columns read at login. Never serialized back to a client.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Credentials {
    pub password_hash: String,
    #[serde(flatten)]
    pub account: Account,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub token: TokenResponse,
    pub user: Account,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailTaken,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Failed to issue token: {0}")]
    Token(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::EmailTaken | AuthError::UsernameTaken => AppError::Conflict(message),
            AuthError::InvalidCredentials => AppError::Auth(message),
            AuthError::Validation(_) => AppError::ValidationError(message),
            AuthError::Hashing(_) | AuthError::Token(_) => AppError::Internal(message),
            AuthError::Database(_) => AppError::Database(message),
        }
    }
}

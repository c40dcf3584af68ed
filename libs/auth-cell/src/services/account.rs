use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use shared_config::AppConfig;
use shared_database::supabase::{ApiError, SupabaseClient, UNIQUE_VIOLATION};
use shared_models::auth::{TokenResponse, ROLE_USER};
use shared_utils::jwt::issue_token;

use crate::models::{Account, AuthError, Credentials, LoginRequest, LoginResponse, RegisterRequest};
use crate::services::password::PasswordService;
use crate::services::validation::{normalize_email, validate_register_request};

const USERS: &str = "/rest/v1/users";
const ACCOUNT_COLUMNS: &str = "id,username,email,full_name,phone_number,date_of_birth,role,created_at";

pub struct AuthService {
    supabase: Arc<SupabaseClient>,
    jwt_secret: String,
    expiry_hours: i64,
}

impl AuthService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            jwt_secret: config.jwt_secret.clone(),
            expiry_hours: config.jwt_expiry_hours,
        }
    }

    async fn column_taken(&self, column: &str, value: &str) -> Result<bool, AuthError> {
        let path = format!(
            "{}?{}=eq.{}&select=id&limit=1",
            USERS,
            column,
            urlencoding::encode(value)
        );
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        Ok(!rows.is_empty())
    }

    /// Creates a `user`-role account. Email is stored lowercased.
    pub async fn register(&self, request: RegisterRequest) -> Result<Account, AuthError> {
        validate_register_request(&request)?;

        let email = normalize_email(&request.email);
        let username = request.username.trim().to_string();
        debug!("Registering account {}", email);

        if self.column_taken("email", &email).await? {
            warn!("Email already registered: {}", email);
            return Err(AuthError::EmailTaken);
        }
        if self.column_taken("username", &username).await? {
            warn!("Username already taken: {}", username);
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = PasswordService::hash_password(&request.password)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        let user_data = json!({
            "username": username,
            "email": email,
            "password_hash": password_hash,
            "full_name": request.full_name.trim(),
            "phone_number": request.phone_number.trim(),
            "date_of_birth": request.date_of_birth.format("%Y-%m-%d").to_string(),
            "role": ROLE_USER
        });

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let result: Result<Vec<Account>, _> = self
            .supabase
            .request_with_headers(
                Method::POST,
                &format!("{}?select={}", USERS, ACCOUNT_COLUMNS),
                Some(user_data),
                Some(headers),
            )
            .await;

        let rows = match result {
            Ok(rows) => rows,
            // Lost a race with a concurrent registration
            Err(e) if ApiError::is_pg_code(&e, UNIQUE_VIOLATION) => {
                warn!("Unique violation while registering {}: {}", email, e);
                return Err(if e.to_string().contains("username") {
                    AuthError::UsernameTaken
                } else {
                    AuthError::EmailTaken
                });
            }
            Err(e) => {
                error!("Failed to create account {}: {}", email, e);
                return Err(AuthError::Database(e.to_string()));
            }
        };

        let account = rows
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::Database("insert returned no row".to_string()))?;

        info!("Account {} registered", account.id);
        Ok(account)
    }

    /// Unknown email and wrong password fail the same way.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        let email = normalize_email(&request.email);
        debug!("Login attempt for {}", email);

        let path = format!(
            "{}?email=eq.{}&select={},password_hash&limit=1",
            USERS,
            urlencoding::encode(&email),
            ACCOUNT_COLUMNS
        );
        let rows: Vec<Credentials> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        let Some(credentials) = rows.into_iter().next() else {
            warn!("Login failed: no account for {}", email);
            return Err(AuthError::InvalidCredentials);
        };

        let verified = PasswordService::verify_password(&request.password, &credentials.password_hash)
            .map_err(|e| {
                error!("Stored hash for {} is unreadable: {}", credentials.account.id, e);
                AuthError::InvalidCredentials
            })?;
        if !verified {
            warn!("Login failed: wrong password for {}", email);
            return Err(AuthError::InvalidCredentials);
        }

        let account = credentials.account;
        let access_token = issue_token(
            &account.id.to_string(),
            &account.email,
            &account.role,
            &self.jwt_secret,
            self.expiry_hours,
        )
        .map_err(AuthError::Token)?;

        info!("Account {} logged in", account.id);

        Ok(LoginResponse {
            token: TokenResponse {
                access_token,
                token_type: "Bearer".to_string(),
                expires_in: self.expiry_hours * 3600,
                user_id: account.id.to_string(),
                role: account.role.clone(),
            },
            user: account,
        })
    }
}

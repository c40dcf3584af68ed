use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{JwtClaims, User};

use crate::jwt::sign_claims;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            jwt_expiry_hours: 24,
            clinic_timezone: shared_config::DEFAULT_TIMEZONE.to_string(),
            storage_bucket: "clinic-uploads".to_string(),
            max_upload_bytes: shared_config::DEFAULT_MAX_UPLOAD_BYTES,
            request_timeout_secs: 5,
            port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "user".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn owner(email: &str) -> Self {
        Self::new(email, "user")
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let claims = JwtClaims {
            sub: user.id.clone(),
            exp: Some(exp.timestamp().max(0) as u64),
            email: Some(user.email.clone()),
            role: Some(user.role.clone()),
            iat: Some(now.timestamp() as u64),
        };

        sign_claims(&claims, secret).expect("test secret must not be empty")
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned PostgREST rows for the clinic tables.
pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn user_row(user_id: &str, email: &str, role: &str) -> serde_json::Value {
        json!({
            "id": user_id,
            "username": email.split('@').next().unwrap_or(email),
            "email": email,
            "full_name": "Test Owner",
            "phone_number": "08123456789",
            "date_of_birth": "1990-01-01",
            "role": role,
            "created_at": "2025-01-01T00:00:00Z"
        })
    }

    /// A doctor working Monday to Friday, 08:00 to 20:00.
    pub fn doctor_row(doctor_id: &str, user_id: &str) -> serde_json::Value {
        json!({
            "id": doctor_id,
            "user_id": user_id,
            "full_name": "drh. Sari Wulandari",
            "last_education": "Universitas Gadjah Mada",
            "specialist_at": "Small animals",
            "profile_image": null,
            "birth_date": "1985-04-12",
            "hospital_name": "Klinik Hewan Sehat",
            "years_of_experience": 10,
            "price_per_hour": 150000.0,
            "gmeet_link": "https://meet.google.com/abc-defg-hij",
            "working_days": ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"],
            "working_hours_start": "08:00",
            "working_hours_end": "20:00",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        })
    }

    pub fn consultation_row(
        consultation_id: &str,
        user_id: &str,
        doctor_id: &str,
        start_time: &str,
        end_time: &str,
    ) -> serde_json::Value {
        json!({
            "id": consultation_id,
            "user_id": user_id,
            "doctor_id": doctor_id,
            "pet_type": "cat",
            "pet_name": "Mochi",
            "pet_age": 3,
            "disease_description": "Sneezing and watery eyes for three days",
            "consultation_date": "2025-06-02",
            "start_time": start_time,
            "end_time": end_time,
            "payment_proof": "https://example.com/payment.png",
            "created_at": "2025-06-01T00:00:00Z"
        })
    }

    pub fn error_response(message: &str, code: &str) -> serde_json::Value {
        json!({
            "message": message,
            "code": code
        })
    }
}

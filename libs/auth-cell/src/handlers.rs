use std::sync::Arc;

use axum::{
    extract::{Extension, Json, State},
    http::StatusCode,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{LoginRequest, RegisterRequest};
use crate::services::account::AuthService;

#[axum::debug_handler]
pub async fn register(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let auth_service = AuthService::new(&state);

    let account = auth_service.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "user": account
        })),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let auth_service = AuthService::new(&state);

    let response = auth_service.login(request).await?;

    Ok(Json(json!(response)))
}

pub async fn me(Extension(user): Extension<User>) -> Json<Value> {
    debug!("Returning claims for user {}", user.id);

    Json(json!({
        "user_id": user.id,
        "email": user.email,
        "role": user.role
    }))
}

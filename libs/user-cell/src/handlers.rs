use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::UserListQuery;
use crate::services::user::UserService;

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Value>, AppError> {
    let user_service = UserService::new(&state);

    let page = user_service.list_users(query.page, query.page_size).await?;

    Ok(Json(json!(page)))
}

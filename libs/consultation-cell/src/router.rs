use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, middleware, routing::post, Router};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

/// Room for the text fields around the payment proof.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn consultation_routes(state: Arc<AppConfig>) -> Router {
    let body_limit = state.max_upload_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        .route(
            "/",
            post(handlers::create_consultation).get(handlers::list_consultations),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

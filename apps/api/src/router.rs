use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use auth_cell::router::auth_routes;
use consultation_cell::router::consultation_routes;
use doctor_cell::router::doctor_routes;
use shared_config::AppConfig;
use user_cell::router::user_routes;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Pet clinic API is running!" }))
        .nest("/api/v1/auth", auth_routes(state.clone()))
        .nest("/api/v1/doctors", doctor_routes(state.clone()))
        .nest("/api/v1/consultations", consultation_routes(state.clone()))
        .nest("/api/v1/users", user_routes(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{Request, StatusCode}};
    use shared_utils::test_utils::TestConfig;
    use tower::ServiceExt;

    async fn status_of(uri: &str) -> StatusCode {
        let app = create_router(TestConfig::default().to_arc());
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        app.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_root_is_alive() {
        assert_eq!(status_of("/").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_cells_require_token() {
        assert_eq!(status_of("/api/v1/consultations").await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_of("/api/v1/users").await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_of("/api/v1/auth/me").await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        assert_eq!(status_of("/api/v1/pets").await, StatusCode::NOT_FOUND);
    }
}

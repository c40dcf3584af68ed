use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::router::auth_routes;
use auth_cell::services::password::PasswordService;
use shared_config::AppConfig;
use shared_utils::jwt::validate_token;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

fn create_test_app(config: AppConfig) -> Router {
    auth_routes(Arc::new(config))
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn register_body() -> Value {
    json!({
        "username": "owner",
        "email": "Owner@Example.com",
        "password": "s3cure-pass",
        "full_name": "Rina Hartono",
        "phone_number": "+6281234567890",
        "date_of_birth": "1992-03-14"
    })
}

#[tokio::test]
async fn test_register_creates_user_account() {
    let mock_server = MockServer::start().await;
    let user_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .and(body_partial_json(json!({
            "email": "owner@example.com",
            "username": "owner",
            "role": "user"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::user_row(&user_id, "owner@example.com", "user")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(TestConfig::with_supabase_url(&mock_server.uri()).to_app_config());
    let response = app.oneshot(json_request("/register", register_body())).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["user"]["id"], user_id);
    assert_eq!(json["user"]["role"], "user");
    assert!(json["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_is_conflict() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.owner@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": Uuid::new_v4() }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = create_test_app(TestConfig::with_supabase_url(&mock_server.uri()).to_app_config());
    let response = app.oneshot(json_request("/register", register_body())).await.unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Email already registered");
}

#[tokio::test]
async fn test_register_unique_violation_race_is_conflict() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(409).set_body_json(MockSupabaseResponses::error_response(
            "duplicate key value violates unique constraint \"users_username_key\"",
            "23505",
        )))
        .mount(&mock_server)
        .await;

    let app = create_test_app(TestConfig::with_supabase_url(&mock_server.uri()).to_app_config());
    let response = app.oneshot(json_request("/register", register_body())).await.unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Username already taken");
}

#[tokio::test]
async fn test_register_short_password_is_bad_request() {
    let app = create_test_app(TestConfig::default().to_app_config());

    let mut body = register_body();
    body["password"] = json!("short");
    let response = app.oneshot(json_request("/register", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

async fn mount_account(server: &MockServer, user_id: &str, password: &str) {
    let mut row = MockSupabaseResponses::user_row(user_id, "owner@example.com", "user");
    row["password_hash"] = json!(PasswordService::hash_password(password).unwrap());

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.owner@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_issues_verifiable_token() {
    let mock_server = MockServer::start().await;
    let user_id = Uuid::new_v4().to_string();
    mount_account(&mock_server, &user_id, "s3cure-pass").await;

    let config = TestConfig::with_supabase_url(&mock_server.uri());
    let app = create_test_app(config.to_app_config());

    let body = json!({ "email": "OWNER@example.com", "password": "s3cure-pass" });
    let response = app.oneshot(json_request("/login", body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["token_type"], "Bearer");
    assert_eq!(json["expires_in"], 24 * 3600);
    assert_eq!(json["user"]["id"], user_id);

    let user = validate_token(json["access_token"].as_str().unwrap(), &config.jwt_secret).unwrap();
    assert_eq!(user.id, user_id);
    assert_eq!(user.role.as_deref(), Some("user"));
}

#[tokio::test]
async fn test_login_failures_share_one_message() {
    let mock_server = MockServer::start().await;
    mount_account(&mock_server, &Uuid::new_v4().to_string(), "s3cure-pass").await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.nobody@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_supabase_url(&mock_server.uri());

    let wrong_password = create_test_app(config.to_app_config())
        .oneshot(json_request(
            "/login",
            json!({ "email": "owner@example.com", "password": "not-the-password" }),
        ))
        .await
        .unwrap();
    let unknown_email = create_test_app(config.to_app_config())
        .oneshot(json_request(
            "/login",
            json!({ "email": "nobody@example.com", "password": "s3cure-pass" }),
        ))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(wrong_password).await, body_json(unknown_email).await);
}

#[tokio::test]
async fn test_me_echoes_token_claims() {
    let config = TestConfig::default();
    let user = TestUser::admin("admin@example.com");
    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, None);

    let request = Request::builder()
        .method("GET")
        .uri("/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = create_test_app(config.to_app_config()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["user_id"], user.id);
    assert_eq!(json["role"], "admin");
}

#[tokio::test]
async fn test_me_rejects_expired_token() {
    let config = TestConfig::default();
    let token = JwtTestUtils::create_expired_token(&TestUser::default(), &config.jwt_secret);

    let request = Request::builder()
        .method("GET")
        .uri("/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = create_test_app(config.to_app_config()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

//! The reqwest adapter against a local axum stand-in for reqres.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use user_admin::api::{HttpUsersApi, UsersApi};
use user_admin::config::ApiConfig;
use user_admin::domain::{Credentials, Token, UserPatch};
use user_admin::error::{AdminError, LOGIN_FAILED, UNEXPECTED_ERROR};
use user_admin::views::login::login_error_message;

#[derive(Clone, Default)]
struct Recorded {
    requests: Arc<Mutex<Vec<String>>>,
    api_keys: Arc<Mutex<Vec<String>>>,
}

impl Recorded {
    fn record(&self, headers: &HeaderMap, line: String) {
        self.requests.lock().unwrap().push(line);
        if let Some(key) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
            self.api_keys.lock().unwrap().push(key.to_string());
        }
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[derive(Deserialize)]
struct PageParams {
    page: u32,
}

async fn login(State(rec): State<Recorded>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    rec.record(&headers, "POST /login".to_string());
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match (email, password) {
        ("broken@reqres.in", _) => (StatusCode::BAD_GATEWAY, "<html>upstream down</html>").into_response(),
        (_, "") => (StatusCode::BAD_REQUEST, Json(json!({ "message": "Missing password" }))).into_response(),
        ("nobody@reqres.in", _) => (StatusCode::BAD_REQUEST, Json(json!({ "error": "user not found" }))).into_response(),
        _ => Json(json!({ "token": "QpwL5tke4Pnpja7X4" })).into_response(),
    }
}

async fn list_users(State(rec): State<Recorded>, headers: HeaderMap, Query(params): Query<PageParams>) -> Response {
    rec.record(&headers, format!("GET /users?page={}", params.page));
    if params.page == 99 {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    Json(json!({
        "page": params.page,
        "per_page": 6,
        "total": 12,
        "total_pages": 2,
        "data": [{
            "id": 7,
            "email": "michael.lawson@reqres.in",
            "first_name": "Michael",
            "last_name": "Lawson",
            "avatar": "https://reqres.in/img/faces/7-image.jpg"
        }],
        "support": { "url": "https://contentcaddy.io", "text": "Tired of writing endless social media content?" }
    }))
    .into_response()
}

async fn update_user(
    State(rec): State<Recorded>,
    headers: HeaderMap,
    Path(id): Path<u32>,
    Json(body): Json<Value>,
) -> Response {
    rec.record(&headers, format!("PATCH /users/{} {}", id, body));
    let mut echo = body;
    echo["updatedAt"] = json!("2024-01-01T00:00:00.000Z");
    Json(echo).into_response()
}

async fn delete_user(State(rec): State<Recorded>, headers: HeaderMap, Path(id): Path<u32>) -> StatusCode {
    rec.record(&headers, format!("DELETE /users/{}", id));
    StatusCode::NO_CONTENT
}

async fn serve() -> (String, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/api/login", post(login))
        .route("/api/users", get(list_users))
        .route("/api/users/{id}", patch(update_user).delete(delete_user))
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/api", addr), recorded)
}

fn api(base_url: &str, api_key: Option<&str>) -> HttpUsersApi {
    let mut config = ApiConfig::new(base_url).unwrap();
    config.api_key = api_key.map(str::to_string);
    HttpUsersApi::new(&config).unwrap()
}

#[tokio::test]
async fn test_login_returns_token_and_sends_api_key() {
    let (base_url, recorded) = serve().await;
    let api = api(&base_url, Some("reqres-free-v1"));

    let response = api
        .login(&Credentials::new("eve.holt@reqres.in", "cityslicka"))
        .await
        .unwrap();

    assert_eq!(response.token, Token::new("QpwL5tke4Pnpja7X4"));
    assert_eq!(*recorded.api_keys.lock().unwrap(), vec!["reqres-free-v1".to_string()]);
}

#[tokio::test]
async fn test_login_rejection_uses_body_message() {
    let (base_url, _) = serve().await;
    let api = api(&base_url, None);

    let err = api.login(&Credentials::new("eve.holt@reqres.in", "")).await.unwrap_err();
    assert_eq!(err, AdminError::Auth("Missing password".to_string()));
    assert_eq!(login_error_message(&err), "Missing password");

    let err = api
        .login(&Credentials::new("nobody@reqres.in", "secret"))
        .await
        .unwrap_err();
    assert_eq!(err, AdminError::Auth(LOGIN_FAILED.to_string()));
    assert_eq!(login_error_message(&err), LOGIN_FAILED);
}

#[tokio::test]
async fn test_login_rejection_without_json_is_unexpected() {
    let (base_url, _) = serve().await;
    let err = api(&base_url, None)
        .login(&Credentials::new("broken@reqres.in", "secret"))
        .await
        .unwrap_err();

    assert!(matches!(err, AdminError::Decode(_)));
    assert_eq!(login_error_message(&err), UNEXPECTED_ERROR);
}

#[tokio::test]
async fn test_login_without_response_is_unexpected() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = api(&format!("http://{}/api", addr), None);
    let err = api
        .login(&Credentials::new("eve.holt@reqres.in", "cityslicka"))
        .await
        .unwrap_err();

    assert!(matches!(err, AdminError::Network(_)));
    assert_eq!(login_error_message(&err), UNEXPECTED_ERROR);
}

#[tokio::test]
async fn test_list_users_parses_envelope() {
    let (base_url, recorded) = serve().await;
    let api = api(&base_url, None);

    let envelope = api.list_users(2).await.unwrap();
    assert_eq!(envelope.page, 2);
    assert_eq!(envelope.total_pages, 2);
    assert_eq!(envelope.data[0].email, "michael.lawson@reqres.in");
    assert_eq!(recorded.requests(), vec!["GET /users?page=2".to_string()]);
}

#[tokio::test]
async fn test_list_users_server_error_keeps_status() {
    let (base_url, _) = serve().await;
    let err = api(&base_url, None).list_users(99).await.unwrap_err();
    assert_eq!(err, AdminError::Status { status: 500 });
}

#[tokio::test]
async fn test_update_sends_only_present_fields() {
    let (base_url, recorded) = serve().await;
    let api = api(&base_url, None);

    let patch = UserPatch {
        email: Some("emma@example.com".to_string()),
        ..Default::default()
    };
    let updated = api.update_user(3, &patch).await.unwrap();

    assert_eq!(updated.id, Some(3));
    assert_eq!(updated.email.as_deref(), Some("emma@example.com"));
    assert!(updated.first_name.is_none());
    assert_eq!(updated.updated_at.as_deref(), Some("2024-01-01T00:00:00.000Z"));
    assert_eq!(
        recorded.requests(),
        vec![r#"PATCH /users/3 {"email":"emma@example.com"}"#.to_string()]
    );
}

#[tokio::test]
async fn test_delete_accepts_no_content() {
    let (base_url, recorded) = serve().await;
    api(&base_url, None).delete_user(4).await.unwrap();
    assert_eq!(recorded.requests(), vec!["DELETE /users/4".to_string()]);
}

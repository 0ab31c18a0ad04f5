use axum::{
    body::Body,
    http::{self, Request, StatusCode},
};
use bookshelf::{config::Config, controllers::auth::AuthResponse, model::User};
use http_body_util::BodyExt;
use serde_json::json;

use crate::{AppStateTest, PASSWORD};

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn count_users(test_state: &AppStateTest) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(test_state.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn should_be_error_when_body_is_missing() {
    let test_state = AppStateTest::new(false).await;

    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn should_be_error_when_body_is_invalid() {
    let test_state = AppStateTest::new(false).await;

    let request = json_request(
        "POST",
        "/auth/register",
        json!({ "username": "reader" }),
    );
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let request = json_request(
        "POST",
        "/auth/register",
        json!({ "username": "r", "email": "not-an-email", "password": "123" }),
    );
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = json_request(
        "POST",
        "/auth/register",
        json!({
            "username": "reader",
            "email": "reader@localhost",
            "password": "this-password-is-definitely-too-long",
        }),
    );
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn should_be_error_when_has_incorrect_type() {
    let test_state = AppStateTest::new(false).await;

    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .body(Body::from(
            serde_json::to_vec(&json!({ "username": "reader", "password": PASSWORD })).unwrap(),
        ))
        .unwrap();

    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn should_be_error_when_exists_has_no_parameters() {
    let test_state = AppStateTest::new(false).await;

    let request = Request::builder()
        .uri("/auth/exists")
        .body(Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn should_be_error_when_registration_is_disabled() {
    let mut config = Config::new().unwrap();
    config.application.allow_registration = false;

    let test_state = AppStateTest::new_with_config(false, config).await;

    let request = json_request(
        "POST",
        "/auth/register",
        json!({ "username": "reader", "email": "reader@localhost", "password": PASSWORD }),
    );

    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_register_and_login() {
    let mut test_state = AppStateTest::new(true).await;

    assert_eq!(count_users(&test_state).await, 0);

    let request = json_request(
        "POST",
        "/auth/register",
        json!({ "username": "reader", "email": "reader@localhost", "password": PASSWORD }),
    );
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response_body = response.into_body().collect().await.unwrap().to_bytes();
    let user: User = serde_json::from_slice(&response_body).unwrap();
    assert_eq!(user.username, "reader");
    assert_eq!(count_users(&test_state).await, 1);

    let request = json_request(
        "POST",
        "/auth/login",
        json!({ "username": "reader", "password": PASSWORD }),
    );
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response_body = response.into_body().collect().await.unwrap().to_bytes();
    let _: AuthResponse = serde_json::from_slice(&response_body).unwrap();

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_be_conflict_when_username_is_taken() {
    let mut test_state = AppStateTest::new(true).await;

    let user = test_state.generate_user().await;

    let request = json_request(
        "POST",
        "/auth/register",
        json!({ "username": user.username, "email": "other@localhost", "password": PASSWORD }),
    );
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(count_users(&test_state).await, 1);

    let request = Request::builder()
        .uri(format!("/auth/exists?username={}&email=nobody@localhost", user.username))
        .body(Body::empty())
        .unwrap();
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response_body = response.into_body().collect().await.unwrap().to_bytes();
    let exists: serde_json::Value = serde_json::from_slice(&response_body).unwrap();
    assert_eq!(exists, json!({ "username": true, "email": false }));

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_be_conflict_when_email_differs_only_in_case() {
    let mut test_state = AppStateTest::new(true).await;

    let user = test_state.generate_user().await;

    let request = json_request(
        "POST",
        "/auth/register",
        json!({
            "username": "another_reader",
            "email": user.email.to_uppercase(),
            "password": PASSWORD,
        }),
    );
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(count_users(&test_state).await, 1);

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_be_error_when_credential_is_invalid() {
    let mut test_state = AppStateTest::new(true).await;

    let user = test_state.generate_user().await;

    let request = json_request(
        "POST",
        "/auth/login",
        json!({ "username": user.username, "password": "incorrect" }),
    );
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = json_request(
        "POST",
        "/auth/login",
        json!({ "username": "nobody", "password": PASSWORD }),
    );
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_return_user_token_on_mobile_login() {
    let mut test_state = AppStateTest::new(true).await;

    let user = test_state.generate_user().await;

    let mut request = json_request(
        "POST",
        "/api/v1/auth",
        json!({ "username": user.username, "password": PASSWORD }),
    );
    request
        .headers_mut()
        .insert("x-app-key", test_state.app_key().parse().unwrap());

    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response_body = response.into_body().collect().await.unwrap().to_bytes();
    let auth: AuthResponse = serde_json::from_slice(&response_body).unwrap();
    assert_eq!(auth.token, user.auth_token.to_string());

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_change_password_after_verifying_old_one() {
    let mut test_state = AppStateTest::new(true).await;

    let (user, token) = test_state.generate_jwt_with_user().await;

    let mut request = json_request(
        "PUT",
        "/me/password",
        json!({ "old_password": "wrong-old", "new_password": "new-secret" }),
    );
    request.headers_mut().insert(
        http::header::AUTHORIZATION,
        format!("bearer {}", token).parse().unwrap(),
    );
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let mut request = json_request(
        "PUT",
        "/me/password",
        json!({ "old_password": PASSWORD, "new_password": "new-secret" }),
    );
    request.headers_mut().insert(
        http::header::AUTHORIZATION,
        format!("bearer {}", token).parse().unwrap(),
    );
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let request = json_request(
        "POST",
        "/auth/login",
        json!({ "username": user.username, "password": "new-secret" }),
    );
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    test_state.cleanup().await;
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::http::StatusCode;
use axum::response::IntoResponse;
use campus_events::error::AppError;

mod common;

async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    (status, common::body_json(response).await)
}

#[tokio::test]
async fn test_client_errors_carry_details() {
    let (status, body) = render(AppError::Forbidden("Organizer role required".to_string())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
    assert_eq!(body["details"], "Organizer role required");

    let (status, body) = render(AppError::NotFound("Event".to_string())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = render(AppError::Conflict("taken".to_string())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_auth_errors_are_401() {
    for err in [
        AppError::Unauthorized,
        AppError::InvalidToken,
        AppError::InvalidCredentials,
    ] {
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.get("details").is_none());
    }
}

#[tokio::test]
async fn test_session_loading_is_retryable() {
    let (status, body) = render(AppError::SessionLoading).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "session_loading");
}

#[tokio::test]
async fn test_server_errors_hide_details() {
    let (status, body) = render(AppError::Database("connection reset by peer".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "database_error");
    assert!(body.get("details").is_none());

    let (status, body) = render(AppError::IdentityProvider("HTTP 500".to_string())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.get("details").is_none());

    let (status, _) = render(AppError::Internal(anyhow::anyhow!("boom"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_validation_errors_become_bad_request() {
    use validator::Validate;

    let form: campus_events::models::RegistrationForm =
        serde_json::from_value(serde_json::json!({
            "Name": "",
            "College Email ID": "ada@college.edu",
            "Personal Email ID": "ada@example.com",
            "Contact Number": "5550100"
        }))
        .unwrap();

    let err: AppError = form.validate().unwrap_err().into();
    assert!(matches!(err, AppError::BadRequest(_)));
}

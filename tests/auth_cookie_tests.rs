// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Auth cookie attribute tests.
//!
//! These tests verify the session cookies set on sign-in, and that removal
//! attributes on logout match the creation attributes for localhost and
//! production-style frontends.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use serde_json::json;
use tower::ServiceExt;

mod common;

fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

async fn signup_response(app: &axum::Router) -> Response {
    common::send_json(
        app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({
            "email": "ada@example.com",
            "password": "correct-horse",
            "name": "Ada",
            "userType": "user"
        })),
    )
    .await
}

async fn logout_with_cookies(app: axum::Router) -> Response {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/auth/logout")
            .header(header::COOKIE, "campus_token=test; campus_logged_in=1")
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_signup_sets_session_cookies_localhost() {
    let (app, _, _) = common::create_test_app_with_frontend_url("http://localhost:5173");

    let response = signup_response(&app).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let set_cookies = set_cookie_headers(&response);
    let token_cookie = find_cookie(&set_cookies, "campus_token");
    let hint_cookie = find_cookie(&set_cookies, "campus_logged_in");

    assert!(token_cookie.contains("Path=/"));
    assert!(token_cookie.contains("HttpOnly"));
    assert!(token_cookie.contains("SameSite=Lax"));
    assert!(token_cookie.contains("Max-Age=2592000"));
    assert!(!token_cookie.contains("Secure"));

    assert!(hint_cookie.starts_with("campus_logged_in=1"));
    assert!(hint_cookie.contains("Path=/"));
    assert!(!hint_cookie.contains("HttpOnly"));
    assert!(!hint_cookie.contains("Secure"));
}

#[tokio::test]
async fn test_signup_sets_secure_cookies_for_https_frontend() {
    let (app, _, _) = common::create_test_app_with_frontend_url("https://events.example.edu");

    let response = signup_response(&app).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let set_cookies = set_cookie_headers(&response);
    let token_cookie = find_cookie(&set_cookies, "campus_token");
    let hint_cookie = find_cookie(&set_cookies, "campus_logged_in");

    assert!(token_cookie.contains("Secure"));
    assert!(token_cookie.contains("HttpOnly"));
    assert!(hint_cookie.contains("Secure"));
    assert!(!token_cookie.contains("Domain="));
}

#[tokio::test]
async fn test_cookie_token_authenticates() {
    let (app, _, _) = common::create_test_app();
    let token = common::sign_up(&app, "ada@example.com", "user").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/session")
                .header(header::COOKIE, format!("campus_token={}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_cookie_removal_localhost_attributes() {
    let (app, _, _) = common::create_test_app_with_frontend_url("http://localhost:5173");

    let response = logout_with_cookies(app).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let set_cookies = set_cookie_headers(&response);
    let token_cookie = find_cookie(&set_cookies, "campus_token");
    let hint_cookie = find_cookie(&set_cookies, "campus_logged_in");

    assert!(token_cookie.contains("Path=/"));
    assert!(token_cookie.contains("HttpOnly"));
    assert!(token_cookie.contains("SameSite=Lax"));
    assert!(token_cookie.contains("Max-Age=0"));
    assert!(!token_cookie.contains("Secure"));
    assert!(!token_cookie.contains("Domain="));

    assert!(hint_cookie.contains("Path=/"));
    assert!(hint_cookie.contains("SameSite=Lax"));
    assert!(hint_cookie.contains("Max-Age=0"));
    assert!(!hint_cookie.contains("HttpOnly"));
    assert!(!hint_cookie.contains("Secure"));
}

#[tokio::test]
async fn test_logout_cookie_removal_production_attributes() {
    let (app, _, _) = common::create_test_app_with_frontend_url("https://events.example.edu");

    let response = logout_with_cookies(app).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let set_cookies = set_cookie_headers(&response);
    let token_cookie = find_cookie(&set_cookies, "campus_token");
    let hint_cookie = find_cookie(&set_cookies, "campus_logged_in");

    assert!(token_cookie.contains("HttpOnly"));
    assert!(token_cookie.contains("Max-Age=0"));
    assert!(token_cookie.contains("Secure"));

    assert!(hint_cookie.contains("Max-Age=0"));
    assert!(hint_cookie.contains("Secure"));
    assert!(!hint_cookie.contains("HttpOnly"));
}

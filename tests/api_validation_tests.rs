// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation tests.

use axum::http::StatusCode;
use campus_events::db::EventStore;
use serde_json::json;

mod common;
use common::{body_json, send_json, sign_up};

#[tokio::test]
async fn test_signup_rejects_invalid_email() {
    let (app, _, _) = common::create_test_app();

    let response = send_json(
        &app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({
            "email": "not-an-email",
            "password": "correct-horse",
            "name": "Ada",
            "userType": "user"
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_signup_rejects_short_password() {
    let (app, state, _) = common::create_test_app();

    let response = send_json(
        &app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({
            "email": "ada@example.com",
            "password": "abc",
            "name": "Ada",
            "userType": "user"
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(state.sessions.is_empty(), "no session for a rejected sign-up");
}

#[tokio::test]
async fn test_signup_requires_user_type() {
    let (app, _, _) = common::create_test_app();

    let response = send_json(
        &app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({
            "email": "ada@example.com",
            "password": "correct-horse",
            "name": "Ada",
            "userType": ""
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_event_requires_title() {
    let (app, _, _) = common::create_test_app();
    let token = sign_up(&app, "club@example.com", "host").await;

    let response = send_json(
        &app,
        "POST",
        "/api/organizer/events",
        Some(&token),
        Some(json!({
            "title": "",
            "category": "Technical",
            "date": "2025-04-20",
            "location": "Lab 3"
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "bad_request");
}

#[tokio::test]
async fn test_register_rejects_short_contact_number() {
    let (app, _, db) = common::create_test_app();
    db.create_event(&common::test_event("evt1", "host1", "Rust Meetup"))
        .await
        .unwrap();
    let token = sign_up(&app, "ada@example.com", "user").await;

    let mut form = common::test_form_json();
    form["Contact Number"] = json!("12");

    let response = send_json(
        &app,
        "POST",
        "/api/events/evt1/register",
        Some(&token),
        Some(form),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

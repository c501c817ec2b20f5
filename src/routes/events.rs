// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event catalog and attendee registration routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{Event, Registration, RegistrationForm, RegistrationWithEvent};
use crate::services::EventQuery;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Public catalog routes.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events))
        .route("/events/{id}", get(get_event))
}

/// Attendee routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/events/{id}/register", post(register))
        .route("/api/registrations", get(list_my_registrations))
        .route("/api/registrations/{id}", get(get_registration))
}

// ─── Catalog ─────────────────────────────────────────────────

/// Search events, newest first.
async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventQuery>,
) -> Result<Json<Vec<Event>>> {
    let events = state.events.search(&query).await?;
    tracing::debug!(
        q = ?query.q,
        category = ?query.category,
        count = events.len(),
        "Event search"
    );
    Ok(Json(events))
}

async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Event>> {
    Ok(Json(state.events.get(&id).await?))
}

// ─── Registration ────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RegisterResponse {
    pub registration_id: String,
    /// `false` if the user was already registered
    pub created: bool,
}

/// Register the signed-in user for an event.
///
/// Repeating the request returns the original registration ID with 200.
async fn register(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<String>,
    Json(form): Json<RegistrationForm>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let outcome = state
        .registrations
        .register(&event_id, &user.uid, form)
        .await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(RegisterResponse {
            registration_id: outcome.id,
            created: outcome.created,
        }),
    ))
}

/// The signed-in user's registrations with event titles.
async fn list_my_registrations(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<RegistrationWithEvent>>> {
    Ok(Json(
        state
            .registrations
            .list_for_user_with_titles(&user.uid)
            .await?,
    ))
}

async fn get_registration(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Registration>> {
    Ok(Json(state.registrations.get_for_user(&user.uid, &id).await?))
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Organizer routes.
//!
//! Mounted behind both `require_auth` and `require_organizer` in
//! routes/mod.rs. Ownership of individual events is checked here.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{Event, EventPatch, NewEvent, Registration};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/organizer/events", get(list_my_events).post(create_event))
        .route(
            "/api/organizer/events/{id}",
            axum::routing::put(update_event).delete(delete_event),
        )
        .route(
            "/api/organizer/events/{id}/registrations",
            get(list_event_registrations),
        )
}

/// Events owned by the signed-in organizer, newest first.
async fn list_my_events(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Event>>> {
    Ok(Json(state.events.list_by_organizer(&user.uid).await?))
}

async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<NewEvent>,
) -> Result<(StatusCode, Json<Event>)> {
    let event = state.events.create(&user.uid, body).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn update_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(patch): Json<EventPatch>,
) -> Result<Json<Event>> {
    Ok(Json(state.events.update(&user.uid, &id, patch).await?))
}

async fn delete_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.events.delete(&user.uid, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Registrant roster for one of the organizer's events.
async fn list_event_registrations(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Registration>>> {
    state.events.owned(&user.uid, &id).await?;
    let roster = state.registrations.list_for_event(&id).await?;
    tracing::debug!(event_id = %id, count = roster.len(), "Roster fetched");
    Ok(Json(roster))
}

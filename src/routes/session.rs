// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session state and role assignment.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Identity, Profile, Role};
use crate::session::{ProfileFetchError, RoleAssignment, SessionPhase, SessionSnapshot};
use crate::AppState;
use axum::{
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/session", get(get_session))
        .route("/api/session/role", post(set_role))
        .route("/api/session/refresh", post(refresh_session))
}

/// Session state as seen by the frontend.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub identity: Option<Identity>,
    pub profile: Option<Profile>,
    pub role: Option<Role>,
    pub loading: bool,
    pub phase: SessionPhase,
    /// Post-sign-in destination; present on the first read after resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl SessionResponse {
    pub fn new(snapshot: SessionSnapshot, redirect: Option<String>) -> Self {
        Self {
            role: snapshot.role(),
            identity: snapshot.identity,
            profile: snapshot.profile,
            loading: snapshot.loading,
            phase: snapshot.phase,
            redirect,
        }
    }
}

/// Current session state.
///
/// The first read after the profile resolves also carries the redirect the
/// client should follow; later reads omit it.
async fn get_session(Extension(user): Extension<AuthUser>) -> Json<SessionResponse> {
    let resolver = user.session.resolver();
    let snapshot = resolver.snapshot();
    let redirect = if snapshot.loading {
        None
    } else {
        resolver.take_transition()
    };
    Json(SessionResponse::new(snapshot, redirect))
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}

/// Confirm the signed-in user's role.
///
/// Only the role the account type grants is accepted; anything else is 403.
async fn set_role(
    Extension(user): Extension<AuthUser>,
    Json(body): Json<SetRoleRequest>,
) -> Result<Json<SessionResponse>> {
    let resolver = user.session.resolver();

    match resolver.set_role(body.role).await {
        RoleAssignment::Unchanged | RoleAssignment::Applied => {}
        RoleAssignment::NotPermitted { .. } => {
            return Err(AppError::Forbidden(
                "Role not permitted for this account".to_string(),
            ))
        }
        RoleAssignment::NoIdentity => return Err(AppError::Unauthorized),
        RoleAssignment::ProfileNotFound => {
            return Err(AppError::NotFound("No profile found for this account".to_string()))
        }
        RoleAssignment::ProfileUnavailable => return Err(AppError::SessionLoading),
    }

    Ok(Json(SessionResponse::new(resolver.snapshot(), None)))
}

/// Re-fetch the profile, recovering a session that settled without one.
async fn refresh_session(Extension(user): Extension<AuthUser>) -> Result<Json<SessionResponse>> {
    let snapshot = match user.session.resolver().refresh().await {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => return Err(AppError::Unauthorized),
        Err(ProfileFetchError::NotFound) => user.session.resolver().snapshot(),
        Err(ProfileFetchError::Transient(e)) => return Err(AppError::Database(e)),
    };

    Ok(Json(SessionResponse::new(snapshot, None)))
}

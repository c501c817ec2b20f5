// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Organizer role gate.

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::models::Role;
use axum::{extract::Request, middleware::Next, response::Response, Extension};
use std::time::Duration;

/// How long a gated request waits for an in-flight profile resolution.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Middleware that admits only sessions resolved to the organizer role.
///
/// Runs inside [`require_auth`](crate::middleware::require_auth). A session
/// still resolving is awaited; one that ended without a profile is rejected.
pub async fn require_organizer(
    Extension(user): Extension<AuthUser>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let snapshot = tokio::time::timeout(SETTLE_TIMEOUT, user.session.resolver().settled())
        .await
        .map_err(|_| AppError::SessionLoading)?;

    match snapshot.role() {
        Some(Role::Organizer) => Ok(next.run(request).await),
        Some(Role::User) => {
            tracing::debug!(uid = %user.uid, "Organizer route denied to user");
            Err(AppError::Forbidden("Organizer role required".to_string()))
        }
        None => Err(AppError::Forbidden(
            "No profile found for this account".to_string(),
        )),
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Email/password authentication routes.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{
    clear_session_cookies, create_jwt, decode_jwt, session_cookies, session_expiry, TOKEN_COOKIE,
};
use crate::models::{derive_role, Identity, Profile};
use crate::routes::session::SessionResponse;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// "user", "host", ...
    #[validate(length(min = 1, max = 50))]
    pub user_type: String,
    #[serde(default)]
    pub contact_details: String,
    #[serde(default)]
    pub description: String,
    /// Where to send a non-organizer after sign-in
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Response for a successful sign-in or sign-up.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Session JWT, also set as an HttpOnly cookie
    pub token: String,
    pub session: SessionResponse,
}

/// Only same-site paths are accepted as post-sign-in destinations.
///
/// Browsers read a leading `/\` like `//`, so both are rejected.
fn sanitize_next(next: Option<String>) -> Option<String> {
    next.filter(|n| {
        let mut chars = n.chars();
        chars.next() == Some('/')
            && !matches!(chars.next(), Some('/') | Some('\\'))
            && !n.chars().any(char::is_control)
    })
}

/// Start a session for `identity` and issue its token and cookies.
fn start_session(
    state: &AppState,
    jar: CookieJar,
    identity: Identity,
    next: Option<String>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    let expires_at = session_expiry();
    let session = state
        .sessions
        .create(identity.clone(), sanitize_next(next), expires_at)?;
    let token = create_jwt(
        &identity,
        session.id(),
        expires_at,
        &state.config.jwt_signing_key,
    )?;

    let jar = session_cookies(jar, token.clone(), &state.config.frontend_url);
    let body = AuthResponse {
        token,
        session: SessionResponse::new(session.resolver().snapshot(), None),
    };
    Ok((jar, Json(body)))
}

/// Create an account and its profile, then sign in.
async fn signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>)> {
    body.validate()?;

    let identity = state.identity.sign_up(&body.email, &body.password).await?;

    let user_type = body.user_type.trim().to_lowercase();
    let role = derive_role(Some(&user_type), None);
    let profile = Profile {
        uid: identity.uid.clone(),
        name: body.name,
        email: identity.email.clone().unwrap_or(body.email),
        contact_details: body.contact_details,
        description: body.description,
        // Hosts are approved manually.
        is_approved: Some(user_type == "user"),
        user_type: Some(user_type),
        role: Some(role),
        updated_at: Some(chrono::Utc::now()),
        ..Profile::default()
    };
    state.profiles.create_profile(&profile).await?;

    tracing::info!(uid = %identity.uid, role = %role, "User signed up");

    let (jar, response) = start_session(&state, jar, identity, body.next)?;
    Ok((StatusCode::CREATED, jar, response))
}

/// Sign in with email and password.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    body.validate()?;

    let identity = match state
        .identity
        .sign_in_with_password(&body.email, &body.password)
        .await
    {
        Ok(identity) => identity,
        Err(AppError::InvalidCredentials) => {
            tracing::info!("Sign-in rejected: invalid credentials");
            return Err(AppError::InvalidCredentials);
        }
        Err(e) => return Err(e),
    };

    tracing::info!(uid = %identity.uid, "User signed in");
    start_session(&state, jar, identity, body.next)
}

/// Sign out: end the session and clear the cookies.
///
/// Always succeeds, so a client with a stale or missing token can still
/// clear its cookies.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> (StatusCode, CookieJar) {
    let token = jar
        .get(TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(str::to_string)
        });

    if let Some(claims) = token.and_then(|t| decode_jwt(&t, &state.config.jwt_signing_key).ok()) {
        state.sessions.end(&claims.sid, claims.exp as u64);

        let identity = Identity {
            uid: claims.sub,
            email: claims.email,
        };
        if let Err(e) = state.identity.sign_out(&identity).await {
            tracing::warn!(uid = %identity.uid, error = %e, "Identity provider sign-out failed");
        }
        tracing::info!(uid = %identity.uid, "User signed out");
    }

    (
        StatusCode::NO_CONTENT,
        clear_session_cookies(jar, &state.config.frontend_url),
    )
}

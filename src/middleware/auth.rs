// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT session middleware and session cookies.

use crate::models::Identity;
use crate::session::SessionHandle;
use crate::time_utils::unix_now;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session token cookie (HttpOnly).
pub const TOKEN_COOKIE: &str = "campus_token";

/// Logged-in hint cookie readable by the frontend.
pub const LOGGED_IN_COOKIE: &str = "campus_logged_in";

/// Session lifetime.
pub const SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (identity provider uid)
    pub sub: String,
    /// Session ID in the session registry
    pub sid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated caller extracted from the session JWT.
#[derive(Clone)]
pub struct AuthUser {
    pub uid: String,
    pub session: Arc<SessionHandle>,
}

/// Middleware that requires valid JWT authentication.
///
/// The token comes from the session cookie or an `Authorization: Bearer`
/// header. A valid token whose session is not in memory (after a restart)
/// restores the session and re-resolves its profile; a signed-out session
/// stays rejected.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get(TOKEN_COOKIE) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header {
            Some(h) if h.starts_with("Bearer ") => h[7..].to_string(),
            _ => return Err(StatusCode::UNAUTHORIZED),
        }
    };

    let claims = decode_jwt(&token, &state.config.jwt_signing_key)
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    if claims.sub.is_empty() || claims.sid.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let session = state
        .sessions
        .restore(
            &claims.sid,
            Identity {
                uid: claims.sub.clone(),
                email: claims.email,
            },
            claims.exp as u64,
        )
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(AuthUser {
        uid: claims.sub,
        session,
    });

    Ok(next.run(request).await)
}

/// Decode and validate a session JWT.
pub fn decode_jwt(token: &str, signing_key: &[u8]) -> jsonwebtoken::errors::Result<Claims> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &key, &validation).map(|data| data.claims)
}

/// Expiry (Unix timestamp) for a session starting now.
pub fn session_expiry() -> u64 {
    unix_now() + SESSION_TTL_SECS
}

/// Create a JWT for a user session expiring at `expires_at`.
pub fn create_jwt(
    identity: &Identity,
    sid: &str,
    expires_at: u64,
    signing_key: &[u8],
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        sub: identity.uid.clone(),
        sid: sid.to_string(),
        email: identity.email.clone(),
        iat: unix_now() as usize,
        exp: expires_at as usize,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Cookies are `Secure` unless the frontend is served over plain HTTP.
fn secure_cookies(frontend_url: &str) -> bool {
    !frontend_url.starts_with("http://")
}

/// Add the session cookies for a freshly issued token.
pub fn session_cookies(jar: CookieJar, token: String, frontend_url: &str) -> CookieJar {
    let secure = secure_cookies(frontend_url);
    let max_age = time_max_age();

    jar.add(
        Cookie::build((TOKEN_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(secure)
            .max_age(max_age),
    )
    .add(
        Cookie::build((LOGGED_IN_COOKIE, "1"))
            .path("/")
            .same_site(SameSite::Lax)
            .secure(secure)
            .max_age(max_age),
    )
}

/// Expire the session cookies with the attributes they were set with.
pub fn clear_session_cookies(jar: CookieJar, frontend_url: &str) -> CookieJar {
    let secure = secure_cookies(frontend_url);

    jar.remove(
        Cookie::build(TOKEN_COOKIE)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(secure),
    )
    .remove(
        Cookie::build(LOGGED_IN_COOKIE)
            .path("/")
            .same_site(SameSite::Lax)
            .secure(secure),
    )
}

fn time_max_age() -> time::Duration {
    time::Duration::seconds(SESSION_TTL_SECS as i64)
}

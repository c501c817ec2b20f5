// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider clients.
//!
//! The service never stores passwords itself: sign-in and sign-up go to the
//! Firebase Identity Toolkit REST API. [`MemoryIdentityProvider`] stands in
//! for it in tests and in `STORE_BACKEND=memory` runs.

use crate::error::AppError;
use crate::models::Identity;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ring::digest;
use serde::{Deserialize, Serialize};

/// Email/password identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Fails with [`AppError::InvalidCredentials`] on a bad email/password pair.
    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<Identity, AppError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AppError>;

    async fn sign_out(&self, identity: &Identity) -> Result<(), AppError> {
        tracing::debug!(uid = %identity.uid, "Signed out with identity provider");
        Ok(())
    }
}

// ─── Firebase Identity Toolkit ───────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Identity Toolkit REST client.
#[derive(Clone)]
pub struct FirebaseIdentityClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FirebaseIdentityClient {
    /// Create a client for the given Web API key.
    ///
    /// For local development with the emulator, set FIREBASE_AUTH_EMULATOR_HOST.
    pub fn new(api_key: String) -> Self {
        let base_url = match std::env::var("FIREBASE_AUTH_EMULATOR_HOST") {
            Ok(host) => {
                tracing::info!(host = %host, "Using Firebase Auth Emulator");
                format!("http://{}/identitytoolkit.googleapis.com/v1", host)
            }
            Err(_) => "https://identitytoolkit.googleapis.com/v1".to_string(),
        };
        Self::with_base_url(api_key, base_url)
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    async fn post_account(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, AppError> {
        let url = format!("{}/accounts:{}", self.base_url, method);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| AppError::IdentityProvider(e.to_string()))?;

        let account: AccountResponse = self.check_response_json(response).await?;
        Ok(Identity {
            uid: account.local_id,
            email: account.email.or_else(|| Some(email.to_string())),
        })
    }

    /// Check response status and map provider error codes.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let code = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or_default();
            return Err(map_provider_error(status, &code, &body));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::IdentityProvider(format!("JSON parse error: {}", e)))
    }
}

/// Map an Identity Toolkit error code to an application error.
///
/// Codes look like `EMAIL_EXISTS` or `WEAK_PASSWORD : Password should be ...`.
fn map_provider_error(status: reqwest::StatusCode, code: &str, body: &str) -> AppError {
    let kind = code.split(':').next().unwrap_or_default().trim();
    match kind {
        "INVALID_LOGIN_CREDENTIALS" | "EMAIL_NOT_FOUND" | "INVALID_PASSWORD"
        | "INVALID_EMAIL" | "USER_DISABLED" => AppError::InvalidCredentials,
        "EMAIL_EXISTS" => AppError::Conflict("Email is already registered".to_string()),
        "WEAK_PASSWORD" | "MISSING_PASSWORD" => AppError::BadRequest(code.to_string()),
        _ => AppError::IdentityProvider(format!("HTTP {}: {}", status, body)),
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityClient {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AppError> {
        self.post_account("signInWithPassword", email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        let identity = self.post_account("signUp", email, password).await?;
        tracing::info!(uid = %identity.uid, "Account created");
        Ok(identity)
    }
}

// ─── In-memory provider ──────────────────────────────────────

struct Account {
    uid: String,
    email: String,
    password_digest: Vec<u8>,
}

/// Process-local accounts keyed by lowercased email.
#[derive(Default)]
pub struct MemoryIdentityProvider {
    accounts: DashMap<String, Account>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn password_digest(password: &str) -> Vec<u8> {
        digest::digest(&digest::SHA256, password.as_bytes())
            .as_ref()
            .to_vec()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AppError> {
        let account = self
            .accounts
            .get(&email.trim().to_lowercase())
            .ok_or(AppError::InvalidCredentials)?;

        if account.password_digest != Self::password_digest(password) {
            return Err(AppError::InvalidCredentials);
        }

        Ok(Identity {
            uid: account.uid.clone(),
            email: Some(account.email.clone()),
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        if password.len() < 6 {
            return Err(AppError::BadRequest(
                "WEAK_PASSWORD : Password should be at least 6 characters".to_string(),
            ));
        }

        let email = email.trim().to_string();
        match self.accounts.entry(email.to_lowercase()) {
            Entry::Occupied(_) => Err(AppError::Conflict(
                "Email is already registered".to_string(),
            )),
            Entry::Vacant(slot) => {
                let uid = crate::session::random_id(14)?;
                slot.insert(Account {
                    uid: uid.clone(),
                    email: email.clone(),
                    password_digest: Self::password_digest(password),
                });
                Ok(Identity {
                    uid,
                    email: Some(email),
                })
            }
        }
    }
}

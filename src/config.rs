//! Application configuration loaded from environment variables.
//!
//! Secrets are injected as environment variables by the deployment (or a
//! local `.env` file during development) and read once at startup.

use std::env;
use std::time::Duration;

/// Default number of profile fetch attempts after a sign-in.
pub const DEFAULT_PROFILE_FETCH_ATTEMPTS: u32 = 3;

/// Default linear backoff step between profile fetch attempts.
pub const DEFAULT_PROFILE_FETCH_BACKOFF_MS: u64 = 100;

/// Where profiles, events and registrations are stored, and who signs users in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Firestore plus the Firebase Identity Toolkit
    Firestore,
    /// Process-local maps and accounts; data is lost on restart
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "firestore" => Ok(StoreBackend::Firestore),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(()),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP / Firebase project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Maximum profile fetch attempts per sign-in
    pub profile_fetch_attempts: u32,
    /// Backoff step; attempt `n` waits `n * step` before the next attempt
    pub profile_fetch_backoff: Duration,
    /// Storage and identity backend
    pub store_backend: StoreBackend,

    // --- Secrets ---
    /// Firebase Web API key used for Identity Toolkit calls
    pub firebase_api_key: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let store_backend = parse_or("STORE_BACKEND", StoreBackend::Firestore)?;

        // The in-memory backend signs users in locally and needs no API key.
        let firebase_api_key = match env::var("FIREBASE_API_KEY") {
            Ok(v) => v.trim().to_string(),
            Err(_) if store_backend == StoreBackend::Memory => String::new(),
            Err(_) => return Err(ConfigError::Missing("FIREBASE_API_KEY")),
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            profile_fetch_attempts: parse_or("PROFILE_FETCH_ATTEMPTS", DEFAULT_PROFILE_FETCH_ATTEMPTS)?,
            profile_fetch_backoff: Duration::from_millis(parse_or(
                "PROFILE_FETCH_BACKOFF_MS",
                DEFAULT_PROFILE_FETCH_BACKOFF_MS,
            )?),
            store_backend,

            firebase_api_key,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }

    /// Config for tests: short backoff, fixed keys.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:3000".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            profile_fetch_attempts: DEFAULT_PROFILE_FETCH_ATTEMPTS,
            profile_fetch_backoff: Duration::from_millis(1),
            store_backend: StoreBackend::Memory,
            firebase_api_key: "test_api_key".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

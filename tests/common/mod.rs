// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use campus_events::config::Config;
use campus_events::db::{FirestoreDb, MemoryDb, ProfileStore};
use campus_events::error::AppError;
use campus_events::models::{Event, Profile, RegistrationForm, Role};
use campus_events::routes::create_router;
use campus_events::services::MemoryIdentityProvider;
use campus_events::AppState;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app over an in-memory store and identity provider.
/// Returns the router, the shared state and the store for seeding.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, MemoryDb) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(frontend_url: &str) -> (axum::Router, Arc<AppState>, MemoryDb) {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();
    create_test_app_with_config(config)
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>, MemoryDb) {
    let db = MemoryDb::new();
    let state = Arc::new(AppState::new(
        config,
        db.clone(),
        Arc::new(MemoryIdentityProvider::new()),
    ));
    (create_router(state.clone()), state, db)
}

/// Create a session JWT directly, bypassing sign-in.
#[allow(dead_code)]
pub fn create_test_jwt(uid: &str, sid: &str, signing_key: &[u8]) -> String {
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    #[derive(serde::Serialize)]
    struct Claims<'a> {
        sub: &'a str,
        sid: &'a str,
        exp: usize,
        iat: usize,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    encode(
        &Header::new(Algorithm::HS256),
        &Claims {
            sub: uid,
            sid,
            exp: now + 86400,
            iat: now,
        },
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Send a JSON request, optionally with a bearer token.
#[allow(dead_code)]
pub async fn send_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

/// Sign up through the API and return the session token.
#[allow(dead_code)]
pub async fn sign_up(app: &axum::Router, email: &str, user_type: &str) -> String {
    let response = send_json(
        app,
        "POST",
        "/auth/signup",
        None,
        Some(serde_json::json!({
            "email": email,
            "password": "correct-horse",
            "name": "Test User",
            "userType": user_type,
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string()
}

/// Poll the session endpoint until the profile fetch has settled.
#[allow(dead_code)]
pub async fn settled_session(app: &axum::Router, token: &str) -> serde_json::Value {
    for _ in 0..200 {
        let response = send_json(app, "GET", "/api/session", Some(token), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        if body["loading"] == false {
            return body;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    panic!("session never settled");
}

#[allow(dead_code)]
pub fn test_event(event_id: &str, organizer_uid: &str, title: &str) -> Event {
    Event {
        event_id: event_id.to_string(),
        title: title.to_string(),
        description: "An event for testing".to_string(),
        category: "Technical".to_string(),
        tags: vec!["Workshop".to_string()],
        date: "20 Apr 2025".to_string(),
        time: "18:00".to_string(),
        deadline_date: None,
        location: "Main Auditorium".to_string(),
        location_details: String::new(),
        image_name: "placeholder".to_string(),
        poster_url: None,
        attendance_count: 0,
        organizer_name: "Test Club".to_string(),
        user_id: organizer_uid.to_string(),
        speakers: vec![],
        status: None,
        latitude: None,
        longitude: None,
        created_at: Some(chrono::Utc::now()),
        updated_at: Some(chrono::Utc::now()),
    }
}

#[allow(dead_code)]
pub fn test_form_json() -> serde_json::Value {
    serde_json::json!({
        "Name": "Ada Lovelace",
        "College Email ID": "ada@college.edu",
        "Personal Email ID": "ada@example.com",
        "Contact Number": "5550100",
        "Course": "B.Tech",
        "Year of Study": "2"
    })
}

#[allow(dead_code)]
pub fn test_form() -> RegistrationForm {
    serde_json::from_value(test_form_json()).unwrap()
}

/// Profile store wrapper that counts reads and can fail them.
#[allow(dead_code)]
pub struct CountingProfiles {
    pub inner: MemoryDb,
    pub reads: AtomicU32,
    pub role_writes: AtomicU32,
    /// Reads numbered at or below this fail with a store error
    pub fail_first_reads: u32,
    /// While set, every read fails with a store error
    pub unavailable: AtomicBool,
}

#[allow(dead_code)]
impl CountingProfiles {
    pub fn new(inner: MemoryDb) -> Self {
        Self::failing(inner, 0)
    }

    pub fn failing(inner: MemoryDb, fail_first_reads: u32) -> Self {
        Self {
            inner,
            reads: AtomicU32::new(0),
            role_writes: AtomicU32::new(0),
            fail_first_reads,
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn role_writes(&self) -> u32 {
        self.role_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileStore for CountingProfiles {
    async fn get_profile(&self, uid: &str) -> Result<Option<Profile>, AppError> {
        let n = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.fail_first_reads || self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Database("unavailable".to_string()));
        }
        self.inner.get_profile(uid).await
    }

    async fn create_profile(&self, profile: &Profile) -> Result<(), AppError> {
        self.inner.create_profile(profile).await
    }

    async fn update_role(&self, uid: &str, role: Role) -> Result<(), AppError> {
        self.role_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update_role(uid, role).await
    }
}

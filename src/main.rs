// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Campus Events API Server
//!
//! Event discovery and registration backend: organizers publish events,
//! attendees register, and sessions resolve roles from user profiles.

use campus_events::{
    config::{Config, StoreBackend},
    db::{FirestoreDb, MemoryDb},
    services::{FirebaseIdentityClient, IdentityProvider, MemoryIdentityProvider},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        backend = ?config.store_backend,
        profile_fetch_attempts = config.profile_fetch_attempts,
        "Starting Campus Events API"
    );

    let state = match config.store_backend {
        StoreBackend::Firestore => {
            let db = FirestoreDb::new(&config.gcp_project_id).await?;
            let identity: Arc<dyn IdentityProvider> =
                Arc::new(FirebaseIdentityClient::new(config.firebase_api_key.clone()));
            AppState::new(config.clone(), db, identity)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            let identity: Arc<dyn IdentityProvider> = Arc::new(MemoryIdentityProvider::new());
            AppState::new(config.clone(), MemoryDb::new(), identity)
        }
    };

    // Build router
    let app = campus_events::routes::create_router(Arc::new(state));

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("campus_events=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}

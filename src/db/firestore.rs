// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile storage and role updates)
//! - Events (organizer-owned listings)
//! - Registrations (one document per event/user pair)

use crate::db::{collections, EventStore, ProfileStore, RegistrationStore};
use crate::error::AppError;
use crate::models::{Event, Profile, Registration, Role};
use async_trait::async_trait;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator accepts unauthenticated connections; skip local credentials.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }
}

// ─── User Operations ─────────────────────────────────────────

#[async_trait]
impl ProfileStore for FirestoreDb {
    async fn get_profile(&self, uid: &str) -> Result<Option<Profile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn create_profile(&self, profile: &Profile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&profile.uid)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn update_role(&self, uid: &str, role: Role) -> Result<(), AppError> {
        // Only the masked fields are written; the rest of the document is untouched.
        let patch = Profile {
            uid: uid.to_string(),
            role: Some(role),
            updated_at: Some(chrono::Utc::now()),
            ..Profile::default()
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(["role", "updatedAt"])
            .in_col(collections::USERS)
            .document_id(uid)
            .object(&patch)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

// ─── Event Operations ────────────────────────────────────────

#[async_trait]
impl EventStore for FirestoreDb {
    async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        let events: Vec<Event> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::EVENTS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(events
            .into_iter()
            .map(|e| {
                let id = e.event_id.clone();
                e.with_document_id(&id)
            })
            .collect())
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<Event>, AppError> {
        let event: Option<Event> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::EVENTS)
            .obj()
            .one(event_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(event.map(|e| e.with_document_id(event_id)))
    }

    async fn list_events_by_organizer(
        &self,
        organizer_uid: &str,
    ) -> Result<Vec<Event>, AppError> {
        // No order_by here: sorting happens in memory to avoid a composite index.
        let events: Vec<Event> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::EVENTS)
            .filter(|q| q.for_all([q.field("userId").eq(organizer_uid)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(events
            .into_iter()
            .map(|e| {
                let id = e.event_id.clone();
                e.with_document_id(&id)
            })
            .collect())
    }

    async fn create_event(&self, event: &Event) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::EVENTS)
            .document_id(&event.event_id)
            .object(event)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(
            event_id = %event.event_id,
            organizer = %event.user_id,
            "Event created"
        );
        Ok(())
    }

    async fn update_event(&self, event: &Event) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::EVENTS)
            .document_id(&event.event_id)
            .object(event)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::EVENTS)
            .document_id(event_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

// ─── Registration Operations ─────────────────────────────────

#[async_trait]
impl RegistrationStore for FirestoreDb {
    async fn find_registration(
        &self,
        event_id: &str,
        uid: &str,
    ) -> Result<Option<Registration>, AppError> {
        let found: Vec<Registration> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::REGISTRATIONS)
            .filter(|q| {
                q.for_all([
                    q.field("eventId").eq(event_id),
                    q.field("uid").eq(uid),
                ])
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(found.into_iter().next())
    }

    async fn create_registration_if_absent(
        &self,
        registration: &Registration,
    ) -> Result<bool, AppError> {
        // Insert is a create: Firestore rejects it if the document ID is taken.
        let result: Result<(), firestore::errors::FirestoreError> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::REGISTRATIONS)
            .document_id(&registration.id)
            .object(&registration.document_body())
            .execute()
            .await;

        match result {
            Ok(()) => Ok(true),
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => {
                tracing::debug!(
                    registration_id = %registration.id,
                    "Registration document already exists"
                );
                Ok(false)
            }
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    async fn get_registration(&self, id: &str) -> Result<Option<Registration>, AppError> {
        let registration: Option<Registration> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::REGISTRATIONS)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(registration.map(|mut r| {
            r.id = id.to_string();
            r
        }))
    }

    async fn list_registrations_by_user(&self, uid: &str) -> Result<Vec<Registration>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::REGISTRATIONS)
            .filter(|q| q.for_all([q.field("uid").eq(uid)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_registrations_for_event(
        &self,
        event_id: &str,
    ) -> Result<Vec<Registration>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::REGISTRATIONS)
            .filter(|q| q.for_all([q.field("eventId").eq(event_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}


//! Database layer (Firestore, plus an in-memory store for tests and local runs).
//!
//! Handlers and services only see the store traits below. List operations
//! return unordered result sets; callers sort.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::error::AppError;
use crate::models::{Event, Profile, Registration, Role};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    /// User profiles (keyed by uid)
    pub const USERS: &str = "users";
    pub const EVENTS: &str = "events";
    /// Registrations (keyed by `{event_id}_{uid}`)
    pub const REGISTRATIONS: &str = "registrations";
}

/// Profile documents.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, uid: &str) -> Result<Option<Profile>, AppError>;

    async fn create_profile(&self, profile: &Profile) -> Result<(), AppError>;

    /// Merge-write the `role` field (and `updatedAt`) without touching others.
    async fn update_role(&self, uid: &str, role: Role) -> Result<(), AppError>;
}

/// Event documents.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn list_events(&self) -> Result<Vec<Event>, AppError>;

    async fn get_event(&self, event_id: &str) -> Result<Option<Event>, AppError>;

    async fn list_events_by_organizer(&self, organizer_uid: &str)
        -> Result<Vec<Event>, AppError>;

    async fn create_event(&self, event: &Event) -> Result<(), AppError>;

    /// Replace a stored event (callers fetch-modify-write).
    async fn update_event(&self, event: &Event) -> Result<(), AppError>;

    async fn delete_event(&self, event_id: &str) -> Result<(), AppError>;
}

/// Registration documents.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn find_registration(
        &self,
        event_id: &str,
        uid: &str,
    ) -> Result<Option<Registration>, AppError>;

    /// Create the registration under `registration.id` unless that document exists.
    ///
    /// Returns `true` if created, `false` if it was already there.
    async fn create_registration_if_absent(
        &self,
        registration: &Registration,
    ) -> Result<bool, AppError>;

    async fn get_registration(&self, id: &str) -> Result<Option<Registration>, AppError>;

    async fn list_registrations_by_user(&self, uid: &str) -> Result<Vec<Registration>, AppError>;

    async fn list_registrations_for_event(
        &self,
        event_id: &str,
    ) -> Result<Vec<Registration>, AppError>;
}

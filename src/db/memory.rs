// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory store backed by `DashMap`s.
//!
//! Same semantics as the Firestore store, including unordered listings and
//! create-if-absent registrations. Used by tests and by `STORE_BACKEND=memory`.

use crate::db::{EventStore, ProfileStore, RegistrationStore};
use crate::error::AppError;
use crate::models::{Event, Profile, Registration, Role};
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct MemoryDb {
    profiles: Arc<DashMap<String, Profile>>,
    events: Arc<DashMap<String, Event>>,
    registrations: Arc<DashMap<String, Registration>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryDb {
    async fn get_profile(&self, uid: &str) -> Result<Option<Profile>, AppError> {
        Ok(self.profiles.get(uid).map(|p| p.clone()))
    }

    async fn create_profile(&self, profile: &Profile) -> Result<(), AppError> {
        self.profiles.insert(profile.uid.clone(), profile.clone());
        Ok(())
    }

    async fn update_role(&self, uid: &str, role: Role) -> Result<(), AppError> {
        let mut profile = self
            .profiles
            .entry(uid.to_string())
            .or_insert_with(|| Profile {
                uid: uid.to_string(),
                ..Profile::default()
            });
        profile.role = Some(role);
        profile.updated_at = Some(chrono::Utc::now());
        Ok(())
    }
}

#[async_trait]
impl EventStore for MemoryDb {
    async fn list_events(&self) -> Result<Vec<Event>, AppError> {
        Ok(self.events.iter().map(|e| e.value().clone()).collect())
    }

    async fn get_event(&self, event_id: &str) -> Result<Option<Event>, AppError> {
        Ok(self.events.get(event_id).map(|e| e.clone()))
    }

    async fn list_events_by_organizer(
        &self,
        organizer_uid: &str,
    ) -> Result<Vec<Event>, AppError> {
        Ok(self
            .events
            .iter()
            .filter(|e| e.user_id == organizer_uid)
            .map(|e| e.value().clone())
            .collect())
    }

    async fn create_event(&self, event: &Event) -> Result<(), AppError> {
        match self.events.entry(event.event_id.clone()) {
            Entry::Occupied(_) => Err(AppError::Database(format!(
                "Event {} already exists",
                event.event_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(event.clone());
                Ok(())
            }
        }
    }

    async fn update_event(&self, event: &Event) -> Result<(), AppError> {
        self.events.insert(event.event_id.clone(), event.clone());
        Ok(())
    }

    async fn delete_event(&self, event_id: &str) -> Result<(), AppError> {
        self.events.remove(event_id);
        Ok(())
    }
}

#[async_trait]
impl RegistrationStore for MemoryDb {
    async fn find_registration(
        &self,
        event_id: &str,
        uid: &str,
    ) -> Result<Option<Registration>, AppError> {
        Ok(self
            .registrations
            .iter()
            .find(|r| r.event_id == event_id && r.uid == uid)
            .map(|r| r.value().clone()))
    }

    async fn create_registration_if_absent(
        &self,
        registration: &Registration,
    ) -> Result<bool, AppError> {
        match self.registrations.entry(registration.id.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(registration.clone());
                Ok(true)
            }
        }
    }

    async fn get_registration(&self, id: &str) -> Result<Option<Registration>, AppError> {
        Ok(self.registrations.get(id).map(|r| r.clone()))
    }

    async fn list_registrations_by_user(&self, uid: &str) -> Result<Vec<Registration>, AppError> {
        Ok(self
            .registrations
            .iter()
            .filter(|r| r.uid == uid)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn list_registrations_for_event(
        &self,
        event_id: &str,
    ) -> Result<Vec<Registration>, AppError> {
        Ok(self
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id)
            .map(|r| r.value().clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_role_merges_into_existing_profile() {
        let db = MemoryDb::new();
        db.create_profile(&Profile {
            uid: "u1".to_string(),
            name: "Ada".to_string(),
            user_type: Some("host".to_string()),
            ..Profile::default()
        })
        .await
        .unwrap();

        db.update_role("u1", Role::Organizer).await.unwrap();

        let stored = db.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(stored.name, "Ada");
        assert_eq!(stored.user_type.as_deref(), Some("host"));
        assert_eq!(stored.role, Some(Role::Organizer));
    }
}

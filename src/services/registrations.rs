// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event registration.
//!
//! Each `(event, user)` pair maps to one deterministic document ID, and the
//! document is created with create-if-absent semantics. A repeated or
//! concurrent submission therefore resolves to the same registration.

use crate::db::{EventStore, RegistrationStore};
use crate::error::AppError;
use crate::models::{Registration, RegistrationForm, RegistrationWithEvent};
use futures_util::{stream, StreamExt};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use validator::Validate;

/// Maximum concurrent event reads when joining titles.
const MAX_CONCURRENT_READS: usize = 8;

/// Result of [`RegistrationService::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationOutcome {
    pub id: String,
    /// `false` when the user was already registered
    pub created: bool,
}

#[derive(Clone)]
pub struct RegistrationService {
    events: Arc<dyn EventStore>,
    registrations: Arc<dyn RegistrationStore>,
}

impl RegistrationService {
    pub fn new(events: Arc<dyn EventStore>, registrations: Arc<dyn RegistrationStore>) -> Self {
        Self {
            events,
            registrations,
        }
    }

    /// Register `uid` for `event_id`, returning the registration ID.
    ///
    /// Registering twice returns the same ID and writes nothing the second time.
    pub async fn register(
        &self,
        event_id: &str,
        uid: &str,
        form: RegistrationForm,
    ) -> Result<RegistrationOutcome, AppError> {
        form.validate()?;

        if self.events.get_event(event_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Event {} not found", event_id)));
        }

        let id = Registration::document_id(event_id, uid);

        // Pre-check also finds registrations written before IDs were deterministic.
        if let Some(existing) = self.registrations.find_registration(event_id, uid).await? {
            if existing.id.is_empty() {
                return Err(AppError::Database(format!(
                    "Registration for event {} has no document ID",
                    event_id
                )));
            }
            tracing::debug!(event_id = %event_id, uid = %uid, "Already registered");
            return Ok(RegistrationOutcome {
                id: existing.id,
                created: false,
            });
        }

        let registration = Registration {
            id: id.clone(),
            event_id: event_id.to_string(),
            uid: uid.to_string(),
            form,
            timestamp: Some(chrono::Utc::now()),
        };

        let created = self
            .registrations
            .create_registration_if_absent(&registration)
            .await?;

        if created {
            tracing::info!(event_id = %event_id, uid = %uid, "Registered for event");
        } else {
            tracing::info!(
                event_id = %event_id,
                uid = %uid,
                "Concurrent registration already created the document"
            );
        }

        Ok(RegistrationOutcome { id, created })
    }

    /// A single registration, visible only to the user who made it.
    pub async fn get_for_user(&self, uid: &str, id: &str) -> Result<Registration, AppError> {
        self.registrations
            .get_registration(id)
            .await?
            .filter(|r| r.uid == uid)
            .ok_or_else(|| AppError::NotFound(format!("Registration {} not found", id)))
    }

    /// The user's registrations with event titles, newest first.
    ///
    /// Titles fall back to the event ID when the event is gone.
    pub async fn list_for_user_with_titles(
        &self,
        uid: &str,
    ) -> Result<Vec<RegistrationWithEvent>, AppError> {
        let registrations = self.registrations.list_registrations_by_user(uid).await?;

        let event_ids: BTreeSet<String> =
            registrations.iter().map(|r| r.event_id.clone()).collect();

        let titles: HashMap<String, String> = stream::iter(event_ids)
            .map(|event_id| async move {
                let title = match self.events.get_event(&event_id).await {
                    Ok(Some(event)) => Some(event.title),
                    Ok(None) => None,
                    Err(e) => {
                        tracing::warn!(event_id = %event_id, error = %e, "Failed to load event title");
                        None
                    }
                };
                (event_id, title)
            })
            .buffer_unordered(MAX_CONCURRENT_READS)
            .filter_map(|(event_id, title)| async move { title.map(|t| (event_id, t)) })
            .collect()
            .await;

        let mut joined: Vec<RegistrationWithEvent> = registrations
            .into_iter()
            .map(|registration| {
                let event_title = titles
                    .get(&registration.event_id)
                    .cloned()
                    .unwrap_or_else(|| registration.event_id.clone());
                RegistrationWithEvent {
                    registration,
                    event_title,
                }
            })
            .collect();

        joined.sort_by(|a, b| b.registration.timestamp.cmp(&a.registration.timestamp));
        Ok(joined)
    }

    /// Registrant roster for an event, oldest first.
    pub async fn list_for_event(&self, event_id: &str) -> Result<Vec<Registration>, AppError> {
        let mut roster = self
            .registrations
            .list_registrations_for_event(event_id)
            .await?;
        roster.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(roster)
    }
}

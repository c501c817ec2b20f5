// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event catalog: search, ordering and owner-checked CRUD.

use crate::db::EventStore;
use crate::error::AppError;
use crate::models::{Event, EventPatch, NewEvent};
use crate::session::random_id;
use crate::time_utils::parse_event_date;
use serde::Deserialize;
use std::cmp::Ordering;
use std::sync::Arc;
use validator::Validate;

/// Catalog search parameters (`GET /events?q=&category=`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventQuery {
    /// Free-text search over title, description and location
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Normalize a category for comparison: drop whitespace and `&`, lowercase.
///
/// "Arts & Culture" and "artsculture" compare equal.
pub fn normalize_category(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '&')
        .flat_map(char::to_lowercase)
        .collect()
}

impl EventQuery {
    fn search_term(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    fn category_key(&self) -> Option<String> {
        self.category
            .as_deref()
            .map(normalize_category)
            .filter(|c| !c.is_empty() && c != "all")
    }

    /// Whether `event` passes this query.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(term) = self.search_term() {
            let hit = [&event.title, &event.description, &event.location]
                .iter()
                .any(|field| field.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }

        if let Some(category) = self.category_key() {
            let hit = normalize_category(&event.category) == category
                || event.tags.iter().any(|t| normalize_category(t) == category);
            if !hit {
                return false;
            }
        }

        true
    }

    /// Filter `events` and sort the survivors newest first.
    pub fn apply(&self, events: Vec<Event>) -> Vec<Event> {
        let mut events: Vec<Event> = events.into_iter().filter(|e| self.matches(e)).collect();
        sort_by_date_desc(&mut events);
        events
    }
}

/// Sort events by `date`, newest first. Unparsable dates go last.
pub fn sort_by_date_desc(events: &mut [Event]) {
    events.sort_by(|a, b| {
        match (parse_event_date(&a.date), parse_event_date(&b.date)) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| a.title.cmp(&b.title))
    });
}

/// Event operations over an [`EventStore`].
#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn EventStore>,
}

impl EventService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    pub async fn search(&self, query: &EventQuery) -> Result<Vec<Event>, AppError> {
        let events = self.store.list_events().await?;
        Ok(query.apply(events))
    }

    pub async fn get(&self, event_id: &str) -> Result<Event, AppError> {
        self.store
            .get_event(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event {} not found", event_id)))
    }

    pub async fn list_by_organizer(&self, organizer_uid: &str) -> Result<Vec<Event>, AppError> {
        let mut events = self.store.list_events_by_organizer(organizer_uid).await?;
        sort_by_date_desc(&mut events);
        Ok(events)
    }

    /// Create an event owned by `organizer_uid`. Role checks happen upstream.
    pub async fn create(&self, organizer_uid: &str, input: NewEvent) -> Result<Event, AppError> {
        input.validate()?;

        let event = input.into_event(random_id(10)?, organizer_uid, chrono::Utc::now());
        self.store.create_event(&event).await?;

        tracing::info!(
            event_id = %event.event_id,
            organizer = %organizer_uid,
            "Event published"
        );
        Ok(event)
    }

    /// Fetch an event and confirm `uid` owns it.
    pub async fn owned(&self, uid: &str, event_id: &str) -> Result<Event, AppError> {
        let event = self.get(event_id).await?;
        if event.user_id != uid {
            tracing::warn!(event_id = %event_id, uid = %uid, "Rejected access to another organizer's event");
            return Err(AppError::Forbidden(
                "Only the event's organizer can do that".to_string(),
            ));
        }
        Ok(event)
    }

    /// Fetch-modify-write update by the owner.
    pub async fn update(
        &self,
        uid: &str,
        event_id: &str,
        patch: EventPatch,
    ) -> Result<Event, AppError> {
        patch.validate()?;

        let mut event = self.owned(uid, event_id).await?;
        patch.apply(&mut event, chrono::Utc::now());
        self.store.update_event(&event).await?;

        tracing::info!(event_id = %event_id, "Event updated");
        Ok(event)
    }

    pub async fn delete(&self, uid: &str, event_id: &str) -> Result<(), AppError> {
        self.owned(uid, event_id).await?;
        self.store.delete_event(event_id).await?;
        tracing::info!(event_id = %event_id, "Event deleted");
        Ok(())
    }
}

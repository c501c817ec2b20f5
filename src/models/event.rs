// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Speaker listed on an event page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Speaker {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default, rename = "imageURL")]
    pub image_url: String,
}

/// Stored event record in Firestore (`events/{event_id}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Document ID, duplicated into the document body
    #[serde(default)]
    pub event_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Display date, e.g. "20 Apr 2025"
    #[serde(default)]
    pub date: String,
    /// Display time, e.g. "20:00"
    #[serde(default)]
    pub time: String,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub deadline_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub location_details: String,
    /// Poster download URL (legacy field name)
    #[serde(default)]
    pub image_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub attendance_count: u32,
    #[serde(default)]
    pub organizer_name: String,
    /// Organizer UID
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub speakers: Vec<Speaker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Poster URL, falling back to the legacy `imageName` field.
    pub fn poster(&self) -> &str {
        self.poster_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(&self.image_name)
    }

    /// Fill in fields computed on read.
    pub fn with_document_id(mut self, id: &str) -> Self {
        if self.event_id.is_empty() {
            self.event_id = id.to_string();
        }
        if self.poster_url.as_deref().map_or(true, str::is_empty) {
            self.poster_url = Some(self.image_name.clone());
        }
        self
    }
}

/// Organizer input for creating an event.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 10000))]
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[validate(length(min = 1, max = 50))]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub deadline_date: Option<DateTime<Utc>>,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    #[serde(default)]
    pub location_details: String,
    /// Already-hosted poster URL; uploading is handled elsewhere
    #[serde(default)]
    pub image_name: Option<String>,
    #[serde(default)]
    pub organizer_name: String,
    #[validate(nested)]
    #[serde(default)]
    pub speakers: Vec<Speaker>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl NewEvent {
    /// Build the stored event for `organizer_uid`.
    pub fn into_event(self, event_id: String, organizer_uid: &str, now: DateTime<Utc>) -> Event {
        let image_name = self
            .image_name
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| "placeholder".to_string());

        Event {
            event_id,
            title: self.title,
            description: self.description,
            category: self.category,
            tags: self.tags,
            date: self.date,
            time: self.time,
            deadline_date: self.deadline_date,
            location: self.location,
            location_details: self.location_details,
            poster_url: Some(image_name.clone()),
            image_name,
            attendance_count: 0,
            organizer_name: self.organizer_name,
            user_id: organizer_uid.to_string(),
            speakers: self.speakers,
            status: None,
            latitude: self.latitude,
            longitude: self.longitude,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

/// Partial update applied by the event owner.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub deadline_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub location_details: Option<String>,
    pub image_name: Option<String>,
    pub organizer_name: Option<String>,
    #[validate(nested)]
    pub speakers: Option<Vec<Speaker>>,
    pub status: Option<String>,
    pub attendance_count: Option<u32>,
}

impl EventPatch {
    /// Apply the patch in place and bump `updated_at`.
    pub fn apply(self, event: &mut Event, now: DateTime<Utc>) {
        if let Some(v) = self.title {
            event.title = v;
        }
        if let Some(v) = self.description {
            event.description = v;
        }
        if let Some(v) = self.category {
            event.category = v;
        }
        if let Some(v) = self.tags {
            event.tags = v;
        }
        if let Some(v) = self.date {
            event.date = v;
        }
        if let Some(v) = self.time {
            event.time = v;
        }
        if let Some(v) = self.deadline_date {
            event.deadline_date = Some(v);
        }
        if let Some(v) = self.location {
            event.location = v;
        }
        if let Some(v) = self.location_details {
            event.location_details = v;
        }
        if let Some(v) = self.image_name {
            event.poster_url = Some(v.clone());
            event.image_name = v;
        }
        if let Some(v) = self.organizer_name {
            event.organizer_name = v;
        }
        if let Some(v) = self.speakers {
            event.speakers = v;
        }
        if let Some(v) = self.status {
            event.status = Some(v);
        }
        if let Some(v) = self.attendance_count {
            event.attendance_count = v;
        }
        event.updated_at = Some(now);
    }
}

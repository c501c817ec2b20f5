// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event registration model.
//!
//! Registrant fields keep the labelled keys used by the stored documents
//! ("College Email ID", "Year of Study", ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Registration form as submitted by an attendee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RegistrationForm {
    #[serde(rename = "Name")]
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(rename = "College Email ID")]
    #[validate(email)]
    pub college_email: String,
    #[serde(rename = "Personal Email ID")]
    #[validate(email)]
    pub personal_email: String,
    #[serde(rename = "Contact Number")]
    #[validate(length(min = 5, max = 20))]
    pub contact_number: String,
    #[serde(rename = "Course", default)]
    pub course: String,
    #[serde(rename = "Department", default)]
    pub department: String,
    #[serde(rename = "Section", default)]
    pub section: String,
    #[serde(rename = "Specialization", default)]
    pub specialization: String,
    #[serde(rename = "Year of Study", default)]
    pub year_of_study: String,
    #[serde(rename = "FA Number", default)]
    pub fa_number: String,
    #[serde(rename = "Faculty Advisor", default)]
    pub faculty_advisor: String,
    #[serde(rename = "Registration No.", default)]
    pub registration_no: String,
}

/// Stored registration (`registrations/{event_id}_{uid}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    /// Document ID; query results fill it from the document name. It is
    /// never part of the stored fields (see [`Registration::document_body`]).
    #[serde(default, alias = "_firestore_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "eventId")]
    pub event_id: String,
    pub uid: String,
    #[serde(flatten)]
    pub form: RegistrationForm,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Registration {
    /// Deterministic document ID for an `(event_id, uid)` pair.
    ///
    /// Two registrations for the same pair always land on the same document,
    /// so the store rejects the second create instead of holding duplicates.
    pub fn document_id(event_id: &str, uid: &str) -> String {
        format!(
            "{}_{}",
            urlencoding::encode(event_id),
            urlencoding::encode(uid)
        )
    }

    /// The fields written to the store; the ID lives only in the document name.
    pub fn document_body(&self) -> Registration {
        Registration {
            id: String::new(),
            ..self.clone()
        }
    }
}

/// Registration joined with its event title for "my registrations".
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationWithEvent {
    #[serde(flatten)]
    pub registration: Registration,
    pub event_title: String,
}

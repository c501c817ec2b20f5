// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User identity, profile and role models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// `userType` values that resolve to the organizer role.
const ORGANIZER_USER_TYPES: [&str; 4] = ["host", "organiser", "organizer", "club"];

/// Identity issued by the identity provider. Read-only to this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Identity {
    /// Provider subject id (also the profile document ID)
    pub uid: String,
    pub email: Option<String>,
}

/// Authorization role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/", rename_all = "lowercase")
)]
pub enum Role {
    User,
    Organizer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Organizer => "organizer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// Stored roles are free-form strings; anything but "organizer" reads as a user.
impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(if raw.eq_ignore_ascii_case("organizer") {
            Role::Organizer
        } else {
            Role::User
        })
    }
}

/// Derive the role for a profile.
///
/// A non-empty `userType` always decides the role. Without one, an existing
/// role is kept, otherwise the profile is a plain user.
pub fn derive_role(user_type: Option<&str>, existing: Option<Role>) -> Role {
    match user_type.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) if ORGANIZER_USER_TYPES
            .iter()
            .any(|o| t.eq_ignore_ascii_case(o)) =>
        {
            Role::Organizer
        }
        Some(_) => Role::User,
        None => existing.unwrap_or(Role::User),
    }
}

/// Free-form tech stack, stored either as one string or a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TechStack {
    One(String),
    Many(Vec<String>),
}

/// User profile stored in Firestore (`users/{uid}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub uid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub contact_details: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub github_url: String,
    #[serde(default)]
    pub linkedin_url: String,
    #[serde(default, rename = "profileImageURL")]
    pub profile_image_url: String,
    /// Self-declared account type ("user", "host", ...)
    #[serde(default)]
    pub user_type: Option<String>,
    /// Authorization role; derived from `user_type` on every resolution
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub tech_stack: Option<TechStack>,
    /// Hosts need manual approval, users are approved on sign-up
    #[serde(default)]
    pub is_approved: Option<bool>,
    #[serde(default, with = "firestore::serialize_as_optional_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Re-apply the `userType -> role` rule and return the resolved role.
    pub fn resolve_role(&mut self) -> Role {
        let role = derive_role(self.user_type.as_deref(), self.role);
        self.role = Some(role);
        role
    }

    /// Resolved role, defaulting to `user` when none is set.
    pub fn effective_role(&self) -> Role {
        self.role.unwrap_or(Role::User)
    }
}

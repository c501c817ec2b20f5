// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod event;
pub mod registration;
pub mod user;

pub use event::{Event, EventPatch, NewEvent, Speaker};
pub use registration::{Registration, RegistrationForm, RegistrationWithEvent};
pub use user::{derive_role, Identity, Profile, Role};

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod events;
pub mod identity;
pub mod registrations;

pub use events::{EventQuery, EventService};
pub use identity::{FirebaseIdentityClient, IdentityProvider, MemoryIdentityProvider};
pub use registrations::{RegistrationOutcome, RegistrationService};

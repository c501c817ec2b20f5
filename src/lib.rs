// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Campus Events: event discovery and registration
//!
//! This crate provides the backend API where organizers publish events,
//! attendees browse and register, and organizers review registrant rosters.
//! Signed-in sessions resolve their authorization role from the user's
//! profile (see [`session`]).

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod time_utils;

use config::Config;
use db::{EventStore, ProfileStore, RegistrationStore};
use services::{EventService, IdentityProvider, RegistrationService};
use session::{ResolverSettings, SessionRegistry};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub profiles: Arc<dyn ProfileStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub sessions: SessionRegistry,
    pub events: EventService,
    pub registrations: RegistrationService,
}

impl AppState {
    /// Wire services over the given stores and identity provider.
    pub fn new<S>(config: Config, store: S, identity: Arc<dyn IdentityProvider>) -> Self
    where
        S: ProfileStore + EventStore + RegistrationStore + Clone + 'static,
    {
        let profiles: Arc<dyn ProfileStore> = Arc::new(store.clone());
        let events: Arc<dyn EventStore> = Arc::new(store.clone());
        let registrations: Arc<dyn RegistrationStore> = Arc::new(store);

        Self {
            sessions: SessionRegistry::new(profiles.clone(), ResolverSettings::from(&config)),
            events: EventService::new(events.clone()),
            registrations: RegistrationService::new(events, registrations),
            profiles,
            identity,
            config,
        }
    }
}

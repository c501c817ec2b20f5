// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session/role resolver.
//!
//! Turns identity notifications into a role-annotated profile. The resolver
//! is the only writer of its [`SessionSnapshot`]; everything else reads it
//! through a `watch` receiver.
//!
//! ```text
//! Unauthenticated --identity--> Authenticating --fetch ok/exhausted--> Authenticated
//!        ^                                                                  |
//!        +----------------------------- sign-out ---------------------------+
//! ```
//!
//! A fetch that finds no profile document is retried exactly like one that
//! fails with a store error. The two cannot be told apart here: a profile that
//! is not provisioned yet looks the same as a transient miss.

use crate::db::ProfileStore;
use crate::models::{derive_role, Identity, Profile, Role};
use crate::session::retry::{linear_backoff, retry_bounded, RetryOutcome};
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Where organizers land after sign-in.
pub const ORGANIZER_HOME: &str = "/organizer/events";

/// Where users land after sign-in when no destination was requested.
pub const DEFAULT_HOME: &str = "/";

/// Resolution phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Unauthenticated,
    /// Identity present, profile fetch in flight
    Authenticating,
    /// Resolution finished; the profile may still be absent if fetches ran out
    Authenticated,
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    pub profile: Option<Profile>,
    pub loading: bool,
    pub phase: SessionPhase,
    /// Whether the post-sign-in transition has been handed out
    pub transitioned: bool,
}

impl SessionSnapshot {
    fn signed_out() -> Self {
        Self {
            identity: None,
            profile: None,
            loading: false,
            phase: SessionPhase::Unauthenticated,
            transitioned: false,
        }
    }

    /// Resolved role, if a profile is present.
    pub fn role(&self) -> Option<Role> {
        self.profile.as_ref().map(Profile::effective_role)
    }
}

/// Why a profile fetch attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileFetchError {
    #[error("Profile not found")]
    NotFound,

    #[error("Profile store error: {0}")]
    Transient(String),
}

/// Result of [`SessionResolver::set_role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleAssignment {
    /// The profile already had the role; nothing was written
    Unchanged,
    Applied,
    /// The account type does not grant the role; nothing was written
    NotPermitted { allowed: Role },
    /// No identity is signed in
    NoIdentity,
    /// The signed-in identity has no profile document
    ProfileNotFound,
    /// A profile was needed but could not be fetched
    ProfileUnavailable,
}

/// Retry settings for the sign-in profile fetch.
#[derive(Debug, Clone, Copy)]
pub struct ResolverSettings {
    pub max_attempts: u32,
    pub backoff_step: Duration,
}

impl From<&crate::config::Config> for ResolverSettings {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            max_attempts: config.profile_fetch_attempts,
            backoff_step: config.profile_fetch_backoff,
        }
    }
}

pub struct SessionResolver {
    profiles: Arc<dyn ProfileStore>,
    settings: ResolverSettings,
    state: watch::Sender<SessionSnapshot>,
    /// Bumped on every identity change; stale resolutions compare against it
    generation: AtomicU64,
    /// Destination requested at sign-in, used for non-organizers
    next: Option<String>,
}

impl SessionResolver {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        settings: ResolverSettings,
        next: Option<String>,
    ) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::signed_out());
        Self {
            profiles,
            settings,
            state,
            generation: AtomicU64::new(0),
            next,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Wait until no resolution is in flight and return the settled state.
    pub async fn settled(&self) -> SessionSnapshot {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let result = rx.wait_for(|s| !s.loading).await.map(|s| s.clone());
        result.unwrap_or_else(|_| self.snapshot())
    }

    /// Consume an identity feed until its sender is dropped.
    ///
    /// The current value of the feed is applied before the returned future is
    /// first polled, so a freshly started session reads as loading at once.
    /// Fetches run in their own tasks: a sign-out is applied immediately even
    /// while a retry loop is sleeping.
    pub fn run(
        self: Arc<Self>,
        mut feed: watch::Receiver<Option<Identity>>,
    ) -> impl Future<Output = ()> + Send + 'static {
        let mut identity = feed.borrow_and_update().clone();
        let mut generation = self.begin(identity.clone());

        async move {
            loop {
                if let Some(identity) = identity {
                    let resolver = self.clone();
                    tokio::spawn(async move {
                        resolver.complete(generation, identity).await;
                    });
                }

                if feed.changed().await.is_err() {
                    tracing::debug!("Identity feed closed");
                    break;
                }

                identity = feed.borrow_and_update().clone();
                generation = self.begin(identity.clone());
            }
        }
    }

    /// Resolve a single identity notification inline.
    ///
    /// `None` clears the session. `Some` fetches the profile with bounded
    /// retry and settles, with or without a profile.
    pub async fn resolve(&self, identity: Option<Identity>) {
        let generation = self.begin(identity.clone());
        if let Some(identity) = identity {
            self.complete(generation, identity).await;
        }
    }

    /// Clear the session now, without waiting for the identity feed.
    pub fn sign_out(&self) {
        self.begin(None);
    }

    /// Apply the synchronous half of an identity change and return its generation.
    fn begin(&self, identity: Option<Identity>) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        match identity {
            None => {
                tracing::info!("Signed out; clearing session");
                self.state.send_replace(SessionSnapshot::signed_out());
            }
            Some(identity) => {
                tracing::debug!(uid = %identity.uid, "Resolving profile");
                self.state.send_replace(SessionSnapshot {
                    identity: Some(identity),
                    profile: None,
                    loading: true,
                    phase: SessionPhase::Authenticating,
                    transitioned: false,
                });
            }
        }

        generation
    }

    async fn complete(&self, generation: u64, identity: Identity) {
        let outcome = retry_bounded(
            self.settings.max_attempts,
            linear_backoff(self.settings.backoff_step),
            |attempt| {
                let uid = identity.uid.clone();
                async move {
                    let result = self.fetch_profile(&uid).await;
                    if let Err(e) = &result {
                        tracing::debug!(uid = %uid, attempt, error = %e, "Profile fetch failed");
                    }
                    result
                }
            },
        )
        .await;

        let profile = match outcome {
            RetryOutcome::Succeeded { value, attempts } => {
                tracing::debug!(uid = %identity.uid, attempts, "Profile fetched");
                Some(value)
            }
            RetryOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                tracing::warn!(
                    uid = %identity.uid,
                    attempts,
                    error = %last_error,
                    "Giving up on profile fetch"
                );
                None
            }
        };

        let profile = match profile {
            Some(profile) => Some(self.apply_derived_role(profile).await),
            None => None,
        };

        let applied = self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            state.profile = profile.clone();
            state.loading = false;
            state.phase = SessionPhase::Authenticated;
            true
        });

        if applied {
            tracing::info!(
                uid = %identity.uid,
                role = ?profile.as_ref().map(Profile::effective_role),
                "Session resolved"
            );
        } else {
            tracing::debug!(uid = %identity.uid, "Discarding stale profile resolution");
        }
    }

    /// Assign `role` to the session's profile.
    ///
    /// Only the role derived from the profile's `userType` (or, without one,
    /// its stored role) is accepted. A missing profile is fetched once; a
    /// profile that does not exist is never created here.
    pub async fn set_role(&self, role: Role) -> RoleAssignment {
        let generation = self.generation.load(Ordering::SeqCst);
        let current = self.snapshot();

        let Some(identity) = current.identity else {
            tracing::warn!(role = %role, "Cannot set role without a signed-in identity");
            return RoleAssignment::NoIdentity;
        };

        let (mut profile, cached) = match current.profile {
            Some(profile) => (profile, true),
            None => match self.fetch_profile(&identity.uid).await {
                Ok(profile) => (profile, false),
                Err(ProfileFetchError::NotFound) => {
                    tracing::warn!(uid = %identity.uid, "Cannot set role; no profile document");
                    return RoleAssignment::ProfileNotFound;
                }
                Err(e) => {
                    tracing::warn!(uid = %identity.uid, error = %e, "Cannot set role; profile unavailable");
                    return RoleAssignment::ProfileUnavailable;
                }
            },
        };

        let allowed = derive_role(profile.user_type.as_deref(), profile.role);
        if role != allowed {
            tracing::warn!(
                uid = %identity.uid,
                requested = %role,
                allowed = %allowed,
                "Rejected role not granted by account type"
            );
            return RoleAssignment::NotPermitted { allowed };
        }

        let stored = profile.role;
        if cached && stored == Some(role) {
            return RoleAssignment::Unchanged;
        }

        profile.role = Some(role);
        if stored != Some(role) {
            self.persist_role(&identity.uid, role).await;
        }

        let applied = self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            state.profile = Some(profile.clone());
            state.loading = false;
            state.phase = SessionPhase::Authenticated;
            true
        });

        if applied {
            tracing::info!(uid = %identity.uid, role = %role, "Role assigned");
            RoleAssignment::Applied
        } else {
            tracing::debug!(uid = %identity.uid, "Identity changed during role assignment");
            RoleAssignment::NoIdentity
        }
    }

    /// Re-fetch the profile once, bypassing the cached copy.
    ///
    /// Returns `Ok(None)` when no identity is signed in. A missing profile
    /// document settles the session without a profile, and so does a failed
    /// fetch, which is then also reported as an error.
    pub async fn refresh(&self) -> Result<Option<SessionSnapshot>, ProfileFetchError> {
        let generation = self.generation.load(Ordering::SeqCst);
        let Some(identity) = self.snapshot().identity else {
            return Ok(None);
        };

        self.state.send_modify(|s| s.loading = true);

        let profile = match self.fetch_profile(&identity.uid).await {
            Ok(profile) => Some(self.apply_derived_role(profile).await),
            Err(ProfileFetchError::NotFound) => None,
            Err(e) => {
                tracing::warn!(uid = %identity.uid, error = %e, "Profile refresh failed");
                self.state.send_if_modified(|s| {
                    if self.generation.load(Ordering::SeqCst) != generation {
                        return false;
                    }
                    s.profile = None;
                    s.loading = false;
                    s.phase = SessionPhase::Authenticated;
                    true
                });
                return Err(e);
            }
        };

        self.state.send_if_modified(|s| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            s.profile = profile;
            s.loading = false;
            s.phase = SessionPhase::Authenticated;
            true
        });

        Ok(Some(self.snapshot()))
    }

    /// Hand out the post-sign-in destination once per resolved profile.
    pub fn take_transition(&self) -> Option<String> {
        let mut destination = None;

        self.state.send_if_modified(|s| {
            if s.transitioned || s.loading || s.phase != SessionPhase::Authenticated {
                return false;
            }
            let Some(profile) = &s.profile else {
                return false;
            };

            destination = Some(match profile.effective_role() {
                Role::Organizer => ORGANIZER_HOME.to_string(),
                Role::User => self.next.clone().unwrap_or_else(|| DEFAULT_HOME.to_string()),
            });
            s.transitioned = true;
            true
        });

        destination
    }

    async fn fetch_profile(&self, uid: &str) -> Result<Profile, ProfileFetchError> {
        match self.profiles.get_profile(uid).await {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => Err(ProfileFetchError::NotFound),
            Err(e) => Err(ProfileFetchError::Transient(e.to_string())),
        }
    }

    /// Derive the role from `userType` and write it back if it changed.
    async fn apply_derived_role(&self, mut profile: Profile) -> Profile {
        let stored = profile.role;
        let role = profile.resolve_role();
        if stored != Some(role) {
            self.persist_role(&profile.uid, role).await;
        }
        profile
    }

    async fn persist_role(&self, uid: &str, role: Role) {
        if let Err(e) = self.profiles.update_role(uid, role).await {
            tracing::warn!(uid = %uid, role = %role, error = %e, "Failed to persist role");
        }
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed-in sessions.
//!
//! Each session owns an identity feed and a [`SessionResolver`] consuming it.
//! Handlers find sessions by the `sid` claim of the session JWT. Sessions and
//! sign-out markers are kept until that JWT's `exp`, then pruned.

pub mod resolver;
pub mod retry;

pub use resolver::{
    ProfileFetchError, ResolverSettings, RoleAssignment, SessionPhase, SessionResolver,
    SessionSnapshot,
};

use crate::db::ProfileStore;
use crate::error::AppError;
use crate::models::Identity;
use crate::time_utils::unix_now;
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;
use tokio::sync::watch;

/// Generate a random hex identifier from `bytes` bytes of entropy.
pub fn random_id(bytes: usize) -> Result<String, AppError> {
    let mut buf = vec![0u8; bytes];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(hex::encode(buf))
}

/// One signed-in client.
pub struct SessionHandle {
    id: String,
    /// Unix timestamp after which the session's token is no longer valid
    expires_at: u64,
    identity: watch::Sender<Option<Identity>>,
    resolver: Arc<SessionResolver>,
}

impl SessionHandle {
    fn start(
        id: String,
        identity: Identity,
        expires_at: u64,
        profiles: Arc<dyn ProfileStore>,
        settings: ResolverSettings,
        next: Option<String>,
    ) -> Self {
        let resolver = Arc::new(SessionResolver::new(profiles, settings, next));
        let (tx, rx) = watch::channel(Some(identity));

        // Ends once the handle (and with it the sender) is dropped.
        tokio::spawn(resolver.clone().run(rx));

        Self {
            id,
            expires_at,
            identity: tx,
            resolver,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    pub fn resolver(&self) -> &SessionResolver {
        &self.resolver
    }

    /// Identity most recently published on the feed.
    pub fn identity(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    fn sign_out(&self) {
        self.identity.send_replace(None);
        self.resolver.sign_out();
    }
}

/// All live sessions, keyed by session id.
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<SessionHandle>>,
    /// Signed-out session IDs and their token expiry; those tokens must not
    /// restore a session
    ended: DashMap<String, u64>,
    profiles: Arc<dyn ProfileStore>,
    settings: ResolverSettings,
}

impl SessionRegistry {
    pub fn new(profiles: Arc<dyn ProfileStore>, settings: ResolverSettings) -> Self {
        Self {
            sessions: DashMap::new(),
            ended: DashMap::new(),
            profiles,
            settings,
        }
    }

    /// Start a session for a freshly signed-in identity.
    ///
    /// `expires_at` is the `exp` of the token issued for it.
    pub fn create(
        &self,
        identity: Identity,
        next: Option<String>,
        expires_at: u64,
    ) -> Result<Arc<SessionHandle>, AppError> {
        self.prune_expired(unix_now());

        let sid = random_id(16)?;
        tracing::info!(uid = %identity.uid, "Starting session");

        let handle = Arc::new(SessionHandle::start(
            sid.clone(),
            identity,
            expires_at,
            self.profiles.clone(),
            self.settings,
            next,
        ));
        self.sessions.insert(sid, handle.clone());
        Ok(handle)
    }

    pub fn get(&self, sid: &str) -> Option<Arc<SessionHandle>> {
        self.sessions.get(sid).map(|h| h.clone())
    }

    /// Look up a session, re-creating it from a still-valid token if needed.
    ///
    /// Sessions live in process memory, so a restart (or another instance)
    /// loses them while the client's JWT stays valid. Returns `None` for a
    /// session that was signed out.
    pub fn restore(
        &self,
        sid: &str,
        identity: Identity,
        expires_at: u64,
    ) -> Option<Arc<SessionHandle>> {
        if self.ended.contains_key(sid) {
            return None;
        }

        if let Some(handle) = self.get(sid) {
            let same_user = handle
                .identity()
                .is_some_and(|current| current.uid == identity.uid);
            if same_user {
                return Some(handle);
            }
        }

        tracing::debug!(uid = %identity.uid, "Restoring session from token");
        let handle = Arc::new(SessionHandle::start(
            sid.to_string(),
            identity,
            expires_at,
            self.profiles.clone(),
            self.settings,
            None,
        ));
        self.sessions.insert(sid.to_string(), handle.clone());
        Some(handle)
    }

    /// Sign a session out and forget it.
    ///
    /// The sign-out marker is kept until `expires_at`, the `exp` of the
    /// session's token. Readers still holding the handle observe a cleared
    /// session.
    pub fn end(&self, sid: &str, expires_at: u64) -> bool {
        self.prune_expired(unix_now());

        self.ended.insert(sid.to_string(), expires_at);
        match self.sessions.remove(sid) {
            Some((_, handle)) => {
                handle.sign_out();
                tracing::info!("Session ended");
                true
            }
            None => false,
        }
    }

    /// Drop sessions and sign-out markers whose token expired at or before `now`.
    fn prune_expired(&self, now: u64) {
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().expires_at <= now)
            .map(|entry| entry.key().clone())
            .collect();

        for sid in &expired {
            if let Some((_, handle)) = self.sessions.remove(sid) {
                handle.sign_out();
            }
        }
        self.ended.retain(|_, expires_at| *expires_at > now);

        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "Pruned expired sessions");
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(
            Arc::new(crate::db::MemoryDb::new()),
            ResolverSettings {
                max_attempts: 1,
                backoff_step: std::time::Duration::from_millis(1),
            },
        )
    }

    fn in_a_day() -> u64 {
        unix_now() + 86400
    }

    fn identity(uid: &str) -> Identity {
        Identity {
            uid: uid.to_string(),
            email: None,
        }
    }

    #[tokio::test]
    async fn test_new_session_reads_as_loading_immediately() {
        let sessions = registry();
        let handle = sessions.create(identity("u1"), None, in_a_day()).unwrap();

        let snapshot = handle.resolver().snapshot();
        assert_eq!(snapshot.identity, Some(identity("u1")));
        assert!(snapshot.loading);
        assert_eq!(snapshot.phase, SessionPhase::Authenticating);

        let settled = handle.resolver().settled().await;
        assert!(!settled.loading);
        assert_eq!(settled.phase, SessionPhase::Authenticated);
    }

    #[tokio::test]
    async fn test_restore_reuses_live_session() {
        let sessions = registry();
        let handle = sessions.create(identity("u1"), None, in_a_day()).unwrap();

        let restored = sessions.restore(handle.id(), identity("u1"), in_a_day()).unwrap();
        assert!(Arc::ptr_eq(&handle, &restored));

        let rebuilt = sessions.restore("unknown-sid", identity("u2"), in_a_day()).unwrap();
        assert_eq!(rebuilt.id(), "unknown-sid");
        assert_eq!(sessions.len(), 2);
    }

    #[tokio::test]
    async fn test_ended_session_cannot_be_restored() {
        let sessions = registry();
        let handle = sessions.create(identity("u1"), None, in_a_day()).unwrap();
        let sid = handle.id().to_string();

        assert!(sessions.end(&sid, handle.expires_at()));
        assert!(sessions.get(&sid).is_none());
        assert!(sessions.restore(&sid, identity("u1"), in_a_day()).is_none());

        let snapshot = handle.resolver().snapshot();
        assert_eq!(snapshot.identity, None);
        assert_eq!(snapshot.profile, None);
    }

    #[tokio::test]
    async fn test_expired_sessions_and_markers_are_pruned() {
        let sessions = registry();
        let past = unix_now() - 1;

        let stale = sessions.create(identity("u1"), None, past).unwrap();
        assert_eq!(sessions.len(), 1);

        let live = sessions.create(identity("u2"), None, in_a_day()).unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(sessions.get(stale.id()).is_none());
        assert!(sessions.get(live.id()).is_some());
        assert_eq!(stale.resolver().snapshot().identity, None);

        assert!(!sessions.end("signed-out-sid", past));
        assert_eq!(sessions.ended.len(), 1);

        sessions.create(identity("u3"), None, in_a_day()).unwrap();
        assert!(sessions.ended.is_empty());
        assert_eq!(sessions.len(), 2);
    }

    #[tokio::test]
    async fn test_unexpired_sign_out_marker_survives_pruning() {
        let sessions = registry();
        let handle = sessions.create(identity("u1"), None, in_a_day()).unwrap();
        let sid = handle.id().to_string();
        sessions.end(&sid, handle.expires_at());

        sessions.prune_expired(unix_now());

        assert!(sessions.restore(&sid, identity("u1"), in_a_day()).is_none());
    }

    #[test]
    fn test_random_id_is_hex_of_requested_length() {
        let id = random_id(16).unwrap();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, random_id(16).unwrap());
    }
}

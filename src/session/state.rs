//! Session state: the token, the user's display name and role set.
//!
//! One `SessionState` lives for one desk lifetime. It is created from the
//! persisted token at start, mutated by login, profile fetch and token reset,
//! and torn down at logout, which also asks for a full reload.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use futures::lock::Mutex;
use tracing::{debug, info, warn};

use crate::error::{DeskError, DeskResult};
use crate::identity::IdentityService;
use crate::metrics::MetricsRecorder;
use crate::models::{Credentials, Profile, Session};
use crate::navigation::reload::Reloader;
use crate::routing::{reset_router, PermissionStore, Router};
use crate::store::CredentialStore;

/// Collaborators the session needs to tear itself down at logout.
#[derive(Clone)]
pub struct SessionTeardown {
    pub router: Arc<dyn Router>,
    pub permission: Arc<PermissionStore>,
    pub reloader: Arc<dyn Reloader>,
}

pub struct SessionState {
    session: RwLock<Session>,
    store: Arc<dyn CredentialStore>,
    identity: Arc<dyn IdentityService>,
    teardown: SessionTeardown,
    metrics: Arc<dyn MetricsRecorder>,
    login_in_flight: Mutex<()>,
}

impl SessionState {
    /// Builds an empty session. Use `restore` to pick up a persisted token.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        identity: Arc<dyn IdentityService>,
        teardown: SessionTeardown,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> Self {
        SessionState {
            session: RwLock::new(Session::default()),
            store,
            identity,
            teardown,
            metrics,
            login_in_flight: Mutex::new(()),
        }
    }

    /// Builds a session seeded with whatever token the store holds.
    /// A store that cannot be read yields a logged-out session.
    pub async fn restore(
        store: Arc<dyn CredentialStore>,
        identity: Arc<dyn IdentityService>,
        teardown: SessionTeardown,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> Self {
        let token = match store.get().await {
            Ok(token) => token.unwrap_or_default(),
            Err(e) => {
                if store.is_enabled() {
                    warn!("Could not read persisted token: {}", e);
                } else {
                    debug!("Credential store disabled; starting logged out");
                }
                String::new()
            }
        };
        if !token.is_empty() {
            info!(
                event_name = "session.restored",
                event_domain = "session",
                "restored persisted token"
            );
        }

        let state = Self::new(store, identity, teardown, metrics);
        *state.write() = Session::with_token(token);
        state
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Session> {
        self.session.read().expect("session lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Session> {
        self.session.write().expect("session lock poisoned")
    }

    pub fn token(&self) -> String {
        self.read().token.clone()
    }

    pub fn username(&self) -> String {
        self.read().username.clone()
    }

    pub fn roles(&self) -> BTreeSet<String> {
        self.read().roles.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    async fn persist(&self, token: &str) {
        if let Err(e) = self.store.set(token).await {
            let err = DeskError::StorageWrite(e);
            warn!(
                event_name = "session.persist_failed",
                event_domain = "session",
                error = %err,
                "token kept in memory only"
            );
        }
    }

    async fn forget_persisted(&self) {
        if let Err(e) = self.store.remove().await {
            let err = DeskError::StorageWrite(e);
            warn!(
                event_name = "session.forget_failed",
                event_domain = "session",
                error = %err,
                "persisted token could not be removed"
            );
        }
    }

    /// Persists the token (best effort) and makes it the current one.
    pub async fn set_token(&self, value: &str) {
        self.persist(value).await;
        self.write().token = value.to_string();
    }

    /// Exchanges credentials for a token.
    ///
    /// Only one login may be in flight; the token is set once, on success.
    pub async fn login(&self, credentials: &Credentials) -> DeskResult<()> {
        let Some(_in_flight) = self.login_in_flight.try_lock() else {
            self.metrics.record_login("in_flight");
            return Err(DeskError::LoginInFlight);
        };
        if self.is_authenticated() {
            self.metrics.record_login("already_authenticated");
            return Err(DeskError::AlreadyAuthenticated);
        }

        match self.identity.login(credentials).await {
            Ok(token) if token.is_empty() => {
                self.metrics.record_login("failure");
                Err(DeskError::Login(format!(
                    "identity service '{}' returned an empty token",
                    self.identity.get_name()
                )))
            }
            Ok(token) => {
                self.set_token(&token).await;
                self.metrics.record_login("success");
                info!(
                    event_name = "session.login",
                    event_domain = "session",
                    username = credentials.username.as_str(),
                    identity = self.identity.get_name(),
                    "login succeeded"
                );
                Ok(())
            }
            Err(e) => {
                self.metrics.record_login("failure");
                warn!(
                    event_name = "session.login_failed",
                    event_domain = "session",
                    username = credentials.username.as_str(),
                    error = e.as_str(),
                    "login failed"
                );
                Err(DeskError::Login(e))
            }
        }
    }

    /// Fetches the profile for the current token and adopts its roles.
    ///
    /// The role set is replaced, never merged, so repeated calls with the same
    /// token leave the same roles. A result for a token that is no longer
    /// current is discarded.
    pub async fn get_info(&self) -> DeskResult<Profile> {
        let token = self.token();
        if token.is_empty() {
            return Err(DeskError::Unauthenticated);
        }

        let profile = self
            .identity
            .fetch_profile(&token)
            .await
            .map_err(DeskError::RoleFetch)?;

        if profile.roles.is_empty() {
            return Err(DeskError::RoleFetch(format!(
                "profile of '{}' carries no roles",
                profile.username
            )));
        }

        let mut session = self.write();
        if session.token != token {
            return Err(DeskError::RoleFetch(
                "session changed while the profile was being fetched".to_string(),
            ));
        }
        session.roles = profile.role_set();
        session.username = profile.username.clone();
        debug!(
            "Session roles for '{}' are now {:?}",
            session.username, session.roles
        );
        Ok(profile)
    }

    /// Ends the session: forgets the token everywhere, retracts dynamic routes
    /// and requests a full reload so no in-memory state survives.
    pub async fn logout(&self) {
        self.forget_persisted().await;
        let username = {
            let mut session = self.write();
            let username = std::mem::take(&mut session.username);
            session.clear();
            username
        };

        self.teardown.permission.reset();
        // A failed retraction already asked for a reload; the one below covers
        // the normal path.
        if let Err(e) = reset_router(self.teardown.router.as_ref(), self.teardown.reloader.as_ref()) {
            warn!("Route table reset failed during logout: {}", e);
        }

        self.metrics.record_session_reset("logout");
        info!(
            event_name = "session.logout",
            event_domain = "session",
            username = username.as_str(),
            "logged out"
        );
        self.teardown.reloader.reload();
    }

    /// Forgets the token and roles without reloading or touching routes.
    pub async fn reset_token(&self) {
        self.forget_persisted().await;
        self.write().clear_credentials();
        self.metrics.record_session_reset("reset");
        info!(
            event_name = "session.token_reset",
            event_domain = "session",
            "token reset"
        );
    }
}

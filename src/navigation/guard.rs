//! The navigation guard: every attempt goes through here before it commits.
//!
//! The login screen (and anything else whitelisted) is always reachable.
//! Without a token every other path redirects to login. The first
//! authenticated navigation of a session fetches the user's roles, registers
//! the role routes and replays the original target with history-replacing
//! semantics. Later navigations pass straight through.

use std::sync::Arc;

use async_trait::async_trait;
use futures::lock::Mutex;
use tracing::{debug, error, info, warn};

use super::navigator::{BeforeEach, GuardDecision, Navigation, Navigator};
use super::progress::Progress;
use super::reload::Reloader;
use crate::config::{GuardMode, NavigationConfig};
use crate::error::{DeskError, DeskResult};
use crate::metrics::MetricsRecorder;
use crate::models::route::normalize_path;
use crate::routing::{PermissionStore, Resolution, Router};
use crate::session::SessionState;

/// Where a navigation attempt stands before the guard decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Whitelisted,
    Unauthenticated,
    /// Token present, role routes not yet registered this session.
    RolesUninitialized,
    RolesReady,
}

pub struct NavigationGuard {
    session: Arc<SessionState>,
    permission: Arc<PermissionStore>,
    router: Arc<dyn Router>,
    reloader: Arc<dyn Reloader>,
    metrics: Arc<dyn MetricsRecorder>,
    login_path: String,
    whitelist: Vec<String>,
    mode: GuardMode,
    materializing: Mutex<()>,
}

impl NavigationGuard {
    pub fn new(
        config: &NavigationConfig,
        session: Arc<SessionState>,
        permission: Arc<PermissionStore>,
        router: Arc<dyn Router>,
        reloader: Arc<dyn Reloader>,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> Self {
        NavigationGuard {
            session,
            permission,
            router,
            reloader,
            metrics,
            login_path: normalize_path(&config.login_path),
            whitelist: config.whitelist.iter().map(|p| normalize_path(p)).collect(),
            mode: config.mode,
            materializing: Mutex::new(()),
        }
    }

    /// Installs the guard and a progress indicator on `navigator`.
    pub fn register(self: &Arc<Self>, navigator: &Navigator) -> Arc<Progress> {
        let progress = Arc::new(Progress::new());
        navigator.before_each(self.clone());
        navigator.add_hook(progress.clone());
        info!(
            event_name = "navigation.guard.registered",
            event_domain = "navigation",
            mode = ?self.mode,
            login_path = self.login_path.as_str(),
            "navigation guard registered"
        );
        progress
    }

    pub fn classify(&self, path: &str) -> GuardState {
        let path = normalize_path(path);
        if path == self.login_path || self.whitelist.contains(&path) {
            GuardState::Whitelisted
        } else if !self.session.is_authenticated() {
            GuardState::Unauthenticated
        } else if !self.permission.is_materialized() {
            GuardState::RolesUninitialized
        } else {
            GuardState::RolesReady
        }
    }

    /// Fetches roles and registers their routes, once per session.
    ///
    /// Concurrent callers queue on the same lock; whoever comes second finds
    /// the work done and returns zero. A failed registration removes whatever
    /// this call had already added.
    pub async fn materialize(&self) -> DeskResult<usize> {
        let _flight = self.materializing.lock().await;
        if self.permission.is_materialized() {
            self.metrics.record_materialization("skipped");
            debug!("Role routes were materialized while waiting");
            return Ok(0);
        }

        self.session.get_info().await?;
        let delta = self.permission.materialize(&self.session.roles());

        let mut registered = Vec::with_capacity(delta.added.len());
        for route in delta.added {
            let name = route.name.clone();
            if let Err(e) = self.router.add_route(route) {
                self.retract(&registered);
                self.permission.reset();
                return Err(DeskError::RouteRegistration(e));
            }
            registered.extend(name);
        }

        self.metrics.record_materialization("success");
        info!(
            event_name = "navigation.guard.materialized",
            event_domain = "navigation",
            username = self.session.username().as_str(),
            routes = ?registered,
            "role routes registered"
        );
        Ok(registered.len())
    }

    /// Removes routes added by a materialization that did not finish. If the
    /// table refuses, it is in an unknown state and only a reload recovers it.
    fn retract(&self, names: &[String]) {
        for name in names.iter().rev() {
            if !self.router.has_route(name) {
                continue;
            }
            if let Err(e) = self.router.remove_route(name) {
                let err = DeskError::RouteRemoval(e);
                error!(
                    event_name = "navigation.guard.retract_failed",
                    event_domain = "navigation",
                    route = name.as_str(),
                    error = %err,
                    "could not retract partially registered routes"
                );
                self.reloader.reload();
                return;
            }
        }
    }

    async fn recover(&self, to: &Resolution, err: DeskError) -> GuardDecision {
        self.metrics.record_materialization("failure");
        error!(
            event_name = "navigation.guard.failed",
            event_domain = "navigation",
            target = to.full_path().as_str(),
            error = %err,
            "role materialization failed; sending user to login"
        );
        self.session.reset_token().await;
        GuardDecision::Redirect(self.login_path.clone())
    }

    fn to_login(&self, to: &Resolution) -> GuardDecision {
        info!(
            event_name = "navigation.guard.redirect_login",
            event_domain = "navigation",
            target = to.full_path().as_str(),
            "no token; redirecting to login"
        );
        GuardDecision::Redirect(self.login_path.clone())
    }

    async fn gate(&self, to: &Resolution, state: GuardState) -> GuardDecision {
        match state {
            GuardState::Whitelisted | GuardState::RolesReady => GuardDecision::Allow,
            GuardState::Unauthenticated => self.to_login(to),
            GuardState::RolesUninitialized => match self.materialize().await {
                Ok(_) => GuardDecision::Replay { replace: true },
                Err(e) => self.recover(to, e).await,
            },
        }
    }

    /// Roles are refreshed when missing but a failure never blocks the user.
    async fn advise(&self, to: &Resolution, state: GuardState) -> GuardDecision {
        match state {
            GuardState::Whitelisted => GuardDecision::Allow,
            GuardState::Unauthenticated => self.to_login(to),
            GuardState::RolesReady if self.session.roles().is_empty() => {
                if let Err(e) = self.session.get_info().await {
                    warn!("Role refresh for {} failed: {}", to.full_path(), e);
                }
                GuardDecision::Allow
            }
            GuardState::RolesReady => GuardDecision::Allow,
            // `to` was resolved before any role route existed, even when a
            // concurrent attempt did the registering.
            GuardState::RolesUninitialized => match self.materialize().await {
                Ok(_) => GuardDecision::Replay { replace: true },
                Err(e) => {
                    self.metrics.record_materialization("failure");
                    warn!(
                        event_name = "navigation.guard.advisory_failed",
                        event_domain = "navigation",
                        target = to.full_path().as_str(),
                        error = %e,
                        "role refresh failed; letting navigation through"
                    );
                    GuardDecision::Allow
                }
            },
        }
    }
}

#[async_trait]
impl BeforeEach for NavigationGuard {
    fn name(&self) -> &str {
        "navigation-guard"
    }

    async fn before_each(&self, to: &Resolution, _from: Option<&Navigation>) -> GuardDecision {
        let state = self.classify(&to.path);
        debug!("Guard state for {}: {:?}", to.full_path(), state);
        match self.mode {
            GuardMode::Gating => self.gate(to, state).await,
            GuardMode::Advisory => self.advise(to, state).await,
        }
    }
}

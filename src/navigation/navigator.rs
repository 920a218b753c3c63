use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::{DeskError, DeskResult};
use crate::metrics::MetricsRecorder;
use crate::models::RouteRecord;
use crate::routing::{Resolution, Router};

/// What a before-guard wants done with a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Abandon this attempt and navigate to another path instead.
    Redirect(String),
    /// Run the same navigation again against the current route table.
    Replay { replace: bool },
}

/// Runs before every navigation attempt. The first decision other than
/// `Allow` wins; later guards are not consulted.
#[async_trait]
pub trait BeforeEach: Send + Sync {
    fn name(&self) -> &str;
    async fn before_each(&self, to: &Resolution, from: Option<&Navigation>) -> GuardDecision;
}

/// Observes the start and end of every navigation attempt.
pub trait NavigationHook: Send + Sync {
    fn started(&self, target: &str);
    fn finished(&self, target: &str, outcome: &str);
}

/// A committed navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Final path, with query.
    pub location: String,
    pub matched: RouteRecord,
    pub params: BTreeMap<String, String>,
    /// The path first asked for, when a guard or route redirect changed it.
    pub redirected_from: Option<String>,
    /// Whether this entry replaced the previous one in history.
    pub replaced: bool,
    /// Attempts it took, counting redirects and replays.
    pub attempts: usize,
}

/// Pairs `started` with `finished` for one attempt, whichever way it ends.
struct AttemptScope {
    hooks: Vec<Arc<dyn NavigationHook>>,
    metrics: Arc<dyn MetricsRecorder>,
    target: String,
    outcome: &'static str,
    opened: Instant,
}

impl AttemptScope {
    fn open(
        hooks: Vec<Arc<dyn NavigationHook>>,
        metrics: Arc<dyn MetricsRecorder>,
        target: &str,
    ) -> Self {
        for hook in &hooks {
            hook.started(target);
        }
        AttemptScope {
            hooks,
            metrics,
            target: target.to_string(),
            // Overwritten on every path that returns normally.
            outcome: "cancelled",
            opened: Instant::now(),
        }
    }

    fn close(mut self, outcome: &'static str) {
        self.outcome = outcome;
    }
}

impl Drop for AttemptScope {
    fn drop(&mut self) {
        for hook in &self.hooks {
            hook.finished(&self.target, self.outcome);
        }
        self.metrics
            .record_navigation(self.outcome, self.opened.elapsed().as_secs_f64());
    }
}

/// Drives navigations through the before-guards and keeps the history stack.
pub struct Navigator {
    router: Arc<dyn Router>,
    guards: RwLock<Vec<Arc<dyn BeforeEach>>>,
    hooks: RwLock<Vec<Arc<dyn NavigationHook>>>,
    history: RwLock<Vec<Navigation>>,
    max_redirects: usize,
    metrics: Arc<dyn MetricsRecorder>,
}

impl Navigator {
    pub fn new(
        router: Arc<dyn Router>,
        max_redirects: usize,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> Self {
        Navigator {
            router,
            guards: RwLock::new(Vec::new()),
            hooks: RwLock::new(Vec::new()),
            history: RwLock::new(Vec::new()),
            max_redirects,
            metrics,
        }
    }

    pub fn router(&self) -> &Arc<dyn Router> {
        &self.router
    }

    pub fn before_each(&self, guard: Arc<dyn BeforeEach>) {
        debug!("Registering before-guard '{}'", guard.name());
        self.guards
            .write()
            .expect("navigator lock poisoned")
            .push(guard);
    }

    pub fn add_hook(&self, hook: Arc<dyn NavigationHook>) {
        self.hooks
            .write()
            .expect("navigator lock poisoned")
            .push(hook);
    }

    pub fn current(&self) -> Option<Navigation> {
        self.history
            .read()
            .expect("navigator lock poisoned")
            .last()
            .cloned()
    }

    /// History entries, oldest first.
    pub fn history(&self) -> Vec<Navigation> {
        self.history
            .read()
            .expect("navigator lock poisoned")
            .clone()
    }

    pub async fn push(&self, path: &str) -> DeskResult<Navigation> {
        self.navigate(path, false).await
    }

    pub async fn replace(&self, path: &str) -> DeskResult<Navigation> {
        self.navigate(path, true).await
    }

    fn guards(&self) -> Vec<Arc<dyn BeforeEach>> {
        self.guards.read().expect("navigator lock poisoned").clone()
    }

    fn hooks(&self) -> Vec<Arc<dyn NavigationHook>> {
        self.hooks.read().expect("navigator lock poisoned").clone()
    }

    async fn run_guards(&self, to: &Resolution, from: Option<&Navigation>) -> GuardDecision {
        for guard in self.guards() {
            let decision = guard.before_each(to, from).await;
            if decision != GuardDecision::Allow {
                debug!(
                    "Guard '{}' decided {:?} for {}",
                    guard.name(),
                    decision,
                    to.full_path()
                );
                return decision;
            }
        }
        GuardDecision::Allow
    }

    fn commit(&self, navigation: &Navigation) {
        let mut history = self.history.write().expect("navigator lock poisoned");
        if navigation.replaced && !history.is_empty() {
            history.pop();
        }
        history.push(navigation.clone());
    }

    async fn navigate(&self, path: &str, mut replace: bool) -> DeskResult<Navigation> {
        let mut target = path.to_string();
        let mut redirected_from: Option<String> = None;
        let mut attempts = 0;

        loop {
            attempts += 1;
            let scope = AttemptScope::open(self.hooks(), self.metrics.clone(), &target);
            let to = self.router.resolve(&target);
            let from = self.current();

            match self.run_guards(&to, from.as_ref()).await {
                GuardDecision::Allow => {
                    let Some(matched) = to.matched.clone() else {
                        scope.close("failed");
                        warn!("No route matches {}", to.full_path());
                        return Err(DeskError::Unmatched(to.full_path()));
                    };
                    let navigation = Navigation {
                        location: to.full_path(),
                        matched,
                        params: to.params.clone(),
                        redirected_from: redirected_from.or_else(|| to.redirected_from.clone()),
                        replaced: replace,
                        attempts,
                    };
                    self.commit(&navigation);
                    scope.close("allowed");
                    info!(
                        event_name = "navigation.committed",
                        event_domain = "navigation",
                        location = navigation.location.as_str(),
                        route = navigation.matched.name.as_deref().unwrap_or(""),
                        replaced = navigation.replaced,
                        attempts = navigation.attempts,
                        "navigation committed"
                    );
                    return Ok(navigation);
                }
                GuardDecision::Redirect(next) => {
                    scope.close("redirected");
                    redirected_from.get_or_insert_with(|| target.clone());
                    target = next;
                }
                GuardDecision::Replay { replace: replay_replace } => {
                    scope.close("replayed");
                    replace |= replay_replace;
                }
            }

            if attempts > self.max_redirects {
                warn!(
                    event_name = "navigation.redirect_limit",
                    event_domain = "navigation",
                    path = path,
                    limit = self.max_redirects,
                    "navigation gave up after too many redirects"
                );
                return Err(DeskError::TooManyRedirects {
                    path: path.to_string(),
                    limit: self.max_redirects,
                });
            }
        }
    }
}

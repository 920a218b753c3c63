//! Shared desk state.
//!
//! One `DeskState` holds everything a desk session needs: configuration, the
//! route table, the session and the guarded navigator. It is built at start
//! and rebuilt from scratch whenever a full reload is requested.

use std::sync::Arc;

use crate::config::ConfigV1;
use crate::identity::{create_identity_service, IdentityService};
use crate::metrics::{Metrics, MetricsRecorder};
use crate::navigation::{NavigationGuard, Navigator, Progress, ReloadSignal};
use crate::routing::{PermissionStore, RouteTable, Router};
use crate::session::{SessionState, SessionTeardown};
use crate::store::{create_store, CredentialStore};

#[derive(Clone)]
pub struct DeskState {
    pub config: Arc<ConfigV1>,
    /// Outlives rebuilds; it is where the token survives a reload.
    pub store: Arc<dyn CredentialStore>,
    pub identity: Arc<dyn IdentityService>,
    pub router: Arc<dyn Router>,
    pub permission: Arc<PermissionStore>,
    pub reload: Arc<ReloadSignal>,
    pub session: Arc<SessionState>,
    pub guard: Arc<NavigationGuard>,
    pub navigator: Arc<Navigator>,
    pub progress: Arc<Progress>,
    pub metrics: Metrics,
}

impl DeskState {
    pub async fn build(config: Arc<ConfigV1>, metrics: Metrics) -> Self {
        let store = create_store(&config.store);
        Self::with_store(config, store, metrics).await
    }

    /// Builds a fresh desk around an existing credential store.
    pub async fn with_store(
        config: Arc<ConfigV1>,
        store: Arc<dyn CredentialStore>,
        metrics: Metrics,
    ) -> Self {
        let recorder: Arc<dyn MetricsRecorder> = Arc::new(metrics.clone());
        let identity = create_identity_service(&config.identity);
        let router: Arc<dyn Router> = Arc::new(RouteTable::new(config.routes.constant.clone()));
        let permission = Arc::new(PermissionStore::from_config(&config.routes));
        let reload = Arc::new(ReloadSignal::new());

        let session = Arc::new(
            SessionState::restore(
                store.clone(),
                identity.clone(),
                SessionTeardown {
                    router: router.clone(),
                    permission: permission.clone(),
                    reloader: reload.clone(),
                },
                recorder.clone(),
            )
            .await,
        );

        let guard = Arc::new(NavigationGuard::new(
            &config.navigation,
            session.clone(),
            permission.clone(),
            router.clone(),
            reload.clone(),
            recorder.clone(),
        ));
        let navigator = Arc::new(Navigator::new(
            router.clone(),
            config.navigation.max_redirects,
            recorder,
        ));
        let progress = guard.register(&navigator);

        DeskState {
            config,
            store,
            identity,
            router,
            permission,
            reload,
            session,
            guard,
            navigator,
            progress,
            metrics,
        }
    }

    /// Drops all in-memory state and starts over from config and the persisted token.
    pub async fn rebuild(&self) -> Self {
        Self::with_store(self.config.clone(), self.store.clone(), self.metrics.clone()).await
    }
}

use std::collections::BTreeSet;
use std::sync::RwLock;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::RoutesConfig;
use crate::models::route::join_paths;
use crate::models::RouteDescriptor;

/// Routes to register into the live table as the result of one materialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteDelta {
    pub added: Vec<RouteDescriptor>,
}

impl RouteDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
    }
}

/// An entry of the sidebar menu.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub title: String,
    pub path: String,
    pub icon: Option<String>,
    pub children: Vec<MenuItem>,
}

/// Keeps the routes the role set may see, recursing into children.
pub fn filter_dynamic_routes(
    routes: &[RouteDescriptor],
    roles: &BTreeSet<String>,
) -> Vec<RouteDescriptor> {
    routes
        .iter()
        .filter(|r| r.meta.permits(roles))
        .map(|r| {
            let mut route = r.clone();
            route.children = filter_dynamic_routes(&r.children, roles);
            route
        })
        .collect()
}

fn menu_items(routes: &[RouteDescriptor], parent: &str) -> Vec<MenuItem> {
    let mut items = Vec::new();
    for route in routes.iter().filter(|r| !r.meta.hidden) {
        let path = join_paths(parent, &route.path);
        let mut children = menu_items(&route.children, &path);
        match &route.meta.title {
            // A single visible child stands in for its parent unless told otherwise.
            Some(_) if children.len() == 1 && !route.meta.always_show => {
                items.append(&mut children);
            }
            Some(title) => items.push(MenuItem {
                title: title.clone(),
                path,
                icon: route.meta.icon.clone(),
                children,
            }),
            None => items.append(&mut children),
        }
    }
    items
}

#[derive(Debug, Default)]
struct PermissionState {
    materialized: bool,
    roles: BTreeSet<String>,
    added: Vec<RouteDescriptor>,
}

/// Derives, once per session, the role-gated routes a user may reach.
pub struct PermissionStore {
    constant: Vec<RouteDescriptor>,
    dynamic: Vec<RouteDescriptor>,
    state: RwLock<PermissionState>,
}

impl PermissionStore {
    pub fn new(constant: Vec<RouteDescriptor>, dynamic: Vec<RouteDescriptor>) -> Self {
        PermissionStore {
            constant,
            dynamic,
            state: RwLock::new(PermissionState::default()),
        }
    }

    pub fn from_config(config: &RoutesConfig) -> Self {
        Self::new(config.constant.clone(), config.dynamic.clone())
    }

    pub fn is_materialized(&self) -> bool {
        self.state.read().expect("permission lock poisoned").materialized
    }

    /// Computes the routes `roles` may reach and records them as this session's
    /// dynamic collection. Only the first call yields routes; until `reset`,
    /// later calls return an empty delta whatever the roles.
    pub fn materialize(&self, roles: &BTreeSet<String>) -> RouteDelta {
        let mut state = self.state.write().expect("permission lock poisoned");
        if state.materialized {
            debug!("Role routes already materialized; nothing to add");
            return RouteDelta::default();
        }

        let added = filter_dynamic_routes(&self.dynamic, roles);
        info!(
            event_name = "routing.permission.materialized",
            event_domain = "routing",
            roles = ?roles,
            added_count = added.len(),
            "materialized role routes"
        );
        state.materialized = true;
        state.roles = roles.clone();
        state.added = added.clone();
        RouteDelta { added }
    }

    /// The dynamic routes of this session. Empty until materialized.
    pub fn added_routes(&self) -> Vec<RouteDescriptor> {
        self.state
            .read()
            .expect("permission lock poisoned")
            .added
            .clone()
    }

    /// Constant routes followed by this session's dynamic routes.
    pub fn routes(&self) -> Vec<RouteDescriptor> {
        let mut routes = self.constant.clone();
        routes.extend(self.added_routes());
        routes
    }

    pub fn menu(&self) -> Vec<MenuItem> {
        menu_items(&self.routes(), "/")
    }

    /// Forgets the materialization so the next authenticated navigation starts over.
    pub fn reset(&self) {
        let mut state = self.state.write().expect("permission lock poisoned");
        *state = PermissionState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::defaults::{clinic_constant_routes, clinic_dynamic_routes};

    fn roles(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|r| r.to_string()).collect()
    }

    fn store() -> PermissionStore {
        PermissionStore::new(clinic_constant_routes(), clinic_dynamic_routes())
    }

    #[test]
    fn test_filter_by_role() {
        let nurse = filter_dynamic_routes(&clinic_dynamic_routes(), &roles(&["nurse"]));
        let paths: Vec<&str> = nurse.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/patient", "/history"]);

        let admin = filter_dynamic_routes(&clinic_dynamic_routes(), &roles(&["admin"]));
        assert_eq!(admin.len(), 5);

        assert!(filter_dynamic_routes(&clinic_dynamic_routes(), &roles(&["janitor"])).is_empty());
    }

    #[test]
    fn test_filter_prunes_gated_children() {
        let route = RouteDescriptor::new("/reports")
            .named("Reports")
            .with_meta(crate::models::RouteMeta {
                roles: vec!["doctor".to_string(), "admin".to_string()],
                ..Default::default()
            })
            .with_child(RouteDescriptor::new("open").named("OpenReports"))
            .with_child(
                RouteDescriptor::new("audit")
                    .named("AuditReports")
                    .with_meta(crate::models::RouteMeta {
                        roles: vec!["admin".to_string()],
                        ..Default::default()
                    }),
            );
        let filtered = filter_dynamic_routes(&[route], &roles(&["doctor"]));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].children.len(), 1);
        assert_eq!(filtered[0].children[0].name.as_deref(), Some("OpenReports"));
    }

    #[test]
    fn test_materialize_is_idempotent() {
        let store = store();
        assert!(!store.is_materialized());
        assert!(store.added_routes().is_empty());

        let first = store.materialize(&roles(&["doctor"]));
        assert_eq!(first.added.len(), 4);
        assert!(store.is_materialized());

        let second = store.materialize(&roles(&["doctor"]));
        assert!(second.is_empty());
        assert_eq!(store.added_routes().len(), 4);
    }

    #[test]
    fn test_materialize_with_no_accessible_routes_still_counts() {
        let store = store();
        let delta = store.materialize(&roles(&["janitor"]));
        assert!(delta.is_empty());
        assert!(store.is_materialized());
    }

    #[test]
    fn test_reset_allows_new_materialization() {
        let store = store();
        store.materialize(&roles(&["nurse"]));
        store.reset();
        assert!(!store.is_materialized());
        assert!(store.added_routes().is_empty());
        assert_eq!(store.materialize(&roles(&["admin"])).added.len(), 5);
    }

    #[test]
    fn test_menu_collapses_single_child_layouts() {
        let store = store();
        let before: Vec<String> = store.menu().into_iter().map(|m| m.path).collect();
        assert_eq!(before, vec!["/workbench"]);

        store.materialize(&roles(&["nurse"]));
        let menu = store.menu();
        let paths: Vec<&str> = menu.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["/workbench", "/patient/index", "/history/index"]);
        assert_eq!(menu[1].title, "Patient intake");
    }

    #[test]
    fn test_menu_keeps_always_show_parent() {
        let store = store();
        store.materialize(&roles(&["doctor"]));
        let menu = store.menu();
        let chat = menu
            .iter()
            .find(|m| m.path == "/ai-chat")
            .expect("always-show parent should stay");
        assert_eq!(chat.children.len(), 1);
        assert_eq!(chat.children[0].path, "/ai-chat/index");
    }
}

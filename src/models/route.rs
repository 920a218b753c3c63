use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Display and access metadata attached to a route.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMeta {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    /// Hidden routes are reachable but never shown in the menu.
    #[serde(default)]
    pub hidden: bool,
    /// Roles allowed to see this route. Empty means everyone.
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub keep_alive: bool,
    /// Pinned in the tag bar.
    #[serde(default)]
    pub affix: bool,
    /// Show the parent in the menu even with a single child.
    #[serde(default)]
    pub always_show: bool,
}

impl RouteMeta {
    pub fn requires_roles(&self) -> bool {
        !self.roles.is_empty()
    }

    /// True when no roles are required or any of `roles` is listed.
    pub fn permits(&self, roles: &BTreeSet<String>) -> bool {
        self.roles.is_empty() || self.roles.iter().any(|r| roles.contains(r))
    }
}

/// A node of the route tree as declared in configuration.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteDescriptor {
    /// Absolute for top-level routes, relative or absolute for children.
    pub path: String,
    /// Required for any route that may later be removed.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub redirect: Option<String>,
    #[serde(default)]
    pub alias: Vec<String>,
    #[serde(default)]
    pub meta: RouteMeta,
    #[serde(default)]
    pub children: Vec<RouteDescriptor>,
}

impl RouteDescriptor {
    pub fn new(path: impl Into<String>) -> Self {
        RouteDescriptor {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn redirect_to(mut self, target: impl Into<String>) -> Self {
        self.redirect = Some(target.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias.push(alias.into());
        self
    }

    pub fn with_meta(mut self, meta: RouteMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_child(mut self, child: RouteDescriptor) -> Self {
        self.children.push(child);
        self
    }

    /// Walks this route and its descendants, yielding the first one without a name.
    pub fn find_unnamed(&self) -> Option<&RouteDescriptor> {
        if self.name.is_none() {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_unnamed())
    }

    /// Flattens the tree into records with full paths, parents first.
    pub fn flatten(&self) -> Vec<RouteRecord> {
        let mut out = Vec::new();
        self.flatten_into("", &[], &mut out);
        out
    }

    fn flatten_into(&self, parent: &str, inherited_roles: &[String], out: &mut Vec<RouteRecord>) {
        let path = join_paths(parent, &self.path);
        let mut meta = self.meta.clone();
        if meta.roles.is_empty() {
            meta.roles = inherited_roles.to_vec();
        }
        let alias = self
            .alias
            .iter()
            .map(|a| join_paths(parent, a))
            .collect();
        out.push(RouteRecord {
            path: path.clone(),
            name: self.name.clone(),
            redirect: self.redirect.clone(),
            alias,
            meta: meta.clone(),
        });
        for child in &self.children {
            child.flatten_into(&path, &meta.roles, out);
        }
    }
}

/// A route as it sits in the live route table: one entry per tree node, with
/// the full path resolved and required roles inherited from ancestors.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RouteRecord {
    pub path: String,
    pub name: Option<String>,
    pub redirect: Option<String>,
    pub alias: Vec<String>,
    pub meta: RouteMeta,
}

/// Joins a child path onto its parent unless the child is already absolute.
pub fn join_paths(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        return normalize_path(child);
    }
    if child.is_empty() {
        return normalize_path(parent);
    }
    normalize_path(&format!("{}/{}", parent.trim_end_matches('/'), child))
}

/// Ensures a leading slash, collapses repeated slashes and drops a trailing one.
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

use std::collections::BTreeMap;
use std::sync::RwLock;

use tracing::{debug, warn};

use crate::models::route::{join_paths, normalize_path};
use crate::models::{RouteDescriptor, RouteRecord};

/// Longest chain of `redirect` hops `resolve` will follow.
const MAX_REDIRECT_CHAIN: usize = 8;

/// The live route table the navigation guard mutates.
pub trait Router: Send + Sync {
    /// Registers a top-level route. A route with the same name is replaced.
    fn add_route(&self, route: RouteDescriptor) -> Result<(), String>;
    /// Removes the named route, at any depth, together with its children.
    fn remove_route(&self, name: &str) -> Result<(), String>;
    /// Every route in the table, flattened, in declaration order.
    fn get_routes(&self) -> Vec<RouteRecord>;
    fn has_route(&self, name: &str) -> bool;
    /// Matches a path against the table, following redirects.
    fn resolve(&self, path: &str) -> Resolution;
}

/// The outcome of matching a path against the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The path that was asked for, normalised.
    pub requested: String,
    /// The path after following redirects. Catch-all matches keep the requested path.
    pub path: String,
    pub query: Option<String>,
    pub matched: Option<RouteRecord>,
    pub params: BTreeMap<String, String>,
    /// Set when at least one redirect was followed.
    pub redirected_from: Option<String>,
}

impl Resolution {
    pub fn is_matched(&self) -> bool {
        self.matched.is_some()
    }

    pub fn full_path(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    CatchAll(String),
}

fn parse_pattern(pattern: &str) -> Vec<Segment> {
    pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s.strip_prefix(':') {
            Some(rest) => param_segment(rest),
            None => Segment::Literal(s.to_string()),
        })
        .collect()
}

/// `:name(.*)` and `:name(.*)*` swallow the rest of the path; any other
/// custom regex is treated as a plain single-segment parameter.
fn param_segment(rest: &str) -> Segment {
    match rest.split_once('(') {
        Some((name, pattern)) if pattern.starts_with(".*)") => Segment::CatchAll(name.to_string()),
        Some((name, _)) => Segment::Param(name.to_string()),
        None => Segment::Param(rest.to_string()),
    }
}

/// Scores a match: literal segments outrank parameters, which outrank catch-alls.
fn match_pattern(pattern: &str, path: &str) -> Option<(usize, BTreeMap<String, String>)> {
    let segments = parse_pattern(pattern);
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let mut params = BTreeMap::new();
    let mut score = 0;

    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::CatchAll(name) => {
                params.insert(name.clone(), parts.get(i..).unwrap_or(&[]).join("/"));
                return Some((score, params));
            }
            Segment::Literal(lit) => {
                if parts.get(i) != Some(&lit.as_str()) {
                    return None;
                }
                score += 4;
            }
            Segment::Param(name) => {
                let value = parts.get(i)?;
                params.insert(name.clone(), value.to_string());
                score += 2;
            }
        }
    }

    if parts.len() == segments.len() {
        // An exact-length match beats any catch-all.
        Some((score + 1, params))
    } else {
        None
    }
}

fn split_query(path: &str) -> (String, Option<String>) {
    match path.split_once('?') {
        Some((p, q)) if !q.is_empty() => (normalize_path(p), Some(q.to_string())),
        Some((p, _)) => (normalize_path(p), None),
        None => (normalize_path(path), None),
    }
}

/// Finds the most specific record for `path`, checking each record's path and aliases.
/// Ties go to the record declared first.
fn best_match(
    records: &[RouteRecord],
    path: &str,
) -> Option<(RouteRecord, BTreeMap<String, String>, bool)> {
    let mut best: Option<(usize, RouteRecord, BTreeMap<String, String>, bool)> = None;
    for record in records {
        let candidates = std::iter::once((record.path.as_str(), false))
            .chain(record.alias.iter().map(|a| (a.as_str(), true)));
        for (pattern, via_alias) in candidates {
            if let Some((score, params)) = match_pattern(pattern, path) {
                let better = best.as_ref().map_or(true, |(s, ..)| score > *s);
                if better {
                    best = Some((score, record.clone(), params, via_alias));
                }
            }
        }
    }
    best.map(|(_, record, params, via_alias)| (record, params, via_alias))
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

/// In-memory, ordered route table.
pub struct RouteTable {
    routes: RwLock<Vec<RouteDescriptor>>,
}

impl RouteTable {
    pub fn new(initial: Vec<RouteDescriptor>) -> Self {
        RouteTable {
            routes: RwLock::new(initial),
        }
    }

    fn remove_named(routes: &mut Vec<RouteDescriptor>, name: &str) -> bool {
        let before = routes.len();
        routes.retain(|r| r.name.as_deref() != Some(name));
        if routes.len() != before {
            return true;
        }
        routes
            .iter_mut()
            .any(|r| Self::remove_named(&mut r.children, name))
    }
}

impl Router for RouteTable {
    fn add_route(&self, route: RouteDescriptor) -> Result<(), String> {
        if route.path.trim().is_empty() {
            return Err("Route has no path".to_string());
        }
        let mut routes = self.routes.write().expect("route table lock poisoned");
        if let Some(name) = route.name.as_deref() {
            if Self::remove_named(&mut routes, name) {
                debug!("Replacing existing route named '{}'", name);
            }
        }
        debug!(
            "Adding route '{}' ({})",
            route.path,
            route.name.as_deref().unwrap_or("unnamed")
        );
        routes.push(route);
        Ok(())
    }

    fn remove_route(&self, name: &str) -> Result<(), String> {
        let mut routes = self.routes.write().expect("route table lock poisoned");
        if Self::remove_named(&mut routes, name) {
            debug!("Removed route '{}'", name);
            Ok(())
        } else {
            Err(format!("No route named '{}'", name))
        }
    }

    fn get_routes(&self) -> Vec<RouteRecord> {
        let routes = self.routes.read().expect("route table lock poisoned");
        routes.iter().flat_map(|r| r.flatten()).collect()
    }

    fn has_route(&self, name: &str) -> bool {
        self.get_routes()
            .iter()
            .any(|r| r.name.as_deref() == Some(name))
    }

    fn resolve(&self, path: &str) -> Resolution {
        let records = self.get_routes();
        let (requested, query) = split_query(path);
        let mut current = requested.clone();
        let mut redirected_from = None;

        for _ in 0..=MAX_REDIRECT_CHAIN {
            let Some((record, params, via_alias)) = best_match(&records, &current) else {
                return Resolution {
                    requested,
                    path: current,
                    query,
                    matched: None,
                    params: BTreeMap::new(),
                    redirected_from,
                };
            };

            if let Some(target) = record.redirect.as_deref() {
                let next = join_paths(parent_of(&record.path), target);
                if next != current {
                    redirected_from.get_or_insert_with(|| current.clone());
                    current = next;
                    continue;
                }
            }

            if via_alias {
                debug!("'{}' matched alias of '{}'", current, record.path);
            }
            return Resolution {
                requested,
                path: current,
                query,
                matched: Some(record),
                params,
                redirected_from,
            };
        }

        warn!("Redirect chain from '{}' is too long; giving up", requested);
        Resolution {
            requested,
            path: current,
            query,
            matched: None,
            params: BTreeMap::new(),
            redirected_from,
        }
    }
}

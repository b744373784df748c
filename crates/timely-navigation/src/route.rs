//! Static route table and resolved locations.

use crate::error::{NavigationError, Result};

/// Route names used by the guards.
pub const DASHBOARD: &str = "dashboard";
pub const LOGIN: &str = "login";
pub const AUTH_CALLBACK: &str = "auth-callback";
pub const NOT_FOUND: &str = "not-found";

/// Static per-route flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub title: Option<String>,
    pub requires_auth: bool,
}

impl RouteMeta {
    pub fn titled(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            requires_auth: false,
        }
    }

    pub fn protected(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            requires_auth: true,
        }
    }
}

/// One entry of the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRecord {
    pub path: String,
    pub name: String,
    pub aliases: Vec<String>,
    pub meta: RouteMeta,
    /// Matches any path no other record matches.
    pub catch_all: bool,
}

impl RouteRecord {
    pub fn new(path: &str, name: &str, meta: RouteMeta) -> Self {
        Self {
            path: path.to_string(),
            name: name.to_string(),
            aliases: Vec::new(),
            meta,
            catch_all: false,
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn catch_all(name: &str, meta: RouteMeta) -> Self {
        Self {
            path: "/:pathMatch(.*)*".to_string(),
            name: name.to_string(),
            aliases: Vec::new(),
            meta,
            catch_all: true,
        }
    }

    fn matches(&self, path: &str) -> bool {
        self.path == path || self.aliases.iter().any(|a| a == path)
    }
}

/// Where a redirect points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    Named(String),
    Path(String),
}

impl RouteTarget {
    pub fn named(name: &str) -> Self {
        RouteTarget::Named(name.to_string())
    }

    pub fn path(path: &str) -> Self {
        RouteTarget::Path(path.to_string())
    }
}

impl std::fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteTarget::Named(name) => write!(f, "{{name: {}}}", name),
            RouteTarget::Path(path) => write!(f, "{}", path),
        }
    }
}

/// A path resolved against the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteLocation {
    /// `None` only for the start location.
    pub name: Option<String>,
    pub path: String,
    /// Path plus query string and fragment, as requested.
    pub full_path: String,
    pub meta: RouteMeta,
}

impl RouteLocation {
    /// The location before the first navigation.
    pub fn start() -> Self {
        Self {
            name: None,
            path: "/".to_string(),
            full_path: "/".to_string(),
            meta: RouteMeta::default(),
        }
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}

/// The application's routes.
#[derive(Debug, Clone)]
pub struct RouteTable {
    records: Vec<RouteRecord>,
}

impl RouteTable {
    pub fn new(records: Vec<RouteRecord>) -> Self {
        Self { records }
    }

    /// The Timely route table.
    pub fn standard() -> Self {
        Self::new(vec![
            RouteRecord::new("/", DASHBOARD, RouteMeta::protected("Dashboard"))
                .with_alias("/dashboard"),
            RouteRecord::new("/login", LOGIN, RouteMeta::titled("Login")),
            RouteRecord::new("/auth/callback", AUTH_CALLBACK, RouteMeta::titled("Signing in")),
            RouteRecord::new(
                "/time-entries",
                "time-entries",
                RouteMeta::protected("Time Entries"),
            ),
            RouteRecord::new("/projects", "projects", RouteMeta::protected("Projects")),
            RouteRecord::new("/reports", "reports", RouteMeta::protected("Reports")),
            RouteRecord::catch_all(NOT_FOUND, RouteMeta::titled("404 Page Not Found")),
        ])
    }

    pub fn records(&self) -> &[RouteRecord] {
        &self.records
    }

    /// Resolve a requested path (query string and fragment allowed).
    ///
    /// Paths no record matches resolve to the catch-all route.
    pub fn resolve(&self, full_path: &str) -> Result<RouteLocation> {
        let full_path = if full_path.starts_with('/') {
            full_path.to_string()
        } else {
            format!("/{}", full_path)
        };
        let path = normalize(&full_path);

        let record = self
            .records
            .iter()
            .find(|r| !r.catch_all && r.matches(&path))
            .or_else(|| self.records.iter().find(|r| r.catch_all))
            .ok_or_else(|| NavigationError::UnknownRoute(path.clone()))?;

        Ok(RouteLocation {
            name: Some(record.name.clone()),
            path,
            full_path,
            meta: record.meta.clone(),
        })
    }

    /// Resolve a route by name, at its canonical path.
    pub fn resolve_named(&self, name: &str) -> Result<RouteLocation> {
        let record = self
            .records
            .iter()
            .find(|r| r.name == name && !r.catch_all)
            .ok_or_else(|| NavigationError::UnknownRoute(name.to_string()))?;

        Ok(RouteLocation {
            name: Some(record.name.clone()),
            path: record.path.clone(),
            full_path: record.path.clone(),
            meta: record.meta.clone(),
        })
    }

    pub fn resolve_target(&self, target: &RouteTarget) -> Result<RouteLocation> {
        match target {
            RouteTarget::Named(name) => self.resolve_named(name),
            RouteTarget::Path(path) => self.resolve(path),
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Strip query and fragment, collapse a trailing slash.
fn normalize(full_path: &str) -> String {
    let end = full_path.find(['?', '#']).unwrap_or(full_path.len());
    let path = &full_path[..end];
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

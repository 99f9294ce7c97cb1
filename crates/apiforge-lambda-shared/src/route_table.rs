//! Declarative gateway route registrations.
//!
//! Path matching is the gateway's job. The table only records which deployed
//! handler serves each `METHOD /path` key so deployment tooling and tests can
//! enumerate them.

use std::collections::HashSet;
use std::fmt;

use http::Method;
use serde::Serialize;
use thiserror::Error;

/// Directory deployed handlers live under.
pub const HANDLER_ROOT: &str = "lambdas";

/// Folder used when a route does not name one.
pub const DEFAULT_FOLDER: &str = "api";

/// Errors raised while building a [`RouteTable`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteTableError {
    #[error("route {0} is already registered")]
    Duplicate(String),

    #[error("route path must start with '/': {0}")]
    InvalidPath(String),

    #[error("handler location must not be empty")]
    EmptyHandler,
}

/// Location of a deployed handler: `<root>/<folder>/<suffix>`.
///
/// ```
/// use apiforge_lambda_shared::create_route;
///
/// assert_eq!(create_route("home.handler", None), "lambdas/api/home.handler");
/// assert_eq!(create_route("stripe.handler", Some("webhooks")), "lambdas/webhooks/stripe.handler");
/// ```
pub fn create_route(handler_suffix: &str, folder: Option<&str>) -> String {
    format!(
        "{}/{}/{}",
        HANDLER_ROOT,
        folder.unwrap_or(DEFAULT_FOLDER),
        handler_suffix.trim_start_matches('/')
    )
}

/// One gateway route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDefinition {
    #[serde(serialize_with = "serialize_method")]
    pub method: Method,
    pub path: String,
    pub handler: String,
    pub authenticated: bool,
}

fn serialize_method<S: serde::Serializer>(method: &Method, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(method.as_str())
}

impl RouteDefinition {
    /// Public route served by the handler at `handler_suffix` in the default folder.
    pub fn new(method: Method, path: impl Into<String>, handler_suffix: &str) -> Self {
        Self {
            method,
            path: path.into(),
            handler: create_route(handler_suffix, None),
            authenticated: false,
        }
    }

    pub fn authenticated(mut self) -> Self {
        self.authenticated = true;
        self
    }

    /// Route key as the gateway spells it, e.g. `GET /`.
    pub fn key(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

impl fmt::Display for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.key(), self.handler)
    }
}

/// Routes in registration order, unique by key.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteDefinition>,
    keys: HashSet<String>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route. Duplicate keys are rejected.
    pub fn register(&mut self, route: RouteDefinition) -> Result<&RouteDefinition, RouteTableError> {
        if !route.path.starts_with('/') {
            return Err(RouteTableError::InvalidPath(route.path));
        }
        if route.handler.trim().is_empty() {
            return Err(RouteTableError::EmptyHandler);
        }

        let key = route.key();
        if !self.keys.insert(key.clone()) {
            return Err(RouteTableError::Duplicate(key));
        }

        self.routes.push(route);
        Ok(&self.routes[self.routes.len() - 1])
    }

    /// Look up the route registered for `method` and `path`.
    pub fn get(&self, method: &Method, path: &str) -> Option<&RouteDefinition> {
        self.routes
            .iter()
            .find(|route| route.method == *method && route.path == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteDefinition> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_route_default_folder() {
        assert_eq!(create_route("home.handler", None), "lambdas/api/home.handler");
        assert_eq!(create_route("/leads/get.handler", None), "lambdas/api/leads/get.handler");
    }

    #[test]
    fn test_register_in_order() {
        let mut table = RouteTable::new();
        table
            .register(RouteDefinition::new(Method::GET, "/", "home.handler"))
            .unwrap();
        table
            .register(RouteDefinition::new(Method::POST, "/leads", "leads/create.handler").authenticated())
            .unwrap();

        let keys: Vec<String> = table.iter().map(RouteDefinition::key).collect();
        assert_eq!(keys, vec!["GET /", "POST /leads"]);
        assert!(table.get(&Method::POST, "/leads").unwrap().authenticated);
        assert!(table.get(&Method::DELETE, "/leads").is_none());
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let mut table = RouteTable::new();
        table
            .register(RouteDefinition::new(Method::GET, "/", "home.handler"))
            .unwrap();
        let err = table
            .register(RouteDefinition::new(Method::GET, "/", "other.handler"))
            .unwrap_err();

        assert_eq!(err, RouteTableError::Duplicate("GET /".to_string()));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_same_path_different_method_allowed() {
        let mut table = RouteTable::new();
        table
            .register(RouteDefinition::new(Method::GET, "/leads", "leads/list.handler"))
            .unwrap();
        table
            .register(RouteDefinition::new(Method::POST, "/leads", "leads/create.handler"))
            .unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_invalid_path_rejected() {
        let mut table = RouteTable::new();
        let err = table
            .register(RouteDefinition::new(Method::GET, "leads", "leads/list.handler"))
            .unwrap_err();
        assert_eq!(err, RouteTableError::InvalidPath("leads".to_string()));
        assert!(table.is_empty());
    }

    #[test]
    fn test_route_display() {
        let route = RouteDefinition::new(Method::GET, "/", "home.handler");
        assert_eq!(route.to_string(), "GET / -> lambdas/api/home.handler");
    }
}

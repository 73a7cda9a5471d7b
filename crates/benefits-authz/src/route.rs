//! Per-route permission registration.
//!
//! # Purpose
//! Holds the startup-built table mapping `(method, route template)` to the
//! permission a caller must hold before the handler runs.
//!
//! # Key invariants
//! - Methods are stored upper-cased; route templates are stored verbatim.
//! - Every registered permission passes [`Permission::parse_alternatives`].
//! - Routes that were never registered report [`RouteRequirement::Unregistered`]
//!   so checkpoints can deny by default.
use crate::{AuthzError, AuthzResult, Permission};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum RouteEntry {
    Public,
    Permission(String),
}

/// What a checkpoint must verify for one route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRequirement<'a> {
    /// Explicitly registered as not requiring any permission.
    Public,
    /// Required permission string, possibly comma-separated alternatives.
    Permission(&'a str),
    /// Not present in the table.
    Unregistered,
}

/// Registration table consulted by the endpoint checkpoint.
///
/// # Example
/// ```rust
/// use benefits_authz::{RouteRequirement, RouteTable};
///
/// let mut routes = RouteTable::new();
/// routes.register("GET", "/v1/applications", "applications.view").expect("register");
/// routes.register_public("GET", "/v1/system/health").expect("register");
/// assert_eq!(
///     routes.required_for("get", "/v1/applications"),
///     RouteRequirement::Permission("applications.view")
/// );
/// assert_eq!(
///     routes.required_for("DELETE", "/v1/applications"),
///     RouteRequirement::Unregistered
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<(String, String), RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route that requires `permission`.
    ///
    /// # Errors
    /// - [`AuthzError::InvalidRoute`] when the permission is malformed.
    /// - [`AuthzError::DuplicateRoute`] when the route was already registered.
    pub fn register(&mut self, method: &str, route: &str, permission: &str) -> AuthzResult<()> {
        Permission::parse_alternatives(permission).map_err(|err| AuthzError::InvalidRoute {
            method: method.to_string(),
            route: route.to_string(),
            reason: err.to_string(),
        })?;
        self.insert(method, route, RouteEntry::Permission(permission.to_string()))
    }

    /// Register a route that any resolved caller may reach.
    pub fn register_public(&mut self, method: &str, route: &str) -> AuthzResult<()> {
        self.insert(method, route, RouteEntry::Public)
    }

    pub fn required_for(&self, method: &str, route: &str) -> RouteRequirement<'_> {
        match self
            .routes
            .get(&(method.to_ascii_uppercase(), route.to_string()))
        {
            Some(RouteEntry::Public) => RouteRequirement::Public,
            Some(RouteEntry::Permission(permission)) => RouteRequirement::Permission(permission),
            None => RouteRequirement::Unregistered,
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn insert(&mut self, method: &str, route: &str, entry: RouteEntry) -> AuthzResult<()> {
        if route.is_empty() || method.is_empty() {
            return Err(AuthzError::InvalidRoute {
                method: method.to_string(),
                route: route.to_string(),
                reason: "method and route must be non-empty".to_string(),
            });
        }
        let key = (method.to_ascii_uppercase(), route.to_string());
        if self.routes.contains_key(&key) {
            return Err(AuthzError::DuplicateRoute {
                method: key.0,
                route: key.1,
            });
        }
        self.routes.insert(key, entry);
        Ok(())
    }
}

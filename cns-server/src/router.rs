//! Route tables for the two services
//!
//! Every route is registered together with the roles it admits, so the gate
//! decision is data attached to the route rather than code in the handler.

use cns_core::auth::ADMIN_ROLES;
use cns_core::Role;
use hyper::Method;

/// Who may call a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Roles(&'static [Role]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Health,
    Login,
    Logout,
    Me,
    ListUsers,
    CreateUser,
    UpdateUserRole,
    UpdateUserPermissions,
    DeleteUser,
    ListAssociations,
    CreateAssociation,
    UpdateAssociation,
    DeleteAssociation,
    ListManagers,
    CreateManager,
    UpdateManager,
    DeleteManager,
}

#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    pub pattern: &'static str,
    pub access: Access,
    pub endpoint: Endpoint,
}

/// Path parameters captured by `:name` segments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(&'static str, String)>);

impl Params {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug)]
pub enum Resolution<'r> {
    Matched { route: &'r Route, params: Params },
    MethodNotAllowed,
    NotFound,
}

#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    fn new() -> Self {
        Router { routes: Vec::new() }
    }

    fn route(mut self, method: Method, pattern: &'static str, access: Access, endpoint: Endpoint) -> Self {
        self.routes.push(Route {
            method,
            pattern,
            access,
            endpoint,
        });
        self
    }

    /// Routes of the authentication service
    pub fn auth() -> Self {
        Router::new()
            .route(Method::GET, "/health", Access::Public, Endpoint::Health)
            .route(Method::POST, "/api/auth/login", Access::Public, Endpoint::Login)
            .route(Method::GET, "/api/auth/me", Access::Public, Endpoint::Me)
            .route(Method::POST, "/api/auth/logout", Access::Public, Endpoint::Logout)
    }

    /// Routes of the admin service; everything but health requires admin or super
    pub fn admin() -> Self {
        let admins = Access::Roles(ADMIN_ROLES);
        Router::new()
            .route(Method::GET, "/health", Access::Public, Endpoint::Health)
            .route(Method::GET, "/api/admin/users", admins, Endpoint::ListUsers)
            .route(Method::POST, "/api/admin/users", admins, Endpoint::CreateUser)
            .route(Method::DELETE, "/api/admin/users/:id", admins, Endpoint::DeleteUser)
            .route(Method::PUT, "/api/admin/users/:id/role", admins, Endpoint::UpdateUserRole)
            .route(
                Method::PUT,
                "/api/admin/users/:id/permissions",
                admins,
                Endpoint::UpdateUserPermissions,
            )
            .route(Method::GET, "/api/admin/data/associations", admins, Endpoint::ListAssociations)
            .route(Method::POST, "/api/admin/data/associations", admins, Endpoint::CreateAssociation)
            .route(Method::PUT, "/api/admin/data/associations/:id", admins, Endpoint::UpdateAssociation)
            .route(Method::DELETE, "/api/admin/data/associations/:id", admins, Endpoint::DeleteAssociation)
            .route(Method::GET, "/api/admin/data/managers", admins, Endpoint::ListManagers)
            .route(Method::POST, "/api/admin/data/managers", admins, Endpoint::CreateManager)
            .route(Method::PUT, "/api/admin/data/managers/:id", admins, Endpoint::UpdateManager)
            .route(Method::DELETE, "/api/admin/data/managers/:id", admins, Endpoint::DeleteManager)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn resolve(&self, method: &Method, path: &str) -> Resolution<'_> {
        let mut path_matched = false;
        for route in &self.routes {
            if let Some(params) = match_pattern(route.pattern, path) {
                if route.method == *method {
                    return Resolution::Matched { route, params };
                }
                path_matched = true;
            }
        }
        if path_matched {
            Resolution::MethodNotAllowed
        } else {
            Resolution::NotFound
        }
    }
}

fn match_pattern(pattern: &'static str, path: &str) -> Option<Params> {
    // a single trailing slash is tolerated
    let path = match path.strip_suffix('/') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => path,
    };

    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');
    let mut params = Vec::new();

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return Some(Params(params)),
            (Some(expected), Some(actual)) => {
                if let Some(name) = expected.strip_prefix(':') {
                    if actual.is_empty() {
                        return None;
                    }
                    let value = urlencoding::decode(actual).ok()?.into_owned();
                    params.push((name, value));
                } else if expected != actual {
                    return None;
                }
            }
            _ => return None,
        }
    }
}

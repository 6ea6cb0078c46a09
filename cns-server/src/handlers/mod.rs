//! Endpoint handlers
//!
//! Handlers are synchronous: the gate has already run and the body has been
//! read when they are called, and every store call blocks only on the store's
//! own I/O. [`crate::App`] runs them on the blocking pool.

use bytes::Bytes;
use cns_core::*;
use serde::de::DeserializeOwned;

use crate::response::Reply;
use crate::router::{Endpoint, Params};
use crate::state::AppState;

pub mod associations;
pub mod auth;
pub mod managers;
pub mod users;

/// Everything a handler may read from the request
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub service: &'static str,
    pub params: Params,
    pub query: Option<String>,
    pub token: Option<String>,
    pub session: Option<Session>,
    pub body: Bytes,
}

impl RequestContext {
    /// Decode the JSON body; an empty body decodes to the default value
    pub fn json<T: DeserializeOwned + Default>(&self) -> Result<T> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }
        serde_json::from_slice(&self.body).map_err(|_| CnsError::validation("Invalid input"))
    }

    /// Decode the JSON body, falling back to the default value when it does not parse
    pub fn json_or_default<T: DeserializeOwned + Default>(&self) -> T {
        serde_json::from_slice(&self.body).unwrap_or_default()
    }

    pub fn param(&self, name: &str) -> Result<&str> {
        self.params
            .get(name)
            .ok_or_else(|| CnsError::Internal(format!("route has no :{} parameter", name)))
    }

    /// First value of query parameter `name`, percent- and plus-decoded
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query
            .as_deref()?
            .split('&')
            .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
            .find(|(key, _)| *key == name)
            .and_then(|(_, value)| {
                urlencoding::decode(&value.replace('+', " "))
                    .ok()
                    .map(|v| v.into_owned())
            })
    }

    /// Session admitted by the gate
    pub fn session(&self) -> Result<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| CnsError::Unauthorized("Invalid or missing token".to_string()))
    }
}

pub fn dispatch(state: &AppState, endpoint: Endpoint, ctx: &RequestContext) -> Result<Reply> {
    match endpoint {
        Endpoint::Health => auth::health(ctx),
        Endpoint::Login => auth::login(state, ctx),
        Endpoint::Logout => auth::logout(state),
        Endpoint::Me => auth::me(state, ctx),
        Endpoint::ListUsers => users::list(state),
        Endpoint::CreateUser => users::create(state, ctx),
        Endpoint::UpdateUserRole => users::update_role(state, ctx),
        Endpoint::UpdateUserPermissions => users::update_permissions(state, ctx),
        Endpoint::DeleteUser => users::delete(state, ctx),
        Endpoint::ListAssociations => associations::list(state, ctx),
        Endpoint::CreateAssociation => associations::create(state, ctx),
        Endpoint::UpdateAssociation => associations::update(state, ctx),
        Endpoint::DeleteAssociation => associations::delete(state, ctx),
        Endpoint::ListManagers => managers::list(state, ctx),
        Endpoint::CreateManager => managers::create(state, ctx),
        Endpoint::UpdateManager => managers::update(state, ctx),
        Endpoint::DeleteManager => managers::delete(state, ctx),
    }
}

//! Session Controller: login, logout and identity introspection
//!
//! Sessions are stateless. Login reads the store but never writes it; logout
//! only overwrites the client's cookie.

use chrono::Utc;
use cns_core::auth::{cleared_session_cookie, session_cookie, IssuedToken, SessionClaims};
use cns_core::*;
use tracing::{debug, info};

use crate::state::AppState;

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginGrant {
    pub token: IssuedToken,
    pub cookie: String,
}

pub struct SessionController<'a> {
    state: &'a AppState,
}

impl<'a> SessionController<'a> {
    pub fn new(state: &'a AppState) -> Self {
        SessionController { state }
    }

    /// Check credentials and issue a session token.
    ///
    /// Unknown usernames and wrong passwords fail identically.
    pub fn login(&self, request: LoginRequest) -> Result<LoginGrant> {
        let request = request.normalized()?;
        let user = self.state.store.user_by_username(&request.username)?;

        let verified = match &user {
            Some(user) => self.state.passwords.verify(&request.password, &user.password_hash),
            None => self.state.passwords.verify_dummy(&request.password),
        };
        let user = match user {
            Some(user) if verified => user,
            _ => {
                debug!("login rejected");
                return Err(CnsError::Unauthorized("Invalid credentials".to_string()));
            }
        };

        let token = self
            .state
            .tokens
            .issue(&user.username, user.role)
            .map_err(|e| CnsError::Internal(e.to_string()))?;
        let cookie = session_cookie(&token.token, token.expires_at, self.state.tokens.ttl());
        info!(username = %user.username, role = %user.role, "session issued");
        Ok(LoginGrant { token, cookie })
    }

    /// Set-Cookie value that ends the client's session. Always succeeds.
    pub fn logout(&self) -> String {
        cleared_session_cookie(Utc::now())
    }

    /// Decode the caller's token
    pub fn me(&self, token: Option<&str>) -> Result<SessionClaims> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CnsError::Unauthorized("No token".to_string()))?;
        Ok(self.state.tokens.verify(token)?)
    }
}

//! Role-based admission check run before every protected handler

use tracing::debug;

use super::TokenService;
use crate::{CnsError, Result, Role, Session};

/// Roles admitted to the admin API
pub const ADMIN_ROLES: &[Role] = &[Role::Super, Role::Admin];

/// Decide whether a request carrying `token` may reach a route open to `allowed`.
///
/// * no token, or a token that fails verification: `Unauthorized`
/// * a verified token without a usable role claim: `Forbidden`
/// * a role outside `allowed`: `Forbidden`
pub fn authorize(tokens: &TokenService, token: Option<&str>, allowed: &[Role]) -> Result<Session> {
    let token = token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CnsError::Unauthorized("Invalid or missing token".to_string()))?;

    let claims = tokens.verify(token).map_err(|e| {
        debug!(reason = %e, "session token rejected");
        CnsError::Unauthorized("Invalid or missing token".to_string())
    })?;

    let role = claims
        .role
        .ok_or_else(|| CnsError::Forbidden("Role missing from token".to_string()))?;

    if !allowed.contains(&role) {
        debug!(username = %claims.username, role = %role, "insufficient privileges");
        return Err(CnsError::Forbidden("Insufficient privileges".to_string()));
    }

    Ok(Session {
        username: claims.username,
        role,
    })
}

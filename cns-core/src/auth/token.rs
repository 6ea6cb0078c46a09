//! Signed session tokens
//!
//! Tokens are HS256 JWTs carrying `{username, role, exp}`. Nothing is stored
//! server-side: a token is valid exactly while its signature checks out and
//! its expiry has not passed. Logging out only clears the client cookie, so a
//! copied token stays usable until it expires.

use jwt_simple::prelude::*;
use jwt_simple::JWTError;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::Role;

/// Lifetime of an issued session token
pub const SESSION_TTL: std::time::Duration = std::time::Duration::from_secs(2 * 60 * 60);

/// Shortest HMAC key jwt-simple will sign or verify with (96 bits)
pub const MIN_SECRET_LEN: usize = 12;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("invalid token signature")]
    Invalid,

    #[error("token has expired")]
    Expired,

    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Custom claims embedded in the JWT next to the registered `exp`/`iat`/`nbf`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionClaimsWire {
    username: String,
    #[serde(
        default,
        deserialize_with = "lenient_role",
        skip_serializing_if = "Option::is_none"
    )]
    role: Option<Role>,
}

/// A missing, non-string or unknown role decodes to `None`
fn lenient_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| s.parse().ok()))
}

/// Claims recovered from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub username: String,
    pub role: Option<Role>,
    /// Expiry as seconds since the Unix epoch
    pub expires_at: u64,
}

/// A freshly signed token and its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: u64,
}

/// Issues and verifies session tokens with a process-wide HMAC secret
pub struct TokenService {
    key: HS256Key,
    ttl: std::time::Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenService {
    /// Build the service from the configured secret. Empty or short secrets are refused.
    pub fn new(secret: &[u8]) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::Signing("signing secret is empty".to_string()));
        }
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenError::Signing(format!(
                "signing secret must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }
        Ok(TokenService {
            key: HS256Key::from_bytes(secret),
            ttl: SESSION_TTL,
        })
    }

    /// Override the token lifetime
    pub fn with_ttl(mut self, ttl: std::time::Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> std::time::Duration {
        self.ttl
    }

    /// Sign a token for `username` with `role`, valid for the configured lifetime
    pub fn issue(&self, username: &str, role: Role) -> Result<IssuedToken, TokenError> {
        let claims = Claims::with_custom_claims(
            SessionClaimsWire {
                username: username.to_string(),
                role: Some(role),
            },
            Duration::from_secs(self.ttl.as_secs()),
        );
        self.sign(claims)
    }

    fn sign(&self, claims: JWTClaims<SessionClaimsWire>) -> Result<IssuedToken, TokenError> {
        let expires_at = claims
            .expires_at
            .map(|exp| exp.as_secs())
            .ok_or_else(|| TokenError::Signing("claims carry no expiry".to_string()))?;
        let token = self
            .key
            .authenticate(claims)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Check signature and expiry, then decode the claims
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let options = VerificationOptions {
            time_tolerance: Some(Duration::from_secs(0)),
            ..Default::default()
        };
        let claims = self
            .key
            .verify_token::<SessionClaimsWire>(token, Some(options))
            .map_err(classify)?;
        let expires_at = claims
            .expires_at
            .map(|exp| exp.as_secs())
            .ok_or_else(|| TokenError::Malformed("missing exp claim".to_string()))?;
        Ok(SessionClaims {
            username: claims.custom.username,
            role: claims.custom.role,
            expires_at,
        })
    }
}

fn classify(err: jwt_simple::Error) -> TokenError {
    match err.downcast_ref::<JWTError>() {
        Some(JWTError::TokenHasExpired) => TokenError::Expired,
        Some(JWTError::InvalidSignature) | Some(JWTError::InvalidAuthenticationTag) => {
            TokenError::Invalid
        }
        _ => TokenError::Malformed(err.to_string()),
    }
}

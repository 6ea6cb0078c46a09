//! Error types for the CNS admin backend

use serde_json::{json, Value};
use thiserror::Error;

use crate::auth::TokenError;

#[derive(Error, Debug)]
pub enum CnsError {
    #[error("{0}")]
    Validation(String),

    /// The addressed entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// An entity referenced from the request body does not exist.
    #[error("{0}")]
    MissingReference(String),

    #[error("{message}")]
    Conflict { message: String, owned: Option<u64> },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// A store-level integrity constraint rejected a write.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CnsError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CnsError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        CnsError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        CnsError::Conflict { message: msg.into(), owned: None }
    }

    /// Deletion blocked because the manager still owns associations.
    pub fn owned_conflict(msg: impl Into<String>, owned: u64) -> Self {
        CnsError::Conflict { message: msg.into(), owned: Some(owned) }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            CnsError::Validation(_) | CnsError::MissingReference(_) => 400,
            CnsError::NotFound(_) => 404,
            CnsError::Conflict { .. } => 409,
            CnsError::Unauthorized(_) | CnsError::Token(_) => 401,
            CnsError::Forbidden(_) => 403,
            CnsError::Constraint(_)
            | CnsError::Storage(_)
            | CnsError::Serialization(_)
            | CnsError::Io(_)
            | CnsError::Internal(_) => 500,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }

    /// JSON body sent to clients. Internal failures are reported generically.
    pub fn body(&self) -> Value {
        match self {
            CnsError::Conflict { message, owned: Some(owned) } => {
                json!({ "error": message, "owned": owned })
            }
            CnsError::Token(_) => json!({ "error": "Invalid token" }),
            e if e.is_internal() => json!({ "error": "Internal server error" }),
            e => json!({ "error": e.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(CnsError::validation("bad").status_code(), 400);
        assert_eq!(CnsError::MissingReference("Manager not found".into()).status_code(), 400);
        assert_eq!(CnsError::not_found("User not found").status_code(), 404);
        assert_eq!(CnsError::conflict("dup").status_code(), 409);
        assert_eq!(CnsError::Unauthorized("no".into()).status_code(), 401);
        assert_eq!(CnsError::Token(TokenError::Expired).status_code(), 401);
        assert_eq!(CnsError::Forbidden("no".into()).status_code(), 403);
        assert_eq!(CnsError::Storage("disk".into()).status_code(), 500);
        assert_eq!(CnsError::Constraint("fk".into()).status_code(), 500);
    }

    #[test]
    fn conflict_body_carries_owned_count() {
        let body = CnsError::owned_conflict("Manager has associations; provide reassignTo", 3).body();
        assert_eq!(body["owned"], 3);
        assert_eq!(body["error"], "Manager has associations; provide reassignTo");
    }

    #[test]
    fn internal_errors_are_not_leaked() {
        let body = CnsError::Storage("partition users: io failure at /var/data".into()).body();
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }
}

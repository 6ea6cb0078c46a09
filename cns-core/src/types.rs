//! Core data types for the CNS admin backend

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::{CnsError, Result};

const MAX_ID_LEN: usize = 64;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a fresh, time-ordered identifier
            pub fn generate() -> Self {
                $name(ulid::Ulid::new().to_string())
            }

            /// Parse an identifier supplied by a client
            pub fn parse(raw: &str) -> Result<Self> {
                let raw = raw.trim();
                if raw.is_empty() {
                    return Err(CnsError::validation(concat!("empty ", $what, " id")));
                }
                if raw.len() > MAX_ID_LEN
                    || raw.chars().any(|c| c.is_control() || c == '/' || c.is_whitespace())
                {
                    return Err(CnsError::validation(concat!("invalid ", $what, " id")));
                }
                Ok($name(raw.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

entity_id!(
    /// Opaque unique user identifier
    UserId, "user"
);
entity_id!(
    /// Opaque unique manager identifier
    ManagerId, "manager"
);
entity_id!(
    /// Opaque unique association identifier
    AssociationId, "association"
);

/// Access role carried by every user and every session token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    Super,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Super => "super",
        }
    }

    /// `super` is never created, reassigned or deleted through the admin API
    pub fn is_protected(&self) -> bool {
        matches!(self, Role::Super)
    }
}

impl FromStr for Role {
    type Err = CnsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "super" => Ok(Role::Super),
            other => Err(CnsError::validation(format!("unknown role '{}'", other))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored user record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl User {
    pub fn new(username: impl Into<String>, password_hash: String, role: Role) -> Self {
        User {
            id: UserId::generate(),
            username: username.into(),
            password_hash,
            role,
            permissions: BTreeSet::new(),
        }
    }

    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = String>) -> Self {
        self.permissions = permissions.into_iter().collect();
        self
    }

    /// Public projection, never carries the password hash
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id.clone(),
            username: self.username.clone(),
            role: self.role,
            permissions: self.permissions.iter().cloned().collect(),
        }
    }
}

/// User row as returned by the admin API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    #[serde(rename = "ID")]
    pub id: UserId,
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Role")]
    pub role: Role,
    #[serde(rename = "Permissions")]
    pub permissions: Vec<String>,
}

/// Property manager owning zero or more associations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manager {
    pub id: ManagerId,
    pub email: String,
    pub name: String,
    pub titles: String,
    pub initials: String,
}

/// Association, always owned by exactly one existing manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Association {
    pub id: AssociationId,
    pub legal_name: String,
    pub filter_name: String,
    pub location: String,
    pub manager_id: ManagerId,
}

/// Association list entry with its owning manager embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationListing {
    #[serde(flatten)]
    pub association: Association,
    pub manager: Option<Manager>,
}

/// Manager list entry with owned associations embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerListing {
    #[serde(flatten)]
    pub manager: Manager,
    pub associations: Vec<Association>,
}

/// Authenticated identity taken from a verified session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub username: String,
    pub role: Role,
}

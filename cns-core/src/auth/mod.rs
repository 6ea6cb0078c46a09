//! Session security for the auth and admin services
//!
//! - HS256 session tokens with a fixed lifetime
//! - Argon2id password hashing
//! - the `token` cookie
//! - role-based admission for admin routes

pub mod cookie;
pub mod gate;
pub mod password;
pub mod token;

pub use cookie::*;
pub use gate::*;
pub use password::*;
pub use token::*;

//! Process-wide application state shared by every request

use cns_core::auth::{PasswordHasher, TokenService};
use cns_engine::Store;
use std::sync::Arc;

/// Store handle plus the session security services.
///
/// The signing secret lives inside `tokens` and is only ever read, so the
/// state can be shared across workers behind an `Arc` without locking.
pub struct AppState {
    pub store: Store,
    pub tokens: TokenService,
    pub passwords: PasswordHasher,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(store: Store, tokens: TokenService, passwords: PasswordHasher) -> SharedState {
        Arc::new(AppState {
            store,
            tokens,
            passwords,
        })
    }
}

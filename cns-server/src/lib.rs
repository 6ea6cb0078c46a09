//! Authentication and admin HTTP services for the CNS directory

pub mod accounts;
pub mod app;
pub mod config;
pub mod directory;
pub mod handlers;
pub mod response;
pub mod router;
pub mod seed;
pub mod server;
pub mod session;
pub mod state;

pub use app::App;
pub use config::{Config, ConfigError, LogFormat, Services};
pub use server::Server;
pub use state::{AppState, SharedState};

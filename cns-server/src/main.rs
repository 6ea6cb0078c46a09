//! cns-admin: authentication and admin services

use anyhow::Context;
use cns_core::auth::{PasswordHasher, TokenService};
use cns_engine::{StorageEngine, Store};
use cns_server::seed::seed;
use cns_server::{App, AppState, Config, ConfigError, LogFormat, Server};
use futures::future::{try_join_all, BoxFuture, FutureExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::from_args(std::env::args_os()) {
        Ok(config) => config,
        Err(ConfigError::Cli(e)) => e.exit(),
        Err(e) => return Err(e.into()),
    };
    init_tracing(config.log_format);

    info!("Starting cns-admin {}", env!("CARGO_PKG_VERSION"));
    info!("Data directory: {}", config.data_dir.display());

    if !config.data_dir.exists() {
        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("creating data directory {}", config.data_dir.display()))?;
        info!("Created data directory: {}", config.data_dir.display());
    }

    let engine = StorageEngine::new(&config.data_dir).context("opening the store")?;
    let tokens = TokenService::new(config.jwt_secret.as_bytes()).context("configuring session tokens")?;
    let passwords = PasswordHasher::new()?;
    let state = AppState::new(Store::new(engine), tokens, passwords);

    let report = seed(&state, &config.seed_options()).context("seeding the store")?;
    if !report.users.is_empty() || report.managers > 0 {
        info!(users = ?report.users, managers = report.managers, associations = report.associations, "seeding done");
    }

    let mut services: Vec<BoxFuture<'static, std::io::Result<()>>> = Vec::new();
    if config.services.runs_auth() {
        services.push(Server::new(App::auth(state.clone())).serve(config.auth_addr()).boxed());
    }
    if config.services.runs_admin() {
        services.push(Server::new(App::admin(state.clone())).serve(config.admin_addr()).boxed());
    }

    try_join_all(services).await.context("server error")?;
    Ok(())
}

//! Command line and environment configuration

use clap::builder::BoolishValueParser;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

use cns_core::auth::MIN_SECRET_LEN;

use crate::seed::SeedOptions;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{0} must be at least {1} bytes")]
    TooShort(&'static str, usize),

    #[error(transparent)]
    Cli(#[from] clap::Error),
}

/// Which listeners this process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Services {
    Auth,
    Admin,
    All,
}

impl Services {
    pub fn runs_auth(&self) -> bool {
        matches!(self, Services::Auth | Services::All)
    }

    pub fn runs_admin(&self) -> bool {
        matches!(self, Services::Admin | Services::All)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub jwt_secret: String,
    pub bind: IpAddr,
    pub auth_port: u16,
    pub admin_port: u16,
    pub super_password: Option<String>,
    pub admin_password: Option<String>,
    pub seed_demo: bool,
    pub log_format: LogFormat,
    pub services: Services,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("data_dir", &self.data_dir)
            .field("bind", &self.bind)
            .field("auth_port", &self.auth_port)
            .field("admin_port", &self.admin_port)
            .field("seed_demo", &self.seed_demo)
            .field("log_format", &self.log_format)
            .field("services", &self.services)
            .finish_non_exhaustive()
    }
}

pub fn command() -> Command {
    Command::new("cns-admin")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Authentication and directory administration services")
        .subcommand(Command::new("auth").about("Run only the authentication service"))
        .subcommand(Command::new("admin").about("Run only the admin service"))
        .subcommand(Command::new("all").about("Run both services in one process (default)"))
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .env("DATABASE_URL")
                .value_name("PATH")
                .help("Store directory")
                .default_value("./data")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("jwt-secret")
                .long("jwt-secret")
                .env("JWT_SECRET")
                .value_name("SECRET")
                .help("HMAC secret used to sign session tokens")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new("bind")
                .long("bind")
                .env("BIND_ADDR")
                .value_name("IP")
                .help("Listen address")
                .default_value("0.0.0.0")
                .value_parser(value_parser!(IpAddr))
                .global(true),
        )
        .arg(
            Arg::new("auth-port")
                .long("auth-port")
                .env("AUTH_PORT")
                .value_name("PORT")
                .help("Port of the authentication service")
                .default_value("8080")
                .value_parser(value_parser!(u16))
                .global(true),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .env("PORT")
                .value_name("PORT")
                .help("Port of the admin service")
                .default_value("8082")
                .value_parser(value_parser!(u16))
                .global(true),
        )
        .arg(
            Arg::new("super-password")
                .long("super-password")
                .env("DEFAULT_SUPER_PASSWORD")
                .value_name("PASSWORD")
                .help("Password of the seeded super user")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new("admin-password")
                .long("admin-password")
                .env("DEFAULT_ADMIN_PASSWORD")
                .value_name("PASSWORD")
                .help("Password of the seeded admin user")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new("seed-demo")
                .long("seed-demo")
                .env("SEED_DEMO_DATA")
                .help("Seed a demo user, managers and associations")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new())
                .global(true),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .env("LOG_FORMAT")
                .value_name("FORMAT")
                .default_value("text")
                .value_parser(["text", "json"])
                .global(true),
        )
}

impl Config {
    /// Parse process arguments (and the environment)
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = command().try_get_matches_from(args)?;
        Self::from_matches(&matches)
    }

    pub fn from_matches(matches: &ArgMatches) -> Result<Self, ConfigError> {
        let services = match matches.subcommand_name() {
            Some("auth") => Services::Auth,
            Some("admin") => Services::Admin,
            _ => Services::All,
        };

        // refuse to sign with an empty or weak key
        let jwt_secret = matches
            .get_one::<String>("jwt-secret")
            .filter(|s| !s.is_empty())
            .cloned()
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::TooShort("JWT_SECRET", MIN_SECRET_LEN));
        }

        let log_format = match matches.get_one::<String>("log-format").map(String::as_str) {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Config {
            data_dir: matches
                .get_one::<PathBuf>("data-dir")
                .cloned()
                .unwrap_or_else(|| PathBuf::from("./data")),
            jwt_secret,
            bind: matches
                .get_one::<IpAddr>("bind")
                .copied()
                .unwrap_or(IpAddr::from([0, 0, 0, 0])),
            auth_port: matches.get_one::<u16>("auth-port").copied().unwrap_or(8080),
            admin_port: matches.get_one::<u16>("port").copied().unwrap_or(8082),
            super_password: non_empty(matches, "super-password"),
            admin_password: non_empty(matches, "admin-password"),
            seed_demo: matches.get_flag("seed-demo"),
            log_format,
            services,
        })
    }

    pub fn auth_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.auth_port)
    }

    pub fn admin_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.admin_port)
    }

    pub fn seed_options(&self) -> SeedOptions {
        SeedOptions {
            super_password: self.super_password.clone(),
            admin_password: self.admin_password.clone(),
            demo: self.seed_demo,
        }
    }
}

fn non_empty(matches: &ArgMatches, id: &str) -> Option<String> {
    matches
        .get_one::<String>(id)
        .filter(|s| !s.is_empty())
        .cloned()
}

//! Startup seeding of the built-in accounts and optional demo data
//!
//! Seeding is idempotent: each step is skipped when its rows already exist.

use cns_core::*;
use tracing::{info, warn};

use crate::directory::Directory;
use crate::state::AppState;

#[derive(Debug, Clone, Default)]
pub struct SeedOptions {
    pub super_password: Option<String>,
    pub admin_password: Option<String>,
    pub demo: bool,
}

/// What a seeding run created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: Vec<String>,
    pub managers: usize,
    pub associations: usize,
}

const DEMO_MANAGERS: [(&str, &str, &str, &str); 3] = [
    ("Alice Johnson", "alice@example.com", "Regional Manager", "AJ"),
    ("Bob Smith", "bob@example.com", "District Manager", "BS"),
    ("Carol Lee", "carol@example.com", "General Manager", "CL"),
];

/// (legal name, filter name, location, index into `DEMO_MANAGERS`)
const DEMO_ASSOCIATIONS: [(&str, &str, &str, usize); 5] = [
    ("Sunset Condos", "sunset", "Tampa", 0),
    ("Palm Villas", "palm", "Orlando", 0),
    ("Ocean Breeze", "ocean", "Miami", 1),
    ("Lakeside Apartments", "lake", "Tampa", 1),
    ("Riverfront Homes", "river", "Jacksonville", 0),
];

pub fn seed(state: &AppState, options: &SeedOptions) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    seed_account(state, &mut report, "super", Role::Super, options.super_password.as_deref(), "DEFAULT_SUPER_PASSWORD")?;
    seed_account(state, &mut report, "admin", Role::Admin, options.admin_password.as_deref(), "DEFAULT_ADMIN_PASSWORD")?;

    if options.demo {
        seed_demo(state, &mut report)?;
    }
    Ok(report)
}

fn seed_account(
    state: &AppState,
    report: &mut SeedReport,
    username: &str,
    role: Role,
    password: Option<&str>,
    setting: &str,
) -> Result<()> {
    if state.store.count_users_with_role(role)? > 0 {
        return Ok(());
    }
    if state.store.user_by_username(username)?.is_some() {
        warn!(username, role = %role, "no {} account exists but the username is taken; not seeding", role);
        return Ok(());
    }
    let password = password.ok_or_else(|| {
        CnsError::validation(format!("{} is required to create the initial {} account", setting, role))
    })?;

    let hash = state.passwords.hash(password)?;
    state.store.insert_user(User::new(username, hash, role))?;
    info!(username, role = %role, "seeded account");
    report.users.push(username.to_string());
    Ok(())
}

fn seed_demo(state: &AppState, report: &mut SeedReport) -> Result<()> {
    if state.store.user_by_username("user1")?.is_none() {
        let hash = state.passwords.hash("user123")?;
        let user = User::new("user1", hash, Role::User).with_permissions(["doc_parser".to_string()]);
        state.store.insert_user(user)?;
        report.users.push("user1".to_string());
    }

    if !state.store.managers()?.is_empty() {
        info!("demo directory seed skipped, managers already exist");
        return Ok(());
    }

    let directory = Directory::new(&state.store);
    let mut managers = Vec::with_capacity(DEMO_MANAGERS.len());
    for (name, email, titles, initials) in DEMO_MANAGERS {
        let manager = directory.create_manager(NewManager {
            name: name.to_string(),
            email: email.to_string(),
            titles: titles.to_string(),
            initials: initials.to_string(),
        })?;
        managers.push(manager.id);
    }
    for (legal_name, filter_name, location, owner) in DEMO_ASSOCIATIONS {
        directory.create_association(NewAssociation {
            legal_name: legal_name.to_string(),
            filter_name: filter_name.to_string(),
            location: location.to_string(),
            manager_id: managers[owner].to_string(),
        })?;
    }

    report.managers = DEMO_MANAGERS.len();
    report.associations = DEMO_ASSOCIATIONS.len();
    info!(managers = report.managers, associations = report.associations, "seeded demo directory");
    Ok(())
}

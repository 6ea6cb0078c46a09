//! Health and Session Controller endpoints

use cns_core::*;
use serde_json::json;

use super::RequestContext;
use crate::response::Reply;
use crate::session::SessionController;
use crate::state::AppState;

pub fn health(ctx: &RequestContext) -> Result<Reply> {
    Ok(Reply::ok(json!({
        "status": "healthy",
        "service": ctx.service,
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

pub fn login(state: &AppState, ctx: &RequestContext) -> Result<Reply> {
    let request: LoginRequest = ctx.json()?;
    let grant = SessionController::new(state).login(request)?;
    Ok(Reply::ok(json!({ "token": grant.token.token })).with_cookie(grant.cookie))
}

pub fn logout(state: &AppState) -> Result<Reply> {
    let cookie = SessionController::new(state).logout();
    Ok(Reply::message("Logged out successfully").with_cookie(cookie))
}

pub fn me(state: &AppState, ctx: &RequestContext) -> Result<Reply> {
    let claims = SessionController::new(state).me(ctx.token.as_deref())?;
    Ok(Reply::ok(json!({
        "username": claims.username,
        "role": claims.role,
    })))
}

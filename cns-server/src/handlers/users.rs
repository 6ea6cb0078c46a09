//! `/api/admin/users` endpoints

use cns_core::*;
use hyper::StatusCode;
use serde_json::json;

use super::RequestContext;
use crate::accounts::Accounts;
use crate::response::Reply;
use crate::state::AppState;

pub fn list(state: &AppState) -> Result<Reply> {
    Reply::json(StatusCode::OK, &Accounts::new(state).list()?)
}

pub fn create(state: &AppState, ctx: &RequestContext) -> Result<Reply> {
    Accounts::new(state).create(ctx.json()?)?;
    Ok(Reply::created(json!({ "message": "User created successfully" })))
}

pub fn update_role(state: &AppState, ctx: &RequestContext) -> Result<Reply> {
    let id = UserId::parse(ctx.param("id")?)?;
    Accounts::new(state).update_role(ctx.session()?, &id, ctx.json()?)?;
    Ok(Reply::message("User updated successfully"))
}

pub fn update_permissions(state: &AppState, ctx: &RequestContext) -> Result<Reply> {
    let id = UserId::parse(ctx.param("id")?)?;
    Accounts::new(state).update_permissions(ctx.session()?, &id, ctx.json()?)?;
    Ok(Reply::message("User updated successfully"))
}

pub fn delete(state: &AppState, ctx: &RequestContext) -> Result<Reply> {
    let id = UserId::parse(ctx.param("id")?)?;
    Accounts::new(state).delete(ctx.session()?, &id)?;
    Ok(Reply::message("User deleted"))
}

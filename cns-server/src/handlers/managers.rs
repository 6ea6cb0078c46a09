//! `/api/admin/data/managers` endpoints

use cns_core::*;
use hyper::StatusCode;
use serde_json::json;

use super::RequestContext;
use crate::directory::Directory;
use crate::response::Reply;
use crate::state::AppState;

pub fn list(state: &AppState, ctx: &RequestContext) -> Result<Reply> {
    let filter = SearchFilter::new(ctx.query_param("q").as_deref());
    Reply::json(StatusCode::OK, &Directory::new(&state.store).list_managers(&filter)?)
}

pub fn create(state: &AppState, ctx: &RequestContext) -> Result<Reply> {
    let manager = Directory::new(&state.store).create_manager(ctx.json()?)?;
    Reply::json(StatusCode::CREATED, &manager)
}

pub fn update(state: &AppState, ctx: &RequestContext) -> Result<Reply> {
    let id = ManagerId::parse(ctx.param("id")?)?;
    Directory::new(&state.store).update_manager(&id, ctx.json()?)?;
    Ok(Reply::message("Updated"))
}

/// The body is optional; one that does not parse counts as no reassignment
pub fn delete(state: &AppState, ctx: &RequestContext) -> Result<Reply> {
    let id = ManagerId::parse(ctx.param("id")?)?;
    let request: DeleteManagerRequest = ctx.json_or_default();
    let deletion = Directory::new(&state.store).delete_manager(&id, &request)?;
    Ok(Reply::ok(json!({
        "message": "Deleted",
        "reassigned": deletion.reassigned,
    })))
}

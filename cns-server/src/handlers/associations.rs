//! `/api/admin/data/associations` endpoints

use cns_core::*;
use hyper::StatusCode;

use super::RequestContext;
use crate::directory::Directory;
use crate::response::Reply;
use crate::state::AppState;

pub fn list(state: &AppState, ctx: &RequestContext) -> Result<Reply> {
    let filter = SearchFilter::new(ctx.query_param("q").as_deref());
    Reply::json(StatusCode::OK, &Directory::new(&state.store).list_associations(&filter)?)
}

pub fn create(state: &AppState, ctx: &RequestContext) -> Result<Reply> {
    let association = Directory::new(&state.store).create_association(ctx.json()?)?;
    Reply::json(StatusCode::CREATED, &association)
}

pub fn update(state: &AppState, ctx: &RequestContext) -> Result<Reply> {
    let id = AssociationId::parse(ctx.param("id")?)?;
    Directory::new(&state.store).update_association(&id, ctx.json()?)?;
    Ok(Reply::message("Updated"))
}

pub fn delete(state: &AppState, ctx: &RequestContext) -> Result<Reply> {
    let id = AssociationId::parse(ctx.param("id")?)?;
    Directory::new(&state.store).delete_association(&id)?;
    Ok(Reply::message("Deleted"))
}

//! Request pipeline: route lookup, auth gate, body read, handler dispatch

use bytes::Bytes;
use cns_core::auth::{authorize, read_cookie, SESSION_COOKIE};
use cns_core::*;
use http_body_util::{BodyExt, Limited};
use hyper::body::Body;
use hyper::header::COOKIE;
use hyper::{HeaderMap, Request, Response, StatusCode};
use tracing::{debug, error, info};

use crate::handlers::{self, RequestContext};
use crate::response::{Reply, ResponseBody};
use crate::router::{Access, Resolution, Router};
use crate::state::SharedState;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// One service: a route table bound to the shared state
#[derive(Clone)]
pub struct App {
    name: &'static str,
    router: Router,
    state: SharedState,
}

impl App {
    /// The authentication service
    pub fn auth(state: SharedState) -> Self {
        App {
            name: "auth",
            router: Router::auth(),
            state,
        }
    }

    /// The admin service
    pub fn admin(state: SharedState) -> Self {
        App {
            name: "admin",
            router: Router::admin(),
            state,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub async fn handle<B>(&self, req: Request<B>) -> Response<ResponseBody>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let reply = match self.route(req).await {
            Ok(reply) => reply,
            Err(e) => {
                if e.is_internal() {
                    error!("Handler error for {} {}: {}", method, path, e);
                }
                Reply::from_error(&e)
            }
        };

        info!(service = self.name, "{} {} -> {}", method, path, reply.status().as_u16());
        reply.into_response()
    }

    async fn route<B>(&self, req: Request<B>) -> Result<Reply>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (route, params) = match self.router.resolve(req.method(), req.uri().path()) {
            Resolution::Matched { route, params } => (route, params),
            Resolution::MethodNotAllowed => {
                return Ok(Reply::error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"))
            }
            Resolution::NotFound => return Err(CnsError::not_found("Not found")),
        };

        let token = session_token(req.headers());
        let session = match route.access {
            Access::Public => None,
            Access::Roles(allowed) => Some(authorize(&self.state.tokens, token.as_deref(), allowed)?),
        };

        let query = req.uri().query().map(str::to_string);
        let body = Limited::new(req.into_body(), MAX_BODY_BYTES)
            .collect()
            .await
            .map_err(|e| {
                debug!("failed to read request body: {}", e);
                CnsError::validation("Invalid input")
            })?
            .to_bytes();

        let ctx = RequestContext {
            service: self.name,
            params,
            query,
            token,
            session,
            body,
        };

        let state = self.state.clone();
        let endpoint = route.endpoint;
        tokio::task::spawn_blocking(move || handlers::dispatch(&state, endpoint, &ctx))
            .await
            .map_err(|e| CnsError::Internal(format!("handler task failed: {}", e)))?
    }
}

/// Value of the `token` cookie across every Cookie header
fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|header| read_cookie(header, SESSION_COOKIE))
        .map(str::to_string)
}

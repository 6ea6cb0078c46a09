//! JSON replies and their conversion into hyper responses

use bytes::Bytes;
use cns_core::CnsError;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE, SERVER, SET_COOKIE};
use hyper::{Response, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

pub type ResponseBody = Full<Bytes>;

const SERVER_NAME: &str = concat!("cns-admin/", env!("CARGO_PKG_VERSION"));

/// Outcome of a handler: status, JSON body and an optional Set-Cookie value
#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    body: Value,
    cookie: Option<String>,
}

impl Reply {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Reply {
            status,
            body,
            cookie: None,
        }
    }

    pub fn ok(body: Value) -> Self {
        Reply::new(StatusCode::OK, body)
    }

    pub fn created(body: Value) -> Self {
        Reply::new(StatusCode::CREATED, body)
    }

    /// 200 with `{"message": ...}`
    pub fn message(message: &str) -> Self {
        Reply::ok(json!({ "message": message }))
    }

    pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Self, CnsError> {
        Ok(Reply::new(status, serde_json::to_value(value)?))
    }

    pub fn error(status: StatusCode, message: &str) -> Self {
        Reply::new(status, json!({ "error": message }))
    }

    pub fn from_error(err: &CnsError) -> Self {
        let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Reply::new(status, err.body())
    }

    pub fn with_cookie(mut self, cookie: String) -> Self {
        self.cookie = Some(cookie);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub fn into_response(self) -> Response<ResponseBody> {
        let mut response = Response::new(Full::new(Bytes::from(self.body.to_string())));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(SERVER, HeaderValue::from_static(SERVER_NAME));
        if let Some(cookie) = self.cookie {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    headers.insert(SET_COOKIE, value);
                }
                Err(e) => warn!("dropping unencodable Set-Cookie header: {}", e),
            }
        }
        response
    }
}

//! Shared harness for the service integration tests

#![allow(dead_code)]

use bytes::Bytes;
use cns_core::auth::{PasswordHasher, TokenService};
use cns_core::*;
use cns_engine::{StorageEngine, Store};
use cns_server::seed::{seed, SeedOptions};
use cns_server::{App, AppState, SharedState};
use http_body_util::{BodyExt, Full};
use hyper::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use hyper::{Method, Request, StatusCode};
use serde_json::Value;

pub const SECRET: &[u8] = b"integration-test-secret";
pub const SUPER_PASSWORD: &str = "super-pass";
pub const ADMIN_PASSWORD: &str = "admin-pass";

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub set_cookie: Option<String>,
}

impl TestResponse {
    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }

    /// Token value carried by the Set-Cookie header
    pub fn cookie_token(&self) -> Option<String> {
        let cookie = self.set_cookie.as_deref()?;
        let first = cookie.split(';').next()?;
        first.strip_prefix("token=").map(str::to_string)
    }
}

pub struct Harness {
    pub state: SharedState,
    pub auth: App,
    pub admin: App,
    _temp: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(false)
    }

    /// Harness with user1 and the demo managers/associations
    pub fn with_demo() -> Self {
        Self::build(true)
    }

    fn build(demo: bool) -> Self {
        let (engine, temp) = StorageEngine::temp().unwrap();
        let state = AppState::new(
            Store::new(engine),
            TokenService::new(SECRET).unwrap(),
            PasswordHasher::with_params(8, 1, 1).unwrap(),
        );
        seed(
            &state,
            &SeedOptions {
                super_password: Some(SUPER_PASSWORD.to_string()),
                admin_password: Some(ADMIN_PASSWORD.to_string()),
                demo,
            },
        )
        .unwrap();

        Harness {
            auth: App::auth(state.clone()),
            admin: App::admin(state.clone()),
            state,
            _temp: temp,
        }
    }

    pub fn store(&self) -> &Store {
        &self.state.store
    }

    /// Token for `username` without going through login
    pub fn token(&self, username: &str, role: Role) -> String {
        self.state.tokens.issue(username, role).unwrap().token
    }

    pub fn admin_token(&self) -> String {
        self.token("admin", Role::Admin)
    }

    pub fn super_token(&self) -> String {
        self.token("super", Role::Super)
    }

    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        let body = serde_json::json!({ "username": username, "password": password });
        call(&self.auth, Method::POST, "/api/auth/login", None, Some(body)).await
    }

    pub async fn admin_call(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        call(&self.admin, method, path, token, body).await
    }

    pub async fn create_manager(&self, token: &str, name: &str, email: &str) -> ManagerId {
        let body = serde_json::json!({
            "name": name,
            "email": email,
            "titles": "Community Manager",
            "initials": name.chars().next().map(String::from).unwrap_or_default(),
        });
        let resp = self
            .admin_call(Method::POST, "/api/admin/data/managers", Some(token), Some(body))
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
        ManagerId::parse(resp.body["id"].as_str().unwrap()).unwrap()
    }

    pub async fn create_association(&self, token: &str, legal_name: &str, manager: &ManagerId) -> AssociationId {
        let body = serde_json::json!({
            "legalName": legal_name,
            "filterName": legal_name.to_lowercase(),
            "location": "Tampa",
            "managerId": manager.as_str(),
        });
        let resp = self
            .admin_call(Method::POST, "/api/admin/data/associations", Some(token), Some(body))
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{}", resp.body);
        AssociationId::parse(resp.body["id"].as_str().unwrap()).unwrap()
    }
}

pub async fn call(
    app: &App,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(COOKIE, format!("token={}", token));
    }
    let bytes = match body {
        Some(body) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Bytes::from(body.to_string())
        }
        None => Bytes::new(),
    };
    let request = builder.body(Full::new(bytes)).unwrap();
    send(app, request).await
}

pub async fn call_raw(app: &App, method: Method, path: &str, token: Option<&str>, body: &'static str) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(COOKIE, format!("token={}", token));
    }
    send(app, builder.body(Full::new(Bytes::from_static(body.as_bytes()))).unwrap()).await
}

async fn send(app: &App, request: Request<Full<Bytes>>) -> TestResponse {
    let response = app.handle(request).await;
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    TestResponse {
        status,
        body,
        set_cookie,
    }
}

#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, Bytes, to_bytes},
    http::{HeaderMap, Request, StatusCode},
};
use meetmind::config::Config;
use meetmind::db::DbActorHandle;
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;

pub const ADMIN_KEY: &str = "pwd";

pub fn unique_sqlite_path(prefix: &str) -> std::path::PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "meetmind-{prefix}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));
    temp_path
}

/// Config that ignores the repo's `config.toml` and the process environment.
pub fn test_config() -> Config {
    let mut cfg = Config::default();
    cfg.basic.admin_key = ADMIN_KEY.to_string();
    cfg
}

pub struct TestApp {
    pub app: Router,
    pub db: DbActorHandle,
    pub database_url: String,
}

pub async fn spawn_app(prefix: &str, cfg: Config) -> TestApp {
    let database_url = format!("sqlite:{}", unique_sqlite_path(prefix).display());
    let db = meetmind::db::spawn(&database_url)
        .await
        .expect("spawn db actor");
    let state = meetmind::AppState::new(db.clone(), &cfg).expect("build state");
    TestApp {
        app: meetmind::meetmind_router(state),
        db,
        database_url,
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "response body was not JSON ({e}): {}",
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .unwrap_or_else(|| panic!("missing header {name}"))
            .to_str()
            .expect("header was not valid utf-8")
    }
}

pub async fn send(app: &Router, req: Request<Body>) -> Reply {
    let resp = app.clone().oneshot(req).await.expect("request failed");
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    Reply {
        status,
        headers,
        body,
    }
}

pub fn admin(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-admin-key", ADMIN_KEY);
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .expect("failed to build request"),
        None => builder
            .body(Body::empty())
            .expect("failed to build request"),
    }
}

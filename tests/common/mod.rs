//! Shared utilities for integration and server tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Method, Response};
use serde_json::Value;

use mvc_web::config::{AppConfig, RouteConfig};
use mvc_web::pipeline::{Handler, Stage};
use mvc_web::results::view::ViewEngine;
use mvc_web::{Application, ApplicationBuilder, HttpContext, HttpError};

/// Configuration with the given routes and default everything else.
pub fn config_with_routes(routes: Vec<RouteConfig>) -> AppConfig {
    let mut config = AppConfig::default();
    config.routes = routes;
    config
}

/// A route with an explicit controller.
pub fn route(url: &str, controller: &str) -> RouteConfig {
    RouteConfig {
        controller: Some(controller.to_string()),
        ..RouteConfig::new(url)
    }
}

pub fn build(builder: ApplicationBuilder, config: AppConfig) -> Arc<Application> {
    builder.build(config).expect("application should build")
}

/// Run a request in-process.
pub async fn send(
    app: &Arc<Application>,
    method: Method,
    uri: &str,
    headers: &[(&'static str, &str)],
    body: &str,
) -> Response<Body> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.insert(*name, HeaderValue::from_str(value).expect("valid header value"));
    }
    app.execute_request(method, uri, map, body.to_string())
        .await
        .expect("local request")
}

pub async fn get(app: &Arc<Application>, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, &[], "").await
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_text(response).await).expect("json body")
}

pub fn header<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Shared record of the stages a [`RecordingHandler`] saw.
#[derive(Clone, Default)]
pub struct StageLog(Arc<Mutex<Vec<String>>>);

impl StageLog {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Handler listening to every stage; records each call and can fail or
/// stall at one of them.
pub struct RecordingHandler {
    pub name: &'static str,
    pub log: StageLog,
    pub fail_at: Option<(Stage, HttpError)>,
    pub stall_at: Option<(Stage, Duration)>,
}

impl RecordingHandler {
    pub fn new(name: &'static str, log: StageLog) -> Self {
        Self {
            name,
            log,
            fail_at: None,
            stall_at: None,
        }
    }

    pub fn failing_at(mut self, stage: Stage, err: HttpError) -> Self {
        self.fail_at = Some((stage, err));
        self
    }

    pub fn stalling_at(mut self, stage: Stage, delay: Duration) -> Self {
        self.stall_at = Some((stage, delay));
        self
    }

    async fn record(&self, stage: Stage) -> Result<(), HttpError> {
        self.log.push(format!("{}:{}", self.name, stage));
        if let Some((at, delay)) = &self.stall_at {
            if *at == stage {
                tokio::time::sleep(*delay).await;
            }
        }
        match &self.fail_at {
            Some((at, err)) if *at == stage => Err(err.clone()),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Handler for RecordingHandler {
    fn name(&self) -> &'static str {
        self.name
    }

    fn stages(&self) -> &'static [Stage] {
        &Stage::LISTENABLE
    }

    async fn begin_request(&self, _ctx: &mut HttpContext) -> Result<(), HttpError> {
        self.record(Stage::BeginRequest).await
    }

    async fn validate_request(&self, _ctx: &mut HttpContext) -> Result<(), HttpError> {
        self.record(Stage::ValidateRequest).await
    }

    async fn authenticate_request(&self, _ctx: &mut HttpContext) -> Result<(), HttpError> {
        self.record(Stage::AuthenticateRequest).await
    }

    async fn authorize_request(&self, _ctx: &mut HttpContext) -> Result<(), HttpError> {
        self.record(Stage::AuthorizeRequest).await
    }

    async fn map_request(&self, _ctx: &mut HttpContext) -> Result<(), HttpError> {
        self.record(Stage::MapRequest).await
    }

    async fn post_map_request(&self, _ctx: &mut HttpContext) -> Result<(), HttpError> {
        self.record(Stage::PostMapRequest).await
    }

    async fn end_request(&self, _ctx: &mut HttpContext) -> Result<(), HttpError> {
        self.record(Stage::EndRequest).await
    }

    async fn pre_execute_result(&self, _ctx: &mut HttpContext) -> Result<(), HttpError> {
        self.record(Stage::PreExecuteResult).await
    }

    async fn post_execute_result(&self, _ctx: &mut HttpContext) -> Result<(), HttpError> {
        self.record(Stage::PostExecuteResult).await
    }
}

/// Minimal template engine: replaces `{{key}}` with top-level string or
/// number members of the data.
pub struct MustacheLite;

#[async_trait]
impl ViewEngine for MustacheLite {
    fn name(&self) -> &'static str {
        "mustache-lite"
    }

    fn extension(&self) -> &str {
        "tpl"
    }

    async fn render(&self, path: &Path, data: &Value, _ctx: &HttpContext) -> Result<String, HttpError> {
        let mut text = tokio::fs::read_to_string(path).await.map_err(HttpError::from)?;
        if let Some(map) = data.as_object() {
            for (key, value) in map {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                text = text.replace(&format!("{{{{{key}}}}}"), &value);
            }
        }
        Ok(text)
    }
}

/// Write `contents` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create fixture directory");
    }
    std::fs::write(path, contents).expect("write fixture");
}

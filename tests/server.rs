//! End-to-end tests against a bound `HttpServer`.

use std::net::SocketAddr;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::mpsc;

use mvc_web::config::{AppConfig, RouteConfig};
use mvc_web::http::HttpServer;
use mvc_web::lifecycle::Shutdown;
use mvc_web::{ActionMethod, ActionResult, Application, ApplicationBuilder, Controller};

mod common;

fn uploads() -> Controller {
    Controller::new().action(
        ActionMethod::new("create", |ctx, args| {
            Box::pin(async move {
                let stored = ctx
                    .files
                    .get("attachment")
                    .map(|f| String::from_utf8_lossy(&f.data).into_owned());
                Ok(ActionResult::json(json!({
                    "title": args.get("title"),
                    "attachment": args.get("attachment"),
                    "stored": stored,
                })))
            })
        })
        .post()
        .params(&["title", "attachment"]),
    )
}

fn status() -> Controller {
    Controller::new().action(ActionMethod::new("index", |_ctx, _args| {
        Box::pin(async { Ok(ActionResult::content("first")) })
    }))
}

fn builder() -> ApplicationBuilder {
    Application::builder()
        .controller("uploads", uploads)
        .controller("status", status)
        .controller("reloaded", || {
            Controller::new().action(ActionMethod::new("index", |_ctx, _args| {
                Box::pin(async { Ok(ActionResult::content("second")) })
            }))
        })
}

fn base_config() -> AppConfig {
    common::config_with_routes(vec![
        RouteConfig {
            controller: Some("status".into()),
            action: Some("index".into()),
            ..RouteConfig::new("/status")
        },
        RouteConfig::new("/:controller/:action"),
    ])
}

struct Running {
    addr: SocketAddr,
    shutdown: Shutdown,
    config_updates: mpsc::UnboundedSender<AppConfig>,
    handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

async fn start(config: AppConfig) -> Running {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(builder(), config).unwrap();
    let shutdown = Shutdown::new();
    let (config_updates, updates) = mpsc::unbounded_channel();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, updates, server_shutdown).await });
    Running {
        addr,
        shutdown,
        config_updates,
        handle,
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = start(base_config()).await;
    let client = client();

    let res = client
        .get(format!("http://{}/status", server.addr))
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(res.status(), 200);
    let generated = res.headers().get("x-request-id").and_then(|v| v.to_str().ok()).unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());
    assert_eq!(res.text().await.unwrap(), "first");

    let res = client
        .get(format!("http://{}/status", server.addr))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers().get("x-request-id").unwrap(), "trace-me");

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_multipart_upload() {
    let server = start(base_config()).await;

    let form = reqwest::multipart::Form::new().text("title", "report").part(
        "attachment",
        reqwest::multipart::Part::bytes(b"file body".to_vec())
            .file_name("report.txt")
            .mime_str("text/plain")
            .unwrap(),
    );
    let res = client()
        .post(format!("http://{}/uploads/create", server.addr))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "title": "report",
            "attachment": { "fileName": "report.txt", "contentType": "text/plain", "size": 9 },
            "stored": "file body",
        })
    );

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut config = base_config();
    config.listener.max_body_size = 16;
    let server = start(config).await;

    let res = client()
        .post(format!("http://{}/uploads/create", server.addr))
        .header("content-type", "application/json")
        .body(format!("{{\"title\":\"{}\"}}", "x".repeat(64)))
        .send()
        .await
        .unwrap();
    assert!(res.status().is_client_error());

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_config_reload_swaps_application() {
    let server = start(base_config()).await;
    let client = client();
    let url = format!("http://{}/status", server.addr);

    assert_eq!(client.get(&url).send().await.unwrap().text().await.unwrap(), "first");

    // A broken configuration is ignored.
    let mut broken = base_config();
    broken.routes.push(RouteConfig::new(""));
    server.config_updates.send(broken).unwrap();

    let mut next = base_config();
    next.routes[0].controller = Some("reloaded".into());
    server.config_updates.send(next).unwrap();

    let mut body = String::new();
    for _ in 0..50 {
        body = client.get(&url).send().await.unwrap().text().await.unwrap();
        if body == "second" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(body, "second");

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_graceful_shutdown_stops_server() {
    let server = start(base_config()).await;
    assert_eq!(
        client()
            .get(format!("http://{}/status", server.addr))
            .send()
            .await
            .unwrap()
            .status(),
        200
    );

    server.shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("server should stop")
        .expect("server task should not panic");
    assert!(result.is_ok());
}

//! HTTP adapter tests against a local server

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::Path;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_test::assert_err;
use url::Url;

use terrctl::app::options::{DeployOptions, ServiceEndpoints};
use terrctl::deploy::remote::RemoteService;
use terrctl::errors::DeployError;
use terrctl::http::client::HttpClient;
use terrctl::models::instance::Instance;
use terrctl::models::upload::{Language, UploadRequest};
use terrctl::utils::user_agent;

async fn upload(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    let marked = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == user_agent());
    if !marked {
        return Json(json!({"success": false, "message": "missing client marker"}));
    }
    match body["lang"].as_str() {
        Some("wasm") | None => Json(json!({"success": false, "message": "bad upload"})),
        Some("c") => Json(json!({"id": "", "success": true, "message": ""})),
        Some(_) if body["options"] == json!([]) => {
            Json(json!({"id": "abc123", "success": true, "message": "ok"}))
        }
        Some(_) => Json(json!({"success": false, "message": "unexpected options"})),
    }
}

async fn status(Path(id): Path<String>) -> (StatusCode, String) {
    match id.as_str() {
        "abc123" => (
            StatusCode::OK,
            json!({"status": "building", "message": "compiling", "success": true, "done": false})
                .to_string(),
        ),
        "a b" => (
            StatusCode::OK,
            json!({"message": "escaped", "success": true, "done": true}).to_string(),
        ),
        "huge" => {
            let padding = "x".repeat(10_000);
            (
                StatusCode::OK,
                json!({"message": padding, "success": true, "done": false}).to_string(),
            )
        }
        _ => (StatusCode::NOT_FOUND, "not found".to_string()),
    }
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(5)).await;
    "ok"
}

async fn spawn_server() -> SocketAddr {
    let app = Router::new()
        .route("/upload", post(upload))
        .route("/status/{id}", get(status))
        .route("/health/ok", get(|| async { "ok" }))
        .route("/health/empty", get(|| async { "" }))
        .route(
            "/health/unavailable",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "starting") }),
        )
        .route("/health/slow", get(slow));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr, http_timeout: Duration) -> HttpClient {
    let options = DeployOptions {
        http_timeout,
        endpoints: ServiceEndpoints {
            deploy_url: format!("http://{}/upload", addr),
            status_url: format!("http://{}/status/", addr),
            ..Default::default()
        },
        ..Default::default()
    };
    HttpClient::new(&options).unwrap()
}

fn request(lang: &str) -> UploadRequest {
    UploadRequest {
        lang: lang.parse().unwrap_or(Language::Rust),
        options: Vec::new(),
        tar: "dGFy".to_string(),
    }
}

#[tokio::test]
async fn test_submit_returns_instance() {
    let addr = spawn_server().await;
    let client = client(addr, Duration::from_secs(5));

    let instance = client.submit(&request("rust")).await.unwrap();
    assert_eq!(instance.id(), "abc123");
}

#[tokio::test]
async fn test_submit_rejected_by_service() {
    let addr = spawn_server().await;
    let client = client(addr, Duration::from_secs(5));

    let err = assert_err!(client.submit(&request("wasm")).await);
    assert!(matches!(err, DeployError::Service(ref m) if m == "bad upload"));
}

#[tokio::test]
async fn test_submit_refuses_unresolved_language() {
    let addr = spawn_server().await;
    let client = client(addr, Duration::from_secs(5));

    let err = assert_err!(client.submit(&request("auto")).await);
    assert!(matches!(err, DeployError::Internal(_)));
}

#[tokio::test]
async fn test_submit_without_id_is_protocol_error() {
    let addr = spawn_server().await;
    let client = client(addr, Duration::from_secs(5));

    let err = assert_err!(client.submit(&request("c")).await);
    assert!(matches!(err, DeployError::Protocol(_)));
}

#[tokio::test]
async fn test_submit_connection_refused_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = client(addr, Duration::from_secs(5));

    let err = assert_err!(client.submit(&request("rust")).await);
    assert!(matches!(err, DeployError::Transport(_)));
}

#[tokio::test]
async fn test_poll_status() {
    let addr = spawn_server().await;
    let client = client(addr, Duration::from_secs(5));

    let snapshot = client.poll_status(&Instance::new("abc123")).await.unwrap();
    assert_eq!(snapshot.status, "building");
    assert_eq!(snapshot.message, "compiling");
    assert!(snapshot.success);
    assert!(!snapshot.done);
}

#[tokio::test]
async fn test_poll_status_escapes_instance_id() {
    let addr = spawn_server().await;
    let client = client(addr, Duration::from_secs(5));

    assert_eq!(
        client.status_url(&Instance::new("a b")).unwrap().as_str(),
        format!("http://{}/status/a%20b", addr)
    );
    let snapshot = client.poll_status(&Instance::new("a b")).await.unwrap();
    assert_eq!(snapshot.message, "escaped");
    assert!(snapshot.done);
}

#[tokio::test]
async fn test_poll_status_oversized_body_is_truncated() {
    let addr = spawn_server().await;
    let client = client(addr, Duration::from_secs(5));

    let err = assert_err!(client.poll_status(&Instance::new("huge")).await);
    assert!(matches!(err, DeployError::Protocol(_)));
}

#[tokio::test]
async fn test_poll_status_undecodable_body() {
    let addr = spawn_server().await;
    let client = client(addr, Duration::from_secs(5));

    let err = assert_err!(client.poll_status(&Instance::new("missing")).await);
    assert!(matches!(err, DeployError::Protocol(_)));
}

#[tokio::test]
async fn test_probe_health_answers() {
    let addr = spawn_server().await;
    let client = client(addr, Duration::from_secs(5));
    let url = |path: &str| Url::parse(&format!("http://{}{}", addr, path)).unwrap();

    assert!(client.probe(url("/health/ok")).await.unwrap());
    assert!(!client.probe(url("/health/empty")).await.unwrap());
    assert!(!client.probe(url("/health/unavailable")).await.unwrap());
    assert!(!client.probe(url("/health/unknown")).await.unwrap());
}

#[tokio::test]
async fn test_probe_health_connection_refused_is_unhealthy() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = client(addr, Duration::from_secs(5));

    let url = Url::parse(&format!("http://{}/health/ok", addr)).unwrap();
    assert!(!client.probe(url).await.unwrap());
}

#[tokio::test]
async fn test_probe_health_timeout_is_transport_error() {
    let addr = spawn_server().await;
    let client = client(addr, Duration::from_millis(200));

    let url = Url::parse(&format!("http://{}/health/slow", addr)).unwrap();
    let err = assert_err!(client.probe(url).await);
    assert!(matches!(err, DeployError::Transport(_)));
}

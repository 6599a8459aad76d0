//! Mock metrics API shared by the integration tests.
//!
//! Records the headers of every request, checks the signature the same way
//! the real API does and tracks how many requests were in flight at once.

#![allow(dead_code)]

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::IntoResponse,
    routing::get,
};
use base64::{Engine as _, engine::general_purpose};
use bitscrunch_metrics::verify_signature;
use ecdsa_lib::{Curve, PrivateKey};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::{Duration, sleep};

pub const METRICS_ROUTE: &str = "/api/v1/market/metrics";

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub uri: String,
    pub content_type: String,
    pub name: String,
    pub pubkey: String,
    pub rid: String,
    pub sign: String,
    pub message: String,
    pub valid: bool,
}

#[derive(Clone)]
pub struct MockApi {
    curve: Curve,
    public_key: Vec<u8>,
    pub seen: Arc<Mutex<Vec<SeenRequest>>>,
    in_flight: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

impl MockApi {
    pub fn new(key: &PrivateKey) -> Self {
        Self {
            curve: key.curve(),
            public_key: key.public_key(),
            seen: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

fn header(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn handle_metrics(State(api): State<MockApi>, uri: Uri, headers: HeaderMap) -> impl IntoResponse {
    let now = api.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    api.max_in_flight.fetch_max(now, Ordering::SeqCst);

    // hold the request open long enough for an overlapping one to show up
    sleep(Duration::from_millis(20)).await;

    let message = header(&headers, "meesage");
    let sign = header(&headers, "sign");
    let valid = verify_signature(api.curve, &api.public_key, &message, &sign);
    let seen = SeenRequest {
        uri: uri.to_string(),
        content_type: header(&headers, "content-type"),
        name: header(&headers, "name"),
        pubkey: header(&headers, "pubkey"),
        rid: header(&headers, "rid"),
        sign,
        message,
        valid,
    };

    let index = {
        let mut seen_requests = api.seen.lock().unwrap();
        seen_requests.push(seen);
        seen_requests.len()
    };
    api.in_flight.fetch_sub(1, Ordering::SeqCst);

    if valid {
        (StatusCode::OK, format!(r#"{{"request":{index},"holders":1200}}"#))
    } else {
        (StatusCode::UNAUTHORIZED, format!(r#"{{"request":{index},"error":"invalid signature"}}"#))
    }
}

async fn fallback_handler() -> impl IntoResponse {
    (StatusCode::BAD_REQUEST, "Invalid request")
}

/// Binds an ephemeral port and serves the mock API on it.
pub async fn spawn_server(api: MockApi) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new()
        .route(METRICS_ROUTE, get(handle_metrics))
        .fallback(fallback_handler)
        .with_state(api);

    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .unwrap_or_else(|e| eprintln!("Server error: {}", e));
    });
    addr
}

/// Key material the way the API hands it out: base64 PKCS#8, no armor.
pub fn raw_material(key: &PrivateKey) -> String {
    general_purpose::STANDARD.encode(key.to_pkcs8_der().unwrap())
}

/// JSON access key file contents for `key`.
pub fn access_key_json(key: &PrivateKey, public_key: &str, name: &str) -> String {
    serde_json::json!({
        "Key": raw_material(key),
        "PublicKey": public_key,
        "Name": name,
    })
    .to_string()
}

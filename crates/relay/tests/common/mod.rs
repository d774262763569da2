#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use clap::Parser;
use http_body_util::BodyExt;
use serde_json::Value;
use signatom_relay::{AppState, Args, RelayConfig, router};
use tower::ServiceExt;

type Responder = Arc<dyn Fn(&Value) -> (StatusCode, String) + Send + Sync>;

/// A request the relay sent to the fake backend.
#[derive(Debug, Clone)]
pub struct Call {
    pub path: String,
    pub headers: HeaderMap,
    pub body: Value,
}

#[derive(Clone, Default)]
struct Shared {
    calls: Arc<Mutex<Vec<Call>>>,
    responders: Arc<Mutex<HashMap<String, Responder>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
}

/// Stand-in for the signing service, bound to an ephemeral local port.
pub struct FakeBackend {
    pub url: String,
    shared: Shared,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let shared = Shared::default();
        let app = Router::new().fallback(record).with_state(shared.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { url, shared }
    }

    pub fn respond(&self, path: &str, status: StatusCode, body: Value) {
        let body = body.to_string();
        self.respond_with(path, move |_| (status, body.clone()));
    }

    pub fn respond_raw(&self, path: &str, status: StatusCode, body: &str) {
        let body = body.to_string();
        self.respond_with(path, move |_| (status, body.clone()));
    }

    pub fn respond_with<F>(&self, path: &str, responder: F)
    where
        F: Fn(&Value) -> (StatusCode, String) + Send + Sync + 'static,
    {
        self.shared
            .responders
            .lock()
            .unwrap()
            .insert(path.to_string(), Arc::new(responder));
    }

    /// Hold every answer on `path` back for `delay`.
    pub fn delay(&self, path: &str, delay: Duration) {
        self.shared
            .delays
            .lock()
            .unwrap()
            .insert(path.to_string(), delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.shared.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|call| call.path == path).collect()
    }
}

async fn record(
    State(shared): State<Shared>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let path = uri.path().to_string();
    shared.calls.lock().unwrap().push(Call {
        path: path.clone(),
        headers,
        body: body.clone(),
    });

    let delay = shared.delays.lock().unwrap().get(&path).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let responder = shared.responders.lock().unwrap().get(&path).cloned();
    match responder {
        Some(responder) => {
            let (status, body) = responder(&body);
            (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
        }
        None => (StatusCode::NOT_FOUND, "{}").into_response(),
    }
}

pub fn config(backend_url: &str) -> RelayConfig {
    config_with(backend_url, &[])
}

pub fn config_with(backend_url: &str, extra: &[&str]) -> RelayConfig {
    let mut argv = vec!["relay", "--backend-url", backend_url];
    argv.extend_from_slice(extra);
    Args::try_parse_from(argv).unwrap().into_config().unwrap()
}

pub fn keyless_config(backend_url: &str) -> RelayConfig {
    config_with(
        backend_url,
        &[
            "--id-token",
            "test-id-token",
            "--sign-mgr-url",
            "http://rekor.test:18080",
            "--cert-mgr-url",
            "http://fulcio.test:18080",
            "--cert-issuer",
            "https://issuer.test",
            "--cert-san",
            "system:serviceaccount:default:default",
        ],
    )
}

pub fn app(config: RelayConfig) -> (Router, AppState) {
    let state = AppState::new(config).unwrap();
    (router(state.clone()), state)
}

/// A base URL nothing is listening on.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub async fn call(app: &Router, method: Method, path: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

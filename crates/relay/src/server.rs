use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::State,
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{MethodRouter, get, post},
};
use serde::Serialize;
use tracing::info;

use crate::backend::{BackendClient, BackendResponse};
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::session::SessionCache;
use crate::workflow::{
    GenerateKey, KeylessSign, KeylessVerify, SignWithKey, VerifyWithKey, Workflow, run_step,
};

/// Inbound paths served by the relay.
pub mod paths {
    pub const GENERATE_KEY: &str = "/generateKey";
    pub const SIGN_WITH_KEY: &str = "/signwithKey";
    pub const VERIFY_WITH_KEY: &str = "/verifywithKey";
    pub const SIGN_WITHOUT_KEY: &str = "/signwithoutKey";
    pub const VERIFY_WITHOUT_KEY: &str = "/verifywithoutKey";
    pub const SESSION: &str = "/session";
    pub const HEALTHCHECK: &str = "/healthcheck";
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub backend: BackendClient,
    pub session: Arc<SessionCache>,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Result<Self> {
        let backend = BackendClient::new(&config.backend)?;
        Ok(Self {
            config: Arc::new(config),
            backend,
            session: Arc::new(SessionCache::new()),
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            paths::HEALTHCHECK,
            get(|| async move { (StatusCode::OK, "Ok").into_response() }),
        )
        .route(paths::SESSION, only(Method::GET, get(session_handler)))
        .route(paths::GENERATE_KEY, only(Method::POST, post(step_handler::<GenerateKey>)))
        .route(paths::SIGN_WITH_KEY, only(Method::POST, post(step_handler::<SignWithKey>)))
        .route(paths::VERIFY_WITH_KEY, only(Method::GET, get(step_handler::<VerifyWithKey>)))
        .route(paths::SIGN_WITHOUT_KEY, only(Method::POST, post(step_handler::<KeylessSign>)))
        .route(paths::VERIFY_WITHOUT_KEY, only(Method::GET, get(step_handler::<KeylessVerify>)))
        .with_state(state)
}

// Answers every other verb with a plain-text 405.
fn only(allowed: Method, route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.fallback(move || {
        let allowed = allowed.clone();
        async move { RelayError::MethodNotAllowed(allowed) }
    })
}

async fn step_handler<W: Workflow>(
    State(state): State<AppState>,
) -> Result<BackendResponse, RelayError> {
    run_step::<W>(&state).await
}

/// Which artifacts the session currently holds. Secrets are never exposed.
#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub key_generated: bool,
    pub public_key: String,
    pub key_id: String,
    pub signed: bool,
    pub certificate_cached: bool,
}

async fn session_handler(State(state): State<AppState>) -> Json<SessionStatus> {
    let status = state.session.read(|session| SessionStatus {
        key_generated: !session.key.private_key.is_empty(),
        public_key: session.key.public_key.clone(),
        key_id: session.key.key_id.clone(),
        signed: !session.signature.signature.is_empty(),
        certificate_cached: session.signature.certificate.is_some(),
    });
    Json(status)
}

pub async fn run(host: String, port: u16, config: RelayConfig) -> Result<()> {
    let state = AppState::new(config)?;

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("binding {host}:{port}"))?;
    info!(address = %listener.local_addr()?, "relay listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving relay")?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}

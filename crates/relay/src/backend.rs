use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::BackendConfig;
use crate::error::RelayError;

/// Status, content type and raw body exactly as the backend sent them.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl IntoResponse for BackendResponse {
    fn into_response(self) -> Response {
        let content_type = self
            .content_type
            .unwrap_or_else(|| HeaderValue::from_static("application/json"));
        (self.status, [(header::CONTENT_TYPE, content_type)], self.body).into_response()
    }
}

/// Single-shot JSON client for the signing service.
///
/// Status codes are returned uninterpreted; deciding whether a body can
/// be trusted is left to the caller.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str());

        if let Some(pem) = &config.ca_cert_pem {
            let cert = reqwest::Certificate::from_pem(pem).context("parsing backend CA certificate")?;
            builder = builder.add_root_certificate(cert);
        }

        let http = builder.build().context("building backend HTTP client")?;
        Ok(Self { http })
    }

    pub async fn send<T>(&self, url: &str, payload: &T) -> Result<BackendResponse, RelayError>
    where
        T: Serialize + ?Sized,
    {
        let body = serde_json::to_vec(payload).map_err(RelayError::Encoding)?;

        let response = self
            .http
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .inspect_err(|e| warn!(url, error = %e, "backend request failed"))?;

        let status = response.status();
        let content_type = response.headers().get(header::CONTENT_TYPE).cloned();
        let body = response
            .bytes()
            .await
            .inspect_err(|e| warn!(url, error = %e, "reading backend response failed"))?;

        debug!(url, status = status.as_u16(), len = body.len(), "backend responded");

        Ok(BackendResponse {
            status,
            content_type,
            body,
        })
    }
}

use axum::http::{Method, StatusCode, header};
use axum_core::response::{IntoResponse as AxumCoreIntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Failed to encode backend request: {0}")]
    Encoding(#[source] serde_json::Error),
    #[error("Backend service unavailable: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Failed to parse backend response: {0}")]
    Decoding(#[source] serde_json::Error),
    #[error("{0} is not set")]
    Precondition(&'static str),
    #[error("Only {0} method is allowed")]
    MethodNotAllowed(Method),
    #[error("Keyless signing is not configured")]
    KeylessDisabled,
}

// Backend URLs stay in the logs, never in caller-facing bodies.
impl From<reqwest::Error> for RelayError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.without_url())
    }
}

/// Trait implementation to convert this error into an axum http response
impl AxumCoreIntoResponse for RelayError {
    fn into_response(self) -> Response {
        match self {
            RelayError::MethodNotAllowed(ref allowed) => {
                let allow = allowed.to_string();
                (
                    StatusCode::METHOD_NOT_ALLOWED,
                    [(header::ALLOW, allow)],
                    self.to_string(),
                )
                    .into_response()
            }
            precondition_error @ RelayError::Precondition(_) => {
                (StatusCode::BAD_REQUEST, precondition_error.to_string()).into_response()
            }
            transport_error @ RelayError::Transport(_) => {
                (StatusCode::BAD_GATEWAY, transport_error.to_string()).into_response()
            }
            disabled @ RelayError::KeylessDisabled => {
                (StatusCode::SERVICE_UNAVAILABLE, disabled.to_string()).into_response()
            }
            internal @ (RelayError::Encoding(_) | RelayError::Decoding(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, internal.to_string()).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_error() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("{not json").unwrap_err()
    }

    #[test]
    fn precondition_returns_400() {
        let error = RelayError::Precondition("private key");
        assert_eq!(error.to_string(), "private key is not set");
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn method_not_allowed_returns_405_with_allow_header() {
        let error = RelayError::MethodNotAllowed(Method::POST);
        assert_eq!(error.to_string(), "Only POST method is allowed");
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "POST");
    }

    #[test]
    fn decoding_error_returns_500() {
        let response = RelayError::Decoding(json_error()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn encoding_error_returns_500() {
        let response = RelayError::Encoding(json_error()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn keyless_disabled_returns_503() {
        let response = RelayError::KeylessDisabled.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

mod keyed;
mod keyless;
mod protocol;

pub use keyed::{GenerateKey, SignWithKey, VerifyWithKey};
pub use keyless::{KeylessSign, KeylessVerify};
pub use protocol::{
    BaseConfig, Certificate, GenerateKeyRequest, GenerateKeyResponse, KeySignRequest,
    KeySignResponse, KeyVerifyRequest, KeylessSignRequest, KeylessSignResponse,
    KeylessVerifyRequest, VerifyResponse,
};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{info, warn};

use crate::backend::BackendResponse;
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::server::AppState;
use crate::session::SessionState;

pub const KEYPAIR_PATH: &str = "/v1/keypair";
pub const SIGN_DIGEST_PATH: &str = "/v1/sign/digest";
pub const VERIFY_DIGEST_PATH: &str = "/v1/verify/digest";

/// Trust model a step belongs to. Selects the envelope and backend URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Caller-held key pair cached by the generate step.
    Keyed,
    /// Short-lived certificate anchored to an identity token.
    Keyless,
}

/// One step of a signing workflow.
///
/// Implementations only describe the step: which endpoint it calls, how
/// its request is built from cached state, and what it writes back.
/// Sequencing and locking live in [`run_step`].
pub trait Workflow: Send + Sync + 'static {
    type Request: Serialize + Send + Sync;
    type Response: DeserializeOwned + Send;

    const NAME: &'static str;
    const FLOW: Flow;
    const PATH: &'static str;

    /// Build the backend request, failing with `Precondition` when an
    /// artifact from an earlier step is missing.
    fn prepare(config: &RelayConfig, state: &SessionState) -> Result<Self::Request, RelayError>;

    /// Record a successfully decoded response. Read-only steps keep the default.
    fn commit(_response: Self::Response, _state: &mut SessionState) {}
}

/// Runs one workflow step against the backend.
///
/// The session lock is held only while preparing the request and while
/// committing the decoded response. Non-2xx backend answers are relayed
/// untouched and never reach the cache.
#[tracing::instrument(skip_all, fields(step = W::NAME))]
pub async fn run_step<W: Workflow>(state: &AppState) -> Result<BackendResponse, RelayError> {
    let request = state
        .session
        .read(|session| W::prepare(&state.config, session))
        .inspect_err(|e| warn!(error = %e, "precondition failed"))?;

    let url = state.config.endpoint(W::FLOW, W::PATH);
    let response = state.backend.send(&url, &request).await?;

    if !response.status.is_success() {
        warn!(status = response.status.as_u16(), "backend rejected request");
        return Ok(response);
    }

    let decoded: W::Response = serde_json::from_slice(&response.body)
        .map_err(RelayError::Decoding)
        .inspect_err(|e| warn!(error = %e, "unexpected backend response"))?;

    state.session.update(|session| W::commit(decoded, session));

    info!(status = response.status.as_u16(), "step completed");
    Ok(response)
}

fn require<'a>(value: &'a str, what: &'static str) -> Result<&'a str, RelayError> {
    if value.is_empty() {
        Err(RelayError::Precondition(what))
    } else {
        Ok(value)
    }
}

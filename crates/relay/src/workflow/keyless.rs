use super::{
    Flow, KeylessSignRequest, KeylessSignResponse, KeylessVerifyRequest, SIGN_DIGEST_PATH,
    VERIFY_DIGEST_PATH, VerifyResponse, Workflow, require,
};
use crate::config::{KeylessConfig, RelayConfig};
use crate::error::RelayError;
use crate::session::{SessionState, SignatureArtifact};

fn keyless(config: &RelayConfig) -> Result<&KeylessConfig, RelayError> {
    config.keyless.as_ref().ok_or(RelayError::KeylessDisabled)
}

/// Signs the digest under a certificate issued for the configured identity token.
pub struct KeylessSign;

impl Workflow for KeylessSign {
    type Request = KeylessSignRequest;
    type Response = KeylessSignResponse;

    const NAME: &'static str = "keyless-sign";
    const FLOW: Flow = Flow::Keyless;
    const PATH: &'static str = SIGN_DIGEST_PATH;

    fn prepare(config: &RelayConfig, _state: &SessionState) -> Result<Self::Request, RelayError> {
        let keyless = keyless(config)?;
        Ok(KeylessSignRequest {
            base_config: config.base_config(Self::FLOW),
            digest: config.digest.clone(),
            id_token: keyless.id_token.clone(),
            sign_mgr: keyless.sign_mgr.clone(),
            sign_mgr_url: keyless.sign_mgr_url.clone(),
            cert_mgr: keyless.cert_mgr.clone(),
            cert_mgr_url: keyless.cert_mgr_url.clone(),
        })
    }

    fn commit(response: Self::Response, state: &mut SessionState) {
        state.signature = SignatureArtifact {
            signature: response.signature,
            certificate: Some(response.cert),
        };
    }
}

/// Verifies the cached keyless signature and its certificate.
pub struct KeylessVerify;

impl Workflow for KeylessVerify {
    type Request = KeylessVerifyRequest;
    type Response = VerifyResponse;

    const NAME: &'static str = "keyless-verify";
    const FLOW: Flow = Flow::Keyless;
    const PATH: &'static str = VERIFY_DIGEST_PATH;

    fn prepare(config: &RelayConfig, state: &SessionState) -> Result<Self::Request, RelayError> {
        let keyless = keyless(config)?;
        let signature = require(&state.signature.signature, "signature")?;
        let cert = state
            .signature
            .certificate
            .as_ref()
            .filter(|cert| !cert.is_empty())
            .ok_or(RelayError::Precondition("certificate"))?;
        Ok(KeylessVerifyRequest {
            base_config: config.base_config(Self::FLOW),
            digest: config.digest.clone(),
            signature: signature.to_string(),
            cert: cert.clone(),
            cert_issuer: keyless.cert_issuer.clone(),
            cert_san: keyless.cert_san.clone(),
            sign_mgr: keyless.sign_mgr.clone(),
            sign_mgr_url: keyless.sign_mgr_url.clone(),
            cert_mgr: keyless.cert_mgr.clone(),
            cert_mgr_url: keyless.cert_mgr_url.clone(),
        })
    }
}

use super::{
    Flow, GenerateKeyRequest, GenerateKeyResponse, KEYPAIR_PATH, KeySignRequest, KeySignResponse,
    KeyVerifyRequest, SIGN_DIGEST_PATH, VERIFY_DIGEST_PATH, VerifyResponse, Workflow, require,
};
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::session::{KeyMaterial, SessionState, SignatureArtifact};

/// Creates a fresh key pair and replaces the cached one.
pub struct GenerateKey;

impl Workflow for GenerateKey {
    type Request = GenerateKeyRequest;
    type Response = GenerateKeyResponse;

    const NAME: &'static str = "generate-key";
    const FLOW: Flow = Flow::Keyed;
    const PATH: &'static str = KEYPAIR_PATH;

    fn prepare(config: &RelayConfig, _state: &SessionState) -> Result<Self::Request, RelayError> {
        Ok(GenerateKeyRequest(config.base_config(Self::FLOW)))
    }

    fn commit(response: Self::Response, state: &mut SessionState) {
        state.key = KeyMaterial {
            private_key: response.private_key,
            public_key: response.public_key,
            key_id: response.key_id,
        };
    }
}

/// Signs the deployment digest with the cached private key.
pub struct SignWithKey;

impl Workflow for SignWithKey {
    type Request = KeySignRequest;
    type Response = KeySignResponse;

    const NAME: &'static str = "sign-with-key";
    const FLOW: Flow = Flow::Keyed;
    const PATH: &'static str = SIGN_DIGEST_PATH;

    fn prepare(config: &RelayConfig, state: &SessionState) -> Result<Self::Request, RelayError> {
        let private_key = require(&state.key.private_key, "private key")?;
        Ok(KeySignRequest {
            base_config: config.base_config(Self::FLOW),
            private_key: private_key.to_string(),
            digest: config.digest.clone(),
        })
    }

    fn commit(response: Self::Response, state: &mut SessionState) {
        state.signature = SignatureArtifact {
            signature: response.signature,
            certificate: None,
        };
    }
}

/// Verifies the cached signature against the cached public key.
pub struct VerifyWithKey;

impl Workflow for VerifyWithKey {
    type Request = KeyVerifyRequest;
    type Response = VerifyResponse;

    const NAME: &'static str = "verify-with-key";
    const FLOW: Flow = Flow::Keyed;
    const PATH: &'static str = VERIFY_DIGEST_PATH;

    fn prepare(config: &RelayConfig, state: &SessionState) -> Result<Self::Request, RelayError> {
        let signature = require(&state.signature.signature, "signature")?;
        let public_key = require(&state.key.public_key, "public key")?;
        let digest = require(&config.digest, "digest")?;
        Ok(KeyVerifyRequest {
            base_config: config.base_config(Self::FLOW),
            public_key: public_key.to_string(),
            digest: digest.to_string(),
            signature: signature.to_string(),
        })
    }
}

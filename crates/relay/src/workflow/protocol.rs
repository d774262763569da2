use std::fmt;

use serde::{Deserialize, Serialize};

/// Descriptive envelope attached to every backend request and response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseConfig {
    pub algo: String,
    pub kms: String,
    pub flow: String,
}

/// Keyless signing certificate as issued by the certificate manager.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Certificate {
    #[serde(rename = "CertPEM")]
    pub cert_pem: String,
    #[serde(rename = "ChainPEM")]
    pub chain_pem: String,
    /// Transparency-log inclusion proof.
    #[serde(rename = "SCT")]
    pub sct: String,
    #[serde(rename = "Identity")]
    pub identity: String,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "SubjectRegExp")]
    pub subject_regexp: String,
    #[serde(rename = "Issuer")]
    pub issuer: String,
    #[serde(rename = "IssuerRegExp")]
    pub issuer_regexp: String,
    #[serde(rename = "Token")]
    pub token: String,
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.token.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("Certificate")
            .field("cert_pem", &self.cert_pem)
            .field("chain_pem", &self.chain_pem)
            .field("sct", &self.sct)
            .field("identity", &self.identity)
            .field("subject", &self.subject)
            .field("subject_regexp", &self.subject_regexp)
            .field("issuer", &self.issuer)
            .field("issuer_regexp", &self.issuer_regexp)
            .field("token", &token)
            .finish()
    }
}

impl Certificate {
    pub fn is_empty(&self) -> bool {
        *self == Certificate::default()
    }
}

// ── Requests ─────────────────────────────────────────────────────────

/// The keypair endpoint takes the bare envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct GenerateKeyRequest(pub BaseConfig);

#[derive(Debug, Clone, Serialize)]
pub struct KeySignRequest {
    pub base_config: BaseConfig,
    #[serde(rename = "priv")]
    pub private_key: String,
    pub digest: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyVerifyRequest {
    pub base_config: BaseConfig,
    #[serde(rename = "pub")]
    pub public_key: String,
    pub digest: String,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeylessSignRequest {
    pub base_config: BaseConfig,
    pub digest: String,
    pub id_token: String,
    pub sign_mgr: String,
    pub sign_mgr_url: String,
    pub cert_mgr: String,
    pub cert_mgr_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeylessVerifyRequest {
    pub base_config: BaseConfig,
    pub digest: String,
    pub signature: String,
    pub cert: Certificate,
    pub cert_issuer: String,
    pub cert_san: String,
    pub sign_mgr: String,
    pub sign_mgr_url: String,
    pub cert_mgr: String,
    pub cert_mgr_url: String,
}

// ── Responses ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateKeyResponse {
    // Some backend builds still emit the misspelled key.
    #[serde(default, alias = "base_conig")]
    pub base_config: BaseConfig,
    #[serde(rename = "priv")]
    pub private_key: String,
    #[serde(rename = "pub")]
    pub public_key: String,
    #[serde(default)]
    pub key_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeySignResponse {
    #[serde(default)]
    pub base_config: BaseConfig,
    pub signature: String,
    #[serde(default)]
    pub cert: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeylessSignResponse {
    #[serde(default)]
    pub base_config: BaseConfig,
    pub signature: String,
    pub cert: Certificate,
}

/// Shared by both verify endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponse {
    #[serde(default)]
    pub base_config: BaseConfig,
    pub result: serde_json::Value,
}

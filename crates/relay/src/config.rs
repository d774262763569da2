use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail, ensure};
use clap::Parser;
use reqwest::Url;

use crate::workflow::{BaseConfig, Flow};

#[derive(Parser, Debug, Clone)]
#[command(name = "relay")]
#[command(about = "Session relay in front of a remote signing service")]
pub struct Args {
    #[clap(long, env = "RELAY_HOST", default_value = "127.0.0.1")]
    pub host: String,
    #[clap(long, env = "RELAY_PORT", default_value = "8080")]
    pub port: u16,

    /// Base URL of the key-based signing service
    #[clap(long, env = "SIGNING_BACKEND_URL")]
    pub backend_url: String,
    /// Base URL for keyless steps (defaults to --backend-url)
    #[clap(long, env = "KEYLESS_BACKEND_URL")]
    pub keyless_backend_url: Option<String>,
    /// Extra PEM root certificate trusted for HTTPS backends
    #[clap(long, env = "SIGNING_BACKEND_CA_CERT")]
    pub backend_ca_cert: Option<PathBuf>,
    #[clap(long, env = "SIGNING_BACKEND_TIMEOUT_SECS", default_value = "5")]
    pub timeout_secs: u64,
    #[clap(long, env = "SIGNING_BACKEND_USER_AGENT", default_value = "Signatom/1.0")]
    pub user_agent: String,

    #[clap(long, env = "KEY_ALGORITHM", default_value = "sm2")]
    pub key_algorithm: String,
    #[clap(long, env = "KEYLESS_ALGORITHM", default_value = "ecdsa")]
    pub keyless_algorithm: String,
    #[clap(long, env = "SIGNING_KMS", default_value = "")]
    pub kms: String,
    #[clap(long, env = "SIGNING_FLOW", default_value = "classic")]
    pub flow: String,
    /// The message digest every sign and verify step operates on
    #[clap(long, env = "SIGNING_DIGEST", default_value = "Hello, Signatom!")]
    pub digest: String,

    // Keyless signing is enabled only when an identity token is supplied.
    #[clap(long, env = "KEYLESS_ID_TOKEN", hide_env_values = true)]
    pub id_token: Option<String>,
    #[clap(long, env = "KEYLESS_ID_TOKEN_FILE", conflicts_with = "id_token")]
    pub id_token_file: Option<PathBuf>,
    #[clap(long, env = "KEYLESS_SIGN_MGR", default_value = "rekor")]
    pub sign_mgr: String,
    #[clap(long, env = "KEYLESS_SIGN_MGR_URL")]
    pub sign_mgr_url: Option<String>,
    #[clap(long, env = "KEYLESS_CERT_MGR", default_value = "fulcio")]
    pub cert_mgr: String,
    #[clap(long, env = "KEYLESS_CERT_MGR_URL")]
    pub cert_mgr_url: Option<String>,
    #[clap(long, env = "KEYLESS_CERT_ISSUER", default_value = "")]
    pub cert_issuer: String,
    #[clap(long, env = "KEYLESS_CERT_SAN", default_value = "")]
    pub cert_san: String,

    /// Log level (trace, debug, info, warn, error)
    #[clap(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn into_config(self) -> Result<RelayConfig> {
        ensure!(!self.digest.is_empty(), "--digest must not be empty");
        ensure!(self.timeout_secs > 0, "--timeout-secs must be greater than zero");

        let backend_url = parse_base_url(&self.backend_url).context("--backend-url")?;
        let keyless_backend_url = match &self.keyless_backend_url {
            Some(url) => parse_base_url(url).context("--keyless-backend-url")?,
            None => backend_url.clone(),
        };

        let ca_cert_pem = self
            .backend_ca_cert
            .as_ref()
            .map(|path| {
                std::fs::read(path)
                    .with_context(|| format!("reading CA certificate {}", path.display()))
            })
            .transpose()?;

        let id_token = match (self.id_token, &self.id_token_file) {
            (Some(token), _) => Some(token),
            (None, Some(path)) => Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("reading identity token {}", path.display()))?,
            ),
            (None, None) => None,
        };

        let keyless = match id_token {
            Some(token) => {
                let id_token = token.trim().to_string();
                ensure!(!id_token.is_empty(), "identity token must not be empty");
                let Some(sign_mgr_url) = self.sign_mgr_url else {
                    bail!("--sign-mgr-url is required when keyless signing is enabled");
                };
                let Some(cert_mgr_url) = self.cert_mgr_url else {
                    bail!("--cert-mgr-url is required when keyless signing is enabled");
                };
                Some(KeylessConfig {
                    id_token,
                    sign_mgr: self.sign_mgr,
                    sign_mgr_url,
                    cert_mgr: self.cert_mgr,
                    cert_mgr_url,
                    cert_issuer: self.cert_issuer,
                    cert_san: self.cert_san,
                })
            }
            None => None,
        };

        Ok(RelayConfig {
            backend: BackendConfig {
                url: backend_url,
                keyless_url: keyless_backend_url,
                timeout: Duration::from_secs(self.timeout_secs),
                user_agent: self.user_agent,
                ca_cert_pem,
            },
            key_base: BaseConfig {
                algo: self.key_algorithm,
                kms: self.kms.clone(),
                flow: self.flow.clone(),
            },
            keyless_base: BaseConfig {
                algo: self.keyless_algorithm,
                kms: self.kms,
                flow: self.flow,
            },
            digest: self.digest,
            keyless,
        })
    }
}

/// Validated relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub backend: BackendConfig,
    pub key_base: BaseConfig,
    pub keyless_base: BaseConfig,
    pub digest: String,
    pub keyless: Option<KeylessConfig>,
}

impl RelayConfig {
    pub fn base_config(&self, flow: Flow) -> BaseConfig {
        match flow {
            Flow::Keyed => self.key_base.clone(),
            Flow::Keyless => self.keyless_base.clone(),
        }
    }

    /// Full backend URL for `path` on the service that handles `flow`.
    pub fn endpoint(&self, flow: Flow, path: &str) -> String {
        let base = match flow {
            Flow::Keyed => &self.backend.url,
            Flow::Keyless => &self.backend.keyless_url,
        };
        format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: Url,
    pub keyless_url: Url,
    pub timeout: Duration,
    pub user_agent: String,
    pub ca_cert_pem: Option<Vec<u8>>,
}

#[derive(Clone)]
pub struct KeylessConfig {
    pub id_token: String,
    pub sign_mgr: String,
    pub sign_mgr_url: String,
    pub cert_mgr: String,
    pub cert_mgr_url: String,
    pub cert_issuer: String,
    pub cert_san: String,
}

impl fmt::Debug for KeylessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeylessConfig")
            .field("id_token", &"<redacted>")
            .field("sign_mgr", &self.sign_mgr)
            .field("sign_mgr_url", &self.sign_mgr_url)
            .field("cert_mgr", &self.cert_mgr)
            .field("cert_mgr_url", &self.cert_mgr_url)
            .field("cert_issuer", &self.cert_issuer)
            .field("cert_san", &self.cert_san)
            .finish()
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("invalid URL {raw:?}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("unsupported scheme {:?} in {raw:?}", url.scheme());
    }
    Ok(url)
}

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use signatom_relay::paths;

/// A relay endpoint, in the order a session normally walks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    GenerateKey,
    SignWithKey,
    VerifyWithKey,
    KeylessSign,
    KeylessVerify,
}

impl Step {
    pub const KEY_FLOW: [Step; 3] = [Step::GenerateKey, Step::SignWithKey, Step::VerifyWithKey];
    pub const KEYLESS_FLOW: [Step; 2] = [Step::KeylessSign, Step::KeylessVerify];

    pub fn path(self) -> &'static str {
        match self {
            Step::GenerateKey => paths::GENERATE_KEY,
            Step::SignWithKey => paths::SIGN_WITH_KEY,
            Step::VerifyWithKey => paths::VERIFY_WITH_KEY,
            Step::KeylessSign => paths::SIGN_WITHOUT_KEY,
            Step::KeylessVerify => paths::VERIFY_WITHOUT_KEY,
        }
    }

    /// Verification is read-only; every other step changes the session.
    pub fn method(self) -> Method {
        match self {
            Step::VerifyWithKey | Step::KeylessVerify => Method::GET,
            _ => Method::POST,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub step: Step,
    pub status: StatusCode,
    pub body: String,
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

pub struct RelayClient {
    http: reqwest::Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn call(&self, step: Step) -> Result<StepOutcome> {
        let url = format!("{}{}", self.base_url, step.path());
        let response = self
            .http
            .request(step.method(), &url)
            .send()
            .await
            .with_context(|| format!("calling {url}"))?;

        let status = response.status();
        let body = response.text().await.context("reading relay response")?;
        Ok(StepOutcome { step, status, body })
    }

    /// Runs `steps` in order, stopping after the first unsuccessful one.
    pub async fn run_sequence(&self, steps: &[Step]) -> Result<Vec<StepOutcome>> {
        let mut outcomes = Vec::with_capacity(steps.len());
        for &step in steps {
            let outcome = self.call(step).await?;
            let failed = !outcome.is_success();
            outcomes.push(outcome);
            if failed {
                break;
            }
        }
        Ok(outcomes)
    }
}

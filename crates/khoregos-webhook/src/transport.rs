//! The HTTP send operation, isolated behind a trait so the retry state
//! machine in `state.rs` can be tested without a real network call.

use std::time::Duration;

use crate::error::{Result, WebhookError};

const USER_AGENT: &str = "khoregos-webhook/1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub trait Transport: Send + Sync {
    fn post(&self, url: &str, body: &[u8], signature: Option<&str>) -> Result<()>;
}

/// Delivers over real HTTP via `reqwest`'s blocking client — the core
/// is synchronous end to end (`spec.md` §5), so no async runtime is
/// pulled in for this.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::blocking::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("reqwest client builds with static configuration"),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ReqwestTransport {
    fn post(&self, url: &str, body: &[u8], signature: Option<&str>) -> Result<()> {
        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("User-Agent", USER_AGENT)
            .body(body.to_vec());
        if let Some(signature) = signature {
            request = request.header("X-K6s-Signature", signature);
        }

        let response = request
            .send()
            .map_err(|err| WebhookError::RequestFailed(err.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(WebhookError::UnexpectedStatus(response.status().as_u16()))
        }
    }
}

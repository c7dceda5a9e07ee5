use crate::constants::REQUEST_TIMEOUT_SECS;
use crate::source::{FetchError, LedgerSource};
use crate::types::{FetchRequest, FetchResponse};
use log::debug;
use std::time::Duration;
use ureq::Agent;

/// client for the graphql proxy edge function. the proxy owns the actual
/// indexer queries; we only speak its `{ limit }` -> `FetchResponse` contract.
pub struct ProxySource {
    url: String,
    agent: Agent,
}

impl ProxySource {
    pub fn new(url: &str) -> Self {
        ProxySource {
            url: url.to_string(),
            agent: http_agent(),
        }
    }
}

impl LedgerSource for ProxySource {
    fn fetch(&self, limit: u32) -> Result<FetchResponse, FetchError> {
        debug!("proxy fetch {} limit={limit}", self.url);
        let mut res = self
            .agent
            .post(self.url.as_str())
            .send_json(FetchRequest { limit })?;
        let status = res.status().as_u16();
        let body = res.body_mut().read_to_string()?;
        parse_proxy_body(status, &body)
    }
}

/// shared agent setup: bounded requests, and non-2xx bodies handed back to
/// us so an `error` payload can be surfaced as-is
pub(crate) fn http_agent() -> Agent {
    Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .http_status_as_error(false)
        .build()
        .into()
}

fn parse_proxy_body(status: u16, body: &str) -> Result<FetchResponse, FetchError> {
    let success = (200..300).contains(&status);
    match serde_json::from_str::<FetchResponse>(body) {
        Ok(res) if success || res.error.is_some() => res.into_result(),
        Ok(_) => Err(FetchError::Transport(format!(
            "proxy responded with HTTP {status}"
        ))),
        Err(_) if !success => Err(FetchError::Transport(format!(
            "proxy responded with HTTP {status}"
        ))),
        Err(err) => Err(err.into()),
    }
}

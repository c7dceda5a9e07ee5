use crate::{node::NodeSource, proxy::ProxySource, types::FetchResponse};
use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::{str::FromStr, sync::Arc};
use thiserror::Error;

/// a failed fetch. both variants render as the bare message, which is
/// what observers of the sampler get to see.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// the request never produced a usable response
    #[error("{0}")]
    Transport(String),
    /// well-formed response carrying an `error`
    #[error("{0}")]
    Api(String),
}

impl From<ureq::Error> for FetchError {
    fn from(err: ureq::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Transport(format!("invalid response body: {err}"))
    }
}

impl FetchResponse {
    /// turns an api-level `error` field into a `FetchError::Api`
    pub fn into_result(self) -> Result<FetchResponse, FetchError> {
        match self.error {
            Some(message) => Err(FetchError::Api(message)),
            None => Ok(self),
        }
    }
}

/// anything that can hand back the most recent transactions plus the
/// current ledger info. implementations block; async callers are
/// expected to go through `spawn_blocking`.
pub trait LedgerSource: Send + Sync {
    fn fetch(&self, limit: u32) -> Result<FetchResponse, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// the graphql proxy in front of the aptos indexer
    #[default]
    Proxy,
    /// an aptos fullnode REST api
    Node,
}

impl FromStr for SourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proxy" => Ok(SourceKind::Proxy),
            "node" => Ok(SourceKind::Node),
            other => Err(anyhow!("error: unknown source kind {other}")),
        }
    }
}

impl SourceKind {
    pub fn build(&self, proxy_url: &str, node_url: &str) -> Arc<dyn LedgerSource> {
        match self {
            SourceKind::Proxy => Arc::new(ProxySource::new(proxy_url)),
            SourceKind::Node => Arc::new(NodeSource::new(node_url)),
        }
    }
}

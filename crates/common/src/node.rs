/// direct source over an aptos fullnode REST api (`/v1`).
///
/// the node hands back the last `limit` transactions in ascending version
/// order, the sampler wants the newest first, so batches get reversed here.
/// fields the proxy precomputes (gas cost, transfer amount) are derived
/// from the raw node json.
use crate::constants::{OCTAS_PER_APT, TRANSFER_FUNCTIONS};
use crate::proxy::http_agent;
use crate::source::{FetchError, LedgerSource};
use crate::types::{FetchResponse, LedgerInfo, Transaction};
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use ureq::Agent;

pub struct NodeSource {
    base_url: String,
    agent: Agent,
}

#[derive(Deserialize)]
struct NodeLedgerInfo {
    chain_id: u16,
    epoch: String,
    ledger_version: String,
    ledger_timestamp: String,
    block_height: String,
}

impl From<NodeLedgerInfo> for LedgerInfo {
    fn from(info: NodeLedgerInfo) -> Self {
        LedgerInfo {
            ledger_version: info.ledger_version,
            block_height: info.block_height,
            chain_id: info.chain_id,
            epoch: info.epoch,
            ledger_timestamp: info.ledger_timestamp,
        }
    }
}

impl NodeSource {
    pub fn new(base_url: &str) -> Self {
        NodeSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent: http_agent(),
        }
    }

    fn get(&self, path: &str) -> Result<String, FetchError> {
        let url = format!("{}/v1{path}", self.base_url);
        debug!("node fetch {url}");
        let mut res = self.agent.get(url.as_str()).call()?;
        let status = res.status().as_u16();
        let body = res.body_mut().read_to_string()?;
        if !(200..300).contains(&status) {
            return Err(node_error(status, &body));
        }
        Ok(body)
    }

    fn ledger_info(&self) -> Result<LedgerInfo, FetchError> {
        let body = self.get("")?;
        let info: NodeLedgerInfo = serde_json::from_str(&body)?;
        Ok(info.into())
    }

    fn recent_transactions(&self, limit: u32) -> Result<Vec<Transaction>, FetchError> {
        let body = self.get(&format!("/transactions?limit={limit}"))?;
        let raw: Vec<Value> = serde_json::from_str(&body)?;
        Ok(map_node_batch(&raw))
    }
}

impl LedgerSource for NodeSource {
    fn fetch(&self, limit: u32) -> Result<FetchResponse, FetchError> {
        let ledger_info = self.ledger_info()?;
        let transactions = self.recent_transactions(limit)?;
        Ok(FetchResponse {
            transactions,
            ledger_info: Some(ledger_info),
            error: None,
        })
    }
}

/// node error bodies look like `{"message": "...", "error_code": "..."}`
fn node_error(status: u16, body: &str) -> FetchError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string));
    match message {
        Some(message) => FetchError::Api(message),
        None => FetchError::Transport(format!("node responded with HTTP {status}")),
    }
}

/// maps an ascending node batch into newest-first transactions, dropping
/// entries without a hash or version (pending ones have no version)
fn map_node_batch(raw: &[Value]) -> Vec<Transaction> {
    raw.iter().rev().filter_map(map_node_transaction).collect()
}

fn map_node_transaction(node: &Value) -> Option<Transaction> {
    let hash = node.get("hash").and_then(|v| v.as_str())?.to_string();
    let version = u64_field(node, "version")?;
    let tx_type = node
        .get("type")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let sender = node
        .get("sender")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let success = node
        .get("success")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    // node timestamps are microseconds
    let timestamp_millis = u64_field(node, "timestamp").unwrap_or(0) / 1000;
    let gas_used = u64_field(node, "gas_used").unwrap_or(0);
    let gas_unit_price = u64_field(node, "gas_unit_price").unwrap_or(0);
    let payload = node.get("payload");
    let function = payload
        .and_then(|p| p.get("function"))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let amount = if TRANSFER_FUNCTIONS.contains(&function.as_str()) {
        payload
            .and_then(|p| p.get("arguments"))
            .and_then(|args| args.get(1))
            .and_then(as_u64)
            .map(|octas| octas as f64 / OCTAS_PER_APT)
            .unwrap_or(0.0)
    } else {
        0.0
    };
    let sequence_number = u64_field(node, "sequence_number").unwrap_or(0);
    let proposer = node
        .get("proposer")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    Some(Transaction {
        hash,
        version,
        tx_type,
        sender,
        success,
        timestamp_millis: timestamp_millis as i64,
        gas_used,
        gas_cost: gas_used.saturating_mul(gas_unit_price) as f64 / OCTAS_PER_APT,
        amount,
        function,
        sequence_number,
        proposer,
    })
}

fn u64_field(node: &Value, key: &str) -> Option<u64> {
    node.get(key).and_then(as_u64)
}

fn as_u64(v: &Value) -> Option<u64> {
    v.as_u64()
        .or_else(|| v.as_str().and_then(|s| s.parse::<u64>().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node_batch() -> Vec<Value> {
        vec![
            json!({
                "type": "block_metadata_transaction",
                "version": "100",
                "hash": "0x100",
                "success": true,
                "gas_used": "0",
                "timestamp": "1760000000000000",
                "proposer": "0xval"
            }),
            json!({
                "type": "user_transaction",
                "version": "101",
                "hash": "0x101",
                "sender": "0xalice",
                "sequence_number": "7",
                "success": true,
                "gas_used": "10",
                "gas_unit_price": "100",
                "timestamp": "1760000000500000",
                "payload": {
                    "type": "entry_function_payload",
                    "function": "0x1::aptos_account::transfer",
                    "type_arguments": [],
                    "arguments": ["0xbob", "250000000"]
                }
            }),
            json!({
                "type": "pending_transaction",
                "hash": "0xpending"
            }),
        ]
    }

    #[test]
    fn batch_is_newest_first() {
        let txs = map_node_batch(&node_batch());
        let versions: Vec<u64> = txs.iter().map(|t| t.version).collect();
        assert_eq!(versions, vec![101, 100]);
    }

    #[test]
    fn user_transfer_fields() {
        let txs = map_node_batch(&node_batch());
        let transfer = &txs[0];
        assert_eq!(transfer.sender, "0xalice");
        assert_eq!(transfer.sequence_number, 7);
        assert_eq!(transfer.timestamp_millis, 1_760_000_000_500);
        assert_eq!(transfer.gas_used, 10);
        assert!((transfer.gas_cost - 0.00001).abs() < 1e-12);
        assert_eq!(transfer.amount, 2.5);
        assert_eq!(transfer.proposer, None);
    }

    #[test]
    fn block_metadata_keeps_proposer() {
        let txs = map_node_batch(&node_batch());
        let meta = &txs[1];
        assert_eq!(meta.tx_type, "block_metadata_transaction");
        assert_eq!(meta.proposer.as_deref(), Some("0xval"));
        assert_eq!(meta.amount, 0.0);
        assert_eq!(meta.function, "");
    }

    #[test]
    fn ledger_info_from_node() {
        let body = r#"{
            "chain_id": 1,
            "epoch": "11000",
            "ledger_version": "3046212021",
            "oldest_ledger_version": "0",
            "ledger_timestamp": "1760000000000000",
            "node_role": "full_node",
            "oldest_block_height": "0",
            "block_height": "410000000",
            "git_hash": "abc"
        }"#;
        let info: LedgerInfo = serde_json::from_str::<NodeLedgerInfo>(body).unwrap().into();
        assert_eq!(info.ledger_version, "3046212021");
        assert_eq!(info.block_height, "410000000");
        assert_eq!(info.chain_id, 1);
    }

    #[test]
    fn node_error_bodies() {
        let err = node_error(
            404,
            r#"{"message": "Ledger version not found", "error_code": "version_not_found"}"#,
        );
        assert_eq!(err, FetchError::Api("Ledger version not found".into()));
        let err = node_error(500, "");
        assert_eq!(
            err,
            FetchError::Transport("node responded with HTTP 500".into())
        );
    }
}

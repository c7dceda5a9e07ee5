use crate::tps::TpsWindow;
use common::{FetchError, FetchResponse, LedgerInfo, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const MAX_RETAINED_TRANSACTIONS: usize = 100;
pub const TOP_TYPES: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub tx_type: String,
    pub count: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub tps: f64,
    pub total_transactions: u64,
    pub latest_version: String,
    pub block_height: String,
    pub epoch: String,
    pub ledger_timestamp: String,
    pub top_types: Vec<TypeCount>,
}

/// what observers get to read after every completed cycle
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSnapshot {
    pub transactions: Vec<Transaction>,
    pub stats: AggregateStats,
    pub connected: bool,
    pub error: Option<String>,
}

/// everything a sampler accumulates between cycles. owned by exactly one
/// sampler; mutated only through `apply`.
#[derive(Clone, Debug, Default)]
pub struct LedgerState {
    transactions: Vec<Transaction>,
    last_seen_version: u64,
    stats: AggregateStats,
    connected: bool,
    error: Option<String>,
    tps: TpsWindow,
}

impl LedgerState {
    pub fn last_seen_version(&self) -> u64 {
        self.last_seen_version
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn stats(&self) -> &AggregateStats {
        &self.stats
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn tps_window(&self) -> &TpsWindow {
        &self.tps
    }

    pub fn snapshot(&self) -> LiveSnapshot {
        LiveSnapshot {
            transactions: self.transactions.clone(),
            stats: self.stats.clone(),
            connected: self.connected,
            error: self.error.clone(),
        }
    }

    /// folds one fetch outcome into the state and returns how many unseen
    /// transactions it brought. failures only touch the health fields; data
    /// from earlier cycles stays as it was.
    pub fn apply(&mut self, outcome: Result<FetchResponse, FetchError>, now_millis: i64) -> usize {
        let res = match outcome.and_then(FetchResponse::into_result) {
            Ok(res) => res,
            Err(err) => {
                self.connected = false;
                self.error = Some(err.to_string());
                return 0;
            }
        };
        self.connected = true;
        self.error = None;

        let fresh: Vec<Transaction> = res
            .transactions
            .iter()
            .filter(|tx| tx.version > self.last_seen_version)
            .cloned()
            .collect();
        let fresh_count = fresh.len();
        if let Some(newest) = fresh.first() {
            self.last_seen_version = newest.version;
            self.transactions = merge_transactions(fresh, &self.transactions);
        }

        let top_types = top_types(&res.transactions);
        if let Some(info) = res.ledger_info {
            self.update_tps(&info.ledger_version, now_millis);
            self.stats = aggregate_stats(&info, self.tps.tps(), top_types, &self.stats);
        }
        fresh_count
    }

    /// feeds a ledger version into the tps window
    pub fn update_tps(&mut self, current_version: &str, now_millis: i64) {
        self.tps.record(current_version, now_millis);
        self.stats.tps = self.tps.tps();
    }
}

fn aggregate_stats(
    info: &LedgerInfo,
    tps: f64,
    top_types: Vec<TypeCount>,
    previous: &AggregateStats,
) -> AggregateStats {
    AggregateStats {
        tps,
        total_transactions: info
            .ledger_version
            .trim()
            .parse::<u64>()
            .unwrap_or(previous.total_transactions),
        latest_version: info.ledger_version.clone(),
        block_height: info.block_height.clone(),
        epoch: info.epoch.clone(),
        ledger_timestamp: info.ledger_timestamp.clone(),
        top_types,
    }
}

/// merges `fresh` over `existing`, keyed by version with `fresh` winning,
/// and keeps the newest `MAX_RETAINED_TRANSACTIONS` in descending order
pub fn merge_transactions(fresh: Vec<Transaction>, existing: &[Transaction]) -> Vec<Transaction> {
    let mut by_version: BTreeMap<u64, Transaction> = existing
        .iter()
        .map(|tx| (tx.version, tx.clone()))
        .collect();
    for tx in fresh {
        by_version.insert(tx.version, tx);
    }
    by_version
        .into_values()
        .rev()
        .take(MAX_RETAINED_TRANSACTIONS)
        .collect()
}

/// the `TOP_TYPES` most frequent transaction types in `batch`. ties keep
/// the order in which the types first appeared.
pub fn top_types(batch: &[Transaction]) -> Vec<TypeCount> {
    let mut counts: Vec<TypeCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for tx in batch {
        match index.get(tx.tx_type.as_str()) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(tx.tx_type.as_str(), counts.len());
                counts.push(TypeCount {
                    tx_type: tx.tx_type.clone(),
                    count: 1,
                });
            }
        }
    }
    // stable sort, so equal counts stay in first-seen order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(TOP_TYPES);
    counts
}

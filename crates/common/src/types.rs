/// wire types shared by the data sources and the live sampler.
///
/// the indexer proxy ships most counters as decimal strings (u64 overflows
/// a js number), so numeric fields accept either a json number or a string.
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use std::{fmt::Display, str::FromStr};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    #[serde(deserialize_with = "number_or_string")]
    pub version: u64,
    #[serde(rename = "type")]
    pub tx_type: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub sender: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "number_or_string")]
    pub timestamp_millis: i64,
    #[serde(default, deserialize_with = "number_or_string")]
    pub gas_used: u64,
    #[serde(default, deserialize_with = "number_or_string")]
    pub gas_cost: f64,
    #[serde(default, deserialize_with = "number_or_string")]
    pub amount: f64,
    #[serde(default, deserialize_with = "nullable_string")]
    pub function: String,
    #[serde(default, deserialize_with = "number_or_string")]
    pub sequence_number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerInfo {
    pub ledger_version: String,
    pub block_height: String,
    pub chain_id: u16,
    pub epoch: String,
    pub ledger_timestamp: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FetchRequest {
    pub limit: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResponse {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ledger_info: Option<LedgerInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString<T> {
    Number(T),
    Text(String),
}

fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match NumberOrString::<T>::deserialize(deserializer)? {
        NumberOrString::Number(value) => Ok(value),
        NumberOrString::Text(text) => text.trim().parse::<T>().map_err(D::Error::custom),
    }
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

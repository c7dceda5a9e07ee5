use crate::config::Config;
use axum::{
    Json,
    extract::{Query, State},
};
use common::Transaction;
use live::{AggregateStats, LiveSnapshot, state::MAX_RETAINED_TRANSACTIONS};
use serde_json::{Value, json};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::watch;

#[derive(Clone)]
pub struct AppState {
    pub live: watch::Receiver<Arc<LiveSnapshot>>,
    pub config: Arc<Config>,
}

impl AppState {
    fn latest(&self) -> Arc<LiveSnapshot> {
        self.live.borrow().clone()
    }
}

pub async fn handle_route(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "running",
        "name": "tracktos-server",
        "version": env!("CARGO_PKG_VERSION"),
        "config": *state.config
    }))
}

pub async fn get_live_snapshot(State(state): State<AppState>) -> Json<LiveSnapshot> {
    Json((*state.latest()).clone())
}

pub async fn get_live_transactions(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Transaction>> {
    let limit = params
        .get("limit")
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(MAX_RETAINED_TRANSACTIONS);
    let snapshot = state.latest();
    Json(snapshot.transactions.iter().take(limit).cloned().collect())
}

pub async fn get_live_stats(State(state): State<AppState>) -> Json<AggregateStats> {
    Json(state.latest().stats.clone())
}

pub async fn get_live_health(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.latest();
    Json(json!({
        "connected": snapshot.connected,
        "error": snapshot.error
    }))
}

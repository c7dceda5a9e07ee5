use crate::config::Config;
use crate::routes::{
    AppState, get_live_health, get_live_snapshot, get_live_stats, get_live_transactions,
    handle_route,
};
use axum::{Router, routing::get};
use env_logger::Env;
use live::LiveLedgerSampler;
use log::{error, info};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

mod config;
mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let config = Config::load()?;
    info!(
        "live source: {:?} (proxy={}, node={})",
        config.source, config.proxy_url, config.node_url
    );

    let source = config.source.build(&config.proxy_url, &config.node_url);
    let mut sampler = LiveLedgerSampler::new(source)
        .with_poll_interval(config.poll_interval())
        .start();

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let port = config.port;
    let state = AppState {
        live: sampler.subscribe(),
        config: Arc::new(config),
    };
    let router = Router::new()
        .route("/", get(handle_route))
        // live ledger feed
        .route("/live/snapshot", get(get_live_snapshot))
        .route("/live/transactions", get(get_live_transactions))
        .route("/live/stats", get(get_live_stats))
        .route("/live/health", get(get_live_health))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;
    info!("Server running on PORT: {port}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    sampler.stop().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

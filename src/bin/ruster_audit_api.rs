//! Ruster Audit API Server
//!
//! REST API over the contract analysis pipeline
//!
//! Usage:
//!   cargo run --bin ruster_audit_api
//!
//! Environment:
//!   PORT / AUDIT_PORT   - Server port (default: 8080)
//!   AUDIT_HOST          - Server host (default: 0.0.0.0)
//!   AUDIT_TELEMETRY_DIR - Where stats are written on shutdown (default: ./telemetry)
//!   RUST_LOG            - Log level (default: info)

use ruster_audit::api::{create_router, start_cleanup_task, AppState};
use ruster_audit::{AppConfig, ContractAnalyzer, TelemetryCollector};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = AppConfig::from_env()?;
    let analyzer = ContractAnalyzer::from_config(&config)?;

    let telemetry = Arc::new(TelemetryCollector::new());
    let state = Arc::new(AppState::new(analyzer, config.cache_ttl, telemetry.clone()));

    start_cleanup_task(state.cache.clone());
    info!("🧹 Background cleanup task started");

    let app = create_router(state);

    let host = std::env::var("AUDIT_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("AUDIT_PORT"))
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("🚀 Ruster Audit API starting on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /v1/analyze - Full contract report");
    info!("  GET  /v1/stats   - Analysis statistics");
    info!("  GET  /v1/health  - Health check");
    info!("Press Ctrl+C for graceful shutdown");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("⚠️ Failed to listen for Ctrl+C: {}", e);
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("🛑 Shutdown signal received, exporting telemetry...");
    let stats = telemetry.get_stats();
    info!("{}", stats.summary_line());

    let dir = std::env::var("AUDIT_TELEMETRY_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./telemetry"));
    match telemetry.export_stats_json(&dir) {
        Ok(path) => info!("   ✅ Stats exported to: {}", path.display()),
        Err(e) => warn!("   ⚠️ Failed to export stats: {}", e),
    }

    info!("👋 Ruster Audit API shutdown complete");
    Ok(())
}

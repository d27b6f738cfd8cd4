//! API Request Handlers

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::types::*;
use crate::core::pipeline::ContractAnalyzer;
use crate::models::{AppError, ContractAnalysis, Network};
use crate::utils::cache::ReportCache;
use crate::utils::contract::is_address;
use crate::utils::telemetry::TelemetryCollector;

/// Shared application state
pub struct AppState {
    pub analyzer: ContractAnalyzer,
    pub cache: ReportCache,
    pub telemetry: Arc<TelemetryCollector>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(analyzer: ContractAnalyzer, cache_ttl: Duration, telemetry: Arc<TelemetryCollector>) -> Self {
        Self {
            analyzer,
            cache: ReportCache::new(cache_ttl),
            telemetry,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<()>>)>;

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

fn error_response(err: &AppError, start: Instant) -> (StatusCode, Json<ApiResponse<()>>) {
    let status =
        StatusCode::from_u16(err.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ApiResponse::error(ApiError::from(err), elapsed_ms(start))),
    )
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

// ============================================
// Stats
// ============================================

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();

    let data = StatsData {
        telemetry: state.telemetry.get_stats(),
        cache: state.cache.stats().into(),
        uptime_seconds: state.uptime_seconds(),
    };

    Json(ApiResponse::success(data, elapsed_ms(start)))
}

// ============================================
// Contract Analysis
// ============================================

pub async fn analyze_contract(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<ContractAnalysis> {
    let start = Instant::now();

    let Json(req) = payload
        .map_err(|rejection| error_response(&AppError::bad_request(rejection.body_text()), start))?;

    let network = match req.network.as_deref() {
        Some(name) => name
            .parse::<Network>()
            .map_err(|e| error_response(&e, start))?,
        None => Network::default(),
    };

    let address = req.address.trim();
    if !is_address(address) {
        return Err(error_response(&AppError::invalid_address(address), start));
    }

    if !req.refresh {
        if let Some(report) = state.cache.get(network, address) {
            return Ok(Json(ApiResponse::success(report, elapsed_ms(start))));
        }
    }

    match state.analyzer.analyze(address, network).await {
        Ok(report) => {
            let latency = start.elapsed().as_millis() as u64;
            state.telemetry.record_success(&report, latency);

            // Partial reports are not cached so a later request can complete them
            if report.missing_implementation() || report.security_analysis.is_none() {
                warn!("⚠️ Partial report for {} on {} not cached", address, network);
            } else {
                state.cache.set(&report);
            }

            info!("📤 Report for {} served in {}ms", address, latency);
            Ok(Json(ApiResponse::success(report, elapsed_ms(start))))
        }
        Err(e) => {
            state.telemetry.record_failure(start.elapsed().as_millis() as u64);
            Err(error_response(&e, start))
        }
    }
}

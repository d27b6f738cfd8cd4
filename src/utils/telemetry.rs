//! Telemetry Module for Ruster Audit
//!
//! Aggregate statistics about completed analyses: how many reports were
//! produced, how risky the analyzed contracts were and which threat types
//! the model reported. Used by `GET /v1/stats` and exported as JSON when
//! the API server shuts down.
//!
//! Privacy-first: no contract addresses are stored, only counters.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::{ContractAnalysis, OverallRisk, ThreatType};

/// Aggregated statistics for reporting
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelemetryStats {
    /// Reports produced (complete or partial)
    pub total_analyzed: u64,
    /// Analyses that ended in a fatal error
    pub total_failed: u64,
    /// Reports missing the implementation or security stage
    pub partial_reports: u64,
    pub proxies_detected: u64,
    pub erc20_tokens: u64,
    /// Reports per overall risk verdict
    pub reports_by_risk: HashMap<String, u64>,
    /// Threats reported per threat type
    pub threats_by_type: HashMap<String, u64>,
    /// Average pipeline latency over successes and failures (ms)
    pub avg_latency_ms: f64,
    pub period_start: u64,
    pub period_end: u64,
}

impl TelemetryStats {
    /// One-paragraph summary for logs
    pub fn summary_line(&self) -> String {
        format!(
            "📊 {} reports ({} partial, {} failed) | {} proxies | {} ERC-20 | avg {:.0}ms",
            self.total_analyzed,
            self.partial_reports,
            self.total_failed,
            self.proxies_detected,
            self.erc20_tokens,
            self.avg_latency_ms,
        )
    }
}

/// Lock-light collector; counters are atomics, keyed tallies sit behind RwLocks
pub struct TelemetryCollector {
    total_analyzed: AtomicU64,
    total_failed: AtomicU64,
    partial_reports: AtomicU64,
    proxies_detected: AtomicU64,
    erc20_tokens: AtomicU64,
    total_latency_ms: AtomicU64,
    risk_counts: RwLock<HashMap<OverallRisk, u64>>,
    threat_counts: RwLock<HashMap<ThreatType, u64>>,
    session_start: u64,
}

impl TelemetryCollector {
    pub fn new() -> Self {
        Self {
            total_analyzed: AtomicU64::new(0),
            total_failed: AtomicU64::new(0),
            partial_reports: AtomicU64::new(0),
            proxies_detected: AtomicU64::new(0),
            erc20_tokens: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            risk_counts: RwLock::new(HashMap::new()),
            threat_counts: RwLock::new(HashMap::new()),
            session_start: current_timestamp(),
        }
    }

    /// Record a produced report
    pub fn record_success(&self, report: &ContractAnalysis, latency_ms: u64) {
        self.total_analyzed.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);

        if report.missing_implementation() || report.security_analysis.is_none() {
            self.partial_reports.fetch_add(1, Ordering::Relaxed);
        }
        if report.is_proxy == Some(true) {
            self.proxies_detected.fetch_add(1, Ordering::Relaxed);
        }
        if report.is_erc20 == Some(true) {
            self.erc20_tokens.fetch_add(1, Ordering::Relaxed);
        }

        let Some(security) = &report.security_analysis else {
            return;
        };

        if let Ok(mut counts) = self.risk_counts.write() {
            *counts.entry(security.overall_risk).or_insert(0) += 1;
        }

        if let Ok(mut counts) = self.threat_counts.write() {
            for threat in &security.threats {
                *counts.entry(threat.kind).or_insert(0) += 1;
            }
        }
    }

    /// Record a fatal pipeline error
    pub fn record_failure(&self, latency_ms: u64) {
        self.total_failed.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> TelemetryStats {
        let total_analyzed = self.total_analyzed.load(Ordering::Relaxed);
        let total_failed = self.total_failed.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ms.load(Ordering::Relaxed);

        let runs = total_analyzed + total_failed;
        let avg_latency_ms = if runs > 0 {
            total_latency as f64 / runs as f64
        } else {
            0.0
        };

        let reports_by_risk = self
            .risk_counts
            .read()
            .map(|counts| {
                counts
                    .iter()
                    .map(|(k, v)| (k.as_str().to_string(), *v))
                    .collect()
            })
            .unwrap_or_default();

        let threats_by_type = self
            .threat_counts
            .read()
            .map(|counts| {
                counts
                    .iter()
                    .map(|(k, v)| (k.as_str().to_string(), *v))
                    .collect()
            })
            .unwrap_or_default();

        TelemetryStats {
            total_analyzed,
            total_failed,
            partial_reports: self.partial_reports.load(Ordering::Relaxed),
            proxies_detected: self.proxies_detected.load(Ordering::Relaxed),
            erc20_tokens: self.erc20_tokens.load(Ordering::Relaxed),
            reports_by_risk,
            threats_by_type,
            avg_latency_ms,
            period_start: self.session_start,
            period_end: current_timestamp(),
        }
    }

    /// Write current stats to `<dir>/stats_<unix time>.json`
    pub fn export_stats_json(&self, dir: &Path) -> Result<PathBuf, std::io::Error> {
        fs::create_dir_all(dir)?;

        let stats = self.get_stats();
        let path = dir.join(format!("stats_{}.json", current_timestamp()));

        let json = serde_json::to_string_pretty(&stats)?;
        fs::write(&path, json)?;

        Ok(path)
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

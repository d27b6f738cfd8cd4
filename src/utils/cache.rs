//! In-Memory Report Cache
//!
//! Thread-safe cache for finished contract reports, backed by DashMap.
//! A report costs several explorer calls and two or three model calls,
//! so repeated lookups of the same contract are served from here.
//!
//! Keys are `<network>:<lowercase address>`; the same address on two
//! networks is two different contracts.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::models::{ContractAnalysis, Network};
use crate::utils::constants::DEFAULT_CACHE_TTL_SECS;
use crate::utils::contract::normalize_address;

/// Cached report with its insertion time
#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub report: ContractAnalysis,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }

    /// Seconds left before expiry
    pub fn remaining_ttl(&self) -> u64 {
        self.ttl.saturating_sub(self.created_at.elapsed()).as_secs()
    }
}

#[derive(Clone)]
pub struct ReportCache {
    store: Arc<DashMap<String, CacheEntry>>,
    ttl: Duration,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl Default for ReportCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_CACHE_TTL_SECS))
    }
}

impl ReportCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            ttl,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    #[inline]
    fn key(network: Network, address: &str) -> String {
        format!("{}:{}", network.as_str(), normalize_address(address))
    }

    /// Report for the contract, if cached and not expired
    pub fn get(&self, network: Network, address: &str) -> Option<ContractAnalysis> {
        let key = Self::key(network, address);

        let Some(entry) = self.store.get(&key) else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("📭 CACHE MISS: {}", key);
            return None;
        };

        if entry.is_expired() {
            // Release the read guard before removing
            drop(entry);
            self.store.remove(&key);
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("📭 CACHE MISS (expired): {}", key);
            return None;
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        info!("✅ CACHE HIT: {} (TTL: {}s remaining)", key, entry.remaining_ttl());
        Some(entry.report.clone())
    }

    pub fn set(&self, report: &ContractAnalysis) {
        let key = Self::key(report.network, &report.address);
        let entry = CacheEntry {
            report: report.clone(),
            created_at: Instant::now(),
            ttl: self.ttl,
        };

        self.store.insert(key.clone(), entry);
        info!("💾 CACHE SET: {} (TTL: {}s)", key, self.ttl.as_secs());
    }

    pub fn invalidate(&self, network: Network, address: &str) {
        let key = Self::key(network, address);
        if self.store.remove(&key).is_some() {
            debug!("🗑️ CACHE INVALIDATE: {}", key);
        }
    }

    /// Drop expired entries, returns how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let before = self.store.len();
        self.store.retain(|_, entry| !entry.is_expired());
        let removed = before.saturating_sub(self.store.len());
        if removed > 0 {
            info!("🧹 CACHE CLEANUP: {} expired entries removed", removed);
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            entries: self.store.len(),
            hits,
            misses,
            hit_rate,
            ttl_secs: self.ttl.as_secs(),
        }
    }

    pub fn clear(&self) {
        self.store.clear();
        info!("🗑️ CACHE CLEARED");
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub ttl_secs: u64,
}

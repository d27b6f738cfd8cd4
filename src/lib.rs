//! Ruster Audit Library
//!
//! AI-assisted smart contract analysis for Ethereum and Base:
//! - Verified source and ABI from the Etherscan v2 explorer
//! - Plain-language summary, risks and function descriptions
//! - Threat classification (honeypot, rugpull, fake token, ...) with a 0-100 score
//! - Proxy detection with implementation analysis
//! - Resilient JSON recovery from free-form model replies

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::pipeline::{ContractAnalyzer, SingleContractAnalysis};
pub use models::{
    AppConfig, AppError, AppResult, ContractAnalysis, ErrorCode, Network, OverallRisk,
    SecurityAnalysis,
};
pub use providers::{AnthropicClient, ExplorerClient};
pub use utils::cache::{CacheStats, ReportCache};
pub use utils::json_extract::extract_json;
pub use utils::telemetry::{TelemetryCollector, TelemetryStats};

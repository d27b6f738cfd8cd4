//! Explorer Client Module - Etherscan v2 Integration
//!
//! One endpoint serves every network; `chainid` selects Ethereum (1) or
//! Base (8453). Each network still needs its own API key.
//!
//! 1. Verified source code, ABI and recent transactions
//! 2. Explorer error messages mapped to error codes
//! 3. Exponential backoff with jitter when rate limited (1s→2s→4s)
//! 4. User-Agent header, gzip, API key never logged

use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::{AppError, AppResult, ErrorCode, ExplorerConfig, Network};
use crate::utils::constants::{
    EXPLORER_BASE_RETRY_MS, EXPLORER_MAX_RETRIES, EXPLORER_MAX_RETRY_MS, RETRY_JITTER_PERCENT,
    USER_AGENT as USER_AGENT_CONST,
};

/// Message the explorer sends with status "0" for an address without history
const NO_TRANSACTIONS: &str = "No transactions found";

/// Raw explorer envelope; `result` is an error string when `status != "1"`
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceCodeResponse {
    pub status: String,
    pub message: String,
    pub result: Vec<SourceCodeEntry>,
}

/// One `getsourcecode` record. Unverified contracts come back with an
/// empty `SourceCode`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SourceCodeEntry {
    pub source_code: String,
    #[serde(rename = "ABI")]
    pub abi: String,
    pub contract_name: String,
    pub compiler_version: String,
    pub optimization_used: String,
    pub runs: String,
    pub constructor_arguments: String,
    #[serde(rename = "EVMVersion")]
    pub evm_version: String,
    pub library: String,
    pub license_type: String,
    pub proxy: String,
    pub implementation: String,
    pub swarm_source: String,
}

impl SourceCodeEntry {
    pub fn is_proxy(&self) -> bool {
        self.proxy == "1"
    }

    pub fn is_optimized(&self) -> bool {
        self.optimization_used == "1"
    }
}

/// One `txlist` record, every field a decimal or hex string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTransaction {
    pub block_number: String,
    pub time_stamp: String,
    pub hash: String,
    pub from: String,
    pub to: String,
    pub value: String,
    pub gas: String,
    pub gas_price: String,
    pub is_error: String,
    #[serde(rename = "txreceipt_status")]
    pub txreceipt_status: String,
    pub input: String,
    pub contract_address: String,
    pub gas_used: String,
    pub method_id: String,
    pub function_name: String,
}

/// Etherscan v2 client, shared across requests
#[derive(Clone)]
pub struct ExplorerClient {
    config: ExplorerConfig,
    client: reqwest::Client,
    retry_base: Duration,
}

impl ExplorerClient {
    pub fn new(config: ExplorerConfig) -> AppResult<Self> {
        let client = Self::build_client(config.timeout)?;
        info!("🔍 Explorer client ready: {}", config.base_url);

        Ok(Self {
            config,
            client,
            retry_base: Duration::from_millis(EXPLORER_BASE_RETRY_MS),
        })
    }

    /// Override the first backoff step (later steps double it)
    pub fn with_retry_base(mut self, retry_base: Duration) -> Self {
        self.retry_base = retry_base;
        self
    }

    fn build_client(timeout: Duration) -> AppResult<reqwest::Client> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_CONST));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));

        reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {}", e)))
    }

    /// `module=contract&action=getsourcecode`
    pub async fn get_contract_source_code(
        &self,
        address: &str,
        network: Network,
    ) -> AppResult<SourceCodeResponse> {
        let query = [
            ("module", "contract"),
            ("action", "getsourcecode"),
            ("address", address),
        ];
        let envelope = self.request(network, &query, "contract source code").await?;

        Ok(SourceCodeResponse {
            result: decode_result(envelope.result, "contract source code")?,
            status: envelope.status,
            message: envelope.message,
        })
    }

    /// `module=contract&action=getabi`, the ABI as a JSON string
    pub async fn get_contract_abi(&self, address: &str, network: Network) -> AppResult<String> {
        let query = [
            ("module", "contract"),
            ("action", "getabi"),
            ("address", address),
        ];
        let envelope = self.request(network, &query, "contract ABI").await?;
        decode_result(envelope.result, "contract ABI")
    }

    /// Most recent `limit` transactions, newest first
    pub async fn get_contract_transactions(
        &self,
        address: &str,
        network: Network,
        limit: u32,
    ) -> AppResult<Vec<RawTransaction>> {
        let offset = limit.to_string();
        let query = [
            ("module", "account"),
            ("action", "txlist"),
            ("address", address),
            ("startblock", "0"),
            ("endblock", "99999999"),
            ("page", "1"),
            ("offset", offset.as_str()),
            ("sort", "desc"),
        ];

        match self.request(network, &query, "transactions").await {
            Ok(envelope) => decode_result(envelope.result, "transactions"),
            Err(e) if e.message.contains(NO_TRANSACTIONS) => {
                debug!("📭 No transactions for {} on {}", address, network);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Send with backoff. Only rate-limit failures are retried.
    async fn request(
        &self,
        network: Network,
        query: &[(&str, &str)],
        what: &str,
    ) -> AppResult<Envelope> {
        let api_key = self
            .config
            .api_key(network)
            .ok_or_else(|| AppError::missing_api_key(network.as_str()))?;

        let mut attempt = 0;
        loop {
            match self.execute(network, api_key.expose(), query, what).await {
                Err(e) if e.code == ErrorCode::ExplorerRateLimited && attempt + 1 < EXPLORER_MAX_RETRIES => {
                    let delay = backoff_delay(self.retry_base, attempt);
                    warn!(
                        "⏳ Explorer rate limited on {}, retry {}/{} in {}ms",
                        network,
                        attempt + 1,
                        EXPLORER_MAX_RETRIES - 1,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn execute(
        &self,
        network: Network,
        api_key: &str,
        query: &[(&str, &str)],
        what: &str,
    ) -> AppResult<Envelope> {
        let chain_id = network.chain_id().to_string();
        debug!("🌐 Explorer {:?} on {} (chainid {})", query, network, chain_id);

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[("chainid", chain_id.as_str())])
            .query(query)
            .query(&[("apikey", api_key)])
            .send()
            .await
            // The request URL carries the key
            .map_err(|e| explorer_transport_error(e.without_url(), what))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::new(
                ErrorCode::ExplorerRateLimited,
                format!("Rate limit exceeded for {} API (HTTP 429)", network),
            ));
        }
        if !status.is_success() {
            return Err(AppError::new(
                ErrorCode::ExplorerHttpError,
                format!("Failed to fetch {}: {}", what, status),
            ));
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| explorer_transport_error(e.without_url(), what))?;

        if envelope.status != "1" {
            let detail = envelope.result.as_str().unwrap_or_default();
            return Err(map_explorer_error(&envelope.message, detail, network));
        }

        Ok(envelope)
    }
}

fn explorer_transport_error(err: reqwest::Error, what: &str) -> AppError {
    if err.is_timeout() {
        AppError::new(
            ErrorCode::ExternalTimeout,
            format!("Timed out fetching {}", what),
        )
    } else {
        AppError::with_source(
            ErrorCode::ExplorerRequestFailed,
            format!("Failed to fetch {}: {}", what, err),
            err,
        )
    }
}

fn decode_result<T: DeserializeOwned>(result: serde_json::Value, what: &str) -> AppResult<T> {
    serde_json::from_value(result).map_err(|e| {
        AppError::with_source(
            ErrorCode::ExplorerApiError,
            format!("Unexpected {} payload from explorer", what),
            e,
        )
    })
}

/// Map an explorer `status != "1"` reply to an error.
///
/// `detail` is the `result` string. A bare `NOTOK` says little, so the
/// detail decides between a bad key, a rate limit and any other failure.
pub fn map_explorer_error(message: &str, detail: &str, network: Network) -> AppError {
    let message = if message.is_empty() { "Unknown error" } else { message };
    let env_var = network.api_key_env();

    if message == "NOTOK" {
        if detail.to_lowercase().contains("rate limit") {
            return AppError::new(
                ErrorCode::ExplorerRateLimited,
                format!("Rate limit exceeded for {} API: {}", network, detail),
            );
        }
        if detail.is_empty() || detail.contains("Invalid API Key") {
            return AppError::new(
                ErrorCode::ExplorerInvalidApiKey,
                format!(
                    "Etherscan API error: Invalid API key or rate limit exceeded. Please check your {}.",
                    env_var
                ),
            );
        }
        return AppError::new(
            ErrorCode::ExplorerApiError,
            format!("Etherscan API error: {}", detail),
        );
    }

    if message.contains("Invalid API Key") {
        return AppError::new(
            ErrorCode::ExplorerInvalidApiKey,
            format!("Invalid API key for {}. Please verify your {}.", network, env_var),
        );
    }

    if message.to_lowercase().contains("rate limit") {
        return AppError::new(
            ErrorCode::ExplorerRateLimited,
            format!(
                "Rate limit exceeded for {} API. Please wait a moment and try again.",
                network
            ),
        );
    }

    AppError::new(
        ErrorCode::ExplorerApiError,
        format!("Etherscan API error: {}", message),
    )
}

/// Exponential backoff with ±20% jitter, capped
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let base_ms = base.as_millis() as u64;
    let capped = base_ms
        .saturating_mul(2_u64.saturating_pow(attempt))
        .min(EXPLORER_MAX_RETRY_MS);

    let jitter_range = (capped * RETRY_JITTER_PERCENT) / 100;
    let jitter: i64 = if jitter_range > 0 {
        rand::thread_rng().gen_range(-(jitter_range as i64)..=(jitter_range as i64))
    } else {
        0
    };

    Duration::from_millis((capped as i64 + jitter).max(0) as u64)
}

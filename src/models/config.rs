//! Configuration module for Ruster Audit
//!
//! Everything comes from environment variables; defaults live in
//! utils/constants.rs. API keys are never logged.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use super::errors::{AppError, AppResult};
use super::types::Network;
use crate::utils::constants::{
    DEFAULT_ANTHROPIC_URL, DEFAULT_CACHE_TTL_SECS, DEFAULT_EXPLORER_URL,
    DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_STEP_DELAY_MS,
    DEFAULT_TX_LIMIT,
};

/// Secret string that never shows up in Debug output
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***HIDDEN***")
    }
}

/// Explorer (Etherscan v2) settings
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    pub base_url: String,
    pub etherscan_key: ApiKey,
    pub basescan_key: Option<ApiKey>,
    pub timeout: Duration,
}

impl ExplorerConfig {
    /// Key for the network, if one is configured
    pub fn api_key(&self, network: Network) -> Option<&ApiKey> {
        match network {
            Network::Ethereum => Some(&self.etherscan_key),
            Network::Base => self.basescan_key.as_ref(),
        }
        .filter(|k| !k.expose().is_empty())
    }
}

/// Language model settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: ApiKey,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// Pipeline pacing
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Pause between dependent remote calls; zero disables it
    pub step_delay: Duration,
    /// Recent transactions per report
    pub tx_limit: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            step_delay: Duration::from_millis(DEFAULT_STEP_DELAY_MS),
            tx_limit: DEFAULT_TX_LIMIT,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub explorer: ExplorerConfig,
    pub llm: LlmConfig,
    pub pipeline: PipelineConfig,
    pub cache_ttl: Duration,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let anthropic_key = var("ANTHROPIC_API_KEY").ok_or_else(|| AppError::missing_env("ANTHROPIC_API_KEY"))?;
        let etherscan_key = var("ETHERSCAN_API_KEY").ok_or_else(|| AppError::missing_env("ETHERSCAN_API_KEY"))?;
        let basescan_key = var("BASESCAN_API_KEY");

        let timeout_secs: u64 = parse_or("AUDIT_HTTP_TIMEOUT_SECS", var("AUDIT_HTTP_TIMEOUT_SECS"), DEFAULT_HTTP_TIMEOUT_SECS)?;
        let timeout = Duration::from_secs(timeout_secs);

        let config = Self {
            explorer: ExplorerConfig {
                base_url: var("AUDIT_EXPLORER_URL").unwrap_or_else(|| DEFAULT_EXPLORER_URL.to_string()),
                etherscan_key: ApiKey::new(etherscan_key),
                basescan_key: basescan_key.map(ApiKey::new),
                timeout,
            },
            llm: LlmConfig {
                base_url: var("AUDIT_ANTHROPIC_URL").unwrap_or_else(|| DEFAULT_ANTHROPIC_URL.to_string()),
                api_key: ApiKey::new(anthropic_key),
                model: var("AUDIT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                max_tokens: parse_or("AUDIT_MAX_TOKENS", var("AUDIT_MAX_TOKENS"), DEFAULT_MAX_TOKENS)?,
                timeout,
            },
            pipeline: PipelineConfig {
                step_delay: Duration::from_millis(parse_or(
                    "AUDIT_STEP_DELAY_MS",
                    var("AUDIT_STEP_DELAY_MS"),
                    DEFAULT_STEP_DELAY_MS,
                )?),
                tx_limit: parse_or("AUDIT_TX_LIMIT", var("AUDIT_TX_LIMIT"), DEFAULT_TX_LIMIT)?,
            },
            cache_ttl: Duration::from_secs(parse_or(
                "AUDIT_CACHE_TTL_SECS",
                var("AUDIT_CACHE_TTL_SECS"),
                DEFAULT_CACHE_TTL_SECS,
            )?),
        };

        info!("🔑 ANTHROPIC_API_KEY configured (key hidden)");
        info!("🔑 ETHERSCAN_API_KEY configured (key hidden)");
        if config.explorer.basescan_key.is_some() {
            info!("🔑 BASESCAN_API_KEY configured (key hidden)");
        }

        Ok(config)
    }
}

fn parse_or<T: FromStr>(name: &str, raw: Option<String>, default: T) -> AppResult<T> {
    match raw {
        Some(value) => value
            .parse()
            .map_err(|_| AppError::invalid_config(name, &value)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::ErrorCode;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("ETHERSCAN_API_KEY", "ES"),
        ]))
        .unwrap();

        assert_eq!(config.explorer.base_url, DEFAULT_EXPLORER_URL);
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.llm.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.pipeline.step_delay, Duration::from_millis(300));
        assert_eq!(config.pipeline.tx_limit, 10);
        assert!(config.explorer.api_key(Network::Ethereum).is_some());
        assert!(config.explorer.api_key(Network::Base).is_none());
    }

    #[test]
    fn test_missing_required_key() {
        let err = AppConfig::from_lookup(lookup(&[("ETHERSCAN_API_KEY", "ES")])).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigMissingEnv);
        assert!(err.message.contains("ANTHROPIC_API_KEY"));

        // Blank counts as missing
        let err = AppConfig::from_lookup(lookup(&[
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("ETHERSCAN_API_KEY", "  "),
        ]))
        .unwrap_err();
        assert!(err.message.contains("ETHERSCAN_API_KEY"));
    }

    #[test]
    fn test_invalid_number() {
        let err = AppConfig::from_lookup(lookup(&[
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("ETHERSCAN_API_KEY", "ES"),
            ("AUDIT_STEP_DELAY_MS", "fast"),
        ]))
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigInvalidValue);
    }

    #[test]
    fn test_overrides_and_masking() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ANTHROPIC_API_KEY", "sk-ant-secret"),
            ("ETHERSCAN_API_KEY", "ES"),
            ("BASESCAN_API_KEY", "BS"),
            ("AUDIT_STEP_DELAY_MS", "0"),
            ("AUDIT_TX_LIMIT", "25"),
        ]))
        .unwrap();

        assert_eq!(config.pipeline.step_delay, Duration::ZERO);
        assert_eq!(config.pipeline.tx_limit, 25);
        assert_eq!(config.explorer.api_key(Network::Base).unwrap().expose(), "BS");
        assert!(!format!("{:?}", config).contains("sk-ant-secret"));
    }
}

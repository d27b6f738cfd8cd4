//! Constants Module - Single Source of Truth
//!
//! Every URL, chain id and tuning knob default used across the crate is
//! defined here. No hardcoded values in other modules.

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "RusterAudit";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for outbound HTTP requests
pub const USER_AGENT: &str = concat!("RusterAudit/", env!("CARGO_PKG_VERSION"));

// ============================================
// CHAIN IDS
// ============================================

/// Ethereum Mainnet
pub const CHAIN_ID_ETHEREUM: u64 = 1;
/// Base
pub const CHAIN_ID_BASE: u64 = 8453;

// ============================================
// EXPLORER (Etherscan v2 - one endpoint, chainid selects the network)
// ============================================

pub const DEFAULT_EXPLORER_URL: &str = "https://api.etherscan.io/v2/api";

/// Recent transactions fetched per report
pub const DEFAULT_TX_LIMIT: u32 = 10;

/// Pause between dependent explorer/model calls (ms)
pub const DEFAULT_STEP_DELAY_MS: u64 = 300;

/// Explorer backoff: 1s → 2s → 4s, capped at 8s, ±20% jitter
pub const EXPLORER_BASE_RETRY_MS: u64 = 1000;
pub const EXPLORER_MAX_RETRY_MS: u64 = 8000;
pub const EXPLORER_MAX_RETRIES: u32 = 3;
pub const RETRY_JITTER_PERCENT: u64 = 20;

// ============================================
// LANGUAGE MODEL (Anthropic Messages API)
// ============================================

pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const DEFAULT_MAX_TOKENS: u32 = 16384;

// ============================================
// TIMEOUTS & CACHE
// ============================================

/// Model replies for large contracts take a while
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 120;

/// Report cache TTL (seconds)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 600;

// ============================================
// DIAGNOSTICS
// ============================================

/// Characters of an unparseable candidate kept in logs
pub const JSON_PREVIEW_CHARS: usize = 500;

/// Characters of a raw model reply kept in logs
pub const REPLY_PREVIEW_CHARS: usize = 1000;

// ============================================
// TOKEN DETECTION
// ============================================

/// Functions an ABI must expose to be treated as ERC-20
pub const ERC20_REQUIRED_FUNCTIONS: [&str; 6] = [
    "name",
    "symbol",
    "decimals",
    "totalSupply",
    "balanceOf",
    "transfer",
];

/// Official addresses of commonly impersonated tokens (lowercase, Ethereum)
pub const KNOWN_TOKENS: [(&str, &str); 4] = [
    ("LINK", "0x514910771af9ca656af840dff83e8264ecf986ca"),
    ("USDT", "0xdac17f958d2ee523a2206206994597c13d831ec7"),
    ("USDC", "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
    ("WETH", "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"),
];

/// Look up the official address of a well-known symbol
pub fn known_token_address(symbol: &str) -> Option<&'static str> {
    KNOWN_TOKENS
        .iter()
        .find(|(s, _)| s.eq_ignore_ascii_case(symbol))
        .map(|(_, addr)| *addr)
}

//! Contract helpers: explorer source formats, ABI inspection, address
//! checks and wei formatting.

use alloy_primitives::{Address, U256};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use crate::utils::constants::ERC20_REQUIRED_FUNCTIONS;

const WEI_PER_ETHER: u64 = 1_000_000_000_000_000_000;

/// Solidity standard-JSON input, as returned for multi-file verifications
#[derive(Debug, Deserialize)]
struct StandardJsonInput {
    #[serde(default)]
    sources: BTreeMap<String, SourceFile>,
}

#[derive(Debug, Deserialize)]
struct SourceFile {
    #[serde(default)]
    content: String,
}

/// Turn the explorer `SourceCode` field into plain Solidity.
///
/// - `{{ ... }}`: standard-JSON wrapped in an extra pair of braces
/// - `{ ... }`: standard-JSON
/// - anything else: a single flattened file, returned as is
///
/// Multi-file sources are joined with a blank line, in path order.
/// Unparseable JSON, or JSON without sources, falls back to the raw text.
pub fn flatten_source_code(raw: &str) -> String {
    let json = if raw.starts_with("{{") {
        raw.get(1..raw.len() - 1)
    } else if raw.starts_with('{') {
        Some(raw)
    } else {
        None
    };

    let Some(json) = json else {
        return raw.to_string();
    };

    match serde_json::from_str::<StandardJsonInput>(json) {
        Ok(input) if !input.sources.is_empty() => input
            .sources
            .into_values()
            .map(|file| file.content)
            .collect::<Vec<_>>()
            .join("\n\n"),
        _ => raw.to_string(),
    }
}

/// Parse an ABI string; anything that is not a JSON array yields an empty ABI
pub fn parse_abi(raw: &str) -> Vec<Value> {
    match serde_json::from_str::<Vec<Value>>(raw) {
        Ok(abi) => abi,
        Err(err) => {
            warn!(error = %err, "Failed to parse ABI");
            Vec::new()
        }
    }
}

/// ERC-20 check: every required function is declared in the ABI
pub fn is_erc20_token(abi: &[Value]) -> bool {
    let function_names: Vec<&str> = abi
        .iter()
        .filter(|item| item.get("type").and_then(Value::as_str) == Some("function"))
        .filter_map(|item| item.get("name").and_then(Value::as_str))
        .collect();

    ERC20_REQUIRED_FUNCTIONS
        .iter()
        .all(|required| function_names.contains(required))
}

/// `0x` + 40 hex digits. All-lowercase passes as is; any upper-case letter
/// requires a valid EIP-55 checksum.
pub fn is_address(s: &str) -> bool {
    let Some(hex) = s.strip_prefix("0x") else {
        return false;
    };
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }
    if hex == hex.to_lowercase() {
        return true;
    }
    Address::parse_checksummed(s, None).is_ok()
}

/// Addresses are case-insensitive; compare and key them in lowercase
#[inline]
pub fn normalize_address(address: &str) -> String {
    address.to_lowercase()
}

/// Wei (decimal string) to ether, without trailing zeros.
/// "1500000000000000000" -> "1.5". Unparseable input formats as "0".
pub fn format_ether(wei: &str) -> String {
    let wei: U256 = wei.trim().parse().unwrap_or(U256::ZERO);
    let unit = U256::from(WEI_PER_ETHER);

    let whole = wei / unit;
    let frac = u64::try_from(wei % unit).unwrap_or(0);

    if frac == 0 {
        return whole.to_string();
    }

    let frac = format!("{:018}", frac);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

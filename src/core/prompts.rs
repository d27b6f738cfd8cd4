//! Prompt builders for the two analysis stages.
//!
//! Each prompt embeds the JSON shape that `core::analyzer` deserializes.

use serde_json::Value;

use crate::utils::constants::KNOWN_TOKENS;

const INSIGHT_SHAPE: &str = r#"{
  "summary": "Simple explanation of what the contract does",
  "risks": [
    {
      "level": "high" | "medium" | "low",
      "title": "Risk title",
      "description": "Detailed description",
      "category": "security" | "centralization" | "scam" | "other"
    }
  ],
  "functions": [
    {
      "name": "functionName",
      "signature": "functionName(uint256,address)",
      "stateMutability": "view" | "pure" | "nonpayable" | "payable",
      "description": "What this function does in simple terms",
      "inputs": [{"name": "param", "type": "uint256"}],
      "outputs": [{"name": "result", "type": "bool"}]
    }
  ]
}"#;

const SECURITY_SHAPE: &str = r#"{
  "overallRisk": "safe" | "low" | "medium" | "high" | "critical",
  "riskScore": 0-100,
  "threats": [
    {
      "type": "honeypot" | "scam" | "rugpull" | "malicious" | "backdoor" | "fake-token" | "soft-rug",
      "severity": "low" | "medium" | "high" | "critical",
      "confidence": 0-100,
      "description": "What the threat is, with references to the code",
      "indicators": ["function or variable name", "code pattern"]
    }
  ],
  "recommendation": "Overall recommendation for users"
}"#;

fn pretty_abi(abi: &[Value]) -> String {
    serde_json::to_string_pretty(abi).unwrap_or_else(|_| "[]".to_string())
}

/// General analysis: summary, risks, function descriptions
pub fn contract_analysis_prompt(source: &str, name: &str, abi: &[Value]) -> String {
    format!(
        r#"You are a smart contract security expert. Analyze the following Solidity contract and provide:

1. A clear summary of what the contract does (2-3 sentences for non-technical users)
2. A list of potential risks and security concerns
3. Descriptions of the main functions

Contract Name: {name}

Source Code:
{source}

ABI:
{abi}

Respond in JSON with this structure:
{shape}

Focus on dangerous functions (selfdestruct, delegatecall), access control, reentrancy,
owner privileges, honeypot and rugpull patterns, and gas issues.
Be concise. Put high-severity issues first."#,
        name = name,
        source = source,
        abi = pretty_abi(abi),
        shape = INSIGHT_SHAPE,
    )
}

/// Threat classification with a 0-100 risk score
pub fn security_analysis_prompt(
    source: &str,
    name: &str,
    abi: &[Value],
    is_verified: bool,
    address: Option<&str>,
) -> String {
    let address = address
        .map(str::to_lowercase)
        .unwrap_or_else(|| "Not provided".to_string());
    let verification = if is_verified {
        "VERIFIED on the block explorer (source matches deployed bytecode)"
    } else {
        "NOT VERIFIED (higher risk)"
    };
    let official_tokens: String = KNOWN_TOKENS
        .iter()
        .map(|(symbol, addr)| format!("  * {}: {}\n", symbol, addr))
        .collect();

    format!(
        r#"You are an expert in detecting malicious smart contracts and token scams. Analyze the following Solidity contract for security threats.

Contract Name: {name}
Contract Address: {address}
Verification Status: {verification}

Source Code:
{source}

ABI:
{abi}

Verified contracts are a positive signal; unverified ones deserve more suspicion.

Threat types:
1. honeypot: buying works but selling is blocked (blacklists, hidden transfer conditions, sell-only reverts)
2. scam: fraudulent token where the exact mechanism is unclear
3. rugpull: the team can pull liquidity or dump supply (uncapped owner mint, withdraw-all functions)
4. malicious / backdoor: hidden owner controls (pause, blacklist, fee setters, arbitrary mint)
5. fake-token: copies the name or symbol of a well-known token at a different address.
   Compare addresses in lowercase. Official addresses:
{official_tokens}   Only flag as fake when the lowercase addresses differ.
6. soft-rug: abusive but not exploitative (taxes above 10%, unlimited emissions, hidden unlocks)
If none apply, the contract is safe.

Respond in JSON:
{shape}

Guidelines:
- Only report threats you can back with code evidence, and name that code in indicators
- confidence: 100 definite, 70-90 strong, 50-69 moderate, 30-49 weak, below 30 unlikely
- riskScore: 0-20 safe, 21-40 low, 41-60 medium, 61-80 high, 81-100 critical
- No threats: empty threats array, "safe", score 0-20
- Be less suspicious of unmodified OpenZeppelin or other well-known implementations"#,
        name = name,
        address = address,
        verification = verification,
        source = source,
        abi = pretty_abi(abi),
        official_tokens = official_tokens,
        shape = SECURITY_SHAPE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_analysis_prompt_embeds_inputs() {
        let abi = vec![json!({"type": "function", "name": "owner"})];
        let prompt = contract_analysis_prompt("contract Vault {}", "Vault", &abi);

        assert!(prompt.contains("Contract Name: Vault"));
        assert!(prompt.contains("contract Vault {}"));
        assert!(prompt.contains("\"name\": \"owner\""));
        assert!(prompt.contains("\"stateMutability\""));
    }

    #[test]
    fn test_security_prompt_lowercases_address() {
        let prompt = security_analysis_prompt(
            "contract T {}",
            "T",
            &[],
            true,
            Some("0xDAC17F958D2EE523A2206206994597C13D831EC7"),
        );

        assert!(prompt.contains("Contract Address: 0xdac17f958d2ee523a2206206994597c13d831ec7"));
        assert!(prompt.contains("VERIFIED on the block explorer"));
        for (symbol, addr) in KNOWN_TOKENS {
            assert!(prompt.contains(&format!("{}: {}", symbol, addr)));
        }
        assert!(prompt.contains("\"riskScore\""));
    }

    #[test]
    fn test_security_prompt_without_address() {
        let prompt = security_analysis_prompt("", "X", &[], false, None);
        assert!(prompt.contains("Contract Address: Not provided"));
        assert!(prompt.contains("NOT VERIFIED"));
    }
}

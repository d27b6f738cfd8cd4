//! AI analysis stages
//!
//! Prompt → model → resilient JSON extraction → validation. Each stage
//! wraps its failure with a stage prefix and keeps the error code.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, info};

use crate::core::prompts::{contract_analysis_prompt, security_analysis_prompt};
use crate::models::{AppError, AppResult, ContractInsight, ErrorCode, SecurityAnalysis};
use crate::providers::AnthropicClient;
use crate::utils::constants::REPLY_PREVIEW_CHARS;
use crate::utils::json_extract::{extract_json, preview};

const INSIGHT_CONTEXT: &str = "Failed to analyze contract with AI";
const SECURITY_CONTEXT: &str = "Failed to analyze contract security with AI";

/// Summary, risks and function descriptions for one contract
pub async fn analyze_contract(
    llm: &AnthropicClient,
    source: &str,
    name: &str,
    abi: &[Value],
) -> AppResult<ContractInsight> {
    let prompt = contract_analysis_prompt(source, name, abi);

    let result = llm
        .complete(&prompt)
        .await
        .and_then(|reply| parse_insight(&reply));

    match result {
        Ok(insight) => {
            info!(
                "🧠 {}: {} risks, {} functions described",
                name,
                insight.risks.len(),
                insight.functions.len()
            );
            Ok(insight)
        }
        Err(e) => {
            error!("❌ Contract analysis failed for {}: {}", name, e);
            Err(e.context(INSIGHT_CONTEXT))
        }
    }
}

/// Threat classification and risk score for one contract
pub async fn analyze_contract_security(
    llm: &AnthropicClient,
    source: &str,
    name: &str,
    abi: &[Value],
    is_verified: bool,
    address: Option<&str>,
) -> AppResult<SecurityAnalysis> {
    let prompt = security_analysis_prompt(source, name, abi, is_verified, address);

    let result = llm
        .complete(&prompt)
        .await
        .and_then(|reply| parse_security(&reply));

    match result {
        Ok(security) => {
            info!(
                "{} {}: {} (score {}/100, {} threats)",
                security.overall_risk.emoji(),
                name,
                security.overall_risk.as_str(),
                security.score(),
                security.threats.len()
            );
            Ok(security)
        }
        Err(e) => {
            error!("❌ Security analysis failed for {}: {}", name, e);
            Err(e.context(SECURITY_CONTEXT))
        }
    }
}

/// Field name and the JSON type it must carry
type FieldCheck = (&'static str, fn(&Value) -> bool);

const INSIGHT_FIELDS: [FieldCheck; 3] = [
    ("summary", Value::is_string),
    ("risks", Value::is_array),
    ("functions", Value::is_array),
];

const SECURITY_FIELDS: [FieldCheck; 3] = [
    ("overallRisk", Value::is_string),
    ("riskScore", Value::is_number),
    ("threats", Value::is_array),
];

/// Required fields present with the right JSON type, then typed decode
fn decode_checked<T: DeserializeOwned>(value: Value, fields: &[FieldCheck], what: &str) -> AppResult<T> {
    let invalid = |detail: String| {
        AppError::new(
            ErrorCode::AiInvalidStructure,
            format!("Invalid {} structure from model: {}", what, detail),
        )
    };

    for (name, has_type) in fields {
        match value.get(*name) {
            Some(field) if has_type(field) => {}
            Some(_) => return Err(invalid(format!("{} has the wrong type", name))),
            None => return Err(invalid(format!("missing {}", name))),
        }
    }

    serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
}

/// Extract and validate a general analysis from a model reply
pub fn parse_insight(reply: &str) -> AppResult<ContractInsight> {
    let value: Value = extract_json(reply).ok_or_else(|| {
        error!(reply = %preview(reply, REPLY_PREVIEW_CHARS), "Could not parse JSON from model response");
        AppError::new(ErrorCode::AiJsonNotFound, "Could not parse JSON from model response")
    })?;

    let insight: ContractInsight = decode_checked(value, &INSIGHT_FIELDS, "analysis")?;

    if insight.summary.trim().is_empty() {
        return Err(AppError::new(
            ErrorCode::AiInvalidStructure,
            "Invalid analysis structure from model: empty summary",
        ));
    }

    Ok(insight)
}

/// Extract a security analysis from a model reply; scores are clamped to 0..=100
pub fn parse_security(reply: &str) -> AppResult<SecurityAnalysis> {
    let value: Value = extract_json(reply).ok_or_else(|| {
        error!(
            reply = %preview(reply, REPLY_PREVIEW_CHARS),
            "Could not parse JSON from model security analysis response"
        );
        AppError::new(
            ErrorCode::AiJsonNotFound,
            "Could not parse JSON from model security analysis response",
        )
    })?;

    let mut security: SecurityAnalysis = decode_checked(value, &SECURITY_FIELDS, "security analysis")?;

    security.risk_score = f64::from(security.score());
    for threat in &mut security.threats {
        threat.confidence = threat.confidence.clamp(0.0, 100.0);
    }

    Ok(security)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OverallRisk, RiskCategory, RiskLevel, ThreatType};

    #[test]
    fn test_parse_insight_from_fenced_reply() {
        let reply = r#"Here is my analysis:
```json
{
  "summary": "A fixed-supply ERC-20 token.",
  "risks": [{"level": "medium", "title": "Owner can pause", "description": "pause()", "category": "centralization"}],
  "functions": [{"name": "transfer", "signature": "transfer(address,uint256)", "stateMutability": "nonpayable", "description": "Moves tokens", "inputs": [{"name": "to", "type": "address"}], "outputs": [{"name": "", "type": "bool"}]}]
}
```
Let me know if you need more detail."#;

        let insight = parse_insight(reply).unwrap();
        assert_eq!(insight.summary, "A fixed-supply ERC-20 token.");
        assert_eq!(insight.risks[0].level, RiskLevel::Medium);
        assert_eq!(insight.risks[0].category, RiskCategory::Centralization);
        assert_eq!(insight.functions[0].inputs[0].kind, "address");
    }

    #[test]
    fn test_parse_insight_failures() {
        let err = parse_insight("I could not analyze this contract.").unwrap_err();
        assert_eq!(err.code, ErrorCode::AiJsonNotFound);

        let err = parse_insight(r#"{"summary": "  ", "risks": [], "functions": []}"#).unwrap_err();
        assert_eq!(err.code, ErrorCode::AiInvalidStructure);

        // Well-formed JSON with the wrong shape is a structure error
        let err = parse_insight(r#"{"summary": "x", "risks": []}"#).unwrap_err();
        assert_eq!(err.code, ErrorCode::AiInvalidStructure);
        assert!(err.message.contains("missing functions"));

        let err = parse_insight(r#"{"summary": "x", "risks": {}, "functions": []}"#).unwrap_err();
        assert_eq!(err.code, ErrorCode::AiInvalidStructure);
        assert!(err.message.contains("risks has the wrong type"));

        let err = parse_insight(r#"{"summary": "x", "risks": [{"level": "high"}], "functions": []}"#)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AiInvalidStructure);
    }

    #[test]
    fn test_parse_security_clamps_scores() {
        let reply = r#"{"overallRisk": "critical", "riskScore": 140, "threats": [
            {"type": "honeypot", "severity": "critical", "confidence": 250, "description": "sell blocked", "indicators": ["_transfer"]}
        ], "recommendation": "Avoid"}"#;

        let security = parse_security(reply).unwrap();
        assert_eq!(security.overall_risk, OverallRisk::Critical);
        assert_eq!(security.risk_score, 100.0);
        assert_eq!(security.threats[0].kind, ThreatType::Honeypot);
        assert_eq!(security.threats[0].confidence, 100.0);

        let security = parse_security(
            r#"Result: {"overallRisk": "safe", "riskScore": -3, "threats": [], "recommendation": ""}"#,
        )
        .unwrap();
        assert_eq!(security.score(), 0);
        assert_eq!(security.risk_score, 0.0);
    }

    #[test]
    fn test_parse_security_accepts_any_confidence_number() {
        let reply = r#"{"overallRisk": "high", "riskScore": 72.4, "threats": [
            {"type": "rugpull", "severity": "high", "confidence": 300, "description": "owner mints", "indicators": []},
            {"type": "backdoor", "severity": "medium", "confidence": 87.5, "description": "hidden admin", "indicators": []},
            {"type": "scam", "severity": "low", "confidence": -4, "description": "odd naming", "indicators": []}
        ], "recommendation": "Avoid"}"#;

        let security = parse_security(reply).unwrap();
        assert_eq!(security.score(), 72);
        assert_eq!(security.threats.len(), 3);
        assert_eq!(security.threats[0].confidence, 100.0);
        assert_eq!(security.threats[1].confidence, 87.5);
        assert_eq!(security.threats[2].confidence, 0.0);
    }

    #[test]
    fn test_parse_security_shape_errors() {
        let err = parse_security(r#"{"overallRisk": "low", "threats": []}"#).unwrap_err();
        assert_eq!(err.code, ErrorCode::AiInvalidStructure);
        assert!(err.message.contains("missing riskScore"));

        let err = parse_security(r#"{"overallRisk": "low", "riskScore": "10", "threats": []}"#).unwrap_err();
        assert_eq!(err.code, ErrorCode::AiInvalidStructure);
        assert!(err.message.contains("riskScore has the wrong type"));

        let err = parse_security(r#"{"riskScore": 10, "threats": []}"#).unwrap_err();
        assert_eq!(err.code, ErrorCode::AiInvalidStructure);
        assert!(err.message.starts_with("Invalid security analysis structure from model"));
    }

    #[test]
    fn test_parse_security_not_found() {
        let err = parse_security("```json\n{\"overallRisk\": \"low\"\n```").unwrap_err();
        assert_eq!(err.code, ErrorCode::AiJsonNotFound);
        assert!(err.message.contains("security analysis"));
    }

    #[test]
    fn test_stage_context_prefix() {
        let err = parse_insight("nothing").unwrap_err().context(INSIGHT_CONTEXT);
        assert_eq!(
            err.message,
            "Failed to analyze contract with AI: Could not parse JSON from model response"
        );
        assert_eq!(err.code, ErrorCode::AiJsonNotFound);
    }
}

//! Type definitions for contract analysis reports
//!
//! Wire format is camelCase so reports read the same whether they come
//! from the CLI or the HTTP API. Enums that the language model fills in
//! are parsed leniently: an unexpected label maps to the closest variant
//! instead of failing the whole report.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::AppError;
use crate::utils::constants::{CHAIN_ID_BASE, CHAIN_ID_ETHEREUM};

// ============================================
// Network
// ============================================

/// Supported explorer networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Ethereum,
    Base,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Ethereum => CHAIN_ID_ETHEREUM,
            Network::Base => CHAIN_ID_BASE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Ethereum => "ethereum",
            Network::Base => "base",
        }
    }

    /// Environment variable holding the explorer key for this network
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Network::Ethereum => "ETHERSCAN_API_KEY",
            Network::Base => "BASESCAN_API_KEY",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ethereum" | "eth" | "mainnet" => Ok(Network::Ethereum),
            "base" => Ok(Network::Base),
            other => Err(AppError::unsupported_network(other)),
        }
    }
}

// ============================================
// General analysis (summary / risks / functions)
// ============================================

/// Severity of a single finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::High => "high",
            RiskLevel::Medium => "medium",
            RiskLevel::Low => "low",
        }
    }
}

impl From<String> for RiskLevel {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "high" | "critical" => RiskLevel::High,
            "medium" | "moderate" => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }
}

impl From<RiskLevel> for String {
    fn from(level: RiskLevel) -> Self {
        level.as_str().to_string()
    }
}

/// What kind of concern a finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskCategory {
    Security,
    Centralization,
    Scam,
    Other,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Security => "security",
            RiskCategory::Centralization => "centralization",
            RiskCategory::Scam => "scam",
            RiskCategory::Other => "other",
        }
    }
}

impl From<String> for RiskCategory {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "security" => RiskCategory::Security,
            "centralization" => RiskCategory::Centralization,
            "scam" => RiskCategory::Scam,
            _ => RiskCategory::Other,
        }
    }
}

impl From<RiskCategory> for String {
    fn from(category: RiskCategory) -> Self {
        category.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub level: RiskLevel,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: RiskCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractFunction {
    pub name: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub state_mutability: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub inputs: Vec<FunctionParam>,
    #[serde(default)]
    pub outputs: Vec<FunctionParam>,
}

/// Model output for the general analysis stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractInsight {
    pub summary: String,
    pub risks: Vec<Risk>,
    pub functions: Vec<ContractFunction>,
}

// ============================================
// Security analysis
// ============================================

/// Overall verdict, banded by risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OverallRisk {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl OverallRisk {
    /// 0-20 safe, 21-40 low, 41-60 medium, 61-80 high, 81-100 critical
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=20 => OverallRisk::Safe,
            21..=40 => OverallRisk::Low,
            41..=60 => OverallRisk::Medium,
            61..=80 => OverallRisk::High,
            _ => OverallRisk::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OverallRisk::Safe => "safe",
            OverallRisk::Low => "low",
            OverallRisk::Medium => "medium",
            OverallRisk::High => "high",
            OverallRisk::Critical => "critical",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            OverallRisk::Safe => "✅",
            OverallRisk::Low => "🟡",
            OverallRisk::Medium => "🟠",
            OverallRisk::High => "🔴",
            OverallRisk::Critical => "💀",
        }
    }

    pub const ALL: [OverallRisk; 5] = [
        OverallRisk::Safe,
        OverallRisk::Low,
        OverallRisk::Medium,
        OverallRisk::High,
        OverallRisk::Critical,
    ];
}

impl From<String> for OverallRisk {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "safe" | "none" => OverallRisk::Safe,
            "low" => OverallRisk::Low,
            "high" => OverallRisk::High,
            "critical" => OverallRisk::Critical,
            _ => OverallRisk::Medium,
        }
    }
}

impl From<OverallRisk> for String {
    fn from(risk: OverallRisk) -> Self {
        risk.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ThreatType {
    Honeypot,
    Scam,
    Rugpull,
    Malicious,
    Backdoor,
    FakeToken,
    SoftRug,
}

impl ThreatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatType::Honeypot => "honeypot",
            ThreatType::Scam => "scam",
            ThreatType::Rugpull => "rugpull",
            ThreatType::Malicious => "malicious",
            ThreatType::Backdoor => "backdoor",
            ThreatType::FakeToken => "fake-token",
            ThreatType::SoftRug => "soft-rug",
        }
    }
}

impl From<String> for ThreatType {
    fn from(s: String) -> Self {
        match s.to_lowercase().replace('_', "-").as_str() {
            "honeypot" => ThreatType::Honeypot,
            "rugpull" | "rug-pull" => ThreatType::Rugpull,
            "malicious" => ThreatType::Malicious,
            "backdoor" => ThreatType::Backdoor,
            "fake-token" | "faketoken" | "impersonation" => ThreatType::FakeToken,
            "soft-rug" | "softrug" => ThreatType::SoftRug,
            // Unclear mechanism is reported as a generic scam
            _ => ThreatType::Scam,
        }
    }
}

impl From<ThreatType> for String {
    fn from(kind: ThreatType) -> Self {
        kind.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ThreatSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatSeverity::Low => "low",
            ThreatSeverity::Medium => "medium",
            ThreatSeverity::High => "high",
            ThreatSeverity::Critical => "critical",
        }
    }
}

impl From<String> for ThreatSeverity {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "critical" => ThreatSeverity::Critical,
            "high" => ThreatSeverity::High,
            "medium" | "moderate" => ThreatSeverity::Medium,
            _ => ThreatSeverity::Low,
        }
    }
}

impl From<ThreatSeverity> for String {
    fn from(severity: ThreatSeverity) -> Self {
        severity.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityThreat {
    #[serde(rename = "type")]
    pub kind: ThreatType,
    pub severity: ThreatSeverity,
    /// 0-100, clamped by the analyzer
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub indicators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAnalysis {
    pub overall_risk: OverallRisk,
    /// 0 (safe) to 100 (critical). Models occasionally overshoot, so the
    /// raw number is accepted as f64 and clamped by the analyzer.
    pub risk_score: f64,
    pub threats: Vec<SecurityThreat>,
    #[serde(default)]
    pub recommendation: String,
}

impl SecurityAnalysis {
    /// Score as an integer in 0..=100
    pub fn score(&self) -> u8 {
        self.risk_score.round().clamp(0.0, 100.0) as u8
    }
}

// ============================================
// Transactions
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    pub from: String,
    pub to: String,
    /// Value in ether, decimal string
    pub value: String,
    /// Unix timestamp (seconds)
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub status: TxStatus,
}

// ============================================
// Reports
// ============================================

/// Analysis of the implementation behind a proxy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractImplementation {
    pub address: String,
    pub summary: String,
    pub risks: Vec<Risk>,
    pub functions: Vec<ContractFunction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
}

/// Full report returned to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAnalysis {
    pub address: String,
    pub network: Network,
    pub summary: String,
    pub risks: Vec<Risk>,
    pub functions: Vec<ContractFunction>,
    pub recent_transactions: Vec<Transaction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_proxy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implementation: Option<ContractImplementation>,
    #[serde(rename = "isERC20", skip_serializing_if = "Option::is_none")]
    pub is_erc20: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_analysis: Option<SecurityAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
}

impl ContractAnalysis {
    /// Proxy whose implementation stage did not complete
    pub fn missing_implementation(&self) -> bool {
        self.is_proxy == Some(true) && self.implementation.is_none()
    }

    /// Pretty print the report for terminals
    pub fn summary_text(&self) -> String {
        let mut output = format!(
            "\n📄 {} on {}\n",
            self.contract_name.as_deref().unwrap_or("Unknown contract"),
            self.network
        );
        output.push_str(&format!("   Address: {}\n", self.address));
        if let Some(compiler) = &self.compiler {
            output.push_str(&format!("   Compiler: {}\n", compiler));
        }
        output.push_str(&format!(
            "   Proxy: {} | ERC-20: {} | Verified: {}\n",
            yes_no(self.is_proxy),
            yes_no(self.is_erc20),
            yes_no(self.is_verified)
        ));
        output.push_str(&format!("\n   {}\n", self.summary));

        if let Some(security) = &self.security_analysis {
            let band = OverallRisk::from_score(security.score());
            output.push_str(&format!(
                "\n{} Security: {} (score {}/100, band {})\n",
                security.overall_risk.emoji(),
                security.overall_risk.as_str().to_uppercase(),
                security.score(),
                band.as_str()
            ));
            for threat in &security.threats {
                output.push_str(&format!(
                    "     - [{}] {} ({:.0}% confidence): {}\n",
                    threat.severity.as_str(),
                    threat.kind.as_str(),
                    threat.confidence,
                    threat.description
                ));
            }
            if !security.recommendation.is_empty() {
                output.push_str(&format!("   Recommendation: {}\n", security.recommendation));
            }
        }

        if !self.risks.is_empty() {
            output.push_str("\n   Risks:\n");
            for risk in &self.risks {
                output.push_str(&format!(
                    "     - [{}/{}] {}\n",
                    risk.level.as_str(),
                    risk.category.as_str(),
                    risk.title
                ));
            }
        }

        if let Some(implementation) = &self.implementation {
            output.push_str(&format!(
                "\n   Implementation {} ({} risks)\n     {}\n",
                implementation.address,
                implementation.risks.len(),
                implementation.summary
            ));
        } else if self.missing_implementation() {
            output.push_str("\n   Implementation analysis unavailable\n");
        }

        output.push_str(&format!(
            "\n   Recent transactions: {}\n",
            self.recent_transactions.len()
        ));
        for tx in &self.recent_transactions {
            output.push_str(&format!(
                "     - {} {} ETH {} {}\n",
                tx.hash,
                tx.value,
                tx.method.as_deref().unwrap_or("-"),
                match tx.status {
                    TxStatus::Success => "✅",
                    TxStatus::Failed => "❌",
                }
            ));
        }

        output
    }
}

fn yes_no(flag: Option<bool>) -> &'static str {
    match flag {
        Some(true) => "yes",
        Some(false) => "no",
        None => "?",
    }
}

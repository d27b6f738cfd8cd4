//! Local stand-ins for the Etherscan v2 API and the Anthropic Messages API

#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use ruster_audit::models::{ApiKey, AppConfig, ExplorerConfig, LlmConfig, PipelineConfig};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

pub const EXPLORER_KEY: &str = "test-explorer-key";
pub const ANTHROPIC_KEY: &str = "test-anthropic-key";

pub const TOKEN: &str = "0x1111111111111111111111111111111111111111";
pub const PROXY: &str = "0x2222222222222222222222222222222222222222";
pub const IMPLEMENTATION: &str = "0x3333333333333333333333333333333333333333";
pub const UNVERIFIED: &str = "0x4444444444444444444444444444444444444444";
pub const QUIET: &str = "0x5555555555555555555555555555555555555555";

// ============================================
// Explorer
// ============================================

#[derive(Clone, Default)]
pub struct MockContract {
    pub name: String,
    pub source_code: String,
    pub abi: Value,
    pub implementation: Option<String>,
    pub transactions: Vec<Value>,
}

#[derive(Clone, Default)]
pub struct MockExplorer {
    contracts: Arc<HashMap<String, MockContract>>,
    pub calls: Arc<AtomicUsize>,
    /// Number of upcoming requests answered with a rate-limit error
    pub rate_limited: Arc<AtomicUsize>,
}

impl MockExplorer {
    pub fn new(contracts: Vec<(&str, MockContract)>) -> Self {
        Self {
            contracts: Arc::new(
                contracts
                    .into_iter()
                    .map(|(addr, c)| (addr.to_lowercase(), c))
                    .collect(),
            ),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

async fn explorer_handler(
    State(mock): State<MockExplorer>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    mock.calls.fetch_add(1, Ordering::SeqCst);

    let limited = mock
        .rate_limited
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if limited {
        return Json(json!({"status": "0", "message": "NOTOK", "result": "Max rate limit reached"}));
    }

    if query.get("apikey").map(String::as_str) != Some(EXPLORER_KEY) {
        return Json(json!({"status": "0", "message": "NOTOK", "result": "Invalid API Key"}));
    }

    let address = query.get("address").cloned().unwrap_or_default().to_lowercase();
    let contract = mock.contracts.get(&address);

    match (query.get("action").map(String::as_str), contract) {
        (Some("getsourcecode"), Some(c)) => Json(json!({
            "status": "1",
            "message": "OK",
            "result": [{
                "SourceCode": c.source_code,
                "ABI": c.abi.to_string(),
                "ContractName": c.name,
                "CompilerVersion": "v0.8.20+commit.a1b79de6",
                "OptimizationUsed": "1",
                "Runs": "200",
                "Proxy": if c.implementation.is_some() { "1" } else { "0" },
                "Implementation": c.implementation.clone().unwrap_or_default(),
            }]
        })),
        (Some("getsourcecode"), None) => Json(json!({
            "status": "1",
            "message": "OK",
            "result": [{
                "SourceCode": "",
                "ABI": "Contract source code not verified",
                "ContractName": "",
                "Proxy": "0",
                "Implementation": "",
            }]
        })),
        (Some("getabi"), Some(c)) => Json(json!({
            "status": "1",
            "message": "OK",
            "result": c.abi.to_string(),
        })),
        (Some("getabi"), None) => Json(json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Contract source code not verified",
        })),
        (Some("txlist"), Some(c)) if !c.transactions.is_empty() => {
            let limit: usize = query.get("offset").and_then(|o| o.parse().ok()).unwrap_or(10);
            let txs: Vec<Value> = c.transactions.iter().take(limit).cloned().collect();
            Json(json!({"status": "1", "message": "OK", "result": txs}))
        }
        (Some("txlist"), _) => Json(json!({
            "status": "0",
            "message": "No transactions found",
            "result": [],
        })),
        _ => Json(json!({"status": "0", "message": "NOTOK", "result": "Error! Missing Or invalid Action name"})),
    }
}

// ============================================
// Language model
// ============================================

/// Reply chosen when every needle appears in the prompt
#[derive(Clone)]
pub struct ModelRule {
    pub needles: Vec<String>,
    pub status: u16,
    pub text: String,
}

impl ModelRule {
    pub fn reply(needles: &[&str], text: impl Into<String>) -> Self {
        Self {
            needles: needles.iter().map(|n| n.to_string()).collect(),
            status: 200,
            text: text.into(),
        }
    }

    pub fn failure(needles: &[&str], status: u16) -> Self {
        Self {
            needles: needles.iter().map(|n| n.to_string()).collect(),
            status,
            text: r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#.to_string(),
        }
    }
}

#[derive(Clone, Default)]
pub struct MockModel {
    rules: Arc<Vec<ModelRule>>,
    pub calls: Arc<AtomicUsize>,
}

impl MockModel {
    pub fn new(rules: Vec<ModelRule>) -> Self {
        Self {
            rules: Arc::new(rules),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

async fn messages_handler(
    State(mock): State<MockModel>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    mock.calls.fetch_add(1, Ordering::SeqCst);

    let key = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    let version = headers.get("anthropic-version").and_then(|v| v.to_str().ok());
    if key != Some(ANTHROPIC_KEY) || version != Some("2023-06-01") {
        return (StatusCode::UNAUTHORIZED, "invalid x-api-key".to_string());
    }

    let prompt = body["messages"][0]["content"].as_str().unwrap_or_default();
    let rule = mock
        .rules
        .iter()
        .find(|rule| rule.needles.iter().all(|n| prompt.contains(n.as_str())));

    match rule {
        Some(rule) if rule.status == 200 => (
            StatusCode::OK,
            json!({
                "id": "msg_test",
                "type": "message",
                "role": "assistant",
                "content": [{"type": "text", "text": rule.text}],
                "stop_reason": "end_turn",
            })
            .to_string(),
        ),
        Some(rule) => (
            StatusCode::from_u16(rule.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            rule.text.clone(),
        ),
        None => (
            StatusCode::OK,
            json!({
                "content": [{"type": "text", "text": "I'm not sure what to say about this contract."}],
                "stop_reason": "end_turn",
            })
            .to_string(),
        ),
    }
}

// ============================================
// Servers & config
// ============================================

pub async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Start both mocks; returns (explorer url, model base url)
pub async fn start_mocks(explorer: MockExplorer, model: MockModel) -> (String, String) {
    let explorer_url = spawn(
        Router::new()
            .route("/v2/api", get(explorer_handler))
            .with_state(explorer),
    )
    .await;
    let model_url = spawn(
        Router::new()
            .route("/v1/messages", post(messages_handler))
            .with_state(model),
    )
    .await;

    (format!("{}/v2/api", explorer_url), format!("{}/v1", model_url))
}

pub fn test_config(explorer_url: &str, model_url: &str) -> AppConfig {
    AppConfig {
        explorer: ExplorerConfig {
            base_url: explorer_url.to_string(),
            etherscan_key: ApiKey::new(EXPLORER_KEY),
            basescan_key: None,
            timeout: Duration::from_secs(5),
        },
        llm: LlmConfig {
            base_url: model_url.to_string(),
            api_key: ApiKey::new(ANTHROPIC_KEY),
            model: "test-model".to_string(),
            max_tokens: 1024,
            timeout: Duration::from_secs(5),
        },
        pipeline: PipelineConfig {
            step_delay: Duration::ZERO,
            tx_limit: 10,
        },
        cache_ttl: Duration::from_secs(600),
    }
}

// ============================================
// Fixtures
// ============================================

pub fn erc20_abi() -> Value {
    json!([
        {"type": "function", "name": "name", "stateMutability": "view", "inputs": [], "outputs": [{"name": "", "type": "string"}]},
        {"type": "function", "name": "symbol", "stateMutability": "view", "inputs": [], "outputs": [{"name": "", "type": "string"}]},
        {"type": "function", "name": "decimals", "stateMutability": "view", "inputs": [], "outputs": [{"name": "", "type": "uint8"}]},
        {"type": "function", "name": "totalSupply", "stateMutability": "view", "inputs": [], "outputs": [{"name": "", "type": "uint256"}]},
        {"type": "function", "name": "balanceOf", "stateMutability": "view", "inputs": [{"name": "account", "type": "address"}], "outputs": [{"name": "", "type": "uint256"}]},
        {"type": "function", "name": "transfer", "stateMutability": "nonpayable", "inputs": [{"name": "to", "type": "address"}, {"name": "amount", "type": "uint256"}], "outputs": [{"name": "", "type": "bool"}]},
        {"type": "event", "name": "Transfer", "inputs": []}
    ])
}

pub fn proxy_abi() -> Value {
    json!([
        {"type": "function", "name": "upgradeTo", "stateMutability": "nonpayable", "inputs": [{"name": "newImplementation", "type": "address"}], "outputs": []},
        {"type": "function", "name": "admin", "stateMutability": "view", "inputs": [], "outputs": [{"name": "", "type": "address"}]}
    ])
}

pub fn transactions() -> Vec<Value> {
    vec![
        json!({
            "blockNumber": "19000001",
            "timeStamp": "1700000100",
            "hash": "0xaaa1",
            "from": "0x9999999999999999999999999999999999999999",
            "to": TOKEN,
            "value": "0",
            "isError": "0",
            "functionName": "transfer(address to, uint256 amount)"
        }),
        json!({
            "blockNumber": "19000000",
            "timeStamp": "1700000000",
            "hash": "0xaaa0",
            "from": "0x8888888888888888888888888888888888888888",
            "to": TOKEN,
            "value": "1500000000000000000",
            "isError": "1",
            "functionName": ""
        }),
    ]
}

/// Standard-JSON input wrapped in double braces, as the explorer returns it
pub fn multi_file_source(files: &[(&str, &str)]) -> String {
    let sources: serde_json::Map<String, Value> = files
        .iter()
        .map(|(path, content)| (path.to_string(), json!({ "content": content })))
        .collect();
    format!("{{{}}}", json!({"language": "Solidity", "sources": sources}))
}

pub fn insight_reply(summary: &str) -> String {
    format!(
        "Here is my analysis of the contract.\n\n```json\n{}\n```\n\nLet me know if you need anything else.",
        json!({
            "summary": summary,
            "risks": [{
                "level": "medium",
                "title": "Owner privileges",
                "description": "The owner can change fees.",
                "category": "centralization"
            }],
            "functions": [{
                "name": "transfer",
                "signature": "transfer(address,uint256)",
                "stateMutability": "nonpayable",
                "description": "Moves tokens to another account.",
                "inputs": [{"name": "to", "type": "address"}, {"name": "amount", "type": "uint256"}],
                "outputs": [{"name": "", "type": "bool"}]
            }]
        })
    )
}

pub fn security_reply(risk: &str, score: u8) -> String {
    format!(
        "Assessment complete: {} Overall the code looks standard.",
        json!({
            "overallRisk": risk,
            "riskScore": score,
            "threats": [{
                "type": "soft-rug",
                "severity": "low",
                "confidence": 40,
                "description": "Owner can raise fees up to 5%",
                "indicators": ["setFee"]
            }],
            "recommendation": "Use with caution"
        })
    )
}

/// Needle that only appears in the security prompt
pub const SECURITY_PROMPT: &str = "Contract Address:";

pub fn name_needle(name: &str) -> String {
    format!("Contract Name: {}\n", name)
}

//! Contract analysis pipeline
//!
//! Explorer data and model analyses combined into one report:
//!
//! 1. source lookup (proxy detection)
//! 2. main contract analysis (fatal on failure)
//! 3. ERC-20 detection from the ABI
//! 4. recent transactions (fatal on failure)
//! 5. implementation analysis for proxies (tolerated on failure)
//! 6. security analysis (tolerated on failure)
//!
//! Dependent remote calls are spaced by `PipelineConfig::step_delay` to
//! stay under explorer rate limits.

use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::core::analyzer::{analyze_contract, analyze_contract_security};
use crate::models::{
    AppConfig, AppError, AppResult, ContractAnalysis, ContractFunction, ContractImplementation,
    Network, PipelineConfig, Risk, Transaction, TxStatus,
};
use crate::providers::{AnthropicClient, ExplorerClient, RawTransaction, SourceCodeEntry};
use crate::utils::contract::{flatten_source_code, format_ether, is_address, is_erc20_token, parse_abi};

const PIPELINE_CONTEXT: &str = "Failed to analyze contract";

/// Everything learned about one contract (proxy or implementation)
#[derive(Debug, Clone)]
pub struct SingleContractAnalysis {
    pub source_code: String,
    pub contract_name: String,
    pub compiler: String,
    pub optimization: bool,
    pub summary: String,
    pub risks: Vec<Risk>,
    pub functions: Vec<ContractFunction>,
    pub abi: Vec<Value>,
    pub is_verified: bool,
}

impl SingleContractAnalysis {
    fn into_implementation(self, address: &str) -> ContractImplementation {
        ContractImplementation {
            address: address.to_string(),
            summary: self.summary,
            risks: self.risks,
            functions: self.functions,
            source_code: Some(self.source_code),
            contract_name: Some(self.contract_name),
            compiler: Some(self.compiler),
            optimization: Some(self.optimization),
            is_verified: Some(self.is_verified),
        }
    }
}

/// Pipeline over shared explorer and model clients
#[derive(Clone)]
pub struct ContractAnalyzer {
    explorer: Arc<ExplorerClient>,
    llm: Arc<AnthropicClient>,
    config: PipelineConfig,
}

impl ContractAnalyzer {
    pub fn new(explorer: Arc<ExplorerClient>, llm: Arc<AnthropicClient>, config: PipelineConfig) -> Self {
        Self {
            explorer,
            llm,
            config,
        }
    }

    /// Build both clients from configuration
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let explorer = Arc::new(ExplorerClient::new(config.explorer.clone())?);
        let llm = Arc::new(AnthropicClient::new(config.llm.clone())?);
        Ok(Self::new(explorer, llm, config.pipeline.clone()))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    async fn pause(&self) {
        if !self.config.step_delay.is_zero() {
            tokio::time::sleep(self.config.step_delay).await;
        }
    }

    /// Fetch, flatten and analyze a single verified contract
    pub async fn analyze_single_contract(
        &self,
        address: &str,
        network: Network,
    ) -> AppResult<SingleContractAnalysis> {
        let response = self.explorer.get_contract_source_code(address, network).await?;
        let entry = response
            .result
            .into_iter()
            .next()
            .ok_or_else(AppError::contract_not_found)?;

        self.analyze_entry(address, network, entry).await
    }

    async fn analyze_entry(
        &self,
        address: &str,
        network: Network,
        entry: SourceCodeEntry,
    ) -> AppResult<SingleContractAnalysis> {
        if entry.source_code.trim().is_empty() {
            return Err(AppError::contract_not_verified());
        }

        let source_code = flatten_source_code(&entry.source_code);
        debug!(
            "📄 {} source: {} chars (raw {} chars)",
            entry.contract_name,
            source_code.len(),
            entry.source_code.len()
        );

        self.pause().await;

        let abi_raw = self.explorer.get_contract_abi(address, network).await?;
        let abi = parse_abi(&abi_raw);

        let insight = analyze_contract(&self.llm, &source_code, &entry.contract_name, &abi).await?;

        Ok(SingleContractAnalysis {
            source_code,
            optimization: entry.is_optimized(),
            contract_name: entry.contract_name,
            compiler: entry.compiler_version,
            summary: insight.summary,
            risks: insight.risks,
            functions: insight.functions,
            abi,
            is_verified: true,
        })
    }

    /// Full report for a contract address
    pub async fn analyze(&self, address: &str, network: Network) -> AppResult<ContractAnalysis> {
        if !is_address(address) {
            return Err(AppError::invalid_address(address));
        }

        let start = Instant::now();
        info!("🔍 Analyzing {} on {}", address, network);

        match self.run(address, network).await {
            Ok(report) => {
                info!(
                    "✅ Report ready for {} in {}ms (proxy: {}, implementation: {}, security: {})",
                    address,
                    start.elapsed().as_millis(),
                    report.is_proxy.unwrap_or(false),
                    report.implementation.is_some(),
                    report.security_analysis.is_some()
                );
                Ok(report)
            }
            Err(e) => {
                error!("❌ Analysis failed for {} on {}: {}", address, network, e);
                Err(e.context(PIPELINE_CONTEXT))
            }
        }
    }

    async fn run(&self, address: &str, network: Network) -> AppResult<ContractAnalysis> {
        // 1. Source lookup, also tells us whether this is a proxy
        let response = self.explorer.get_contract_source_code(address, network).await?;
        let entry = response
            .result
            .into_iter()
            .next()
            .ok_or_else(AppError::contract_not_found)?;

        let is_proxy = entry.is_proxy();
        let implementation_address = entry.implementation.clone();

        // 2. Main contract
        let main = self.analyze_entry(address, network, entry).await?;

        // 3. Token detection
        let is_erc20 = is_erc20_token(&main.abi);
        if is_erc20 {
            info!("🪙 {} exposes the ERC-20 interface", address);
        }

        // 4. Recent activity
        self.pause().await;
        let transactions: Vec<Transaction> = self
            .explorer
            .get_contract_transactions(address, network, self.config.tx_limit)
            .await?
            .into_iter()
            .map(map_transaction)
            .collect();

        let mut report = ContractAnalysis {
            address: address.to_string(),
            network,
            summary: main.summary.clone(),
            risks: main.risks.clone(),
            functions: main.functions.clone(),
            recent_transactions: transactions,
            source_code: Some(main.source_code.clone()),
            contract_name: Some(main.contract_name.clone()),
            compiler: Some(main.compiler.clone()),
            optimization: Some(main.optimization),
            is_proxy: Some(is_proxy),
            implementation: None,
            is_erc20: Some(is_erc20),
            security_analysis: None,
            is_verified: Some(main.is_verified),
        };

        // 5. Implementation behind a proxy
        if is_proxy && is_address(&implementation_address) {
            info!("🔗 Proxy detected, analyzing implementation {}", implementation_address);
            self.pause().await;

            match self.analyze_single_contract(&implementation_address, network).await {
                Ok(implementation) => {
                    report.implementation = Some(implementation.into_implementation(&implementation_address));
                }
                Err(e) => {
                    warn!(
                        "⚠️ Implementation analysis failed for {}, continuing without it: {}",
                        implementation_address, e
                    );
                }
            }
        } else if is_proxy {
            warn!(
                "⚠️ Proxy {} reports no usable implementation address ({:?})",
                address, implementation_address
            );
        }

        // 6. Threat classification
        self.pause().await;
        match analyze_contract_security(
            &self.llm,
            &main.source_code,
            &main.contract_name,
            &main.abi,
            main.is_verified,
            Some(address),
        )
        .await
        {
            Ok(security) => report.security_analysis = Some(security),
            Err(e) => {
                warn!("⚠️ Security analysis failed for {}, continuing without it: {}", address, e);
            }
        }

        Ok(report)
    }
}

/// Explorer transaction → report transaction
pub fn map_transaction(tx: RawTransaction) -> Transaction {
    Transaction {
        value: format_ether(&tx.value),
        timestamp: tx.time_stamp.trim().parse().unwrap_or(0),
        method: Some(tx.function_name).filter(|name| !name.is_empty()),
        status: if tx.is_error == "0" {
            TxStatus::Success
        } else {
            TxStatus::Failed
        },
        hash: tx.hash,
        from: tx.from,
        to: tx.to,
    }
}

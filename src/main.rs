//! Ruster Audit CLI
//!
//! Analyze one contract and print the report.
//!
//! Usage:
//!   ruster_audit 0xdAC17F958D2ee523a2206206994597C13D831ec7
//!   ruster_audit 0x... --network base --json
//!
//! Environment:
//!   ANTHROPIC_API_KEY, ETHERSCAN_API_KEY (required), BASESCAN_API_KEY
//!   RUST_LOG - Log level (default: info)

use clap::Parser;
use eyre::Result;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ruster_audit::{AppConfig, ContractAnalyzer, Network};

#[derive(Parser, Debug)]
#[command(name = "ruster_audit", version, about = "AI-assisted smart contract analysis")]
struct Cli {
    /// Contract address (0x + 40 hex characters)
    address: String,

    /// Network: ethereum or base
    #[arg(short, long, default_value = "ethereum")]
    network: String,

    /// Print the full report as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let network: Network = cli.network.parse()?;
    let config = AppConfig::from_env()?;
    let analyzer = ContractAnalyzer::from_config(&config)?;

    let start = Instant::now();
    let report = analyzer.analyze(&cli.address, network).await?;
    info!("⏱️ Analysis finished in {:.1}s", start.elapsed().as_secs_f64());

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.summary_text());
    }

    Ok(())
}

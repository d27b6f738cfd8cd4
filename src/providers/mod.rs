//! Providers Module - External Data Sources
//!
//! Block explorer (Etherscan v2) and the language model API.

pub mod anthropic;
pub mod explorer;

pub use anthropic::*;
pub use explorer::*;

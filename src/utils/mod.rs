//! Utils Module - Helper Functions & Shared Utilities
//!
//! JSON recovery, contract helpers, caching and telemetry shared by the
//! pipeline, the CLI and the API server.

pub mod cache;
pub mod constants;
pub mod contract;
pub mod json_extract;
pub mod telemetry;

pub use cache::*;
pub use constants::*;
pub use contract::*;
pub use json_extract::*;
pub use telemetry::*;

//! Core Module - Analysis Logic
//!
//! Prompt builders, the AI analysis stages and the multi-stage pipeline
//! that turns explorer data into a contract report.

pub mod analyzer;
pub mod pipeline;
pub mod prompts;

pub use analyzer::*;
pub use pipeline::*;
pub use prompts::*;

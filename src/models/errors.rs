//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code so logs and API responses
//! can be grepped by category.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - EXPLORER_xxx: Etherscan/Basescan errors
//! - AI_xxx: Language model errors
//! - API_xxx: HTTP API errors
//! - CFG_xxx: Configuration errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    /// Keep the code, prefix the message with the failing stage
    pub fn context(mut self, prefix: &str) -> Self {
        self.message = format!("{}: {}", prefix, self.message);
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Explorer Errors (1xx)
    // ============================================
    /// Transport-level failure talking to the explorer
    ExplorerRequestFailed,
    /// Explorer returned a non-2xx status
    ExplorerHttpError,
    /// Explorer rejected the API key
    ExplorerInvalidApiKey,
    /// Explorer rate limit hit
    ExplorerRateLimited,
    /// Explorer returned status != "1"
    ExplorerApiError,
    /// Explorer has no record of the contract
    ContractNotFound,
    /// Contract source code is not published
    ContractNotVerified,

    // ============================================
    // AI Errors (2xx)
    // ============================================
    /// Model request failed (transport or non-2xx)
    AiRequestFailed,
    /// Model replied with something other than text
    AiUnexpectedResponse,
    /// No JSON could be recovered from the reply
    AiJsonNotFound,
    /// JSON recovered but missing required content
    AiInvalidStructure,

    // ============================================
    // API Errors (3xx)
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// Rate limit exceeded
    ApiRateLimited,
    /// Internal server error
    ApiInternalError,

    // ============================================
    // Configuration Errors (4xx)
    // ============================================
    /// Missing environment variable
    ConfigMissingEnv,
    /// Missing API key for a network
    ConfigMissingApiKey,
    /// Invalid configuration value
    ConfigInvalidValue,

    // ============================================
    // Input Errors (5xx)
    // ============================================
    /// Address is not 0x + 40 hex characters
    InvalidAddress,
    /// Network is neither ethereum nor base
    UnsupportedNetwork,

    // ============================================
    // Generic Errors (9xx)
    // ============================================
    /// External service timeout
    ExternalTimeout,
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            // Explorer Errors
            Self::ExplorerRequestFailed => "EXPLORER_REQUEST_FAILED",
            Self::ExplorerHttpError => "EXPLORER_HTTP_ERROR",
            Self::ExplorerInvalidApiKey => "EXPLORER_INVALID_API_KEY",
            Self::ExplorerRateLimited => "EXPLORER_RATE_LIMITED",
            Self::ExplorerApiError => "EXPLORER_API_ERROR",
            Self::ContractNotFound => "CONTRACT_NOT_FOUND",
            Self::ContractNotVerified => "CONTRACT_NOT_VERIFIED",

            // AI Errors
            Self::AiRequestFailed => "AI_REQUEST_FAILED",
            Self::AiUnexpectedResponse => "AI_UNEXPECTED_RESPONSE",
            Self::AiJsonNotFound => "AI_JSON_NOT_FOUND",
            Self::AiInvalidStructure => "AI_INVALID_STRUCTURE",

            // API Errors
            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiRateLimited => "API_RATE_LIMITED",
            Self::ApiInternalError => "API_INTERNAL_ERROR",

            // Configuration Errors
            Self::ConfigMissingEnv => "CFG_MISSING_ENV",
            Self::ConfigMissingApiKey => "CFG_MISSING_API_KEY",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            // Input Errors
            Self::InvalidAddress => "INVALID_ADDRESS",
            Self::UnsupportedNetwork => "UNSUPPORTED_NETWORK",

            // Generic
            Self::ExternalTimeout => "EXTERNAL_TIMEOUT",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest
            | Self::InvalidAddress
            | Self::UnsupportedNetwork
            | Self::ConfigInvalidValue => 400,
            Self::ExplorerInvalidApiKey => 401,
            Self::ContractNotFound => 404,
            Self::ContractNotVerified => 422,
            Self::ApiRateLimited | Self::ExplorerRateLimited => 429,
            Self::ExplorerRequestFailed
            | Self::ExplorerHttpError
            | Self::ExplorerApiError
            | Self::AiRequestFailed
            | Self::AiUnexpectedResponse
            | Self::AiJsonNotFound
            | Self::AiInvalidStructure => 502,
            Self::ExternalTimeout => 504,
            _ => 500,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ExplorerRateLimited | Self::ExternalTimeout | Self::ExplorerRequestFailed
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Invalid contract address
    pub fn invalid_address(address: &str) -> Self {
        Self::new(
            ErrorCode::InvalidAddress,
            format!("Invalid Ethereum address: {}", address),
        )
    }

    /// Unsupported network name
    pub fn unsupported_network(name: &str) -> Self {
        Self::new(
            ErrorCode::UnsupportedNetwork,
            format!("Unsupported network: {} (expected ethereum or base)", name),
        )
    }

    /// Missing environment variable
    pub fn missing_env(name: &str) -> Self {
        Self::new(ErrorCode::ConfigMissingEnv, format!("{} is required", name))
    }

    /// Invalid configuration value
    pub fn invalid_config(name: &str, value: &str) -> Self {
        Self::new(
            ErrorCode::ConfigInvalidValue,
            format!("Invalid value for {}: {:?}", name, value),
        )
    }

    /// Missing explorer key for a network
    pub fn missing_api_key(network: &str) -> Self {
        Self::new(
            ErrorCode::ConfigMissingApiKey,
            format!("API key for {} is not configured", network),
        )
    }

    /// Contract not found on the explorer
    pub fn contract_not_found() -> Self {
        Self::new(ErrorCode::ContractNotFound, "Contract not found or not verified")
    }

    /// Contract source unavailable
    pub fn contract_not_verified() -> Self {
        Self::new(
            ErrorCode::ContractNotVerified,
            "Contract source code not available. The contract must be verified on Etherscan/Basescan.",
        )
    }

    /// Model request failed
    pub fn ai_request_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::AiRequestFailed, msg)
    }

    /// API bad request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    /// API internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiInternalError, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::Unknown, "IO error", err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::ExternalTimeout, "Request timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::ExplorerRequestFailed, "Connection failed")
        } else {
            Self::new(ErrorCode::Unknown, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::Unknown, "JSON parse error", err)
    }
}

//! Error types for the Verity core.
//!
//! Uses `thiserror` for public API error types. Provider and judge failures are
//! recovered locally by the fan-out and ensemble runners; only `VerityError`
//! reaches the engine boundary, where it is converted into an Unverified result.

use std::path::PathBuf;

/// Top-level error type for the Verity core library.
#[derive(Debug, thiserror::Error)]
pub enum VerityError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Judge error: {0}")]
    Judge(#[from] JudgeError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal fault in {stage}: {message}")]
    Internal { stage: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VerityError {
    /// Shorthand for an internal fault raised by a named pipeline stage.
    pub fn internal(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Internal {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

/// Errors from evidence providers. Never surfaced past the fan-out.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider '{provider}' unavailable: {message}")]
    Unavailable { provider: String, message: String },

    #[error("Provider '{provider}' timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("Provider '{provider}' returned malformed data: {message}")]
    Malformed { provider: String, message: String },
}

/// Errors from AI judges. A failed judge is excluded from the ensemble.
#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    #[error("Judge request failed: {message}")]
    Request { message: String },

    #[error("Judge response parse error: {message}")]
    Parse { message: String },

    #[error("Judge '{judge}' timed out after {timeout_ms}ms")]
    Timeout { judge: String, timeout_ms: u64 },

    #[error("Authentication failed for judge {judge}")]
    AuthFailed { judge: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Environment variable not set: {var}")]
    EnvVarMissing { var: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// A type alias for results using the top-level `VerityError`.
pub type Result<T> = std::result::Result<T, VerityError>;

//! Error types for trait-lens.

use std::time::Duration;

use serde::Serialize;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Aggregation error: {0}")]
    Aggregate(#[from] AggregateError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised by the external text-generation collaborator.
///
/// The core never retries or reinterprets these; they travel up unchanged.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Trait-vector aggregation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    /// Ratios are undefined for an empty batch.
    #[error("No messages to analyze")]
    EmptyInput,
}

/// The collaborator's labeling reply could not be read as an array of
/// labeled-message records.
///
/// Returned as a value by the hybrid classifier, never raised across the
/// component boundary. Serializes as `{"error": "parse_failed", "raw": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("classifier reply could not be parsed: {reason}")]
pub struct ClassifierParseError {
    /// Always [`ClassifierParseError::CODE`].
    pub error: &'static str,
    /// The collaborator's reply, untouched.
    pub raw: String,
    #[serde(skip)]
    pub reason: String,
}

impl ClassifierParseError {
    pub const CODE: &'static str = "parse_failed";

    pub fn new(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            error: Self::CODE,
            raw: raw.into(),
            reason: reason.into(),
        }
    }
}

/// Pipeline-related errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Aggregation failed: {0}")]
    Aggregate(#[from] AggregateError),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_serializes_code_and_raw_only() {
        let err = ClassifierParseError::new("not json", "expected value at line 1");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json, serde_json::json!({"error": "parse_failed", "raw": "not json"}));
    }

    #[test]
    fn config_error_converts_to_top_level() {
        let err: Error = ConfigError::InvalidValue {
            key: "TRAIT_LENS_SUMMARY".into(),
            message: "expected combined, separate or off".into(),
        }
        .into();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().starts_with("Configuration error:"));
    }

    #[test]
    fn pipeline_error_wraps_empty_input() {
        let err: PipelineError = AggregateError::EmptyInput.into();
        assert!(matches!(err, PipelineError::Aggregate(AggregateError::EmptyInput)));
        assert_eq!(err.to_string(), "Aggregation failed: No messages to analyze");
    }
}

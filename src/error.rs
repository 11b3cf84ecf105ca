//! Error types for Coursemate
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Coursemate operations
///
/// This enum encompasses all possible errors that can occur during
/// document ingestion, vector-index queries, tool execution, and the
/// model-calling orchestration loop.
#[derive(Error, Debug)]
pub enum CoursemateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed course document; names the missing or invalid field
    #[error("Document parse error: {0}")]
    Parse(String),

    /// Underlying vector-engine failure during a query
    #[error("Search error: {0}")]
    Search(String),

    /// The model requested a tool name that is not registered
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Unexpected failure inside a tool's own logic
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Model-call transport or authentication failure (fatal for the turn)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Session store errors
    #[error("Session error: {0}")]
    Session(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Coursemate operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = CoursemateError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_parse_error_display() {
        let error = CoursemateError::Parse("missing 'Title' field".to_string());
        assert_eq!(
            error.to_string(),
            "Document parse error: missing 'Title' field"
        );
    }

    #[test]
    fn test_search_error_display() {
        let error = CoursemateError::Search("engine unavailable".to_string());
        assert_eq!(error.to_string(), "Search error: engine unavailable");
    }

    #[test]
    fn test_unknown_tool_error_display() {
        let error = CoursemateError::UnknownTool("summarize_course".to_string());
        assert_eq!(error.to_string(), "Unknown tool: summarize_course");
    }

    #[test]
    fn test_tool_execution_error_display() {
        let error = CoursemateError::ToolExecution("arguments not an object".to_string());
        assert_eq!(
            error.to_string(),
            "Tool execution error: arguments not an object"
        );
    }

    #[test]
    fn test_provider_error_display() {
        let error = CoursemateError::Provider("401 Unauthorized".to_string());
        assert_eq!(error.to_string(), "Provider error: 401 Unauthorized");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: CoursemateError = io_error.into();
        assert!(matches!(error, CoursemateError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{bad json}").unwrap_err();
        let error: CoursemateError = json_error.into();
        assert!(matches!(error, CoursemateError::Serialization(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CoursemateError>();
    }
}

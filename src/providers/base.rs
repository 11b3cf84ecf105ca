//! Base provider trait and common message types
//!
//! This module defines the `ModelProvider` trait the orchestrator drives,
//! along with the message and tool-request structures exchanged with it.

use crate::error::Result;
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message structure for the model conversation
///
/// Messages can come from the user, assistant, or system, or carry a
/// tool-execution result tied back to its originating request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (user, assistant, system, tool)
    pub role: String,
    /// Content of the message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Tool requests attached to an assistant message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_requests: Option<Vec<ToolRequest>>,
    /// For tool-result messages: the id of the request this answers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_request_id: Option<String>,
}

impl Message {
    /// Creates a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(content.into()),
            tool_requests: None,
            tool_request_id: None,
        }
    }

    /// Creates a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: Some(content.into()),
            tool_requests: None,
            tool_request_id: None,
        }
    }

    /// Creates a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(content.into()),
            tool_requests: None,
            tool_request_id: None,
        }
    }

    /// Creates an assistant message carrying tool requests
    ///
    /// Any text the model produced alongside the requests is preserved.
    pub fn assistant_with_requests(
        content: Option<String>,
        tool_requests: Vec<ToolRequest>,
    ) -> Self {
        Self {
            role: "assistant".to_string(),
            content,
            tool_requests: Some(tool_requests),
            tool_request_id: None,
        }
    }

    /// Creates a tool-result message paired to its originating request
    pub fn tool_result(request_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.into()),
            tool_requests: None,
            tool_request_id: Some(request_id.into()),
        }
    }
}

/// A request from the model to invoke one tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRequest {
    /// Unique identifier pairing this request with its result message
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// Arguments for the tool as a JSON string
    pub arguments: String,
}

/// Outcome of one model call
///
/// Either plain text, one or more tool requests, or both (text produced
/// alongside the requests).
#[derive(Debug, Clone, Default)]
pub struct ModelResponse {
    /// Assistant text, if any
    pub text: Option<String>,
    /// Tool-invocation requests, in the order the model issued them
    pub tool_requests: Vec<ToolRequest>,
}

impl ModelResponse {
    /// Creates a text-only response
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            text: Some(content.into()),
            tool_requests: Vec::new(),
        }
    }

    /// Creates a response consisting of tool requests
    pub fn requests(tool_requests: Vec<ToolRequest>) -> Self {
        Self {
            text: None,
            tool_requests,
        }
    }

    /// Whether the model asked for any tool invocations
    pub fn has_tool_requests(&self) -> bool {
        !self.tool_requests.is_empty()
    }
}

/// Trait that all model providers must implement
///
/// When `tools` is `None` the provider must issue the request without
/// any function-calling capability, so the model cannot ask for tools —
/// this is how the orchestrator forces a final text answer once the
/// round budget is spent.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Requests a completion for the given message history
    ///
    /// # Errors
    ///
    /// Returns `CoursemateError::Provider` on transport, authentication,
    /// or malformed-response failures; such errors fail the whole turn.
    async fn complete(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<ModelResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, "user");
        assert_eq!(msg.content.as_deref(), Some("Hello"));
        assert!(msg.tool_requests.is_none());
    }

    #[test]
    fn test_tool_result_message() {
        let msg = Message::tool_result("req_1", "result text");
        assert_eq!(msg.role, "tool");
        assert_eq!(msg.tool_request_id.as_deref(), Some("req_1"));
    }

    #[test]
    fn test_assistant_with_requests_preserves_text() {
        let request = ToolRequest {
            id: "req_1".to_string(),
            name: "search_course_content".to_string(),
            arguments: r#"{"query":"x"}"#.to_string(),
        };
        let msg = Message::assistant_with_requests(Some("Looking that up.".to_string()), vec![request]);
        assert_eq!(msg.role, "assistant");
        assert_eq!(msg.content.as_deref(), Some("Looking that up."));
        assert_eq!(msg.tool_requests.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_model_response_helpers() {
        assert!(!ModelResponse::text("done").has_tool_requests());
        let response = ModelResponse::requests(vec![ToolRequest {
            id: "1".to_string(),
            name: "get_course_outline".to_string(),
            arguments: "{}".to_string(),
        }]);
        assert!(response.has_tool_requests());
    }
}

//! GLM chat-completions provider
//!
//! Implements the `ModelProvider` trait against BigModel's GLM API,
//! which speaks the OpenAI-compatible chat-completions wire format.
//! Requests are issued with `temperature = 0` and a bounded completion
//! size so answers stay deterministic and brief; when tool definitions
//! are attached, `tool_choice` is set to `auto`.

use crate::config::ProviderConfig;
use crate::error::{CoursemateError, Result};
use crate::providers::{Message, ModelProvider, ModelResponse, ToolRequest};
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const TEMPERATURE: f32 = 0.0;
const MAX_COMPLETION_TOKENS: u32 = 800;

/// BigModel GLM API provider
pub struct GlmProvider {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
}

/// Request body for the chat-completions endpoint
#[derive(Debug, Serialize)]
struct GlmRequest {
    model: String,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<GlmMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GlmTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

/// Message in GLM wire format
#[derive(Debug, Serialize, Deserialize)]
struct GlmMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<GlmToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

/// Tool definition in GLM wire format
#[derive(Debug, Serialize)]
struct GlmTool {
    r#type: String,
    function: GlmFunction,
}

#[derive(Debug, Serialize)]
struct GlmFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

/// Tool call in GLM wire format
#[derive(Debug, Serialize, Deserialize)]
struct GlmToolCall {
    #[serde(default)]
    id: String,
    #[serde(default = "default_call_type")]
    r#type: String,
    function: GlmFunctionCall,
}

fn default_call_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct GlmFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

/// Response body from the chat-completions endpoint
#[derive(Debug, Deserialize)]
struct GlmResponse {
    choices: Vec<GlmChoice>,
}

#[derive(Debug, Deserialize)]
struct GlmChoice {
    message: GlmResponseMessage,
}

#[derive(Debug, Deserialize)]
struct GlmResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<GlmToolCall>>,
}

impl GlmProvider {
    /// Creates a provider from configuration
    ///
    /// # Errors
    ///
    /// Returns `CoursemateError::Config` when no API key is configured.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                CoursemateError::Config(
                    "no provider API key configured (set provider.api_key or COURSEMATE_API_KEY)"
                        .to_string(),
                )
            })?;

        Ok(Self {
            client: Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
        })
    }

    fn convert_messages(&self, messages: &[Message]) -> Vec<GlmMessage> {
        messages
            .iter()
            .map(|message| GlmMessage {
                role: message.role.clone(),
                content: message.content.clone().unwrap_or_default(),
                tool_calls: message.tool_requests.as_ref().map(|requests| {
                    requests
                        .iter()
                        .map(|request| GlmToolCall {
                            id: request.id.clone(),
                            r#type: default_call_type(),
                            function: GlmFunctionCall {
                                name: request.name.clone(),
                                arguments: request.arguments.clone(),
                            },
                        })
                        .collect()
                }),
                tool_call_id: message.tool_request_id.clone(),
            })
            .collect()
    }

    fn convert_tools(&self, tools: &[ToolDefinition]) -> Vec<GlmTool> {
        tools
            .iter()
            .map(|tool| GlmTool {
                r#type: "function".to_string(),
                function: GlmFunction {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.parameters.clone(),
                },
            })
            .collect()
    }
}

#[async_trait]
impl ModelProvider for GlmProvider {
    async fn complete(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<ModelResponse> {
        let request = GlmRequest {
            model: self.model.clone(),
            temperature: TEMPERATURE,
            max_tokens: MAX_COMPLETION_TOKENS,
            messages: self.convert_messages(messages),
            tools: tools.map(|defs| self.convert_tools(defs)),
            tool_choice: tools.map(|_| "auto".to_string()),
        };

        tracing::debug!(
            "Sending GLM request: {} messages, tools attached: {}",
            request.messages.len(),
            request.tools.is_some()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("GLM request failed: {}", e);
                CoursemateError::Provider(format!("GLM request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("GLM returned error {}: {}", status, error_text);
            return Err(
                CoursemateError::Provider(format!("GLM returned error {status}: {error_text}"))
                    .into(),
            );
        }

        let body: GlmResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse GLM response: {}", e);
            CoursemateError::Provider(format!("Failed to parse GLM response: {e}"))
        })?;

        let message = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| CoursemateError::Provider("GLM response had no choices".to_string()))?;

        let tool_requests = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolRequest {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        Ok(ModelResponse {
            text: message.content.filter(|content| !content.is_empty()),
            tool_requests,
        })
    }
}

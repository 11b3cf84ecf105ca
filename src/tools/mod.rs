//! Tools the model can invoke during a query turn
//!
//! Tool use is restricted to a closed set of variants — content search
//! and course-outline retrieval — behind one capability interface:
//! `definition()` describes a tool to the model's function-calling
//! layer, `invoke()` executes it. The [`ToolRegistry`] maps names to
//! variants in registration order and owns the per-turn source
//! accumulator: every invocation's sources are folded in explicitly,
//! and the accumulator is reset by an explicit call at turn start.

pub mod outline;
pub mod search;

use crate::error::{CoursemateError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use url::Url;

pub use outline::OutlineTool;
pub use search::SearchTool;

/// Tool descriptor exposed to the model's function-calling interface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Name the model uses to request this tool
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON schema for the tool's parameters
    pub parameters: serde_json::Value,
}

/// A human-readable citation attached to a content-search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    /// Display label, e.g. `"Intro to MCP - Lesson 2"`
    pub label: String,
    /// Link to the cited lesson, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Url>,
}

/// Result of one tool invocation: the text fed back to the model plus
/// the sources this invocation cites
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub text: String,
    pub sources: Vec<SourceEntry>,
}

impl ToolOutput {
    /// Creates an output with no sources
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: Vec::new(),
        }
    }

    /// Creates an output carrying sources
    pub fn with_sources(text: impl Into<String>, sources: Vec<SourceEntry>) -> Self {
        Self {
            text: text.into(),
            sources,
        }
    }
}

/// The closed set of tools available to the model
pub enum CourseTool {
    Search(SearchTool),
    Outline(OutlineTool),
}

impl CourseTool {
    /// This tool's descriptor for the model
    pub fn definition(&self) -> ToolDefinition {
        match self {
            CourseTool::Search(tool) => tool.definition(),
            CourseTool::Outline(tool) => tool.definition(),
        }
    }

    /// Executes the tool with parsed JSON arguments
    ///
    /// # Errors
    ///
    /// Returns `CoursemateError::ToolExecution` for malformed arguments
    /// or unexpected internal failures; a clean "nothing found" outcome
    /// is an `Ok` result with explanatory text.
    pub async fn invoke(&self, arguments: &serde_json::Value) -> Result<ToolOutput> {
        match self {
            CourseTool::Search(tool) => tool.invoke(arguments).await,
            CourseTool::Outline(tool) => tool.invoke(arguments).await,
        }
    }
}

/// Registry of available tools with the per-turn source accumulator
///
/// Tools are dispatched by name; an unregistered name fails explicitly
/// with `CoursemateError::UnknownTool`. Sources emitted by successful
/// invocations accumulate until [`reset_sources`] is called at the
/// start of the next user query.
///
/// [`reset_sources`]: ToolRegistry::reset_sources
pub struct ToolRegistry {
    tools: Vec<CourseTool>,
    sources: Mutex<Vec<SourceEntry>>,
}

impl ToolRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            sources: Mutex::new(Vec::new()),
        }
    }

    /// Registers a tool; definitions keep registration order
    pub fn register(&mut self, tool: CourseTool) {
        self.tools.push(tool);
    }

    /// All tool descriptors, in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(CourseTool::definition).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Dispatches one tool invocation by name
    ///
    /// `arguments` is the raw JSON argument string from the model. On
    /// success the invocation's sources are appended to the per-turn
    /// accumulator and the result text is returned.
    ///
    /// # Errors
    ///
    /// - `CoursemateError::UnknownTool` when no tool has that name
    /// - `CoursemateError::ToolExecution` when the arguments are not
    ///   valid JSON or the tool itself fails unexpectedly
    pub async fn invoke(&self, name: &str, arguments: &str) -> Result<String> {
        let tool = self
            .tools
            .iter()
            .find(|tool| tool.definition().name == name)
            .ok_or_else(|| CoursemateError::UnknownTool(name.to_string()))?;

        let parsed: serde_json::Value = serde_json::from_str(arguments).map_err(|e| {
            CoursemateError::ToolExecution(format!("arguments for '{name}' are not valid JSON: {e}"))
        })?;

        let output = tool.invoke(&parsed).await?;

        let mut sources = self
            .sources
            .lock()
            .map_err(|_| CoursemateError::ToolExecution("source accumulator poisoned".to_string()))?;
        sources.extend(output.sources);

        Ok(output.text)
    }

    /// Sources aggregated from every tool invoked so far this turn
    pub fn collect_sources(&self) -> Vec<SourceEntry> {
        self.sources
            .lock()
            .map(|sources| sources.clone())
            .unwrap_or_default()
    }

    /// Clears the per-turn accumulator; called exactly once at the start
    /// of handling a new user query
    pub fn reset_sources(&self) {
        if let Ok(mut sources) = self.sources.lock() {
            sources.clear();
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

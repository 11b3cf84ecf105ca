//! Configuration management for Coursemate
//!
//! This module handles loading, parsing, and validating configuration
//! from a YAML file with environment-variable overrides for secrets.

use crate::error::{CoursemateError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable consulted for the provider API key when the
/// config file does not carry one.
pub const API_KEY_ENV: &str = "COURSEMATE_API_KEY";

/// Main configuration structure for Coursemate
///
/// Holds all configuration needed for the assistant: the model provider,
/// document chunking, search behavior, the orchestration loop, and
/// session history retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Document chunking settings
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Vector search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Tool-calling loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Session history settings
    #[serde(default)]
    pub session: SessionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            chunking: ChunkingConfig::default(),
            search: SearchConfig::default(),
            agent: AgentConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

/// Model provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the OpenAI-compatible chat-completions API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model identifier to request
    #[serde(default = "default_model")]
    pub model: String,

    /// API key; when absent the `COURSEMATE_API_KEY` environment
    /// variable is consulted at load time
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_api_base() -> String {
    "https://open.bigmodel.cn/api/paas/v4".to_string()
}

fn default_model() -> String {
    "glm-4-flash".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            api_key: None,
        }
    }
}

/// Document chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk window size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    800
}

fn default_chunk_overlap() -> usize {
    100
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

/// Vector search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum content hits returned per search
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Maximum semantic distance accepted when resolving a course name
    /// fragment to a canonical title (normalized 0-1 scale)
    #[serde(default = "default_resolution_threshold")]
    pub resolution_threshold: f32,
}

fn default_max_results() -> usize {
    5
}

fn default_resolution_threshold() -> f32 {
    0.7
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            resolution_threshold: default_resolution_threshold(),
        }
    }
}

/// Tool-calling loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum number of tool-dispatch rounds per user query
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
}

fn default_max_rounds() -> usize {
    2
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
        }
    }
}

/// Session history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum user/assistant exchanges retained per session
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

fn default_max_history() -> usize {
    2
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
        }
    }
}

impl Config {
    /// Loads configuration from a YAML file
    ///
    /// Missing fields fall back to their defaults. If the file does not
    /// exist, the full default configuration is returned. When the file
    /// carries no API key, the `COURSEMATE_API_KEY` environment variable
    /// is consulted.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config: Config = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(CoursemateError::Io)?;
            serde_yaml::from_str(&contents).map_err(CoursemateError::Yaml)?
        } else {
            Config::default()
        };

        if config.provider.api_key.is_none() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                if !key.is_empty() {
                    config.provider.api_key = Some(key);
                }
            }
        }

        Ok(config)
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `CoursemateError::Config` describing the first invalid
    /// field encountered.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(CoursemateError::Config(
                "chunking.chunk_size must be greater than 0".to_string(),
            )
            .into());
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(CoursemateError::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            ))
            .into());
        }
        if self.search.max_results == 0 {
            return Err(CoursemateError::Config(
                "search.max_results must be greater than 0".to_string(),
            )
            .into());
        }
        if !(0.0..=1.0).contains(&self.search.resolution_threshold) {
            return Err(CoursemateError::Config(format!(
                "search.resolution_threshold ({}) must be within 0.0..=1.0",
                self.search.resolution_threshold
            ))
            .into());
        }
        if self.agent.max_rounds == 0 {
            return Err(CoursemateError::Config(
                "agent.max_rounds must be greater than 0".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

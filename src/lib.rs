//! Coursemate - question answering over structured course documents
//!
//! This library combines semantic retrieval over a two-collection vector
//! index with a bounded tool-calling model loop to answer natural-language
//! questions about a corpus of course documents.
//!
//! # Architecture
//!
//! - `document`: course-document parsing and overlapping text chunking
//! - `index`: the catalog + content vector collections and the embedder
//! - `tools`: the content-search and course-outline tools plus the
//!   registry that dispatches them and accumulates sources per turn
//! - `agent`: the sequential tool-calling orchestrator and session state
//! - `providers`: the model-call boundary and its GLM implementation
//! - `assistant`: the facade wiring ingestion and the query contract
//! - `config`, `error`, `prompts`, `cli`: ambient support
//!
//! # Example
//!
//! ```no_run
//! use coursemate::{Config, CourseAssistant, GlmProvider};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("coursemate.yaml")?;
//!     config.validate()?;
//!
//!     let provider = Arc::new(GlmProvider::new(&config.provider)?);
//!     let assistant = CourseAssistant::new(config, provider);
//!
//!     assistant.ingest_folder("docs").await?;
//!     let response = assistant.handle_query(None, "What is lesson 2 about?").await?;
//!     println!("{}", response.answer);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod assistant;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod prompts;
pub mod providers;
pub mod tools;

// Re-export commonly used types
pub use assistant::{CourseAssistant, QueryResponse};
pub use config::Config;
pub use document::{Chunk, Course, Lesson};
pub use error::{CoursemateError, Result};
pub use index::{CatalogEntry, ContentFilter, ContentHit, VectorIndex};
pub use providers::{GlmProvider, Message, ModelProvider, ModelResponse, ToolRequest};
pub use tools::{SourceEntry, ToolDefinition, ToolRegistry};

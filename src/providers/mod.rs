//! Model provider abstraction and implementations
//!
//! The orchestrator talks to the model exclusively through the
//! [`ModelProvider`] trait. One HTTP implementation is provided
//! ([`GlmProvider`]); tests substitute scripted providers.

mod base;
mod glm;

pub use base::{Message, ModelProvider, ModelResponse, ToolRequest};
pub use glm::GlmProvider;

//! Orchestration loop and session state
//!
//! - `orchestrator`: the bounded model-call / tool-dispatch state machine
//! - `session`: per-session bounded conversation history

pub mod orchestrator;
pub mod session;

pub use orchestrator::{Orchestrator, TurnOutcome};
pub use session::{Exchange, SessionStore};

//! Sequential tool-calling orchestration loop
//!
//! Drives one user query through up to `max_rounds` rounds of
//! model-call → tool-dispatch, then a final model call. The loop is a
//! small state machine:
//!
//! - `AwaitingModel` — call the model with the history and (while the
//!   round budget lasts) the tool schemas.
//! - `DispatchingTools` — execute every requested invocation in request
//!   order, appending each result to history paired with its request id.
//! - `Done` — the model produced a text answer.
//! - `Failed` — the model call itself failed; no answer is fabricated.
//!
//! Once the round budget is spent, the next model call is issued with
//! tool access removed, so the model must synthesize an answer from the
//! tool results already in history. The loop therefore makes at most
//! `max_rounds + 1` model calls and at most `max_rounds` dispatch
//! phases, and always terminates.
//!
//! Tool failures (unknown tool, bad arguments, internal errors) are
//! converted into tool-result text and fed back into the loop; only
//! failures of the model call itself abort the turn. No lock is held
//! across a model or tool call, and an optional cancellation token is
//! checked between rounds: a cancelled turn stops issuing further model
//! calls while letting the current round's tool work complete.

use crate::error::{CoursemateError, Result};
use crate::providers::{Message, ModelProvider, ModelResponse, ToolRequest};
use crate::tools::{SourceEntry, ToolRegistry};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Loop state for one query turn.
#[derive(Debug, Clone)]
enum LoopState {
    AwaitingModel,
    DispatchingTools(Vec<ToolRequest>),
    Done(String),
}

/// Completed turn: the final answer plus the sources every tool
/// invocation contributed this turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub answer: String,
    pub sources: Vec<SourceEntry>,
}

/// Drives the bounded model/tool loop for single query turns.
pub struct Orchestrator {
    provider: Arc<dyn ModelProvider>,
    max_rounds: usize,
}

impl Orchestrator {
    /// Creates an orchestrator over a model provider.
    ///
    /// `max_rounds` bounds the number of tool-dispatch phases per turn.
    pub fn new(provider: Arc<dyn ModelProvider>, max_rounds: usize) -> Self {
        Self {
            provider,
            max_rounds,
        }
    }

    /// Runs one query turn to completion.
    ///
    /// `history` must already contain the system prompt, any prior
    /// session turns, and the new user message. On success the final
    /// answer and the registry's aggregated sources are returned.
    ///
    /// # Errors
    ///
    /// Returns `CoursemateError::Provider` when a model call fails or
    /// when the turn is cancelled; tool failures never abort the turn.
    pub async fn run_turn(
        &self,
        registry: &ToolRegistry,
        mut history: Vec<Message>,
        cancel: Option<&CancellationToken>,
    ) -> Result<TurnOutcome> {
        let definitions = registry.definitions();
        let mut rounds_completed = 0usize;
        let mut state = LoopState::AwaitingModel;

        let answer = loop {
            match state {
                LoopState::AwaitingModel => {
                    if let Some(token) = cancel {
                        if token.is_cancelled() {
                            debug!("Turn cancelled after {} rounds", rounds_completed);
                            return Err(CoursemateError::Provider(
                                "turn cancelled by caller".to_string(),
                            )
                            .into());
                        }
                    }

                    let tools_allowed = rounds_completed < self.max_rounds;
                    debug!(
                        "Model call (round {}/{}, tools {})",
                        rounds_completed,
                        self.max_rounds,
                        if tools_allowed { "attached" } else { "removed" }
                    );

                    let response = self
                        .provider
                        .complete(&history, tools_allowed.then_some(definitions.as_slice()))
                        .await?;
                    let ModelResponse { text, tool_requests } = response;

                    if !tool_requests.is_empty() && tools_allowed {
                        history.push(Message::assistant_with_requests(
                            text,
                            tool_requests.clone(),
                        ));
                        state = LoopState::DispatchingTools(tool_requests);
                    } else if let Some(text) = text {
                        if !tool_requests.is_empty() {
                            // Contract violation: requests issued on a
                            // toolless call. Keep the text, drop them.
                            warn!(
                                "Model requested {} tool(s) on a toolless call; ignoring",
                                tool_requests.len()
                            );
                        }
                        history.push(Message::assistant(text.clone()));
                        state = LoopState::Done(text);
                    } else if tool_requests.is_empty() {
                        return Err(CoursemateError::Provider(
                            "model returned neither text nor tool requests".to_string(),
                        )
                        .into());
                    } else {
                        return Err(CoursemateError::Provider(
                            "model requested tools on a toolless call without any text".to_string(),
                        )
                        .into());
                    }
                }

                LoopState::DispatchingTools(requests) => {
                    debug!(
                        "Dispatching {} tool request(s) in round {}",
                        requests.len(),
                        rounds_completed + 1
                    );
                    for request in requests {
                        let result_text =
                            match registry.invoke(&request.name, &request.arguments).await {
                                Ok(text) => text,
                                Err(err) => {
                                    warn!("Tool '{}' failed: {}", request.name, err);
                                    format!("Tool '{}' failed: {}", request.name, err)
                                }
                            };
                        history.push(Message::tool_result(&request.id, result_text));
                    }
                    rounds_completed += 1;
                    state = LoopState::AwaitingModel;
                }

                LoopState::Done(text) => break text,
            }
        };

        debug!(
            "Turn complete after {} tool round(s), {} source(s)",
            rounds_completed,
            registry.collect_sources().len()
        );

        Ok(TurnOutcome {
            answer,
            sources: registry.collect_sources(),
        })
    }
}

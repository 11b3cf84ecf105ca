//! Course assistant facade
//!
//! Wires the vector index, tool registry, orchestrator, and session
//! store together, and exposes the two entry points the outside world
//! uses: corpus ingestion and the turn-level query contract.

use crate::agent::{Orchestrator, SessionStore, TurnOutcome};
use crate::config::Config;
use crate::document::parse_course_document;
use crate::error::Result;
use crate::index::embedding::{Embedder, HashEmbedder};
use crate::index::VectorIndex;
use crate::prompts::SYSTEM_PROMPT;
use crate::providers::{Message, ModelProvider};
use crate::tools::{CourseTool, OutlineTool, SearchTool, SourceEntry, ToolRegistry};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Answer to one user query: the final text, the sources the search
/// tool cited, and the session the exchange was recorded under.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<SourceEntry>,
    pub session_id: String,
}

/// The assembled question-answering system.
///
/// Ingestion is expected to finish before query traffic begins; queries
/// from different sessions are independent and share only the
/// read-mostly index and the session store.
pub struct CourseAssistant {
    config: Config,
    index: Arc<VectorIndex>,
    registry: ToolRegistry,
    orchestrator: Orchestrator,
    sessions: SessionStore,
}

impl CourseAssistant {
    /// Creates an assistant with the default local embedder.
    pub fn new(config: Config, provider: Arc<dyn ModelProvider>) -> Self {
        Self::with_embedder(config, provider, Arc::new(HashEmbedder::default()))
    }

    /// Creates an assistant over a specific embedder.
    pub fn with_embedder(
        config: Config,
        provider: Arc<dyn ModelProvider>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        let index = Arc::new(VectorIndex::new(
            embedder,
            config.search.resolution_threshold,
        ));

        let mut registry = ToolRegistry::new();
        registry.register(CourseTool::Search(SearchTool::new(
            index.clone(),
            config.search.max_results,
        )));
        registry.register(CourseTool::Outline(OutlineTool::new(index.clone())));

        let orchestrator = Orchestrator::new(provider, config.agent.max_rounds);
        let sessions = SessionStore::new(config.session.max_history);

        Self {
            config,
            index,
            registry,
            orchestrator,
            sessions,
        }
    }

    /// The shared vector index (read-only use).
    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Ingests one course document.
    ///
    /// Returns `Some((title, chunk_count))` when the course was added,
    /// `None` when a course with the same title is already indexed.
    ///
    /// # Errors
    ///
    /// Returns `CoursemateError::Parse` for malformed documents; the
    /// folder-level driver treats that as skip-and-continue.
    pub async fn ingest_document(&self, text: &str) -> Result<Option<(String, usize)>> {
        let (course, chunks) = parse_course_document(text, &self.config.chunking)?;

        if self.index.course_titles()?.contains(&course.title) {
            debug!("Course '{}' already indexed, skipping", course.title);
            return Ok(None);
        }

        self.index.upsert_course(&course).await?;
        self.index.upsert_chunks(&chunks).await?;
        Ok(Some((course.title, chunks.len())))
    }

    /// Ingests every `.txt`/`.md` file in a folder (top level only, in
    /// filename order).
    ///
    /// Files that fail to parse are logged and skipped; files whose
    /// course title is already indexed are skipped silently. Returns
    /// `(courses_added, chunks_added)`.
    pub async fn ingest_folder(&self, folder: impl AsRef<Path>) -> Result<(usize, usize)> {
        let mut paths: Vec<_> = WalkDir::new(folder.as_ref())
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                matches!(
                    path.extension().and_then(|ext| ext.to_str()),
                    Some("txt") | Some("md")
                )
            })
            .collect();
        paths.sort();

        let mut courses_added = 0;
        let mut chunks_added = 0;

        for path in paths {
            let text = std::fs::read_to_string(&path)?;
            match self.ingest_document(&text).await {
                Ok(Some((title, chunk_count))) => {
                    debug!("Ingested '{}' ({} chunks) from {}", title, chunk_count, path.display());
                    courses_added += 1;
                    chunks_added += chunk_count;
                }
                Ok(None) => {}
                Err(err) => {
                    warn!("Skipping {}: {}", path.display(), err);
                }
            }
        }

        info!(
            "Ingestion complete: {} course(s), {} chunk(s)",
            courses_added, chunks_added
        );
        Ok((courses_added, chunks_added))
    }

    /// Answers one user query within a session.
    ///
    /// With `session_id = None` a fresh session is allocated; its id is
    /// returned so the caller can continue the conversation. The
    /// registry's source accumulator is reset at the start of every
    /// query, and the completed exchange is recorded before returning.
    ///
    /// # Errors
    ///
    /// Returns a turn-level error when the model-call chain fails; no
    /// partial answer is fabricated and no sources are reported.
    pub async fn handle_query(&self, session_id: Option<&str>, query: &str) -> Result<QueryResponse> {
        let session_id = match session_id {
            Some(id) => id.to_string(),
            None => self.sessions.create_session(),
        };

        self.registry.reset_sources();

        let mut history = vec![Message::system(SYSTEM_PROMPT)];
        history.extend(self.sessions.history(&session_id)?);
        history.push(Message::user(query));

        let TurnOutcome { answer, sources } = self
            .orchestrator
            .run_turn(&self.registry, history, None)
            .await?;

        self.sessions.record_exchange(&session_id, query, &answer)?;

        Ok(QueryResponse {
            answer,
            sources,
            session_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoursemateError;
    use crate::providers::{ModelResponse, ToolRequest};
    use crate::tools::ToolDefinition;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const DOC: &str = "\
Title: Intro to MCP
Instructor: Jane Doe
Link: https://example.com/mcp

## Lesson 1: Servers
Servers expose resources and prompts.

## Lesson 2: Clients
Clients negotiate capabilities during the handshake.
";

    struct ScriptedProvider {
        responses: Mutex<Vec<ModelResponse>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<ModelResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
            })
        }
    }

    #[async_trait]
    impl crate::providers::ModelProvider for ScriptedProvider {
        async fn complete(
            &self,
            _messages: &[Message],
            _tools: Option<&[ToolDefinition]>,
        ) -> Result<ModelResponse> {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(ModelResponse::text("fallback"))
            } else {
                Ok(responses.remove(0))
            }
        }
    }

    fn assistant(responses: Vec<ModelResponse>) -> CourseAssistant {
        CourseAssistant::new(Config::default(), ScriptedProvider::new(responses))
    }

    #[tokio::test]
    async fn test_ingest_document_then_skip_duplicate() {
        let assistant = assistant(vec![]);
        let first = assistant.ingest_document(DOC).await.unwrap();
        assert!(first.is_some());
        let (catalog_before, content_before) = assistant.index().counts().unwrap();

        let second = assistant.ingest_document(DOC).await.unwrap();
        assert!(second.is_none());
        assert_eq!(assistant.index().counts().unwrap(), (catalog_before, content_before));
    }

    #[tokio::test]
    async fn test_handle_query_allocates_session_and_records_exchange() {
        let assistant = assistant(vec![ModelResponse::text("The answer.")]);
        let response = assistant.handle_query(None, "What is MCP?").await.unwrap();
        assert_eq!(response.answer, "The answer.");
        assert!(!response.session_id.is_empty());

        // Second turn on the same session sees the recorded history.
        let followup = assistant
            .handle_query(Some(&response.session_id), "And then?")
            .await
            .unwrap();
        assert_eq!(followup.session_id, response.session_id);
    }

    #[tokio::test]
    async fn test_sources_cleared_between_turns() {
        let assistant = assistant(vec![
            ModelResponse::requests(vec![ToolRequest {
                id: "call_1".to_string(),
                name: "search_course_content".to_string(),
                arguments: r#"{"query":"negotiate capabilities","lesson_number":2}"#.to_string(),
            }]),
            ModelResponse::text("Found it."),
            ModelResponse::text("No tools this time."),
        ]);
        assistant.ingest_document(DOC).await.unwrap();

        let first = assistant.handle_query(None, "lesson 2?").await.unwrap();
        assert_eq!(first.sources.len(), 1);

        let second = assistant.handle_query(None, "hello").await.unwrap();
        assert!(second.sources.is_empty());
    }

    #[tokio::test]
    async fn test_turn_failure_propagates_without_answer() {
        struct FailingProvider;

        #[async_trait]
        impl crate::providers::ModelProvider for FailingProvider {
            async fn complete(
                &self,
                _messages: &[Message],
                _tools: Option<&[ToolDefinition]>,
            ) -> Result<ModelResponse> {
                Err(CoursemateError::Provider("auth failed".to_string()).into())
            }
        }

        let assistant = CourseAssistant::new(Config::default(), Arc::new(FailingProvider));
        let err = assistant.handle_query(None, "anything").await.unwrap_err();
        assert!(err.to_string().contains("auth failed"));
    }
}

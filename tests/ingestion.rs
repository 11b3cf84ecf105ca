//! Corpus ingestion and chunking property tests

use async_trait::async_trait;
use coursemate::config::ChunkingConfig;
use coursemate::document::chunk_windows;
use coursemate::{Config, CourseAssistant, Message, ModelProvider, ModelResponse, ToolDefinition};
use std::io::Write;
use std::sync::Arc;

/// Ingestion-only tests never call the model.
struct UnusedProvider;

#[async_trait]
impl ModelProvider for UnusedProvider {
    async fn complete(
        &self,
        _messages: &[Message],
        _tools: Option<&[ToolDefinition]>,
    ) -> coursemate::Result<ModelResponse> {
        panic!("ingestion tests must not call the model");
    }
}

fn assistant() -> CourseAssistant {
    CourseAssistant::new(Config::default(), Arc::new(UnusedProvider))
}

fn write_doc(dir: &std::path::Path, name: &str, contents: &str) {
    let mut file = std::fs::File::create(dir.join(name)).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
}

const GOOD_DOC: &str = "\
Title: Intro to MCP
Instructor: Jane Doe

## Lesson 1: Servers
Servers expose resources and prompts.

## Lesson 2: Clients
Clients negotiate capabilities during the handshake.
";

const BAD_DOC: &str = "\
Instructor: Nobody

## Lesson 1: Orphan
This document has no title line.
";

#[tokio::test]
async fn test_folder_ingestion_skips_malformed_files() {
    let dir = tempfile::tempdir().unwrap();
    write_doc(dir.path(), "a_good.txt", GOOD_DOC);
    write_doc(dir.path(), "b_bad.txt", BAD_DOC);
    write_doc(dir.path(), "c_ignored.pdf", "not a course document");

    let assistant = assistant();
    let (courses, chunks) = assistant.ingest_folder(dir.path()).await.unwrap();

    assert_eq!(courses, 1);
    assert!(chunks >= 2);
    assert_eq!(
        assistant.index().course_titles().unwrap(),
        vec!["Intro to MCP"]
    );
}

#[tokio::test]
async fn test_reingesting_folder_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    write_doc(dir.path(), "course.txt", GOOD_DOC);

    let assistant = assistant();
    assistant.ingest_folder(dir.path()).await.unwrap();
    let counts_after_first = assistant.index().counts().unwrap();

    let (courses, chunks) = assistant.ingest_folder(dir.path()).await.unwrap();
    assert_eq!((courses, chunks), (0, 0));
    assert_eq!(assistant.index().counts().unwrap(), counts_after_first);
}

#[test]
fn test_chunk_windows_reconstruct_original_text() {
    // De-overlapped concatenation is lossless: every byte of the input
    // is covered by the windows at their reported offsets.
    let text = "Retrieval systems split documents into bounded windows. \
                Each window overlaps its neighbor so sentences are not orphaned. \
                Offsets increase monotonically across the sequence. \
                The final window always reaches the end of the input text.";
    let config = ChunkingConfig {
        chunk_size: 60,
        chunk_overlap: 15,
    };

    let windows = chunk_windows(text, &config);
    assert!(windows.len() > 2);

    let mut reconstructed = String::new();
    for (offset, window) in &windows {
        assert_eq!(&text[*offset..offset + window.len()], window.as_str());
        // Append only the part beyond what is already covered.
        if offset + window.len() > reconstructed.len() {
            let new_part = &window[reconstructed.len() - offset..];
            reconstructed.push_str(new_part);
        }
    }
    assert_eq!(reconstructed, text);
}

#[test]
fn test_chunk_windows_respect_overlap_step() {
    let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu nu xi \
                omicron pi rho sigma tau upsilon phi chi psi omega and back again to alpha.";
    let config = ChunkingConfig {
        chunk_size: 50,
        chunk_overlap: 10,
    };

    let windows = chunk_windows(text, &config);
    for pair in windows.windows(2) {
        let (start_a, ref window_a) = pair[0];
        let (start_b, _) = pair[1];
        // Monotonically increasing starts, and each window begins at or
        // before the previous one ends (no gaps).
        assert!(start_b > start_a);
        assert!(start_b <= start_a + window_a.len());
    }
}

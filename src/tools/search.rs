//! Content-search tool
//!
//! Searches course-content chunks with optional course-name and
//! lesson-number filtering. A course name that fails to resolve is a
//! hard stop: the tool reports the failure instead of degrading into an
//! unfiltered search, since an unrelated course would otherwise satisfy
//! every filtered query.

use crate::error::{CoursemateError, Result};
use crate::index::{ContentFilter, ContentHit, VectorIndex};
use crate::tools::{SourceEntry, ToolDefinition, ToolOutput};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// How many known titles to list when name resolution fails.
const SUGGESTED_TITLES: usize = 3;

/// Tool for searching course content with semantic course-name matching
pub struct SearchTool {
    index: Arc<VectorIndex>,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct SearchArguments {
    query: String,
    #[serde(default)]
    course_name: Option<String>,
    #[serde(default)]
    lesson_number: Option<u32>,
}

impl SearchTool {
    /// Creates the tool over a shared vector index
    pub fn new(index: Arc<VectorIndex>, max_results: usize) -> Self {
        Self { index, max_results }
    }

    /// This tool's descriptor for the model
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_course_content".to_string(),
            description:
                "Search course materials with smart course name matching and lesson filtering"
                    .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    },
                    "lesson_number": {
                        "type": "integer",
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    /// Executes the search
    ///
    /// Returns explanatory text (and no sources) when the course name
    /// does not resolve or nothing matches; search-engine failures are
    /// also folded into the result text so the model can adapt.
    pub async fn invoke(&self, arguments: &serde_json::Value) -> Result<ToolOutput> {
        let args: SearchArguments = serde_json::from_value(arguments.clone())
            .map_err(|e| CoursemateError::ToolExecution(format!("invalid search arguments: {e}")))?;

        // Resolve the course filter first; failure here must not fall
        // back to an unfiltered search.
        let course_title = match &args.course_name {
            Some(name) => match self.index.resolve_course_name(name).await {
                Ok(Some(title)) => Some(title),
                Ok(None) => return Ok(ToolOutput::text(self.no_course_message(name))),
                Err(e) => return Ok(ToolOutput::text(format!("Search error: {e}"))),
            },
            None => None,
        };

        let filter = ContentFilter {
            course_title,
            lesson_number: args.lesson_number,
        };

        let hits = match self
            .index
            .query_content(&args.query, &filter, self.max_results)
            .await
        {
            Ok(hits) => hits,
            Err(e) => return Ok(ToolOutput::text(format!("Search error: {e}"))),
        };

        if hits.is_empty() {
            return Ok(ToolOutput::text(self.no_results_message(&args, &filter)));
        }

        debug!("Content search returned {} hits", hits.len());
        Ok(self.format_hits(&hits))
    }

    fn no_course_message(&self, name: &str) -> String {
        let mut message = format!("No course found matching '{name}'.");
        if let Ok(titles) = self.index.course_titles() {
            if !titles.is_empty() {
                let suggestions: Vec<&str> = titles
                    .iter()
                    .take(SUGGESTED_TITLES)
                    .map(String::as_str)
                    .collect();
                message.push_str(&format!(" Known courses include: {}.", suggestions.join(", ")));
            }
        }
        message
    }

    fn no_results_message(&self, args: &SearchArguments, filter: &ContentFilter) -> String {
        let mut message = String::from("No relevant content found");
        if let Some(course) = &filter.course_title {
            message.push_str(&format!(" in course '{course}'"));
        }
        if let Some(lesson) = args.lesson_number {
            message.push_str(&format!(" in lesson {lesson}"));
        }
        message.push('.');
        message
    }

    /// Formats hits as labeled blocks in relevance order, collecting one
    /// source per distinct (course, lesson) pair.
    fn format_hits(&self, hits: &[ContentHit]) -> ToolOutput {
        let mut blocks = Vec::with_capacity(hits.len());
        let mut sources: Vec<SourceEntry> = Vec::new();
        let mut seen: HashSet<(String, Option<u32>)> = HashSet::new();

        for hit in hits {
            let course_title = &hit.metadata.course_title;
            let lesson_number = hit.metadata.lesson_number;

            let mut label = course_title.clone();
            if let Some(lesson) = lesson_number {
                label.push_str(&format!(" - Lesson {lesson}"));
            }

            if seen.insert((course_title.clone(), lesson_number)) {
                let link = lesson_number
                    .and_then(|lesson| self.index.lesson_link(course_title, lesson).ok().flatten());
                sources.push(SourceEntry {
                    label: label.clone(),
                    link,
                });
            }

            blocks.push(format!("[{label}]\n{}", hit.content));
        }

        ToolOutput::with_sources(blocks.join("\n\n"), sources)
    }
}

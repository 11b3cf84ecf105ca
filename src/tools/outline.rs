//! Course-outline tool
//!
//! Resolves a fuzzy course title against the catalog and returns the
//! course header plus the complete ordered lesson list as structured
//! text the model can quote directly. Outline answers cite the course
//! itself, not content chunks, so no sources are recorded.

use crate::error::{CoursemateError, Result};
use crate::index::VectorIndex;
use crate::tools::{ToolDefinition, ToolOutput};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Tool for retrieving a course outline with lesson information
pub struct OutlineTool {
    index: Arc<VectorIndex>,
}

#[derive(Debug, Deserialize)]
struct OutlineArguments {
    course_title: String,
}

impl OutlineTool {
    /// Creates the tool over a shared vector index
    pub fn new(index: Arc<VectorIndex>) -> Self {
        Self { index }
    }

    /// This tool's descriptor for the model
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_course_outline".to_string(),
            description: "Get the complete outline of a course including course title, course \
                          link, and all lessons with their numbers and titles"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "course_title": {
                        "type": "string",
                        "description": "Full or partial title of the course (e.g., 'MCP', 'Introduction to RAG')"
                    }
                },
                "required": ["course_title"]
            }),
        }
    }

    /// Executes the outline lookup
    ///
    /// A title that fails to resolve yields explanatory text, never a
    /// fallback to some other course.
    pub async fn invoke(&self, arguments: &serde_json::Value) -> Result<ToolOutput> {
        let args: OutlineArguments = serde_json::from_value(arguments.clone())
            .map_err(|e| CoursemateError::ToolExecution(format!("invalid outline arguments: {e}")))?;

        let resolved = match self.index.resolve_course_name(&args.course_title).await {
            Ok(resolved) => resolved,
            Err(e) => return Ok(ToolOutput::text(format!("Search error: {e}"))),
        };

        let Some(title) = resolved else {
            return Ok(ToolOutput::text(format!(
                "No course found matching '{}'",
                args.course_title
            )));
        };

        let entry = self
            .index
            .catalog_entry(&title)?
            .ok_or_else(|| {
                CoursemateError::ToolExecution(format!("resolved course '{title}' has no catalog entry"))
            })?;

        let mut lines = vec![
            format!("Course: {}", entry.title),
            format!("Instructor: {}", entry.instructor),
        ];
        if let Some(link) = &entry.link {
            lines.push(format!("Course Link: {link}"));
        }
        lines.push(String::new());
        lines.push(format!("Total Lessons: {}", entry.lesson_count));
        lines.push(String::new());
        lines.push("Lessons:".to_string());
        for lesson in &entry.lessons {
            lines.push(format!("  Lesson {}: {}", lesson.number, lesson.title));
        }

        Ok(ToolOutput::text(lines.join("\n")))
    }
}

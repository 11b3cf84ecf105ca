//! Course document parsing and chunking
//!
//! This module parses the structured course-document format into course
//! metadata plus lessons, and splits the body text into overlapping
//! windowed chunks for content retrieval.
//!
//! Document format:
//!
//! ```text
//! Title: Intro to MCP
//! Instructor: Jane Doe
//! Link: https://example.com/courses/mcp
//!
//! Optional course preamble text.
//!
//! ## Lesson 0: Welcome
//! Link: https://example.com/courses/mcp/lesson-0
//! Lesson body text...
//! ```
//!
//! Chunk boundaries are deterministic for identical input and
//! configuration: re-chunking the same document yields byte-identical
//! chunk content.

use crate::config::ChunkingConfig;
use crate::error::{CoursemateError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

/// A parsed course with its ordered lessons.
///
/// Identity is the title (case-sensitive exact string). Courses are
/// immutable once ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub title: String,
    pub instructor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Url>,
    pub lessons: Vec<Lesson>,
}

/// One lesson within a course, identified by `number`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub number: u32,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Url>,
}

/// A bounded, overlapping slice of lesson or course-intro text; the unit
/// of content retrieval.
///
/// `lesson_number` is absent for intro text preceding the first lesson
/// header. `chunk_index` increases monotonically across the whole course
/// (it continues counting across lesson boundaries).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub course_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_number: Option<u32>,
    pub chunk_index: u32,
    pub content: String,
}

/// Parses a course document into its course metadata and chunk sequence.
///
/// # Errors
///
/// Returns `CoursemateError::Parse` naming the missing field when the
/// required `Title` or `Instructor` header is absent, or when the
/// document contains no lesson sections.
pub fn parse_course_document(text: &str, chunking: &ChunkingConfig) -> Result<(Course, Vec<Chunk>)> {
    let lesson_prefix =
        Regex::new(r"^Lesson\s+(\d+)\s*:\s*(.*)$").expect("lesson prefix pattern is valid");

    let mut title: Option<String> = None;
    let mut instructor: Option<String> = None;
    let mut course_link: Option<Url> = None;
    let mut preamble = String::new();

    let mut lines = text.lines().peekable();

    // Header and preamble run until the first lesson section.
    while let Some(&line) = lines.peek() {
        if line.starts_with("## ") {
            break;
        }
        let line = lines.next().expect("peeked line");
        if let Some(value) = line.strip_prefix("Title:") {
            title = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("Instructor:") {
            instructor = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("Link:") {
            course_link = parse_link(value.trim(), "course");
        } else {
            if !preamble.is_empty() {
                preamble.push('\n');
            }
            preamble.push_str(line);
        }
    }

    let title = title
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CoursemateError::Parse("missing 'Title' field".to_string()))?;
    let instructor = instructor
        .filter(|i| !i.is_empty())
        .ok_or_else(|| CoursemateError::Parse("missing 'Instructor' field".to_string()))?;

    // Lesson sections, delimited by `## ` headers.
    let mut lessons: Vec<Lesson> = Vec::new();
    let mut bodies: Vec<String> = Vec::new();
    let mut next_number: u32 = 0;

    while let Some(line) = lines.next() {
        let header = line.strip_prefix("## ").expect("section header").trim();
        let (number, lesson_title) = match lesson_prefix.captures(header) {
            Some(caps) => {
                let number: u32 = caps[1].parse().map_err(|_| {
                    CoursemateError::Parse(format!("invalid lesson number in '{header}'"))
                })?;
                (number, caps[2].trim().to_string())
            }
            None => (next_number, header.to_string()),
        };
        next_number = number + 1;

        let mut link: Option<Url> = None;
        let mut body = String::new();
        let mut saw_content = false;
        while let Some(&peeked) = lines.peek() {
            if peeked.starts_with("## ") {
                break;
            }
            let body_line = lines.next().expect("peeked line");
            if !saw_content && body_line.trim().is_empty() {
                continue;
            }
            if !saw_content {
                if let Some(value) = body_line.strip_prefix("Link:") {
                    link = parse_link(value.trim(), "lesson");
                    continue;
                }
            }
            saw_content = true;
            if !body.is_empty() {
                body.push('\n');
            }
            body.push_str(body_line);
        }

        lessons.push(Lesson {
            number,
            title: lesson_title,
            link,
        });
        bodies.push(body);
    }

    if lessons.is_empty() {
        return Err(CoursemateError::Parse("no lesson sections".to_string()).into());
    }

    // Chunk the intro and every lesson body, with a course-global index.
    let mut chunks: Vec<Chunk> = Vec::new();
    let mut chunk_index: u32 = 0;

    let preamble = preamble.trim();
    if !preamble.is_empty() {
        for (_, window) in chunk_windows(preamble, chunking) {
            chunks.push(Chunk {
                course_title: title.clone(),
                lesson_number: None,
                chunk_index,
                content: window,
            });
            chunk_index += 1;
        }
    }

    for (lesson, body) in lessons.iter().zip(bodies.iter()) {
        let body = body.trim();
        if body.is_empty() {
            continue;
        }
        for (_, window) in chunk_windows(body, chunking) {
            chunks.push(Chunk {
                course_title: title.clone(),
                lesson_number: Some(lesson.number),
                chunk_index,
                content: window,
            });
            chunk_index += 1;
        }
    }

    let course = Course {
        title,
        instructor,
        link: course_link,
        lessons,
    };
    Ok((course, chunks))
}

fn parse_link(value: &str, kind: &str) -> Option<Url> {
    if value.is_empty() {
        return None;
    }
    match Url::parse(value) {
        Ok(url) => Some(url),
        Err(err) => {
            warn!("Ignoring malformed {} link '{}': {}", kind, value, err);
            None
        }
    }
}

/// Splits text into overlapping windows of roughly `chunk_size`
/// characters with `chunk_overlap` characters of overlap.
///
/// Returns `(byte_offset, window)` pairs. Consecutive windows advance by
/// at least `chunk_size - chunk_overlap` bytes up to boundary snapping:
/// the window end is pulled back within a small lookbehind to land after
/// sentence-ending punctuation, or failing that on whitespace, rather
/// than mid-word. Every byte of input appears in at least one window.
pub fn chunk_windows(text: &str, config: &ChunkingConfig) -> Vec<(usize, String)> {
    let size = config.chunk_size.max(1);
    let overlap = config.chunk_overlap.min(size.saturating_sub(1));
    let len = text.len();

    if len <= size {
        if text.is_empty() {
            return Vec::new();
        }
        return vec![(0, text.to_string())];
    }

    // Snapping may pull an end back at most this far; bounded so the
    // step stays close to size - overlap.
    let lookbehind = (size / 4).max(1);

    let mut windows = Vec::new();
    let mut start = 0usize;

    loop {
        let mut ideal_end = floor_char_boundary(text, (start + size).min(len));
        if ideal_end <= start {
            // A window smaller than one multibyte char; take the char whole.
            ideal_end = ceil_char_boundary(text, start + 1);
        }
        if ideal_end >= len {
            windows.push((start, text[start..].to_string()));
            break;
        }

        let end = snap_end(text, start, ideal_end, lookbehind);
        windows.push((start, text[start..end].to_string()));

        let mut next = end.saturating_sub(overlap).max(start + 1);
        next = ceil_char_boundary(text, next);
        // Prefer to begin the next window at a word start inside the
        // overlap region.
        if let Some(pos) = text[next..end].find(char::is_whitespace) {
            let candidate = next + pos + 1;
            if candidate < end {
                next = ceil_char_boundary(text, candidate);
            }
        }
        start = next;
    }

    windows
}

/// Pulls `ideal_end` back to the nearest sentence end, else whitespace,
/// within `lookbehind` bytes. Falls back to the raw position (a mid-word
/// split) only when no boundary exists in range.
fn snap_end(text: &str, start: usize, ideal_end: usize, lookbehind: usize) -> usize {
    let floor = ceil_char_boundary(text, ideal_end.saturating_sub(lookbehind).max(start + 1));
    if floor >= ideal_end {
        return ideal_end;
    }
    let window = &text[floor..ideal_end];

    let sentence_end = window
        .char_indices()
        .filter(|&(i, c)| {
            matches!(c, '.' | '!' | '?' | '\n')
                && text[floor + i + c.len_utf8()..]
                    .chars()
                    .next()
                    .map(|next| next.is_whitespace())
                    .unwrap_or(true)
        })
        .map(|(i, c)| floor + i + c.len_utf8())
        .last();
    if let Some(end) = sentence_end {
        return end;
    }

    let word_end = window
        .char_indices()
        .filter(|(_, c)| c.is_whitespace())
        .map(|(i, c)| floor + i + c.len_utf8())
        .last();
    if let Some(end) = word_end {
        return end;
    }

    ideal_end
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while index < s.len() && !s.is_char_boundary(index) {
        index += 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size: size,
            chunk_overlap: overlap,
        }
    }

    const DOC: &str = "\
Title: Intro to MCP
Instructor: Jane Doe
Link: https://example.com/courses/mcp

This course introduces the protocol.

## Lesson 0: Welcome
Link: https://example.com/courses/mcp/lesson-0
Welcome to the course. We cover the basics here.

## Lesson 1: Architecture
The architecture lesson explains clients and servers in depth.
";

    #[test]
    fn test_parse_header_and_lessons() {
        let (course, chunks) = parse_course_document(DOC, &config(800, 100)).unwrap();
        assert_eq!(course.title, "Intro to MCP");
        assert_eq!(course.instructor, "Jane Doe");
        assert!(course.link.is_some());
        assert_eq!(course.lessons.len(), 2);
        assert_eq!(course.lessons[0].number, 0);
        assert_eq!(course.lessons[0].title, "Welcome");
        assert!(course.lessons[0].link.is_some());
        assert_eq!(course.lessons[1].number, 1);
        assert!(course.lessons[1].link.is_none());
        assert!(!chunks.is_empty());
    }

    #[test]
    fn test_intro_chunk_has_no_lesson_number() {
        let (_, chunks) = parse_course_document(DOC, &config(800, 100)).unwrap();
        assert_eq!(chunks[0].lesson_number, None);
        assert!(chunks[0].content.contains("introduces the protocol"));
        assert!(chunks.iter().any(|c| c.lesson_number == Some(1)));
    }

    #[test]
    fn test_chunk_index_strictly_increasing() {
        let (_, chunks) = parse_course_document(DOC, &config(40, 10)).unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i as u32);
        }
    }

    #[test]
    fn test_missing_title_is_parse_error() {
        let doc = "Instructor: Jane\n\n## Lesson 0: A\nBody.\n";
        let err = parse_course_document(doc, &config(800, 100)).unwrap_err();
        assert!(err.to_string().contains("'Title'"));
    }

    #[test]
    fn test_missing_instructor_is_parse_error() {
        let doc = "Title: Some Course\n\n## Lesson 0: A\nBody.\n";
        let err = parse_course_document(doc, &config(800, 100)).unwrap_err();
        assert!(err.to_string().contains("'Instructor'"));
    }

    #[test]
    fn test_no_lessons_is_parse_error() {
        let doc = "Title: Some Course\nInstructor: Jane\n\nJust a preamble.\n";
        let err = parse_course_document(doc, &config(800, 100)).unwrap_err();
        assert!(err.to_string().contains("no lesson sections"));
    }

    #[test]
    fn test_unnumbered_headers_get_sequential_numbers() {
        let doc = "Title: T\nInstructor: I\n\n## First\nBody one.\n\n## Second\nBody two.\n";
        let (course, _) = parse_course_document(doc, &config(800, 100)).unwrap();
        assert_eq!(course.lessons[0].number, 0);
        assert_eq!(course.lessons[1].number, 1);
        assert_eq!(course.lessons[0].title, "First");
    }

    #[test]
    fn test_windows_cover_every_byte() {
        let text = "The quick brown fox jumps over the lazy dog. \
                    Pack my box with five dozen liquor jugs. \
                    Sphinx of black quartz, judge my vow.";
        let windows = chunk_windows(text, &config(40, 10));
        assert!(windows.len() > 1);

        // Coverage: each window starts at or before the previous end.
        let mut covered_to = 0usize;
        for (offset, window) in &windows {
            assert!(*offset <= covered_to, "gap before offset {offset}");
            assert_eq!(&text[*offset..*offset + window.len()], window.as_str());
            covered_to = covered_to.max(offset + window.len());
        }
        assert_eq!(covered_to, text.len());
    }

    #[test]
    fn test_windows_prefer_sentence_boundaries() {
        let text = "This is sentence number one. And then more text follows here, on and on.";
        let windows = chunk_windows(text, &config(30, 8));
        assert_eq!(windows[0].1, "This is sentence number one.");
    }

    #[test]
    fn test_windows_deterministic() {
        let text = "Alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu.";
        let a = chunk_windows(text, &config(25, 8));
        let b = chunk_windows(text, &config(25, 8));
        assert_eq!(a, b);
    }

    #[test]
    fn test_windows_offsets_monotonic() {
        let text = "word ".repeat(100);
        let windows = chunk_windows(&text, &config(40, 10));
        for pair in windows.windows(2) {
            assert!(pair[1].0 > pair[0].0);
        }
    }

    #[test]
    fn test_windows_multibyte_safe() {
        let text = "naïve café résumé — σπίτι μου ωραίο. ".repeat(10);
        let windows = chunk_windows(&text, &config(30, 10));
        let mut covered_to = 0usize;
        for (offset, window) in &windows {
            assert!(*offset <= covered_to);
            covered_to = covered_to.max(offset + window.len());
        }
        assert_eq!(covered_to, text.len());
    }

    #[test]
    fn test_short_text_single_window() {
        let windows = chunk_windows("short", &config(800, 100));
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0], (0, "short".to_string()));
    }

    #[test]
    fn test_empty_text_no_windows() {
        assert!(chunk_windows("", &config(800, 100)).is_empty());
    }
}

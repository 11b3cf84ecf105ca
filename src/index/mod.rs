//! Two-collection vector index for course search
//!
//! Wraps the embedding engine behind two logical collections:
//!
//! - **catalog** — one semantic descriptor record per course, used for
//!   course-name resolution and outline retrieval, never for content
//!   answers.
//! - **content** — one record per text chunk, queried by semantic
//!   similarity with optional course/lesson metadata filters.
//!
//! Distances are normalized to `[0, 1]` (0 = identical, 1 = no overlap).
//! Any engine or embedder failure during a query is converted into
//! `CoursemateError::Search` at this boundary; callers never see a raw
//! engine error.
//!
//! Stored record metadata never contains JSON nulls: optional fields are
//! omitted entirely, and the collection layer rejects records that carry
//! a null value.

pub mod embedding;

use crate::document::{Chunk, Course};
use crate::error::{CoursemateError, Result};
use embedding::{cosine_similarity, Embedder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::{Arc, RwLock};
use tracing::debug;
use url::Url;

/// Metadata stored with each content-chunk record.
///
/// `lesson_number` is omitted (not null) for course-intro chunks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    pub course_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_number: Option<u32>,
    pub chunk_index: u32,
}

/// Per-lesson entry inside a catalog record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LessonMeta {
    pub number: u32,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Url>,
}

/// Catalog metadata for one course: everything the outline tool needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub title: String,
    pub instructor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Url>,
    pub lesson_count: usize,
    pub lessons: Vec<LessonMeta>,
}

impl CatalogEntry {
    /// Builds the catalog entry for a parsed course.
    pub fn from_course(course: &Course) -> Self {
        Self {
            title: course.title.clone(),
            instructor: course.instructor.clone(),
            link: course.link.clone(),
            lesson_count: course.lessons.len(),
            lessons: course
                .lessons
                .iter()
                .map(|lesson| LessonMeta {
                    number: lesson.number,
                    title: lesson.title.clone(),
                    link: lesson.link.clone(),
                })
                .collect(),
        }
    }

    /// The semantic descriptor text embedded for name resolution.
    fn descriptor(&self) -> String {
        let mut parts = vec![self.title.clone(), self.instructor.clone()];
        parts.extend(self.lessons.iter().map(|l| l.title.clone()));
        parts.join(" ")
    }
}

/// One hit from a content query, best match first.
#[derive(Debug, Clone)]
pub struct ContentHit {
    pub content: String,
    pub metadata: ChunkMetadata,
    pub distance: f32,
}

/// Metadata filters for content queries; all present filters must match.
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    pub course_title: Option<String>,
    pub lesson_number: Option<u32>,
}

/// A stored record: source text, null-free metadata, embedding vector.
struct Record {
    id: String,
    document: String,
    metadata: Map<String, Value>,
    vector: Vec<f32>,
}

/// A named record collection over the embedding engine.
struct Collection {
    name: &'static str,
    records: RwLock<Vec<Record>>,
}

impl Collection {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            records: RwLock::new(Vec::new()),
        }
    }

    /// Inserts a record, rejecting null-valued metadata.
    fn insert(&self, record: Record) -> Result<()> {
        if let Some(key) = find_null_key(&record.metadata) {
            return Err(CoursemateError::Search(format!(
                "collection '{}' rejects null metadata value for key '{}'",
                self.name, key
            ))
            .into());
        }
        let mut records = self
            .records
            .write()
            .map_err(|_| CoursemateError::Search(format!("collection '{}' lock poisoned", self.name)))?;
        records.push(record);
        Ok(())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<Record>>> {
        self.records
            .read()
            .map_err(|_| CoursemateError::Search(format!("collection '{}' lock poisoned", self.name)).into())
    }
}

/// Reports the first null-valued key in a metadata tree, if any.
fn find_null_key(metadata: &Map<String, Value>) -> Option<String> {
    for (key, value) in metadata {
        match value {
            Value::Null => return Some(key.clone()),
            Value::Object(nested) => {
                if let Some(inner) = find_null_key(nested) {
                    return Some(format!("{key}.{inner}"));
                }
            }
            Value::Array(items) => {
                for item in items {
                    if let Value::Object(nested) = item {
                        if let Some(inner) = find_null_key(nested) {
                            return Some(format!("{key}.{inner}"));
                        }
                    } else if item.is_null() {
                        return Some(key.clone());
                    }
                }
            }
            _ => {}
        }
    }
    None
}

fn to_metadata_map<T: Serialize>(value: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(value).map_err(CoursemateError::Serialization)? {
        Value::Object(map) => Ok(map),
        other => Err(CoursemateError::Search(format!(
            "metadata must serialize to an object, got {other}"
        ))
        .into()),
    }
}

/// The two-collection vector index.
///
/// Read queries take shared locks only and never hold a lock across an
/// await point. Ingestion is expected to complete before query traffic
/// begins (startup precondition, not enforced here).
pub struct VectorIndex {
    embedder: Arc<dyn Embedder>,
    catalog: Collection,
    content: Collection,
    resolution_threshold: f32,
}

impl VectorIndex {
    /// Creates an empty index over the given embedder.
    ///
    /// `resolution_threshold` is the maximum distance accepted when
    /// resolving a course-name fragment (see [`resolve_course_name`]).
    ///
    /// [`resolve_course_name`]: VectorIndex::resolve_course_name
    pub fn new(embedder: Arc<dyn Embedder>, resolution_threshold: f32) -> Self {
        Self {
            embedder,
            catalog: Collection::new("course_catalog"),
            content: Collection::new("course_content"),
            resolution_threshold,
        }
    }

    /// Adds one course to the catalog collection.
    ///
    /// Appends unconditionally; the ingestion driver is responsible for
    /// checking [`course_titles`] first to keep ingestion idempotent.
    ///
    /// [`course_titles`]: VectorIndex::course_titles
    pub async fn upsert_course(&self, course: &Course) -> Result<()> {
        let entry = CatalogEntry::from_course(course);
        let descriptor = entry.descriptor();
        let vector = self
            .embedder
            .embed(&descriptor)
            .await
            .map_err(|e| CoursemateError::Search(format!("embedding failed: {e}")))?;
        self.catalog.insert(Record {
            id: entry.title.clone(),
            document: descriptor,
            metadata: to_metadata_map(&entry)?,
            vector,
        })
    }

    /// Appends chunk records to the content collection.
    pub async fn upsert_chunks(&self, chunks: &[Chunk]) -> Result<()> {
        for chunk in chunks {
            let vector = self
                .embedder
                .embed(&chunk.content)
                .await
                .map_err(|e| CoursemateError::Search(format!("embedding failed: {e}")))?;
            let metadata = ChunkMetadata {
                course_title: chunk.course_title.clone(),
                lesson_number: chunk.lesson_number,
                chunk_index: chunk.chunk_index,
            };
            self.content.insert(Record {
                id: format!("{}:{}", chunk.course_title, chunk.chunk_index),
                document: chunk.content.clone(),
                metadata: to_metadata_map(&metadata)?,
                vector,
            })?;
        }
        Ok(())
    }

    /// Semantic nearest-neighbor search over content chunks.
    ///
    /// Restricted to records matching all given filters; ordered by
    /// ascending distance. Hits with no semantic overlap at all are
    /// excluded, and an empty vector (not an error) is returned when
    /// nothing matches.
    pub async fn query_content(
        &self,
        query_text: &str,
        filters: &ContentFilter,
        limit: usize,
    ) -> Result<Vec<ContentHit>> {
        let query_vector = self
            .embedder
            .embed(query_text)
            .await
            .map_err(|e| CoursemateError::Search(format!("embedding failed: {e}")))?;

        let records = self.content.read()?;
        let mut hits: Vec<ContentHit> = records
            .iter()
            .filter(|record| {
                if let Some(course_title) = &filters.course_title {
                    if record.metadata.get("course_title").and_then(Value::as_str)
                        != Some(course_title.as_str())
                    {
                        return false;
                    }
                }
                if let Some(lesson_number) = filters.lesson_number {
                    if record.metadata.get("lesson_number").and_then(Value::as_u64)
                        != Some(u64::from(lesson_number))
                    {
                        return false;
                    }
                }
                true
            })
            .filter_map(|record| {
                let distance = 1.0 - cosine_similarity(&query_vector, &record.vector);
                // A full-distance hit shares nothing with the query.
                if distance >= 1.0 {
                    return None;
                }
                let metadata: ChunkMetadata =
                    serde_json::from_value(Value::Object(record.metadata.clone())).ok()?;
                Some(ContentHit {
                    content: record.document.clone(),
                    metadata,
                    distance,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);
        Ok(hits)
    }

    /// Finds the best-matching catalog entry for a name fragment.
    pub async fn query_catalog(&self, name_fragment: &str) -> Result<Option<(String, CatalogEntry, f32)>> {
        let query_vector = self
            .embedder
            .embed(name_fragment)
            .await
            .map_err(|e| CoursemateError::Search(format!("embedding failed: {e}")))?;

        let records = self.catalog.read()?;
        let best = records
            .iter()
            .map(|record| {
                let distance = 1.0 - cosine_similarity(&query_vector, &record.vector);
                (record, distance)
            })
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        match best {
            Some((record, distance)) => {
                let entry: CatalogEntry =
                    serde_json::from_value(Value::Object(record.metadata.clone()))
                        .map_err(|e| CoursemateError::Search(format!("corrupt catalog record: {e}")))?;
                Ok(Some((record.id.clone(), entry, distance)))
            }
            None => Ok(None),
        }
    }

    /// Resolves a user-supplied course name fragment to its canonical
    /// stored title.
    ///
    /// Rejects a best match whose distance reaches the resolution
    /// threshold: an imprecise name must map to a genuinely similar
    /// course or to nothing, never to the nearest unrelated title.
    pub async fn resolve_course_name(&self, fragment: &str) -> Result<Option<String>> {
        match self.query_catalog(fragment).await? {
            Some((title, _, distance)) if distance < self.resolution_threshold => {
                debug!("Resolved course name '{}' -> '{}' (distance {:.3})", fragment, title, distance);
                Ok(Some(title))
            }
            Some((title, _, distance)) => {
                debug!(
                    "Rejected course name '{}': nearest '{}' at distance {:.3} >= {:.3}",
                    fragment, title, distance, self.resolution_threshold
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Lists stored canonical course titles in insertion order.
    pub fn course_titles(&self) -> Result<Vec<String>> {
        Ok(self.catalog.read()?.iter().map(|r| r.id.clone()).collect())
    }

    /// Exact-title catalog lookup.
    pub fn catalog_entry(&self, title: &str) -> Result<Option<CatalogEntry>> {
        let records = self.catalog.read()?;
        let Some(record) = records.iter().find(|r| r.id == title) else {
            return Ok(None);
        };
        let entry: CatalogEntry = serde_json::from_value(Value::Object(record.metadata.clone()))
            .map_err(|e| CoursemateError::Search(format!("corrupt catalog record: {e}")))?;
        Ok(Some(entry))
    }

    /// Catalog-backed lesson link lookup for source attribution.
    pub fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<Url>> {
        Ok(self.catalog_entry(course_title)?.and_then(|entry| {
            entry
                .lessons
                .iter()
                .find(|l| l.number == lesson_number)
                .and_then(|l| l.link.clone())
        }))
    }

    /// Record counts for the catalog and content collections.
    pub fn counts(&self) -> Result<(usize, usize)> {
        Ok((self.catalog.read()?.len(), self.content.read()?.len()))
    }
}

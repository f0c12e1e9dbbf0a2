//! Course vector store abstraction.
//!
//! The retrieval tools only see the [`VectorStore`] trait: semantic search over
//! lesson chunks with optional course/lesson filters, lesson link lookup and
//! course outlines. Backends decide how course names are resolved.

mod memory;

pub use memory::MemoryVectorStore;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A lesson within a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    /// Lesson number as it appears in the course.
    pub number: u32,
    /// Lesson title.
    pub title: String,
    /// Link to the lesson, if published.
    pub link: Option<String>,
}

/// Course-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Course title. Acts as the course identifier.
    pub title: String,
    /// Instructor name.
    pub instructor: Option<String>,
    /// Link to the course page.
    pub course_link: Option<String>,
    /// Lessons in course order.
    pub lessons: Vec<Lesson>,
}

/// A chunk of course text produced by document ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseChunk {
    /// Text content of this chunk.
    pub content: String,
    /// Title of the course this chunk belongs to.
    pub course_title: String,
    /// Lesson this chunk came from, if any.
    pub lesson_number: Option<u32>,
    /// Order of this chunk within the course.
    pub chunk_index: usize,
}

/// Metadata carried alongside each search hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub course_title: String,
    pub lesson_number: Option<u32>,
}

/// A matched chunk with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Matched text.
    pub content: String,
    pub metadata: ChunkMetadata,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Outcome of a search.
///
/// `error` is set when the request itself could not be resolved (for example
/// an unknown course name); empty `hits` without an error means no matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    pub error: Option<String>,
}

impl SearchResults {
    /// Results with no hits and no error.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Results describing a request that could not be resolved.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            hits: Vec::new(),
            error: Some(message.into()),
        }
    }

    /// Whether there are no hits.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Search parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    /// What to search for.
    pub query: String,
    /// Course name filter; may be partial.
    pub course_name: Option<String>,
    /// Lesson number filter.
    pub lesson_number: Option<u32>,
    /// Overrides the store's default result limit.
    pub limit: Option<usize>,
}

impl SearchRequest {
    /// Create an unfiltered search request.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Restrict the search to one course.
    pub fn with_course(mut self, course_name: impl Into<String>) -> Self {
        self.course_name = Some(course_name.into());
        self
    }

    /// Restrict the search to one lesson.
    pub fn with_lesson(mut self, lesson_number: u32) -> Self {
        self.lesson_number = Some(lesson_number);
        self
    }

    /// Override the result limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Trait for course vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store or replace a course's metadata, keyed by title.
    async fn add_course_metadata(&self, course: &Course) -> Result<()>;

    /// Store content chunks. Returns the number stored.
    async fn add_course_content(&self, chunks: &[CourseChunk]) -> Result<usize>;

    /// Semantic search over content chunks.
    async fn search(&self, request: &SearchRequest) -> Result<SearchResults>;

    /// Link for a lesson of an exactly named course.
    async fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>>;

    /// Outline of the course best matching `course_name`.
    async fn course_outline(&self, course_name: &str) -> Result<Option<Course>>;

    /// Titles of all known courses.
    async fn course_titles(&self) -> Result<Vec<String>>;

    /// Number of known courses.
    async fn course_count(&self) -> Result<usize> {
        Ok(self.course_titles().await?.len())
    }

    /// Remove all courses and content.
    async fn clear(&self) -> Result<()>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_search_request_builder() {
        let request = SearchRequest::new("embeddings")
            .with_course("RAG")
            .with_lesson(2)
            .with_limit(3);
        assert_eq!(request.query, "embeddings");
        assert_eq!(request.course_name.as_deref(), Some("RAG"));
        assert_eq!(request.lesson_number, Some(2));
        assert_eq!(request.limit, Some(3));
    }

    #[test]
    fn test_failed_results() {
        let results = SearchResults::failed("No course found matching 'X'");
        assert!(results.is_empty());
        assert_eq!(results.error.as_deref(), Some("No course found matching 'X'"));
        assert!(SearchResults::empty().error.is_none());
    }
}

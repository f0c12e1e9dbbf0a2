//! In-memory course vector store.
//!
//! Holds course metadata and embedded content chunks in process memory.
//! Useful for tests and small course catalogs.

use super::{
    cosine_similarity, ChunkMetadata, Course, CourseChunk, SearchHit, SearchRequest,
    SearchResults, VectorStore,
};
use crate::config::RetrievalSettings;
use crate::embedding::Embedder;
use crate::error::{KursError, Result};
use async_trait::async_trait;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, instrument};

struct StoredCourse {
    course: Course,
    title_embedding: Vec<f32>,
}

struct StoredChunk {
    chunk: CourseChunk,
    embedding: Vec<f32>,
}

/// In-memory vector store for courses.
pub struct MemoryVectorStore {
    embedder: Arc<dyn Embedder>,
    max_results: usize,
    course_match_threshold: f32,
    courses: RwLock<Vec<StoredCourse>>,
    chunks: RwLock<Vec<StoredChunk>>,
}

impl MemoryVectorStore {
    /// Create a new store with default retrieval settings.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self::from_settings(embedder, &RetrievalSettings::default())
    }

    /// Create a new store from the retrieval settings section.
    pub fn from_settings(embedder: Arc<dyn Embedder>, settings: &RetrievalSettings) -> Self {
        Self {
            embedder,
            max_results: settings.max_results,
            course_match_threshold: settings.course_match_threshold,
            courses: RwLock::new(Vec::new()),
            chunks: RwLock::new(Vec::new()),
        }
    }

    /// Set the default number of results per search.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Set the minimum similarity for fuzzy course-name matches.
    pub fn with_course_match_threshold(mut self, threshold: f32) -> Self {
        self.course_match_threshold = threshold;
        self
    }

    fn read_courses(&self) -> Result<RwLockReadGuard<'_, Vec<StoredCourse>>> {
        self.courses
            .read()
            .map_err(|_| KursError::VectorStore("course catalog lock poisoned".to_string()))
    }

    fn write_courses(&self) -> Result<RwLockWriteGuard<'_, Vec<StoredCourse>>> {
        self.courses
            .write()
            .map_err(|_| KursError::VectorStore("course catalog lock poisoned".to_string()))
    }

    fn read_chunks(&self) -> Result<RwLockReadGuard<'_, Vec<StoredChunk>>> {
        self.chunks
            .read()
            .map_err(|_| KursError::VectorStore("content lock poisoned".to_string()))
    }

    fn write_chunks(&self) -> Result<RwLockWriteGuard<'_, Vec<StoredChunk>>> {
        self.chunks
            .write()
            .map_err(|_| KursError::VectorStore("content lock poisoned".to_string()))
    }

    /// Resolve a possibly partial course name to a stored course title.
    ///
    /// Exact (case-insensitive) matches win, then substring matches in
    /// insertion order, then the most similar title above the threshold.
    async fn resolve_course(&self, course_name: &str) -> Result<Option<String>> {
        let needle = course_name.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(None);
        }

        {
            let courses = self.read_courses()?;
            if courses.is_empty() {
                return Ok(None);
            }
            if let Some(found) = courses
                .iter()
                .find(|c| c.course.title.to_lowercase() == needle)
                .or_else(|| {
                    courses
                        .iter()
                        .find(|c| c.course.title.to_lowercase().contains(&needle))
                })
            {
                return Ok(Some(found.course.title.clone()));
            }
        }

        let name_embedding = self.embedder.embed(course_name).await?;
        let courses = self.read_courses()?;
        let best = courses
            .iter()
            .map(|c| (c, cosine_similarity(&name_embedding, &c.title_embedding)))
            .filter(|(_, score)| *score >= self.course_match_threshold)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(best.map(|(c, score)| {
            debug!("Resolved course '{}' to '{}' ({:.2})", course_name, c.course.title, score);
            c.course.title.clone()
        }))
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn add_course_metadata(&self, course: &Course) -> Result<()> {
        let title_embedding = self.embedder.embed(&course.title).await?;
        let mut courses = self.write_courses()?;

        let stored = StoredCourse {
            course: course.clone(),
            title_embedding,
        };
        match courses.iter_mut().find(|c| c.course.title == course.title) {
            Some(existing) => *existing = stored,
            None => courses.push(stored),
        }
        Ok(())
    }

    async fn add_course_content(&self, chunks: &[CourseChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(KursError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let mut stored = self.write_chunks()?;
        stored.extend(
            chunks
                .iter()
                .cloned()
                .zip(embeddings)
                .map(|(chunk, embedding)| StoredChunk { chunk, embedding }),
        );
        Ok(chunks.len())
    }

    #[instrument(skip(self, request), fields(query = %request.query))]
    async fn search(&self, request: &SearchRequest) -> Result<SearchResults> {
        let course_title = match &request.course_name {
            Some(name) => match self.resolve_course(name).await? {
                Some(title) => Some(title),
                None => {
                    return Ok(SearchResults::failed(format!(
                        "No course found matching '{}'",
                        name
                    )))
                }
            },
            None => None,
        };

        let limit = request.limit.unwrap_or(self.max_results);
        if limit == 0 {
            return Ok(SearchResults::empty());
        }

        let query_embedding = self.embedder.embed(&request.query).await?;
        let chunks = self.read_chunks()?;

        let mut hits: Vec<SearchHit> = chunks
            .iter()
            .filter(|s| {
                course_title
                    .as_deref()
                    .map_or(true, |title| s.chunk.course_title == title)
            })
            .filter(|s| {
                request
                    .lesson_number
                    .map_or(true, |n| s.chunk.lesson_number == Some(n))
            })
            .map(|s| SearchHit {
                content: s.chunk.content.clone(),
                metadata: ChunkMetadata {
                    course_title: s.chunk.course_title.clone(),
                    lesson_number: s.chunk.lesson_number,
                },
                score: cosine_similarity(&query_embedding, &s.embedding),
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);

        debug!("Search matched {} chunks", hits.len());
        Ok(SearchResults { hits, error: None })
    }

    async fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>> {
        let courses = self.read_courses()?;
        Ok(courses
            .iter()
            .find(|c| c.course.title == course_title)
            .and_then(|c| c.course.lessons.iter().find(|l| l.number == lesson_number))
            .and_then(|l| l.link.clone()))
    }

    async fn course_outline(&self, course_name: &str) -> Result<Option<Course>> {
        let Some(title) = self.resolve_course(course_name).await? else {
            return Ok(None);
        };
        let courses = self.read_courses()?;
        Ok(courses
            .iter()
            .find(|c| c.course.title == title)
            .map(|c| c.course.clone()))
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        let courses = self.read_courses()?;
        Ok(courses.iter().map(|c| c.course.title.clone()).collect())
    }

    async fn clear(&self) -> Result<()> {
        self.write_courses()?.clear();
        self.write_chunks()?.clear();
        Ok(())
    }
}

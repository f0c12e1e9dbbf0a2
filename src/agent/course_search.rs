//! Content search over indexed course chunks.

use super::tools::{parse_arguments, ParameterKind, ParameterSpec, SourceRecord, Tool, ToolOutput, ToolSpecification};
use crate::error::Result;
use crate::vector_store::{SearchHit, SearchRequest, VectorStore};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Dispatch name of the content search tool.
pub const SEARCH_TOOL_NAME: &str = "search_course_content";

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    course_name: Option<String>,
    #[serde(default)]
    lesson_number: Option<u32>,
}

/// Searches course content and cites every matched chunk.
pub struct CourseSearchTool {
    store: Arc<dyn VectorStore>,
}

impl CourseSearchTool {
    /// Create a search tool over the given store.
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }

    /// Render hits as labeled blocks and collect one source per hit.
    async fn format_results(&self, hits: &[SearchHit]) -> ToolOutput {
        let mut blocks = Vec::with_capacity(hits.len());
        let mut sources = Vec::with_capacity(hits.len());

        for hit in hits {
            let course = if hit.metadata.course_title.is_empty() {
                "unknown"
            } else {
                hit.metadata.course_title.as_str()
            };

            let label = match hit.metadata.lesson_number {
                Some(lesson) => format!("{} - Lesson {}", course, lesson),
                None => course.to_string(),
            };

            let link = match hit.metadata.lesson_number {
                Some(lesson) => match self.store.lesson_link(course, lesson).await {
                    Ok(link) => link,
                    Err(e) => {
                        warn!("Lesson link lookup failed for {}: {}", label, e);
                        None
                    }
                },
                None => None,
            };

            blocks.push(format!("[{}]\n{}", label, hit.content));
            sources.push(SourceRecord::new(label).with_link(link));
        }

        ToolOutput::with_sources(blocks.join("\n\n"), sources)
    }
}

/// Message for a search with no matches, naming any filters that were applied.
fn no_content_message(course_name: Option<&str>, lesson_number: Option<u32>) -> String {
    let mut message = "No relevant content found".to_string();
    if let Some(course) = course_name {
        message.push_str(&format!(" in course '{}'", course));
    }
    if let Some(lesson) = lesson_number {
        message.push_str(&format!(" in lesson {}", lesson));
    }
    message.push('.');
    message
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn specification(&self) -> ToolSpecification {
        ToolSpecification::new(
            SEARCH_TOOL_NAME,
            "Search course materials with smart course name matching and lesson filtering",
        )
        .with_parameter(ParameterSpec::required(
            "query",
            ParameterKind::String,
            "What to search for in the course content",
        ))
        .with_parameter(ParameterSpec::optional(
            "course_name",
            ParameterKind::String,
            "Course title (partial matches work, e.g. 'MCP', 'Introduction')",
        ))
        .with_parameter(ParameterSpec::optional(
            "lesson_number",
            ParameterKind::Integer,
            "Specific lesson number to search within (e.g. 1, 2, 3)",
        ))
    }

    async fn execute(&self, args: &Value) -> Result<ToolOutput> {
        let args: SearchArgs = parse_arguments(SEARCH_TOOL_NAME, args)?;
        info!(
            "Searching course content: {:?} (course: {:?}, lesson: {:?})",
            args.query, args.course_name, args.lesson_number
        );

        let request = SearchRequest {
            query: args.query.clone(),
            course_name: args.course_name.clone(),
            lesson_number: args.lesson_number,
            limit: None,
        };

        let results = match self.store.search(&request).await {
            Ok(results) => results,
            Err(e) => return Ok(ToolOutput::text(format!("Search error: {}", e))),
        };

        if let Some(error) = results.error {
            return Ok(ToolOutput::text(error));
        }

        if results.is_empty() {
            return Ok(ToolOutput::text(no_content_message(
                args.course_name.as_deref(),
                args.lesson_number,
            )));
        }

        Ok(self.format_results(&results.hits).await)
    }
}

//! Course outline lookup.

use super::tools::{parse_arguments, ParameterKind, ParameterSpec, Tool, ToolOutput, ToolSpecification};
use crate::error::Result;
use crate::vector_store::{Course, VectorStore};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

/// Dispatch name of the outline tool.
pub const OUTLINE_TOOL_NAME: &str = "get_course_outline";

#[derive(Debug, Deserialize)]
struct OutlineArgs {
    course_name: String,
}

/// Returns a course's title, instructor, link and lesson list.
///
/// Outlines are structural metadata, so this tool never cites sources.
pub struct CourseOutlineTool {
    store: Arc<dyn VectorStore>,
}

impl CourseOutlineTool {
    /// Create an outline tool over the given store.
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }
}

fn format_outline(course: &Course) -> String {
    let mut lines = vec![format!("Course Title: {}", course.title)];
    if let Some(instructor) = &course.instructor {
        lines.push(format!("Instructor: {}", instructor));
    }
    if let Some(link) = &course.course_link {
        lines.push(format!("Course Link: {}", link));
    }
    lines.push(String::new());

    if course.lessons.is_empty() {
        lines.push("Lessons: none listed".to_string());
    } else {
        lines.push(format!("Lessons ({} total):", course.lessons.len()));
        let mut lessons: Vec<_> = course.lessons.iter().collect();
        lessons.sort_by_key(|l| l.number);
        for lesson in lessons {
            match &lesson.link {
                Some(link) => lines.push(format!("Lesson {}: {} ({})", lesson.number, lesson.title, link)),
                None => lines.push(format!("Lesson {}: {}", lesson.number, lesson.title)),
            }
        }
    }

    lines.join("\n")
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn specification(&self) -> ToolSpecification {
        ToolSpecification::new(
            OUTLINE_TOOL_NAME,
            "Get a course outline: title, instructor, course link and the complete numbered lesson list",
        )
        .with_parameter(ParameterSpec::required(
            "course_name",
            ParameterKind::String,
            "Course title (partial matches work)",
        ))
    }

    async fn execute(&self, args: &Value) -> Result<ToolOutput> {
        let args: OutlineArgs = parse_arguments(OUTLINE_TOOL_NAME, args)?;
        info!("Fetching outline for course {:?}", args.course_name);

        let content = match self.store.course_outline(&args.course_name).await {
            Ok(Some(course)) => format_outline(&course),
            Ok(None) => format!("No course found matching '{}'", args.course_name),
            Err(e) => format!("Outline error: {}", e),
        };

        Ok(ToolOutput::text(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{populated_store, sample_course};
    use serde_json::json;

    #[test]
    fn test_format_outline() {
        let outline = format_outline(&sample_course());
        assert_eq!(
            outline,
            "Course Title: RAG System Fundamentals\n\
             Instructor: Dr. AI Expert\n\
             Course Link: https://example.com/course\n\
             \n\
             Lessons (3 total):\n\
             Lesson 1: Introduction to RAG (https://example.com/lesson1)\n\
             Lesson 2: Vector Databases (https://example.com/lesson2)\n\
             Lesson 3: Advanced Techniques"
        );
    }

    #[test]
    fn test_format_outline_without_lessons() {
        let course = Course {
            title: "Empty".to_string(),
            instructor: None,
            course_link: None,
            lessons: Vec::new(),
        };
        assert_eq!(format_outline(&course), "Course Title: Empty\n\nLessons: none listed");
    }

    #[tokio::test]
    async fn test_execute_partial_name() {
        let tool = CourseOutlineTool::new(populated_store().await);
        let output = tool.execute(&json!({"course_name": "rag system"})).await.unwrap();

        assert!(output.content.starts_with("Course Title: RAG System Fundamentals"));
        assert!(output.sources.is_empty());
    }

    #[tokio::test]
    async fn test_execute_unknown_course() {
        let tool = CourseOutlineTool::new(populated_store().await);
        let output = tool.execute(&json!({"course_name": "Cooking"})).await.unwrap();

        assert_eq!(output.content, "No course found matching 'Cooking'");
        assert!(output.sources.is_empty());
    }

    #[tokio::test]
    async fn test_specification_requires_course_name() {
        let tool = CourseOutlineTool::new(populated_store().await);
        let schema = tool.specification().input_schema();
        assert_eq!(schema["required"], json!(["course_name"]));
    }
}

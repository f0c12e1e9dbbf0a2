//! Answers and catalog summaries returned to callers.

use crate::agent::SourceRecord;
use serde::{Deserialize, Serialize};

/// An answer with the sources it cites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Deduplicated sources, packed as `label` or `label|LINK:url`.
    pub sources: Vec<String>,
    /// Session the exchange was recorded under.
    pub session_id: String,
}

impl RagResponse {
    /// Format the response for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();

        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            for packed in &self.sources {
                let source = SourceRecord::unpack(packed);
                output.push_str(&format!("\n{}", source.label));
                if let Some(link) = &source.link {
                    output.push_str(&format!("\n  {}", link));
                }
            }
        }

        output
    }
}

/// Summary of the indexed course catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

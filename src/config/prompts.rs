//! Prompt templates for Kurs.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use super::settings::Settings;
use std::collections::HashMap;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub assistant: AssistantPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for the tool-calling course assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantPrompts {
    /// Static behavioral instructions sent as the system prompt on every round.
    pub system: String,
    /// Heading placed before the prior-conversation summary in the system prompt.
    pub history_heading: String,
    /// Wrapper applied to the raw user question. Uses `{{query}}`.
    pub query_template: String,
}

impl Default for AssistantPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an assistant for course materials and educational content. You can call tools that look up course information.

Tools:
- Content search: use it for questions about what a course or lesson actually teaches
- Course outline: use it for questions about course structure, lesson lists, or overviews
- You may call tools over up to two rounds; use what the first round returns to plan the second
- Different tools can be combined to build a complete answer
- Base answers on tool results; if the tools return nothing relevant, say so plainly and do not suggest alternatives

How to respond:
- General knowledge questions: answer from your own knowledge, without tools
- Course content questions: search the content, optionally check the outline for context
- Course structure questions: use the outline, optionally search content for details
- Never describe your reasoning, the tools, or the search process
- Never write phrases like "according to the search results"

Outline answers must include:
- Course title and instructor
- Course link, if there is one
- Every lesson with its number and title
- Lesson links, if there are any

Keep every answer brief, educational, and clear. Add an example only when it helps understanding. Answer exactly what was asked."#
                .to_string(),
            history_heading: "Previous conversation:".to_string(),
            query_template: "Answer this question about course materials: {{query}}".to_string(),
        }
    }
}

impl AssistantPrompts {
    /// Compose the system instructions for one run, appending the prior-turn
    /// summary under its heading when one is present.
    pub fn system_with_history(&self, summary: Option<&str>) -> String {
        match summary.filter(|s| !s.trim().is_empty()) {
            Some(summary) => format!("{}\n\n{}\n{}", self.system, self.history_heading, summary),
            None => self.system.clone(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let assistant_path = Settings::expand_path(dir).join("assistant.toml");
            if assistant_path.exists() {
                let content = std::fs::read_to_string(&assistant_path)?;
                prompts.assistant = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are replaced in a single left-to-right pass; substituted
    /// values are never scanned again. Unknown placeholders are kept as-is.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            let Some(end) = after.find("}}") else {
                rest = &rest[start..];
                break;
            };

            match vars.get(&after[..end]) {
                Some(value) => {
                    result.push_str(value);
                    rest = &after[end + 2..];
                }
                None => {
                    result.push_str("{{");
                    rest = after;
                }
            }
        }

        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// Wrap a raw user question in the configured query template.
    pub fn render_query(&self, query: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), query.to_string());
        self.render_with_custom(&self.assistant.query_template, &vars)
    }
}

//! Tool contract shared by every capability the model can call.

use crate::error::{KursError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Separator between a source label and its link in packed source strings.
pub const LINK_DELIMITER: &str = "|LINK:";

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParameterKind {
    fn as_str(&self) -> &'static str {
        match self {
            ParameterKind::String => "string",
            ParameterKind::Integer => "integer",
            ParameterKind::Number => "number",
            ParameterKind::Boolean => "boolean",
        }
    }
}

/// One parameter of a tool's input schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParameterKind,
    pub description: String,
    pub required: bool,
    pub default: Option<Value>,
}

impl ParameterSpec {
    /// A parameter the model must always supply.
    pub fn required(name: &str, kind: ParameterKind, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: description.to_string(),
            required: true,
            default: None,
        }
    }

    /// A parameter the model may omit.
    pub fn optional(name: &str, kind: ParameterKind, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    /// Advertise a default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Name, description and input schema of a tool, as shown to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpecification {
    /// Unique tool name; the dispatch key.
    pub name: String,
    /// Tells the model when the tool is useful.
    pub description: String,
    /// Parameters in declaration order.
    pub parameters: Vec<ParameterSpec>,
}

impl ToolSpecification {
    /// Create a specification with no parameters.
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters: Vec::new(),
        }
    }

    /// Add a parameter.
    pub fn with_parameter(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// JSON Schema object describing the tool's arguments.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.parameters {
            let mut property = json!({
                "type": param.kind.as_str(),
                "description": param.description,
            });
            if let Some(default) = &param.default {
                property["default"] = default.clone();
            }
            properties.insert(param.name.clone(), property);
        }

        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Where a piece of retrieved content came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Display label, e.g. `"Course Title - Lesson 2"`.
    pub label: String,
    /// Resolvable link for the label, if known.
    pub link: Option<String>,
}

impl SourceRecord {
    /// A source with no link.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            link: None,
        }
    }

    /// Attach a link.
    pub fn with_link(mut self, link: Option<String>) -> Self {
        self.link = link;
        self
    }

    /// Pack into the `label|LINK:url` display-string form.
    pub fn pack(&self) -> String {
        match &self.link {
            Some(link) => format!("{}{}{}", self.label, LINK_DELIMITER, link),
            None => self.label.clone(),
        }
    }

    /// Parse a packed source string. Strings without a link become label-only records.
    ///
    /// The link is taken after the last delimiter, so labels may contain the
    /// delimiter as long as a link follows.
    pub fn unpack(packed: &str) -> Self {
        match packed.rsplit_once(LINK_DELIMITER) {
            Some((label, link)) if !link.is_empty() => Self {
                label: label.to_string(),
                link: Some(link.to_string()),
            },
            Some((label, _)) => Self::new(label),
            None => Self::new(packed),
        }
    }
}

impl fmt::Display for SourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// What a tool hands back from one execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    /// Rendered text for the model.
    pub content: String,
    /// Sources produced by this execution only.
    pub sources: Vec<SourceRecord>,
}

impl ToolOutput {
    /// Output with no sources.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sources: Vec::new(),
        }
    }

    /// Output that cites sources.
    pub fn with_sources(content: impl Into<String>, sources: Vec<SourceRecord>) -> Self {
        Self {
            content: content.into(),
            sources,
        }
    }
}

/// A named, schema-described capability the model can invoke.
///
/// Failures of the underlying lookup (unknown course, backend errors, empty
/// results) must be rendered into the output text. `Err` is reserved for
/// arguments that cannot be understood at all; the tool loop treats it as a
/// failure of the whole round.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's specification. Pure.
    fn specification(&self) -> ToolSpecification;

    /// Run the tool with arguments keyed by parameter name.
    async fn execute(&self, args: &Value) -> Result<ToolOutput>;
}

/// Deserialize tool arguments into a typed struct.
pub fn parse_arguments<T: DeserializeOwned>(tool: &str, args: &Value) -> Result<T> {
    serde_json::from_value(args.clone()).map_err(|e| KursError::ToolArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_schema() {
        let spec = ToolSpecification::new("search_course_content", "Search course materials")
            .with_parameter(ParameterSpec::required("query", ParameterKind::String, "What to search for"))
            .with_parameter(
                ParameterSpec::optional("lesson_number", ParameterKind::Integer, "Lesson filter")
                    .with_default(json!(1)),
            );

        let schema = spec.input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["query"]["type"], "string");
        assert_eq!(schema["properties"]["lesson_number"]["type"], "integer");
        assert_eq!(schema["properties"]["lesson_number"]["default"], 1);
        assert_eq!(schema["required"], json!(["query"]));
    }

    #[test]
    fn test_source_pack_unpack() {
        let source = SourceRecord::new("RAG Course - Lesson 2")
            .with_link(Some("https://example.com/lesson2".to_string()));
        let packed = source.pack();
        assert_eq!(packed, "RAG Course - Lesson 2|LINK:https://example.com/lesson2");
        assert_eq!(SourceRecord::unpack(&packed), source);
    }

    #[test]
    fn test_label_containing_delimiter_keeps_link() {
        let source = SourceRecord::new("Pipes |LINK: and links - Lesson 1")
            .with_link(Some("https://example.com/pipes".to_string()));
        let unpacked = SourceRecord::unpack(&source.pack());
        assert_eq!(unpacked, source);
    }

    #[test]
    fn test_source_without_link() {
        let source = SourceRecord::new("RAG Course");
        assert_eq!(source.pack(), "RAG Course");
        assert_eq!(SourceRecord::unpack("RAG Course"), source);
        assert_eq!(SourceRecord::unpack("RAG Course|LINK:"), source);
        assert_eq!(source.to_string(), "RAG Course");
    }

    #[test]
    fn test_parse_arguments_error_names_tool() {
        #[derive(Debug, Deserialize)]
        struct Args {
            #[allow(dead_code)]
            query: String,
        }

        let err = parse_arguments::<Args>("search_course_content", &json!({"q": 1})).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("search_course_content"));
        assert!(message.contains("query"));
    }
}

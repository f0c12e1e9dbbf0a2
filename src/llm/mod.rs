//! Provider-neutral chat model interface.
//!
//! The tool loop speaks in [`Turn`]s made of [`ContentBlock`]s and asks an
//! [`LlmClient`] for one completion per round. Provider clients translate
//! these types to and from their wire formats.

mod openai;

pub use openai::OpenAIChatClient;

use crate::agent::ToolSpecification;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Provider-generated call identifier, echoed back in the result.
    pub id: String,
    /// Name of the tool to run.
    pub name: String,
    /// Arguments keyed by parameter name.
    pub input: Value,
}

/// The rendered outcome of one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Identifier of the originating [`ToolCallRequest`].
    pub tool_use_id: String,
    /// Tool output, success or error, always text.
    pub content: String,
}

/// One block of turn content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ToolUse(ToolCallRequest),
    ToolResult(ToolResult),
}

/// A single conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Turn {
    /// A user turn holding plain text.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// An assistant turn replaying the model's own content blocks.
    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }

    /// A user turn carrying the results of one round of tool calls.
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self {
            role: Role::User,
            content: results.into_iter().map(ContentBlock::ToolResult).collect(),
        }
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model finished its answer.
    EndTurn,
    /// The model wants one or more tools run before continuing.
    ToolUse,
    /// The output token limit was hit.
    MaxTokens,
    /// Anything else the provider reports.
    Other,
}

/// How the model may pick tools from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoice {
    /// The model decides whether to call a tool.
    Auto,
    /// The model must call some tool.
    Required,
}

/// A single completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// System instructions.
    pub system: String,
    /// The conversation so far, oldest first.
    pub turns: Vec<Turn>,
    /// Tool menu; empty means tools are unavailable for this call.
    pub tools: Vec<ToolSpecification>,
    /// Selection mode; `None` whenever `tools` is empty.
    pub tool_choice: Option<ToolChoice>,
}

/// A completion returned by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    pub stop_reason: StopReason,
    pub content: Vec<ContentBlock>,
}

impl ModelResponse {
    /// A plain text answer.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            stop_reason: StopReason::EndTurn,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// Concatenated text blocks, or `None` if the response has no text.
    pub fn text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }

    /// Tool calls in the order the model listed them.
    pub fn tool_calls(&self) -> Vec<&ToolCallRequest> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse(call) => Some(call),
                _ => None,
            })
            .collect()
    }
}

/// Trait for chat model providers.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run one completion.
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_accessors() {
        let response = ModelResponse {
            stop_reason: StopReason::ToolUse,
            content: vec![
                ContentBlock::Text {
                    text: "Looking that up.".to_string(),
                },
                ContentBlock::ToolUse(ToolCallRequest {
                    id: "call_1".to_string(),
                    name: "search_course_content".to_string(),
                    input: json!({"query": "embeddings"}),
                }),
                ContentBlock::ToolUse(ToolCallRequest {
                    id: "call_2".to_string(),
                    name: "get_course_outline".to_string(),
                    input: json!({"course_name": "RAG"}),
                }),
            ],
        };

        assert_eq!(response.text().as_deref(), Some("Looking that up."));
        let ids: Vec<&str> = response.tool_calls().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["call_1", "call_2"]);
    }

    #[test]
    fn test_response_without_text() {
        let response = ModelResponse {
            stop_reason: StopReason::ToolUse,
            content: vec![ContentBlock::ToolUse(ToolCallRequest {
                id: "call_1".to_string(),
                name: "x".to_string(),
                input: json!({}),
            })],
        };
        assert!(response.text().is_none());
    }

    #[test]
    fn test_tool_results_turn() {
        let turn = Turn::tool_results(vec![
            ToolResult {
                tool_use_id: "a".to_string(),
                content: "one".to_string(),
            },
            ToolResult {
                tool_use_id: "b".to_string(),
                content: "two".to_string(),
            },
        ]);
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content.len(), 2);
    }

    #[test]
    fn test_content_block_serialization() {
        let block = ContentBlock::ToolResult(ToolResult {
            tool_use_id: "call_1".to_string(),
            content: "done".to_string(),
        });
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "tool_result");
        assert_eq!(value["tool_use_id"], "call_1");
    }
}

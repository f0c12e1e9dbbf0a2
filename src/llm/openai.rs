//! OpenAI chat completions backend.

use super::{
    ContentBlock, LlmClient, ModelRequest, ModelResponse, Role, StopReason, ToolCallRequest,
    ToolChoice, Turn,
};
use crate::agent::ToolSpecification;
use crate::config::LlmSettings;
use crate::error::{KursError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionResponseMessage, ChatCompletionTool, ChatCompletionToolChoiceOption,
    ChatCompletionToolType, CreateChatCompletionRequestArgs, FinishReason, FunctionCall,
    FunctionObject,
};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

/// Chat model client backed by the OpenAI API.
pub struct OpenAIChatClient {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
}

impl OpenAIChatClient {
    /// Create a client using the timeout from the LLM settings.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(Duration::from_secs(settings.timeout_secs))?,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAIChatClient {
    #[instrument(skip(self, request), fields(model = %request.model, turns = request.turns.len(), tools = request.tools.len()))]
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&request.model)
            .messages(build_messages(&request.system, &request.turns)?)
            .temperature(request.temperature)
            .max_completion_tokens(request.max_tokens);

        if !request.tools.is_empty() {
            args.tools(build_tools(&request.tools));
            args.tool_choice(match request.tool_choice.unwrap_or(ToolChoice::Auto) {
                ToolChoice::Auto => ChatCompletionToolChoiceOption::Auto,
                ToolChoice::Required => ChatCompletionToolChoiceOption::Required,
            });
        }

        let chat_request = args.build().map_err(|e| KursError::Llm(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| KursError::OpenAI(format!("Chat completion failed: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| KursError::Llm("No response from model".to_string()))?;

        debug!("Model finished with {:?}", choice.finish_reason);
        Ok(convert_response(choice.message, choice.finish_reason))
    }
}

/// Translate system instructions and turns into chat messages.
///
/// Tool results become one `tool` message each, ahead of any text in the
/// same user turn.
fn build_messages(system: &str, turns: &[Turn]) -> Result<Vec<ChatCompletionRequestMessage>> {
    let mut messages: Vec<ChatCompletionRequestMessage> = vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(system.to_string())
            .build()
            .map_err(|e| KursError::Llm(e.to_string()))?
            .into(),
    ];

    for turn in turns {
        let mut texts = Vec::new();
        let mut tool_calls = Vec::new();

        for block in &turn.content {
            match block {
                ContentBlock::Text { text } => texts.push(text.as_str()),
                ContentBlock::ToolUse(call) => tool_calls.push(ChatCompletionMessageToolCall {
                    id: call.id.clone(),
                    r#type: ChatCompletionToolType::Function,
                    function: FunctionCall {
                        name: call.name.clone(),
                        arguments: call.input.to_string(),
                    },
                }),
                ContentBlock::ToolResult(result) => messages.push(
                    ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(result.tool_use_id.clone())
                        .content(result.content.clone())
                        .build()
                        .map_err(|e| KursError::Llm(e.to_string()))?
                        .into(),
                ),
            }
        }

        let text = texts.join("\n");
        match turn.role {
            Role::User => {
                if !text.is_empty() {
                    messages.push(
                        ChatCompletionRequestUserMessageArgs::default()
                            .content(text)
                            .build()
                            .map_err(|e| KursError::Llm(e.to_string()))?
                            .into(),
                    );
                }
            }
            Role::Assistant => {
                let mut assistant = ChatCompletionRequestAssistantMessageArgs::default();
                if !text.is_empty() {
                    assistant.content(text);
                }
                if !tool_calls.is_empty() {
                    assistant.tool_calls(tool_calls);
                }
                messages.push(
                    assistant
                        .build()
                        .map_err(|e| KursError::Llm(e.to_string()))?
                        .into(),
                );
            }
        }
    }

    Ok(messages)
}

/// Build function tools from tool specifications.
fn build_tools(specs: &[ToolSpecification]) -> Vec<ChatCompletionTool> {
    specs
        .iter()
        .map(|spec| ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: spec.name.clone(),
                description: Some(spec.description.clone()),
                parameters: Some(spec.input_schema()),
                strict: None,
            },
        })
        .collect()
}

fn convert_response(
    message: ChatCompletionResponseMessage,
    finish_reason: Option<FinishReason>,
) -> ModelResponse {
    let mut content = Vec::new();

    if let Some(text) = message.content.filter(|t| !t.is_empty()) {
        content.push(ContentBlock::Text { text });
    }

    let tool_calls = message.tool_calls.unwrap_or_default();
    let has_tool_calls = !tool_calls.is_empty();
    for call in tool_calls {
        // Malformed argument JSON is passed through as a string so the tool
        // rejects it when deserializing its arguments.
        let input = serde_json::from_str(&call.function.arguments)
            .unwrap_or(Value::String(call.function.arguments.clone()));
        content.push(ContentBlock::ToolUse(ToolCallRequest {
            id: call.id,
            name: call.function.name,
            input,
        }));
    }

    let stop_reason = match finish_reason {
        Some(FinishReason::ToolCalls) => StopReason::ToolUse,
        Some(FinishReason::Stop) => StopReason::EndTurn,
        Some(FinishReason::Length) => StopReason::MaxTokens,
        Some(_) => StopReason::Other,
        None if has_tool_calls => StopReason::ToolUse,
        None => StopReason::EndTurn,
    };

    ModelResponse {
        stop_reason,
        content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{ParameterKind, ParameterSpec};
    use crate::llm::ToolResult;
    use serde_json::json;

    #[test]
    fn test_build_messages_maps_tool_round() {
        let turns = vec![
            Turn::user_text("What is in lesson 2?"),
            Turn::assistant(vec![ContentBlock::ToolUse(ToolCallRequest {
                id: "call_1".to_string(),
                name: "search_course_content".to_string(),
                input: json!({"query": "lesson 2", "lesson_number": 2}),
            })]),
            Turn::tool_results(vec![ToolResult {
                tool_use_id: "call_1".to_string(),
                content: "[RAG - Lesson 2]\nVectors".to_string(),
            }]),
        ];

        let messages = build_messages("system prompt", &turns).unwrap();
        assert_eq!(messages.len(), 4);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        match &messages[2] {
            ChatCompletionRequestMessage::Assistant(msg) => {
                let calls = msg.tool_calls.as_ref().unwrap();
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].id, "call_1");
                let args: Value = serde_json::from_str(&calls[0].function.arguments).unwrap();
                assert_eq!(args["lesson_number"], 2);
            }
            other => panic!("Expected assistant message, got {:?}", other),
        }
        match &messages[3] {
            ChatCompletionRequestMessage::Tool(msg) => assert_eq!(msg.tool_call_id, "call_1"),
            other => panic!("Expected tool message, got {:?}", other),
        }
    }

    #[test]
    fn test_build_tools_uses_input_schema() {
        let spec = ToolSpecification::new("get_course_outline", "Outline of a course").with_parameter(
            ParameterSpec::required("course_name", ParameterKind::String, "Course title"),
        );

        let tools = build_tools(&[spec]);
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].function.name, "get_course_outline");
        let params = tools[0].function.parameters.as_ref().unwrap();
        assert_eq!(params["required"], json!(["course_name"]));
    }

    #[test]
    fn test_convert_response_with_tool_calls() {
        let message: ChatCompletionResponseMessage = serde_json::from_value(json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_9",
                "type": "function",
                "function": {"name": "search_course_content", "arguments": "{\"query\":\"rag\"}"}
            }]
        }))
        .unwrap();

        let response = convert_response(message, Some(FinishReason::ToolCalls));
        assert_eq!(response.stop_reason, StopReason::ToolUse);
        assert!(response.text().is_none());
        let calls = response.tool_calls();
        assert_eq!(calls[0].id, "call_9");
        assert_eq!(calls[0].input, json!({"query": "rag"}));
    }

    #[test]
    fn test_convert_response_text() {
        let message: ChatCompletionResponseMessage = serde_json::from_value(json!({
            "role": "assistant",
            "content": "Four."
        }))
        .unwrap();

        let response = convert_response(message, Some(FinishReason::Stop));
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.text().as_deref(), Some("Four."));
    }
}

//! Bounded tool-calling loop.
//!
//! Each round calls the model with the conversation so far. A response that
//! does not ask for tools ends the run. Otherwise every requested tool runs in
//! the listed order, the results go back as one user turn, and the next round
//! starts. After `max_tool_rounds` rounds the tools are withdrawn and one last
//! call forces a text answer, so a run makes at most `max_tool_rounds + 1`
//! model calls.

use super::registry::ToolRegistry;
use super::tools::ToolSpecification;
use crate::config::{AssistantPrompts, LlmSettings};
use crate::error::Result;
use crate::llm::{LlmClient, ModelRequest, ModelResponse, StopReason, ToolChoice, ToolResult, Turn};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Answer returned when a round of tool calls could not be executed.
pub const TOOL_FAILURE_MESSAGE: &str = "Tool execution failed";

/// Answer returned when the model asked for tools but produced no text and no
/// registry was available to run them.
const NO_RESPONSE_MESSAGE: &str = "No response";

/// Drives the model through up to `max_tool_rounds` tool rounds.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_tool_rounds: usize,
    prompts: AssistantPrompts,
}

impl Agent {
    /// Create an agent from the LLM settings section.
    pub fn new(llm: Arc<dyn LlmClient>, settings: &LlmSettings) -> Self {
        Self {
            llm,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            max_tool_rounds: settings.max_tool_rounds,
            prompts: AssistantPrompts::default(),
        }
    }

    /// Use custom assistant prompts.
    pub fn with_prompts(mut self, prompts: AssistantPrompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Set the round cap.
    pub fn with_max_tool_rounds(mut self, max: usize) -> Self {
        self.max_tool_rounds = max;
        self
    }

    /// Answer `query`, optionally seeded with a summary of earlier turns.
    ///
    /// Without a registry no tools are offered. Model errors propagate; tool
    /// problems never do. Sources are left in the registry for the caller to
    /// drain and reset.
    #[instrument(skip_all, fields(query = %query))]
    pub async fn run(
        &self,
        query: &str,
        summary: Option<&str>,
        mut tools: Option<&mut ToolRegistry>,
    ) -> Result<AgentResponse> {
        let system = self.prompts.system_with_history(summary);
        let mut turns = vec![Turn::user_text(query)];
        let mut tool_calls = Vec::new();
        let mut model_calls = 0;

        for round in 1..=self.max_tool_rounds {
            debug!("Tool round {}", round);

            let menu = tools
                .as_deref()
                .map(ToolRegistry::specifications)
                .unwrap_or_default();
            let response = self.call_model(&system, &turns, menu).await?;
            model_calls += 1;

            if response.stop_reason != StopReason::ToolUse {
                return Ok(AgentResponse::new(
                    response.text().unwrap_or_default(),
                    tool_calls,
                    model_calls,
                ));
            }

            let Some(registry) = tools.as_deref_mut() else {
                warn!("Model requested tools but none are available");
                let content = response
                    .text()
                    .unwrap_or_else(|| NO_RESPONSE_MESSAGE.to_string());
                return Ok(AgentResponse::new(content, tool_calls, model_calls));
            };

            let results = match execute_tools(&response, registry, &mut tool_calls).await {
                Ok(results) if !results.is_empty() => results,
                Ok(_) => {
                    warn!("Tool round {} produced no results", round);
                    return Ok(AgentResponse::new(TOOL_FAILURE_MESSAGE, tool_calls, model_calls));
                }
                Err(e) => {
                    warn!("Tool round {} failed: {}", round, e);
                    return Ok(AgentResponse::new(TOOL_FAILURE_MESSAGE, tool_calls, model_calls));
                }
            };

            turns.push(Turn::assistant(response.content));
            turns.push(Turn::tool_results(results));
        }

        info!(
            "Reached {} tool rounds, requesting final answer without tools",
            self.max_tool_rounds
        );
        let response = self.call_model(&system, &turns, Vec::new()).await?;
        model_calls += 1;

        Ok(AgentResponse::new(
            response.text().unwrap_or_default(),
            tool_calls,
            model_calls,
        ))
    }

    async fn call_model(
        &self,
        system: &str,
        turns: &[Turn],
        tools: Vec<ToolSpecification>,
    ) -> Result<ModelResponse> {
        let tool_choice = if tools.is_empty() {
            None
        } else {
            Some(ToolChoice::Auto)
        };

        let request = ModelRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            system: system.to_string(),
            turns: turns.to_vec(),
            tools,
            tool_choice,
        };

        self.llm.complete(&request).await
    }
}

/// Run every tool call of one response in order.
///
/// Any tool error abandons the whole round; results gathered so far are
/// discarded.
async fn execute_tools(
    response: &ModelResponse,
    registry: &mut ToolRegistry,
    records: &mut Vec<ToolCallRecord>,
) -> Result<Vec<ToolResult>> {
    let mut results = Vec::new();

    for call in response.tool_calls() {
        info!("Agent calling tool: {} [{}] with args: {}", call.name, call.id, call.input);

        let content = registry.dispatch(&call.name, &call.input).await?;

        records.push(ToolCallRecord {
            name: call.name.clone(),
            arguments: call.input.to_string(),
            result: content.clone(),
        });
        results.push(ToolResult {
            tool_use_id: call.id.clone(),
            content,
        });
    }

    Ok(results)
}

/// Response from an agent run.
#[derive(Debug)]
pub struct AgentResponse {
    /// The final answer text.
    pub content: String,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of model calls made.
    pub model_calls: usize,
}

impl AgentResponse {
    fn new(content: impl Into<String>, tool_calls: Vec<ToolCallRecord>, model_calls: usize) -> Self {
        Self {
            content: content.into(),
            tool_calls,
            model_calls,
        }
    }
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

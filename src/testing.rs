//! Deterministic fakes shared by unit tests.

use crate::agent::{parse_arguments, ParameterKind, ParameterSpec, SourceRecord, Tool, ToolOutput, ToolSpecification};
use crate::embedding::Embedder;
use crate::error::{KursError, Result};
use crate::llm::{ContentBlock, LlmClient, ModelRequest, ModelResponse, StopReason, ToolCallRequest};
use crate::vector_store::{Course, CourseChunk, Lesson, MemoryVectorStore, VectorStore};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Bag-of-words embedder: each lowercase alphanumeric token is hashed into
/// one of `dimensions` buckets.
pub struct KeywordEmbedder {
    dimensions: usize,
}

impl Default for KeywordEmbedder {
    fn default() -> Self {
        Self { dimensions: 256 }
    }
}

impl KeywordEmbedder {
    fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimensions];
        for token in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            // FNV-1a
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            vector[(hash % self.dimensions as u64) as usize] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Embedder whose backend is always down.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(KursError::Embedding("embedding service unavailable".to_string()))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(KursError::Embedding("embedding service unavailable".to_string()))
    }

    fn dimensions(&self) -> usize {
        0
    }
}

pub fn sample_course() -> Course {
    Course {
        title: "RAG System Fundamentals".to_string(),
        instructor: Some("Dr. AI Expert".to_string()),
        course_link: Some("https://example.com/course".to_string()),
        lessons: vec![
            Lesson {
                number: 1,
                title: "Introduction to RAG".to_string(),
                link: Some("https://example.com/lesson1".to_string()),
            },
            Lesson {
                number: 2,
                title: "Vector Databases".to_string(),
                link: Some("https://example.com/lesson2".to_string()),
            },
            Lesson {
                number: 3,
                title: "Advanced Techniques".to_string(),
                link: None,
            },
        ],
    }
}

pub fn sample_chunks() -> Vec<CourseChunk> {
    [
        "This is an introduction to RAG systems. RAG stands for Retrieval-Augmented Generation.",
        "Vector databases are essential for semantic search in RAG systems.",
        "Advanced RAG techniques include query expansion and result reranking.",
    ]
    .iter()
    .enumerate()
    .map(|(i, content)| CourseChunk {
        content: content.to_string(),
        course_title: "RAG System Fundamentals".to_string(),
        lesson_number: Some(i as u32 + 1),
        chunk_index: i,
    })
    .collect()
}

/// A keyword-embedded store holding the sample course.
pub async fn populated_store() -> Arc<MemoryVectorStore> {
    let store = MemoryVectorStore::new(Arc::new(KeywordEmbedder::default()));
    store.add_course_metadata(&sample_course()).await.unwrap();
    store.add_course_content(&sample_chunks()).await.unwrap();
    Arc::new(store)
}

#[derive(Deserialize)]
struct EchoArgs {
    text: String,
}

/// Echoes its `text` argument and cites it as a source.
pub struct EchoTool {
    name: String,
}

impl EchoTool {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl Tool for EchoTool {
    fn specification(&self) -> ToolSpecification {
        ToolSpecification::new(&self.name, "Echo the given text").with_parameter(
            ParameterSpec::required("text", ParameterKind::String, "Text to echo"),
        )
    }

    async fn execute(&self, args: &Value) -> Result<ToolOutput> {
        let args: EchoArgs = parse_arguments(&self.name, args)?;
        Ok(ToolOutput::with_sources(
            format!("{}: {}", self.name, args.text),
            vec![SourceRecord::new(format!("{}:{}", self.name, args.text))],
        ))
    }
}

/// A tool that rejects every call.
pub struct BrokenTool {
    name: String,
}

impl BrokenTool {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl Tool for BrokenTool {
    fn specification(&self) -> ToolSpecification {
        ToolSpecification::new(&self.name, "Always fails")
    }

    async fn execute(&self, _args: &Value) -> Result<ToolOutput> {
        Err(KursError::ToolArguments {
            tool: self.name.clone(),
            message: "broken".to_string(),
        })
    }
}

/// Replays queued responses and records every request it receives.
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<ModelResponse>>,
    requests: Mutex<Vec<ModelRequest>>,
    failure: Option<String>,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<ModelResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    /// A client whose every call fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(message) = &self.failure {
            return Err(KursError::Llm(message.clone()));
        }

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| KursError::Llm("script exhausted".to_string()))
    }
}

/// A response asking for the given `(id, name, input)` tool calls.
pub fn tool_use(calls: &[(&str, &str, Value)]) -> ModelResponse {
    ModelResponse {
        stop_reason: StopReason::ToolUse,
        content: calls
            .iter()
            .map(|(id, name, input)| {
                ContentBlock::ToolUse(ToolCallRequest {
                    id: id.to_string(),
                    name: name.to_string(),
                    input: input.clone(),
                })
            })
            .collect(),
    }
}

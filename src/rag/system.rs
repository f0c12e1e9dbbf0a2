//! Course question answering with cited sources.

use super::response::{CourseAnalytics, RagResponse};
use super::session::SessionManager;
use crate::agent::{Agent, CourseOutlineTool, CourseSearchTool, ToolRegistry};
use crate::config::{Prompts, Settings};
use crate::embedding::OpenAIEmbedder;
use crate::error::Result;
use crate::llm::{LlmClient, OpenAIChatClient};
use crate::vector_store::{Course, CourseChunk, MemoryVectorStore, VectorStore};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Wires the tool loop, course store and sessions together.
///
/// Answering needs `&mut self` because the tool registry tracks sources per
/// query. Share one system between tasks behind a `tokio::sync::Mutex`.
pub struct RagSystem {
    settings: Settings,
    prompts: Prompts,
    agent: Agent,
    store: Arc<dyn VectorStore>,
    registry: ToolRegistry,
    sessions: SessionManager,
}

impl RagSystem {
    /// Build the system from settings, backed by OpenAI and an in-memory store.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let llm = Arc::new(OpenAIChatClient::from_settings(&settings.llm)?);
        let embedder = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?);
        let store = Arc::new(MemoryVectorStore::from_settings(embedder, &settings.retrieval));

        Ok(Self::with_components(settings.clone(), prompts, llm, store))
    }

    /// Build the system from explicit components.
    ///
    /// The content search tool is registered before the outline tool, which
    /// fixes the order of the tool menu and of aggregated sources.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        llm: Arc<dyn LlmClient>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        let mut registry = ToolRegistry::new();
        registry.register(CourseSearchTool::new(store.clone()));
        registry.register(CourseOutlineTool::new(store.clone()));

        let agent = Agent::new(llm, &settings.llm).with_prompts(prompts.assistant.clone());
        let sessions = SessionManager::new(settings.session.max_history);

        Self {
            settings,
            prompts,
            agent,
            store,
            registry,
            sessions,
        }
    }

    /// Answer one query, returning the text and the deduplicated packed sources.
    ///
    /// Sources are collected and cleared even when the run fails, so nothing
    /// carries over into the next query.
    #[instrument(skip(self, summary), fields(query = %query))]
    pub async fn answer(&mut self, query: &str, summary: Option<&str>) -> Result<(String, Vec<String>)> {
        let result = self.agent.run(query, summary, Some(&mut self.registry)).await;

        let collected = self.registry.drain_sources();
        self.registry.reset_sources();

        let response = result?;
        debug!(
            "Answered with {} model calls and {} tool calls",
            response.model_calls,
            response.tool_calls.len()
        );

        let mut seen = HashSet::new();
        let sources: Vec<String> = collected
            .iter()
            .map(|s| s.pack())
            .filter(|packed| seen.insert(packed.clone()))
            .collect();

        Ok((response.content, sources))
    }

    /// Answer a user question within a session.
    ///
    /// Without a session id a new session is started. The raw question, not
    /// the templated prompt, is recorded in the session history.
    #[instrument(skip(self), fields(session = ?session_id))]
    pub async fn query(&mut self, query: &str, session_id: Option<&str>) -> Result<RagResponse> {
        info!("Processing query: {}", query);

        let session_id = match session_id {
            Some(id) => id.to_string(),
            None => self.sessions.create_session(),
        };

        let prompt = self.prompts.render_query(query);
        let history = self.sessions.history(&session_id);
        let (answer, sources) = self.answer(&prompt, history.as_deref()).await?;

        self.sessions.add_exchange(&session_id, query, &answer);

        Ok(RagResponse {
            answer,
            sources,
            session_id,
        })
    }

    /// Index a course's metadata and its pre-chunked content.
    pub async fn add_course(&self, course: &Course, chunks: &[CourseChunk]) -> Result<usize> {
        self.store.add_course_metadata(course).await?;
        let added = self.store.add_course_content(chunks).await?;
        info!("Indexed course '{}' with {} chunks", course.title, added);
        Ok(added)
    }

    /// Number and titles of indexed courses.
    pub async fn course_analytics(&self) -> Result<CourseAnalytics> {
        let course_titles = self.store.course_titles().await?;
        Ok(CourseAnalytics {
            total_courses: course_titles.len(),
            course_titles,
        })
    }

    /// Start a new conversation session.
    pub fn create_session(&mut self) -> String {
        self.sessions.create_session()
    }

    /// Forget a session's history.
    pub fn clear_session(&mut self, session_id: &str) {
        self.sessions.clear_session(session_id);
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

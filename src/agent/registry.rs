//! Tool registry: catalog, dispatch and source aggregation.

use super::tools::{SourceRecord, Tool, ToolSpecification};
use crate::error::Result;
use serde_json::Value;
use tracing::{debug, warn};

struct RegisteredTool {
    name: String,
    tool: Box<dyn Tool>,
    /// Sources from this tool's most recent execution.
    last_sources: Vec<SourceRecord>,
}

/// Holds the tools offered to the model and runs them by name.
///
/// Each tool has a source slot that is overwritten on every execution and
/// emptied by [`reset_sources`](Self::reset_sources). Dispatch needs
/// `&mut self`, so one registry serves one query at a time; concurrent
/// queries need their own registry or an external lock.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its specification name.
    ///
    /// Registering a second tool with the same name replaces the first in
    /// place; there is no duplicate guard.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.specification().name;
        let entry = RegisteredTool {
            name: name.clone(),
            tool: Box::new(tool),
            last_sources: Vec::new(),
        };

        match self.tools.iter_mut().find(|t| t.name == name) {
            Some(existing) => {
                warn!("Replacing already registered tool '{}'", name);
                *existing = entry;
            }
            None => self.tools.push(entry),
        }
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Specifications of all tools, in registration order.
    pub fn specifications(&self) -> Vec<ToolSpecification> {
        self.tools.iter().map(|t| t.tool.specification()).collect()
    }

    /// Run the named tool.
    ///
    /// Unknown names yield a `"Tool '<name>' not found"` string rather than an
    /// error. On success the tool's source slot is replaced with exactly the
    /// sources of this execution.
    pub async fn dispatch(&mut self, name: &str, args: &Value) -> Result<String> {
        let Some(entry) = self.tools.iter_mut().find(|t| t.name == name) else {
            warn!("Model requested unknown tool '{}'", name);
            return Ok(format!("Tool '{}' not found", name));
        };

        let output = entry.tool.execute(args).await?;
        debug!("Tool '{}' produced {} sources", name, output.sources.len());
        entry.last_sources = output.sources;
        Ok(output.content)
    }

    /// Sources currently held by one tool.
    pub fn last_sources(&self, name: &str) -> Option<&[SourceRecord]> {
        self.tools
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.last_sources.as_slice())
    }

    /// All held sources concatenated in registration order.
    ///
    /// Must be followed by [`reset_sources`](Self::reset_sources) once a query
    /// completes.
    pub fn drain_sources(&self) -> Vec<SourceRecord> {
        self.tools
            .iter()
            .flat_map(|t| t.last_sources.iter().cloned())
            .collect()
    }

    /// Empty every tool's source slot.
    pub fn reset_sources(&mut self) {
        for entry in &mut self.tools {
            entry.last_sources.clear();
        }
    }
}

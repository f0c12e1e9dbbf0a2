//! Tool-calling agent over the course catalog.
//!
//! The model answers a question through a bounded loop of tool calls:
//! [`CourseSearchTool`] for content and [`CourseOutlineTool`] for structure,
//! both dispatched by a [`ToolRegistry`] that also collects the sources the
//! final answer should cite.

mod course_outline;
mod course_search;
mod registry;
mod runner;
mod tools;

pub use course_outline::{CourseOutlineTool, OUTLINE_TOOL_NAME};
pub use course_search::{CourseSearchTool, SEARCH_TOOL_NAME};
pub use registry::ToolRegistry;
pub use runner::{Agent, AgentResponse, ToolCallRecord, TOOL_FAILURE_MESSAGE};
pub use tools::{
    parse_arguments, ParameterKind, ParameterSpec, SourceRecord, Tool, ToolOutput,
    ToolSpecification, LINK_DELIMITER,
};

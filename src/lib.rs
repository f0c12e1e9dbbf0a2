//! Kurs - Course Materials Assistant
//!
//! Answers questions about indexed course materials with a tool-calling
//! language model and reports which lessons each answer drew on.
//!
//! # Overview
//!
//! A question runs through a bounded loop: the model may call the content
//! search and course outline tools for up to two rounds, after which it must
//! answer in text. Every search hit the model saw is reported back as a
//! source, deduplicated and cleared between questions.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `llm` - Provider-neutral chat model interface and the OpenAI client
//! - `agent` - Tool contract, tool registry, course tools and the tool loop
//! - `embedding` - Embedding generation
//! - `vector_store` - Course catalog and content search
//! - `rag` - Sessions and the question answering facade
//!
//! # Example
//!
//! ```rust,no_run
//! use kurs::config::Settings;
//! use kurs::rag::RagSystem;
//!
//! #[tokio::main]
//! async fn main() -> kurs::Result<()> {
//!     let settings = Settings::load()?;
//!     kurs::logging::init(&settings.general.log_level);
//!
//!     let mut system = RagSystem::from_settings(&settings)?;
//!     let response = system.query("What does lesson 2 cover?", None).await?;
//!     println!("{}", response.format_for_display());
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod config;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod logging;
pub mod openai;
pub mod rag;
pub mod vector_store;

#[cfg(test)]
mod testing;

pub use error::{KursError, Result};

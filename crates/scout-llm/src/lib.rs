//! Scout LLM - provider abstraction for scoring listings with chat models.
//!
//! This crate provides a unified interface over `OpenAI`-compatible chat
//! completion services, with both single-shot and streamed completions.
//!
//! # Example
//!
//! ```no_run
//! use scout_llm::{CompletionRequest, LlmModel, LlmProvider, OpenAiCompatibleProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OpenAiCompatibleProvider::new(LlmModel::DeepSeekChat, "sk-...")?;
//! let request = CompletionRequest::new("Summarize this job posting")
//!     .with_system_prompt("You are a recruiter");
//! let response = provider.complete(request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod model;
pub mod provider;
pub mod providers;

// Re-export commonly used types
pub use error::{LlmError, Result};
pub use model::LlmModel;
pub use provider::{
    CompletionRequest, CompletionResponse, CompletionStream, LlmProvider, Message,
    ProviderCapabilities, Role, StreamChunk, Usage,
};
pub use providers::OpenAiCompatibleProvider;

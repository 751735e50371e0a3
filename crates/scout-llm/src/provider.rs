//! Core LLM provider trait and request/response types.

use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Trait for LLM providers supporting completion and streaming.
///
/// Provider implementations must be thread-safe (Send + Sync) so a single
/// instance can be shared by concurrent scoring workers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a prompt with a single response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Stream a completion response chunk by chunk.
    async fn stream(&self, request: CompletionRequest) -> Result<CompletionStream>;

    /// Get the capabilities of this provider.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Get the unique identifier for this provider.
    fn provider_id(&self) -> &str;
}

/// Capabilities of an LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    /// Maximum context window size in tokens
    pub max_context_tokens: usize,

    /// Supports server-sent streaming
    pub supports_streaming: bool,

    /// Supports structured output (JSON mode, etc.)
    pub supports_structured_output: bool,

    /// Model name or identifier
    pub model_name: String,
}

/// Request for LLM completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The prompt or conversation messages
    pub messages: Vec<Message>,

    /// Maximum tokens to generate (optional)
    pub max_tokens: Option<u32>,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    pub temperature: Option<f32>,

    /// System prompt (optional)
    pub system_prompt: Option<String>,

    /// Stop sequences (optional)
    pub stop_sequences: Vec<String>,

    /// Ask the provider to emit a single JSON object
    pub json_output: bool,
}

impl CompletionRequest {
    /// Create a new completion request with a simple user message.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(content)],
            max_tokens: None,
            temperature: None,
            system_prompt: None,
            stop_sequences: Vec::new(),
            json_output: false,
        }
    }

    /// Set the maximum tokens to generate.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Add a stop sequence.
    #[must_use]
    pub fn with_stop_sequence(mut self, stop: impl Into<String>) -> Self {
        self.stop_sequences.push(stop.into());
        self
    }

    /// Request JSON-object output.
    #[must_use]
    pub fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }
}

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,

    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message (instructions, context)
    System,
    /// User message (prompt, question)
    User,
    /// Assistant message (response)
    Assistant,
}

impl Role {
    /// Role name on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Response from LLM completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// The generated text
    pub content: String,

    /// Model that generated the response
    pub model: String,

    /// Stop reason (e.g., "`stop`", "`length`")
    pub stop_reason: Option<String>,

    /// Usage statistics
    pub usage: Option<Usage>,
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    /// Input tokens consumed
    pub input_tokens: u32,

    /// Output tokens generated
    pub output_tokens: u32,
}

impl Usage {
    /// Get total tokens used.
    #[must_use]
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Streaming completion response.
pub type CompletionStream = BoxStream<'static, Result<StreamChunk>>;

/// A chunk in a streaming response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Text delta (incremental content)
    pub delta: String,

    /// Whether this is the final chunk
    pub is_final: bool,

    /// Stop reason (only present in final chunk)
    pub stop_reason: Option<String>,
}

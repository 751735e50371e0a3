//! `OpenAI`-compatible chat completions provider.
//!
//! Serves `DeepSeek` and Moonshot through their `OpenAI`-compatible endpoints.

use crate::error::{LlmError, Result};
use crate::model::LlmModel;
use crate::provider::{
    CompletionRequest, CompletionResponse, CompletionStream, LlmProvider, ProviderCapabilities,
    Role, StreamChunk, Usage,
};
use async_trait::async_trait;
use eventsource_stream::{EventStreamError, Eventsource};
use futures::future;
use futures::stream::{BoxStream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Provider for any `/chat/completions` endpoint speaking the `OpenAI` protocol.
pub struct OpenAiCompatibleProvider {
    api_key: String,
    model: LlmModel,
    client: Client,
    base_url: String,
}

impl OpenAiCompatibleProvider {
    /// Create a provider for a model preset at its default endpoint.
    pub fn new(model: LlmModel, api_key: impl Into<String>) -> Result<Self> {
        Self::with_options(model, api_key, None, None)
    }

    /// Create a provider with an optional base URL override and HTTP timeout.
    pub fn with_options(
        model: LlmModel,
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey {
                provider: model.provider_id().to_string(),
            });
        }

        let base_url = base_url
            .unwrap_or_else(|| model.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key,
            model,
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)))
                .build()
                .map_err(|e| LlmError::Internal(format!("failed to create HTTP client: {e}")))?,
            base_url,
        })
    }

    /// Convert internal request to the wire format.
    fn to_api_request<'a>(&self, request: &'a CompletionRequest, stream: bool) -> ChatRequest<'a> {
        let system = request.system_prompt.as_deref().map(|content| ChatMessage {
            role: Role::System.as_str(),
            content,
        });
        let messages = system
            .into_iter()
            .chain(request.messages.iter().map(|m| ChatMessage {
                role: m.role.as_str(),
                content: &m.content,
            }))
            .collect();

        ChatRequest {
            model: self.model.model_name(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stop: (!request.stop_sequences.is_empty()).then_some(request.stop_sequences.as_slice()),
            response_format: request.json_output.then_some(ResponseFormat {
                kind: "json_object",
            }),
            stream,
        }
    }

    fn convert_api_response(&self, response: ChatResponse) -> Result<CompletionResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| self.parse_error("no choices in response"))?;

        Ok(CompletionResponse {
            content: choice.message.content,
            model: response.model,
            stop_reason: choice.finish_reason,
            usage: response.usage.map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        })
    }

    async fn send(&self, body: &ChatRequest<'_>) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::ApiError {
                provider: self.provider_id().to_string(),
                status: status.as_u16(),
                message: error_text,
            });
        }
        Ok(response)
    }

    fn parse_error(&self, message: impl Into<String>) -> LlmError {
        LlmError::ParseError {
            provider: self.provider_id().to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let api_request = self.to_api_request(&request, false);
        let response = self.send(&api_request).await?;

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| self.parse_error(format!("Failed to parse response: {e}")))?;

        self.convert_api_response(api_response)
    }

    async fn stream(&self, request: CompletionRequest) -> Result<CompletionStream> {
        let api_request = self.to_api_request(&request, true);
        let response = self.send(&api_request).await?;
        tracing::debug!(model = %self.model, "Streaming completion started");

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()))
            .boxed();

        Ok(chunk_stream(bytes, self.provider_id().to_string()))
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            max_context_tokens: self.model.max_context_tokens(),
            supports_streaming: true,
            supports_structured_output: true,
            model_name: self.model.model_name().to_string(),
        }
    }

    fn provider_id(&self) -> &str {
        self.model.provider_id()
    }
}

/// Turn an SSE byte stream into completion chunks.
///
/// Ends at `[DONE]`, at the end of the body, or after the first error.
fn chunk_stream(
    bytes: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    provider: String,
) -> CompletionStream {
    bytes
        .eventsource()
        .take_while(|event| future::ready(!matches!(event, Ok(e) if e.data == "[DONE]")))
        .filter_map(move |event| {
            let item = match event {
                Ok(event) if event.data.is_empty() => None,
                Ok(event) => parse_chunk(&event.data)
                    .map_err(|message| LlmError::ParseError {
                        provider: provider.clone(),
                        message,
                    })
                    .transpose(),
                Err(EventStreamError::Transport(e)) => Some(Err(e.into())),
                Err(e) => Some(Err(LlmError::ParseError {
                    provider: provider.clone(),
                    message: e.to_string(),
                })),
            };
            future::ready(item)
        })
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            *failed = item.is_err();
            future::ready(Some(item))
        })
        .boxed()
}

fn parse_chunk(payload: &str) -> std::result::Result<Option<StreamChunk>, String> {
    let chunk: ChatChunk =
        serde_json::from_str(payload).map_err(|e| format!("invalid stream chunk: {e}"))?;
    let Some(choice) = chunk.choices.into_iter().next() else {
        return Ok(None);
    };

    let delta = choice.delta.content.unwrap_or_default();
    if delta.is_empty() && choice.finish_reason.is_none() {
        return Ok(None);
    }
    Ok(Some(StreamChunk {
        delta,
        is_final: choice.finish_reason.is_some(),
        stop_reason: choice.finish_reason,
    }))
}

// Wire types

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'static str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    model: String,
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

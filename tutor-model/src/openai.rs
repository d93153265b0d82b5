//! OpenAI-compatible chat completions client.
//!
//! This module is only available when the `openai` feature is enabled.
//!
//! The same wire format is served by the hosted OpenAI API and by local
//! inference servers (Ollama, vLLM, LM Studio), so one client covers both
//! the remote and the local deployment of the pipeline.

use std::time::Duration;

use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{ModelError, Result};
use crate::llm::{GenerateRequest, Llm, TokenStream};

/// The default OpenAI API base URL.
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Fixed timeout applied to every backend call. On expiry the operation
/// fails instead of hanging.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// An [`Llm`] backed by an OpenAI-compatible `/chat/completions` endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use tutor_model::OpenAiChatModel;
///
/// // Hosted API
/// let model = OpenAiChatModel::new("sk-...", "gpt-4o-mini")?;
///
/// // Local Ollama server (no API key required)
/// let local = OpenAiChatModel::compatible("http://localhost:11434/v1", "llama3.2")?;
/// ```
pub struct OpenAiChatModel {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiChatModel {
    /// Create a client for the hosted OpenAI API.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ModelError::Config("API key must not be empty".into()));
        }
        Self::build(OPENAI_API_BASE.to_string(), Some(api_key), model.into())
    }

    /// Create a client for an OpenAI-compatible server at a custom base URL.
    ///
    /// Local servers such as Ollama do not require an API key.
    pub fn compatible(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::build(base_url.into(), None, model.into())
    }

    /// Set an API key on a compatible-server client.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn build(base_url: String, api_key: Option<String>, model: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ModelError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string(), api_key, model })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn messages<'a>(&self, request: &'a GenerateRequest) -> Vec<ChatMessage<'a>> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage { role: "system", content: system });
        }
        messages.push(ChatMessage { role: "user", content: &request.prompt });
        messages
    }

    async fn post_completions(&self, body: &ChatRequest<'_>) -> Result<reqwest::Response> {
        let mut builder = self.client.post(self.completions_url()).json(body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            error!(model = %self.model, error = %e, "chat completion request failed");
            ModelError::Backend {
                provider: self.model.clone(),
                message: format!("request failed: {e}"),
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(model = %self.model, %status, "chat completion API error");
            return Err(ModelError::Backend {
                provider: self.model.clone(),
                message: format!("API returned {status}: {detail}"),
            });
        }

        Ok(response)
    }
}

// ── Chat completions request/response types ────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: String,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── Llm implementation ─────────────────────────────────────────────

#[async_trait]
impl Llm for OpenAiChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        debug!(model = %self.model, prompt_len = request.prompt.len(), "generating completion");

        let body = ChatRequest {
            model: &self.model,
            messages: self.messages(request),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
        };

        let response = self.post_completions(&body).await?;

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!(model = %self.model, error = %e, "failed to parse completion response");
            ModelError::MalformedResponse {
                provider: self.model.clone(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        parsed.choices.into_iter().next().map(|c| c.message.content).ok_or_else(|| {
            ModelError::MalformedResponse {
                provider: self.model.clone(),
                message: "response contained no choices".into(),
            }
        })
    }

    async fn generate_stream(&self, request: &GenerateRequest) -> Result<TokenStream> {
        debug!(model = %self.model, prompt_len = request.prompt.len(), "starting streamed completion");

        let body = ChatRequest {
            model: &self.model,
            messages: self.messages(request),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: true,
        };

        let response = self.post_completions(&body).await?;
        let model = self.model.clone();

        let stream = try_stream! {
            let mut bytes = response.bytes_stream();
            let mut buffer = String::new();

            'read: while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(|e| ModelError::Stream(format!("stream read failed: {e}")))?;
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                // Server-sent events arrive as `data: {json}` lines.
                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim().to_string();
                    buffer.drain(..=pos);

                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    if data == "[DONE]" {
                        break 'read;
                    }

                    let parsed: StreamChunk = serde_json::from_str(data).map_err(|e| {
                        error!(model = %model, error = %e, "failed to parse stream chunk");
                        ModelError::MalformedResponse {
                            provider: model.clone(),
                            message: format!("failed to parse stream chunk: {e}"),
                        }
                    })?;

                    if let Some(content) =
                        parsed.choices.into_iter().next().and_then(|c| c.delta.content)
                    {
                        if !content.is_empty() {
                            yield content;
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

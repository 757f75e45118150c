//! HTTP provider speaking either the chat-completions shape (OpenAI,
//! Gemini's OpenAI-compatible endpoint, Mistral) or Anthropic's messages API.

use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::default::default_base_url;
use super::{Prompt, Provider, ProviderId, ProviderSettings};
use crate::model::RawReply;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Anthropic requires `max_tokens`; used when settings leave it unset.
const ANTHROPIC_FALLBACK_MAX_TOKENS: u32 = 1024;

/// Request/response layout a backend expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    ChatCompletions,
    AnthropicMessages,
}

impl WireFormat {
    pub fn for_provider(id: ProviderId) -> Self {
        match id {
            ProviderId::Anthropic => WireFormat::AnthropicMessages,
            ProviderId::OpenAi | ProviderId::Google | ProviderId::Mistral => {
                WireFormat::ChatCompletions
            }
        }
    }

    fn path(self) -> &'static str {
        match self {
            WireFormat::ChatCompletions => "chat/completions",
            WireFormat::AnthropicMessages => "messages",
        }
    }
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// [`Provider`] backed by a vendor HTTP API, configured from resolved
/// [`ProviderSettings`].
pub struct HttpProvider {
    settings: ProviderSettings,
    api_key: String,
    endpoint: String,
    wire: WireFormat,
    http: Client,
}

impl HttpProvider {
    pub fn new(settings: ProviderSettings) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Self::with_client(settings, http)
    }

    /// Same as [`Self::new`] with a caller-supplied client.
    pub fn with_client(settings: ProviderSettings, http: Client) -> anyhow::Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .with_context(|| format!("no API key configured for {}", settings.id))?;
        let wire = WireFormat::for_provider(settings.id);
        let base = settings
            .base_url
            .as_deref()
            .unwrap_or_else(|| default_base_url(settings.id));
        let endpoint = format!("{}/{}", base.trim_end_matches('/'), wire.path());
        Ok(Self {
            settings,
            api_key,
            endpoint,
            wire,
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post<B: Serialize>(&self, body: &B) -> anyhow::Result<reqwest::Response> {
        let req = self.http.post(&self.endpoint).json(body);
        let req = match self.wire {
            WireFormat::ChatCompletions => req.bearer_auth(&self.api_key),
            WireFormat::AnthropicMessages => req
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION),
        };
        let resp = req
            .send()
            .await
            .with_context(|| format!("POST {}", self.endpoint))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("{} returned {}: {}", self.endpoint, status, body.trim());
        }
        Ok(resp)
    }

    async fn chat_completion(&self, prompt: &Prompt) -> anyhow::Result<String> {
        let body = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &prompt.system,
                },
                Message {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_output_tokens,
        };
        let parsed: ChatResponse = self
            .post(&body)
            .await?
            .json()
            .await
            .context("invalid chat completion response")?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .context("chat completion returned no choices")?;
        Ok(choice.message.content.unwrap_or_default())
    }

    async fn anthropic_message(&self, prompt: &Prompt) -> anyhow::Result<String> {
        let body = MessagesRequest {
            model: &self.settings.model,
            system: &prompt.system,
            messages: vec![Message {
                role: "user",
                content: &prompt.user,
            }],
            temperature: self.settings.temperature,
            max_tokens: self
                .settings
                .max_output_tokens
                .unwrap_or(ANTHROPIC_FALLBACK_MAX_TOKENS),
        };
        let parsed: MessagesResponse = self
            .post(&body)
            .await?
            .json()
            .await
            .context("invalid messages response")?;
        parsed
            .content
            .into_iter()
            .find(|b| b.kind == "text")
            .and_then(|b| b.text)
            .context("messages response had no text block")
    }
}

#[async_trait]
impl Provider for HttpProvider {
    fn id(&self) -> ProviderId {
        self.settings.id
    }

    async fn complete(&self, prompt: &Prompt) -> anyhow::Result<RawReply> {
        let text = match self.wire {
            WireFormat::ChatCompletions => self.chat_completion(prompt).await?,
            WireFormat::AnthropicMessages => self.anthropic_message(prompt).await?,
        };
        tracing::debug!("{} replied ({} chars)", self.settings.id, text.len());
        Ok(RawReply::new(text))
    }
}

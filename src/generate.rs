use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;

use crate::openai::{self, ChatMessage, ChatRequest};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const TEMPERATURE: f32 = 0.7;

pub const SYSTEM_INSTRUCTION: &str = "Jesteś ekspertem w tworzeniu opisów produktów książkowych, \
specjalizującym się w SEO i marketingu. Tworzysz przekonujące, angażujące opisy, \
które skutecznie prezentują książkę potencjalnym czytelnikom.";

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("OpenAI API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("generated text is empty")]
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub samples: u32,
}

impl SamplingConfig {
    pub fn new(model: impl Into<String>, max_output_tokens: u32) -> Self {
        Self {
            model: model.into(),
            temperature: TEMPERATURE,
            max_output_tokens,
            samples: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system: String,
    pub user_messages: Vec<String>,
    pub sampling: SamplingConfig,
}

/// A single attempt per call; callers decide what a failure means.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

pub struct OpenAiGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiGenerator {
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;

        Ok(Self {
            client,
            endpoint: openai::chat_completions_endpoint(base_url),
            api_key,
        })
    }

    pub fn from_env(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY is not set"))?;
        Self::new(base_url, api_key, timeout)
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let mut messages = Vec::with_capacity(request.user_messages.len() + 1);
        messages.push(ChatMessage::system(request.system.as_str()));
        messages.extend(request.user_messages.iter().map(ChatMessage::user));

        tracing::info!(
            engine = "openai",
            model = %request.sampling.model,
            messages = messages.len(),
            max_tokens = request.sampling.max_output_tokens,
            "generate description"
        );

        let chat = ChatRequest {
            model: &request.sampling.model,
            messages: &messages,
            temperature: request.sampling.temperature,
            max_tokens: request.sampling.max_output_tokens,
            n: request.sampling.samples,
        };
        openai::chat_completion_text(&self.client, &self.endpoint, &self.api_key, &chat).await
    }
}

/// Echoes the last user message; for offline dry runs.
pub struct NoopGenerator;

#[async_trait]
impl Generator for NoopGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        tracing::info!(engine = "noop", "generate description");
        request
            .user_messages
            .last()
            .filter(|text| !text.trim().is_empty())
            .cloned()
            .ok_or(GenerationError::Empty)
    }
}

/// Converts Markdown remnants the model sometimes emits into the HTML tags
/// the descriptions are expected to use.
pub fn markdown_remnants_to_html(text: &str) -> String {
    let lines = text
        .lines()
        .map(|line| {
            let line = bold_to_html(line);
            heading_to_html(&line).unwrap_or(line)
        })
        .collect::<Vec<_>>();
    lines.join("\n")
}

pub fn wrap_html_fence(text: &str) -> String {
    if text.starts_with("```html") {
        return text.to_owned();
    }
    format!("```html\n{text}\n```")
}

fn heading_to_html(line: &str) -> Option<String> {
    let level = line.chars().take_while(|c| *c == '#').count();
    if !(1..=3).contains(&level) {
        return None;
    }
    let rest = &line[level..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let title = rest.trim();
    Some(format!("<h{level}>{title}</h{level}>"))
}

fn bold_to_html(line: &str) -> String {
    let parts = line.split("**").collect::<Vec<_>>();
    // An odd number of markers leaves the line as is.
    if parts.len() < 3 || parts.len() % 2 == 0 {
        return line.to_owned();
    }

    let mut out = String::with_capacity(line.len());
    for (idx, part) in parts.iter().enumerate() {
        if idx > 0 {
            out.push_str(if idx % 2 == 1 { "<b>" } else { "</b>" });
        }
        out.push_str(part);
    }
    out
}

use serde::Serialize;

use crate::generate::GenerationError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub fn chat_completions_endpoint(base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    format!("{base_url}/chat/completions")
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f32,
    pub max_tokens: u32,
    pub n: u32,
}

pub async fn chat_completion_text(
    client: &reqwest::Client,
    endpoint: &str,
    api_key: &str,
    request: &ChatRequest<'_>,
) -> Result<String, GenerationError> {
    let response = client
        .post(endpoint)
        .bearer_auth(api_key)
        .json(request)
        .send()
        .await
        .map_err(|err| GenerationError::Transport(format!("POST {endpoint}: {err:#}")))?;

    let status = response.status();
    let raw = response
        .text()
        .await
        .map_err(|err| GenerationError::Transport(format!("read OpenAI response body: {err:#}")))?;
    if !status.is_success() {
        let message = parse_error_message(&raw).unwrap_or_else(|| raw.clone());
        return Err(GenerationError::Api {
            status: status.as_u16(),
            message,
        });
    }

    let value: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|err| GenerationError::Malformed(format!("parse OpenAI response: {err}")))?;
    extract_message_text(&value)
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    let message = value.get("error")?.get("message")?.as_str()?.to_owned();
    Some(message)
}

fn extract_message_text(value: &serde_json::Value) -> Result<String, GenerationError> {
    let content = value
        .pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            GenerationError::Malformed("missing `choices[0].message.content` in response".to_owned())
        })?;

    let text = content.trim();
    if text.is_empty() {
        return Err(GenerationError::Empty);
    }
    Ok(text.to_owned())
}

// src/enrich/openai.rs
//! OpenAI provider (Chat Completions API).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::provider::{GenerativeProvider, ProviderError, ResponseFormat};

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const SYSTEM_PROMPT: &str = "You are a precise assistant for a tech news desk. Follow the output format exactly.";

pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ai-news-briefing/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
            url: OPENAI_CHAT_URL.to_string(),
        })
    }

    /// Point at a compatible endpoint (proxies, local gateways).
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct JsonMode {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<JsonMode>,
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

/// Pull the answer out of a decoded response, mapping filter/empty cases to errors.
fn extract_text(body: Resp) -> Result<String, ProviderError> {
    let choice = body
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Transient("no choices in response".into()))?;
    if choice.finish_reason.as_deref() == Some("content_filter") {
        return Err(ProviderError::ContentBlocked("finish_reason=content_filter".into()));
    }
    let text = choice.message.content.unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ProviderError::Transient("empty completion".into()));
    }
    Ok(text)
}

#[async_trait]
impl GenerativeProvider for OpenAiProvider {
    async fn generate(&self, prompt: &str, format: ResponseFormat) -> Result<String, ProviderError> {
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Msg {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.2,
            response_format: match format {
                ResponseFormat::Json => Some(JsonMode { kind: "json_object" }),
                ResponseFormat::Text => None,
            },
        };

        debug!(model = %self.model, "openai request");
        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(&e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, &body));
        }
        let body: Resp = resp
            .json()
            .await
            .map_err(|e| ProviderError::Transient(format!("decoding response: {e}")))?;
        extract_text(body)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(s: &str) -> Result<String, ProviderError> {
        extract_text(serde_json::from_str(s).unwrap())
    }

    #[test]
    fn content_filter_is_blocked() {
        let r = decode(r#"{"choices":[{"message":{"content":null},"finish_reason":"content_filter"}]}"#);
        assert!(matches!(r, Err(ProviderError::ContentBlocked(_))));
    }

    #[test]
    fn normal_completion() {
        let r = decode(r#"{"choices":[{"message":{"content":"hello"},"finish_reason":"stop"}]}"#);
        assert_eq!(r.unwrap(), "hello");
    }

    #[test]
    fn empty_choices_are_transient() {
        assert!(matches!(decode(r#"{"choices":[]}"#), Err(ProviderError::Transient(_))));
    }
}

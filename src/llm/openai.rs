//! OpenAI-compatible chat-completions client.
//!
//! Owns the HTTP transport, request construction, bearer auth, and the
//! response fallback chain. Responses arrive in loosely-structured JSON, so
//! decoding tries a small set of known shapes in priority order (chat
//! `choices`, then `output`, then `text`) and falls back to returning the
//! raw body when nothing matches.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{LlmClient, SendError, EMPTY_REPLY};

pub struct OpenAiClient {
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
    client: reqwest::Client,
}

// --- API Request Types (OpenAI format) ---

#[derive(Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiTurn>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ApiTurn {
    role: &'static str,
    content: String,
}

// --- API Response Shapes ---
//
// Attempted in declaration order; the first shape that decodes claims the
// response. `ChatTurnBody.content` defaults to `None` so a choice with a
// null or absent content field still counts as a chat reply (rendered as
// the empty-reply placeholder) instead of falling through.

#[derive(Deserialize)]
struct ChatShape {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatTurnBody,
}

#[derive(Deserialize)]
struct ChatTurnBody {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OutputShape {
    output: Value,
}

#[derive(Deserialize)]
struct TextShape {
    text: Value,
}

/// A decoded response, tagged by which shape matched.
#[derive(Debug, PartialEq)]
enum Reply {
    /// `choices[0].message.content`; `None` when the field is null/absent.
    Chat(Option<String>),
    Output(Value),
    Text(Value),
    /// No recognized shape; the raw body is the reply.
    Opaque(String),
}

// --- Implementation ---

impl OpenAiClient {
    pub fn new(
        api_key: String,
        endpoint: String,
        model: String,
        max_tokens: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            api_key,
            endpoint,
            model,
            max_tokens,
            timeout,
            client: reqwest::Client::new(),
        }
    }

    fn build_request(&self, input: &str) -> ApiRequest {
        ApiRequest {
            model: self.model.clone(),
            messages: vec![ApiTurn {
                role: "user",
                content: input.to_string(),
            }],
            max_tokens: self.max_tokens,
        }
    }

    /// One chat call with the full typed error taxonomy.
    ///
    /// Exactly one outbound POST per invocation; no retries. A blank key or
    /// endpoint short-circuits before any transport work.
    pub async fn try_send(
        &self,
        input: &str,
        cancel: &CancellationToken,
    ) -> Result<String, SendError> {
        if self.api_key.trim().is_empty() || self.endpoint.trim().is_empty() {
            return Err(SendError::NotConfigured);
        }

        let request = self.build_request(input);
        debug!(model = %self.model, endpoint = %self.endpoint, "dispatching chat request");

        let round_trip = async {
            let response = self
                .client
                .post(&self.endpoint)
                .timeout(self.timeout)
                .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
                .header(CONTENT_TYPE, "application/json")
                .json(&request)
                .send()
                .await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        let (status, body) = tokio::select! {
            _ = cancel.cancelled() => return Err(SendError::Cancelled),
            result = round_trip => result?,
        };

        if !status.is_success() {
            return Err(SendError::Api { status, body });
        }

        extract_reply(&body)
    }
}

/// Decode a success body into reply text.
///
/// Invalid JSON is a distinct error variant so callers can tell an
/// unparseable body apart from a genuine reply.
fn extract_reply(body: &str) -> Result<String, SendError> {
    let value: Value = serde_json::from_str(body).map_err(|_| SendError::UnparseableBody {
        body: body.to_string(),
    })?;
    Ok(render(classify(&value, body)))
}

fn classify(value: &Value, raw: &str) -> Reply {
    if let Ok(chat) = ChatShape::deserialize(value) {
        if let Some(choice) = chat.choices.into_iter().next() {
            return Reply::Chat(choice.message.content);
        }
        // `choices` present but empty: try the other shapes
    }
    if let Ok(shape) = OutputShape::deserialize(value) {
        return Reply::Output(shape.output);
    }
    if let Ok(shape) = TextShape::deserialize(value) {
        return Reply::Text(shape.text);
    }
    Reply::Opaque(raw.to_string())
}

fn render(reply: Reply) -> String {
    match reply {
        Reply::Chat(Some(text)) => text,
        Reply::Chat(None) => EMPTY_REPLY.to_string(),
        Reply::Output(value) | Reply::Text(value) => stringify(value),
        Reply::Opaque(raw) => raw,
    }
}

/// Plain strings render unquoted; anything else as compact JSON.
fn stringify(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn send(&self, input: &str, cancel: &CancellationToken) -> String {
        match self.try_send(input, cancel).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(error = %err, "chat call degraded to diagnostic reply");
                err.into_reply()
            }
        }
    }

    fn name(&self) -> &str {
        "OpenAI-Compatible"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::NOT_CONFIGURED;
    use serde_json::json;

    fn rt() -> tokio::runtime::Runtime {
        tokio::runtime::Runtime::new().unwrap()
    }

    fn client(api_key: &str, endpoint: &str) -> OpenAiClient {
        OpenAiClient::new(
            api_key.to_string(),
            endpoint.to_string(),
            "gpt-4o-mini".to_string(),
            1000,
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_request_serialization() {
        let request = client("key", "https://example.invalid").build_request("ping");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "ping");
        assert_eq!(value["max_tokens"], 1000);
    }

    #[test]
    fn test_extract_chat_content() {
        let body = r#"{"choices":[{"message":{"content":"hello"}}]}"#;
        assert_eq!(extract_reply(body).unwrap(), "hello");
    }

    #[test]
    fn test_extract_missing_content_is_placeholder() {
        let body = r#"{"choices":[{"message":{"role":"assistant"}}]}"#;
        assert_eq!(extract_reply(body).unwrap(), EMPTY_REPLY);

        let body = r#"{"choices":[{"message":{"content":null}}]}"#;
        assert_eq!(extract_reply(body).unwrap(), EMPTY_REPLY);
    }

    #[test]
    fn test_choices_take_priority_over_output() {
        let body = r#"{"choices":[{"message":{"content":"from choices"}}],"output":"from output"}"#;
        assert_eq!(extract_reply(body).unwrap(), "from choices");
    }

    #[test]
    fn test_empty_choices_fall_through_to_output() {
        let body = r#"{"choices":[],"output":"fallback"}"#;
        assert_eq!(extract_reply(body).unwrap(), "fallback");
    }

    #[test]
    fn test_extract_output_field() {
        assert_eq!(extract_reply(r#"{"output":"done"}"#).unwrap(), "done");
        // non-string values stringify as compact JSON
        assert_eq!(
            extract_reply(r#"{"output":{"items":[1,2]}}"#).unwrap(),
            json!({"items":[1,2]}).to_string()
        );
    }

    #[test]
    fn test_extract_text_field() {
        assert_eq!(extract_reply(r#"{"text":"short"}"#).unwrap(), "short");
        assert_eq!(extract_reply(r#"{"text":42}"#).unwrap(), "42");
    }

    #[test]
    fn test_unrecognized_shape_returns_raw_body() {
        let body = r#"{"foo":"bar"}"#;
        assert_eq!(extract_reply(body).unwrap(), body);
    }

    #[test]
    fn test_unparseable_body_is_distinct_error() {
        let err = extract_reply("plain text").unwrap_err();
        assert!(matches!(err, SendError::UnparseableBody { .. }));
        // the rendered reply keeps the legacy surface: raw body unchanged
        assert_eq!(err.into_reply(), "plain text");
    }

    #[test]
    fn test_blank_config_short_circuits() {
        let rt = rt();
        rt.block_on(async {
            let cancel = CancellationToken::new();

            let blank_endpoint = client("key", "");
            let err = blank_endpoint.try_send("hi", &cancel).await.unwrap_err();
            assert!(matches!(err, SendError::NotConfigured));

            let blank_key = client("", "https://example.invalid");
            assert_eq!(blank_key.send("hi", &cancel).await, NOT_CONFIGURED);
        });
    }

    #[test]
    fn test_cancelled_before_dispatch() {
        let rt = rt();
        rt.block_on(async {
            let cancel = CancellationToken::new();
            cancel.cancel();
            let err = client("key", "https://example.invalid")
                .try_send("hi", &cancel)
                .await
                .unwrap_err();
            assert!(matches!(err, SendError::Cancelled));
        });
    }

    #[test]
    fn test_api_error_renders_status_and_body() {
        let reply = SendError::Api {
            status: reqwest::StatusCode::UNAUTHORIZED,
            body: "unauthorized".to_string(),
        }
        .into_reply();
        assert!(reply.contains("401"));
        assert!(reply.contains("unauthorized"));
    }
}

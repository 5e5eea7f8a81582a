//! LLM client module.
//!
//! Defines the `LlmClient` trait the conversation controller talks to, the
//! typed error taxonomy for a chat call, and the OpenAI-compatible
//! implementation. The trait seam exists so the controller can be tested
//! against a scripted fake instead of the network.

pub mod openai;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use openai::OpenAiClient;

/// Fixed reply substituted when a technically-valid response carries no
/// extractable text.
pub const EMPTY_REPLY: &str = "(empty reply)";

/// Fixed reply returned when the API key or endpoint is blank.
pub const NOT_CONFIGURED: &str = "(LLM not configured) API key or endpoint is missing.";

/// Everything that can go wrong during one chat call.
///
/// `send` collapses all of these into its string contract, but the variants
/// stay distinct here so callers of `try_send` (and tests) can tell a real
/// reply apart from a degraded one. In particular `UnparseableBody` is its
/// own variant rather than being silently folded into the reply text.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("{}", NOT_CONFIGURED)]
    NotConfigured,
    #[error("API error ({status}): {body}")]
    Api { status: reqwest::StatusCode, body: String },
    #[error("response body is not valid JSON: {body}")]
    UnparseableBody { body: String },
    #[error("request cancelled")]
    Cancelled,
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl SendError {
    /// Render the error into the user-facing reply string.
    ///
    /// An unparseable body keeps its legacy surface (the raw body is shown
    /// as the reply); every other failure becomes a diagnostic line.
    pub fn into_reply(self) -> String {
        match self {
            SendError::NotConfigured => NOT_CONFIGURED.to_string(),
            SendError::Api { status, body } => format!("API error ({status}): {body}"),
            SendError::UnparseableBody { body } => body,
            SendError::Cancelled => "Exception: request cancelled".to_string(),
            SendError::Transport(err) => format!("Exception: {err}"),
        }
    }
}

/// Trait the conversation controller depends on.
///
/// `send` never fails: every error is rendered into the returned string so
/// the controller has a single append-the-reply code path.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one stand-alone prompt and resolve to the reply text, or to a
    /// diagnostic string describing why no reply could be obtained.
    async fn send(&self, input: &str, cancel: &CancellationToken) -> String;

    /// Display name for logging.
    fn name(&self) -> &str;
}

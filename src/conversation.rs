//! Conversation controller.
//!
//! Owns the ordered message log and sequences the user/assistant turn
//! exchange. The log is append-only within a session: a system welcome
//! first, then strictly alternating user/assistant pairs. The client call
//! is the single suspension point and cannot fail, so each accepted submit
//! appends exactly two messages.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::llm::LlmClient;
use crate::types::Message;

/// Whether a turn is currently in flight.
///
/// The originating UI only implicitly serialized submits; this makes the
/// guard explicit so an overlapping submit is rejected deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TurnState {
    Idle,
    Awaiting,
}

/// What happened to a `submit` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Input was empty or all-whitespace; the log is unchanged.
    Ignored,
    /// A previous turn is still awaiting its reply; the log is unchanged.
    Busy,
    /// User message and reply were appended.
    Replied,
}

pub struct Conversation {
    client: Box<dyn LlmClient>,
    messages: Vec<Message>,
    state: TurnState,
}

impl Conversation {
    /// Create a conversation seeded with the system welcome message.
    pub fn new(client: Box<dyn LlmClient>, welcome: impl Into<String>) -> Self {
        Self {
            client,
            messages: vec![Message::system(welcome)],
            state: TurnState::Idle,
        }
    }

    /// Run one user turn: append the user message, obtain the reply (or a
    /// diagnostic string), append it as the assistant message.
    pub async fn submit(&mut self, text: &str, cancel: &CancellationToken) -> SubmitOutcome {
        if text.trim().is_empty() {
            return SubmitOutcome::Ignored;
        }
        if self.state == TurnState::Awaiting {
            debug!("submit rejected: a turn is already in flight");
            return SubmitOutcome::Busy;
        }

        self.state = TurnState::Awaiting;
        self.messages.push(Message::user(text));
        let reply = self.client.send(text, cancel).await;
        self.messages.push(Message::assistant(reply));
        self.state = TurnState::Idle;
        SubmitOutcome::Replied
    }

    /// The chronological message log.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_awaiting(&self) -> bool {
        self.state == TurnState::Awaiting
    }
}

//! Core data types shared by the conversation controller and the LLM client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a message in the conversation log.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sender::System => write!(f, "System"),
            Sender::User => write!(f, "You"),
            Sender::Assistant => write!(f, "Assistant"),
        }
    }
}

/// One entry in the conversation log.
///
/// Messages are created by the controller when a turn occurs (system
/// welcome, user input, or model/error reply) and never mutated after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a system message (the welcome banner).
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Sender::System, text)
    }

    /// Create a user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    /// Create an assistant message (reply text or a rendered error).
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_tag_sender() {
        assert_eq!(Message::system("hi").sender, Sender::System);
        assert_eq!(Message::user("hi").sender, Sender::User);
        assert_eq!(Message::assistant("hi").sender, Sender::Assistant);
    }

    #[test]
    fn test_sender_serializes_lowercase() {
        let json = serde_json::to_string(&Sender::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}

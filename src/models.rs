// Wire shapes exchanged with the chat API. Messages are treated as opaque
// records: the client only reads `id` and `text` and keeps the rest around
// untouched in `extra`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Longest message text the client will submit, in characters.
pub const MAX_MESSAGE_LEN: usize = 10_000;

/// Message identifier. The server uses integers today but nothing in the
/// client depends on that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    Number(i64),
    Text(String),
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Number(n) => write!(f, "{}", n),
            MessageId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Message {
    /// `<id>: <text>`, the line printed by `list`.
    pub fn listing_line(&self) -> String {
        format!("{}: {}", self.id, self.text)
    }
}

/// Body of a `GET /messages` response. Older servers answer with a bare
/// array, newer ones wrap it together with pagination fields.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MessageList {
    Bare(Vec<Message>),
    Wrapped {
        #[serde(default)]
        messages: Option<Vec<Message>>,
    },
}

impl MessageList {
    pub fn into_messages(self) -> Vec<Message> {
        match self {
            MessageList::Bare(messages) => messages,
            MessageList::Wrapped { messages } => messages.unwrap_or_default(),
        }
    }
}

/// Record pushed with a real-time event. Only `text` is guaranteed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventMessage {
    #[serde(default)]
    pub id: Option<MessageId>,
    pub text: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Serialize, Debug)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
}

#[derive(Deserialize, Debug)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct SendRequest<'a> {
    pub text: &'a str,
}

/// Server echo of a posted message. Only `text` is shown to the user.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SentMessage {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Message cannot be empty")]
    EmptyText,

    #[error("Error: Message too long (max {max} characters)", max = MAX_MESSAGE_LEN)]
    TextTooLong { len: usize },
}

/// Check a message text before it is sent.
pub fn validate_text(text: &str) -> Result<(), ValidationError> {
    if text.is_empty() {
        return Err(ValidationError::EmptyText);
    }
    let len = text.chars().count();
    if len > MAX_MESSAGE_LEN {
        return Err(ValidationError::TextTooLong { len });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_accepts_bare_array() {
        let list: MessageList = serde_json::from_str(r#"[{"id":1,"text":"hi"}]"#).unwrap();
        let messages = list.into_messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].listing_line(), "1: hi");
    }

    #[test]
    fn list_accepts_wrapped_object() {
        let json = r#"{"messages":[{"id":1,"text":"hi","timestamp":1700000000000}],"total":1,"limit":100,"offset":0}"#;
        let list: MessageList = serde_json::from_str(json).unwrap();
        let messages = list.into_messages();
        assert_eq!(messages[0].listing_line(), "1: hi");
        assert!(messages[0].extra.contains_key("timestamp"));
    }

    #[test]
    fn empty_lists_in_both_shapes() {
        let bare: MessageList = serde_json::from_str("[]").unwrap();
        let wrapped: MessageList = serde_json::from_str(r#"{"messages":[]}"#).unwrap();
        assert!(bare.into_messages().is_empty());
        assert!(wrapped.into_messages().is_empty());
    }

    #[test]
    fn wrapper_without_messages_is_empty() {
        for body in [r#"{"messages":null}"#, "{}", r#"{"total":0}"#] {
            let list: MessageList = serde_json::from_str(body).unwrap();
            assert!(list.into_messages().is_empty(), "body {}", body);
        }
    }

    #[test]
    fn event_message_needs_only_text() {
        let msg: EventMessage = serde_json::from_str(r#"{"text":"hello"}"#).unwrap();
        assert_eq!(msg.text, "hello");
        assert!(msg.id.is_none());

        let msg: EventMessage =
            serde_json::from_str(r#"{"id":4,"text":"edited","updatedAt":9}"#).unwrap();
        assert_eq!(msg.id, Some(MessageId::Number(4)));
        assert!(msg.extra.contains_key("updatedAt"));

        assert!(serde_json::from_str::<EventMessage>(r#"{"id":4}"#).is_err());
    }

    #[test]
    fn string_ids_print_without_quotes() {
        let msg: Message = serde_json::from_str(r#"{"id":"a1","text":"yo"}"#).unwrap();
        assert_eq!(msg.listing_line(), "a1: yo");
    }

    #[test]
    fn text_validation_bounds() {
        assert_eq!(validate_text(""), Err(ValidationError::EmptyText));
        assert!(validate_text("x").is_ok());
        assert!(validate_text(&"x".repeat(MAX_MESSAGE_LEN)).is_ok());
        assert_eq!(
            validate_text(&"x".repeat(MAX_MESSAGE_LEN + 1)),
            Err(ValidationError::TextTooLong { len: MAX_MESSAGE_LEN + 1 })
        );
        // counted in characters, not bytes
        assert!(validate_text(&"é".repeat(MAX_MESSAGE_LEN)).is_ok());
    }

    #[test]
    fn validation_messages() {
        assert_eq!(ValidationError::EmptyText.to_string(), "Message cannot be empty");
        assert_eq!(
            ValidationError::TextTooLong { len: 10_001 }.to_string(),
            "Error: Message too long (max 10000 characters)"
        );
    }

    #[test]
    fn login_response_without_token() {
        let resp: LoginResponse = serde_json::from_str(r#"{"error":"No username"}"#).unwrap();
        assert!(resp.token.is_none());
    }
}

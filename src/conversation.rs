//! Conversation history passed to routing and completion
//!
//! A conversation is an ordered, immutable sequence of role-tagged messages.
//! The same value feeds feature estimation and the completion request body.

use serde::{Deserialize, Serialize};

/// Speaker of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A single message in a conversation
///
/// Fields are private; a message cannot change after construction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConversationMessage {
    role: Role,
    content: String,
}

impl ConversationMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Ordered dialogue history
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<ConversationMessage>,
}

impl Conversation {
    pub fn new(messages: Vec<ConversationMessage>) -> Self {
        Self { messages }
    }

    /// Conversation holding a single user message
    ///
    /// Used when a caller supplies a prompt without any history.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self::new(vec![ConversationMessage::user(prompt)])
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// All message contents joined by single spaces
    pub fn joined_text(&self) -> String {
        self.messages
            .iter()
            .map(ConversationMessage::content)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<Vec<ConversationMessage>> for Conversation {
    fn from(messages: Vec<ConversationMessage>) -> Self {
        Self::new(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_prompt_creates_single_user_message() {
        let conversation = Conversation::from_prompt("list files");
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].role(), Role::User);
        assert_eq!(conversation.messages()[0].content(), "list files");
    }

    #[test]
    fn test_joined_text_uses_single_spaces() {
        let conversation = Conversation::new(vec![
            ConversationMessage::system("be brief"),
            ConversationMessage::user("hi"),
            ConversationMessage::assistant("hello"),
        ]);
        assert_eq!(conversation.joined_text(), "be brief hi hello");
    }

    #[test]
    fn test_joined_text_empty_conversation() {
        assert_eq!(Conversation::default().joined_text(), "");
        assert!(Conversation::default().is_empty());
    }

    #[test]
    fn test_message_serde_uses_lowercase_roles() {
        let message = ConversationMessage::assistant("done");
        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"done"}"#);

        let parsed: ConversationMessage =
            serde_json::from_str(r#"{"role":"system","content":"rules"}"#).unwrap();
        assert_eq!(parsed.role(), Role::System);
        assert_eq!(parsed.content(), "rules");
    }

    #[test]
    fn test_conversation_serializes_as_array() {
        let conversation = Conversation::from_prompt("hi");
        let json = serde_json::to_string(&conversation).unwrap();
        assert_eq!(json, r#"[{"role":"user","content":"hi"}]"#);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let result = serde_json::from_str::<ConversationMessage>(r#"{"role":"tool","content":"x"}"#);
        assert!(result.is_err());
    }
}

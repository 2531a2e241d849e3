//! Request body shared by the routing and execution endpoints

use crate::conversation::{Conversation, ConversationMessage};
use serde::{Deserialize, Deserializer};

/// Maximum allowed prompt length in characters (100K chars)
pub const MAX_PROMPT_LENGTH: usize = 100_000;

/// Maximum total characters across all history messages (1M chars)
pub const MAX_HISTORY_LENGTH: usize = 1_000_000;

/// Prompt plus optional dialogue history
///
/// Validation is enforced during deserialization - invalid instances cannot exist.
#[derive(Debug, Clone)]
pub struct PromptRequest {
    prompt: String,
    messages: Option<Vec<ConversationMessage>>,
}

impl PromptRequest {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Conversation to route and send
    ///
    /// Uses the supplied history when present and non-empty, otherwise a
    /// single user message holding the prompt.
    pub fn conversation(&self) -> Conversation {
        match &self.messages {
            Some(messages) if !messages.is_empty() => Conversation::new(messages.clone()),
            _ => Conversation::from_prompt(self.prompt.clone()),
        }
    }
}

impl<'de> Deserialize<'de> for PromptRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct RawPromptRequest {
            prompt: String,
            #[serde(default)]
            messages: Option<Vec<ConversationMessage>>,
        }

        let raw = RawPromptRequest::deserialize(deserializer)?;

        if raw.prompt.trim().is_empty() {
            return Err(serde::de::Error::custom(
                "prompt cannot be empty or contain only whitespace",
            ));
        }

        let char_count = raw.prompt.chars().count();
        if char_count > MAX_PROMPT_LENGTH {
            return Err(serde::de::Error::custom(format!(
                "prompt exceeds maximum length of {} characters (got {})",
                MAX_PROMPT_LENGTH, char_count
            )));
        }

        if let Some(messages) = &raw.messages {
            let history_chars: usize = messages
                .iter()
                .map(|message| message.content().chars().count())
                .sum();
            if history_chars > MAX_HISTORY_LENGTH {
                return Err(serde::de::Error::custom(format!(
                    "messages exceed maximum total length of {} characters (got {})",
                    MAX_HISTORY_LENGTH, history_chars
                )));
            }
        }

        Ok(PromptRequest {
            prompt: raw.prompt,
            messages: raw.messages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;

    #[test]
    fn test_prompt_only_builds_single_user_message() {
        let request: PromptRequest = serde_json::from_str(r#"{"prompt": "list files"}"#).unwrap();
        let conversation = request.conversation();
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].role(), Role::User);
        assert_eq!(conversation.messages()[0].content(), "list files");
    }

    #[test]
    fn test_history_is_used_verbatim() {
        let request: PromptRequest = serde_json::from_str(
            r#"{
                "prompt": "now add tests",
                "messages": [
                    {"role": "user", "content": "write parse_date"},
                    {"role": "assistant", "content": "fn parse_date() {}"},
                    {"role": "user", "content": "now add tests"}
                ]
            }"#,
        )
        .unwrap();
        let conversation = request.conversation();
        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.messages()[1].role(), Role::Assistant);
    }

    #[test]
    fn test_empty_history_falls_back_to_prompt() {
        let request: PromptRequest =
            serde_json::from_str(r#"{"prompt": "hi", "messages": []}"#).unwrap();
        assert_eq!(request.conversation().len(), 1);
    }

    #[test]
    fn test_rejects_blank_prompt() {
        let err = serde_json::from_str::<PromptRequest>(r#"{"prompt": "   "}"#).unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_rejects_oversized_prompt() {
        let body = serde_json::json!({ "prompt": "a".repeat(MAX_PROMPT_LENGTH + 1) });
        let err = serde_json::from_value::<PromptRequest>(body).unwrap_err();
        assert!(err.to_string().contains("maximum length"));
    }

    #[test]
    fn test_accepts_prompt_at_limit() {
        let body = serde_json::json!({ "prompt": "a".repeat(MAX_PROMPT_LENGTH) });
        assert!(serde_json::from_value::<PromptRequest>(body).is_ok());
    }

    #[test]
    fn test_rejects_oversized_history() {
        let half = "a".repeat(MAX_HISTORY_LENGTH / 2);
        let body = serde_json::json!({
            "prompt": "summarize",
            "messages": [
                {"role": "user", "content": half},
                {"role": "assistant", "content": half},
                {"role": "user", "content": "summarize"}
            ]
        });
        let err = serde_json::from_value::<PromptRequest>(body).unwrap_err();
        assert!(err.to_string().contains("maximum total length"), "{}", err);
    }

    #[test]
    fn test_accepts_history_at_limit() {
        let body = serde_json::json!({
            "prompt": "summarize",
            "messages": [{"role": "user", "content": "a".repeat(MAX_HISTORY_LENGTH)}]
        });
        let request = serde_json::from_value::<PromptRequest>(body).unwrap();
        assert_eq!(request.conversation().len(), 1);
    }

    #[test]
    fn test_rejects_unknown_role() {
        let result = serde_json::from_str::<PromptRequest>(
            r#"{"prompt": "x", "messages": [{"role": "tool", "content": "y"}]}"#,
        );
        assert!(result.is_err());
    }
}

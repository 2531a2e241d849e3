//! Coarse request features used for routing
//!
//! Token volume and attached-file count are estimated from the raw conversation
//! text. No tokenizer is involved: the numbers only need to be good enough to
//! tell a one-line question from a pasted codebase.

use crate::conversation::Conversation;
use regex::Regex;
use std::sync::LazyLock;

/// Code fence marker; a pair of these delimits one fenced block
const CODE_FENCE: &str = "```";

/// Path-like word followed by a 1-5 character extension (`src/main.rs`, `utils.py`)
static FILE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\w/\\]+\.\w{1,5}").expect("file reference pattern is valid")
});

/// Number of file-like mentions treated as evidence of one attached file
const FILE_REFS_PER_FILE: usize = 3;

/// Characters per token for the crude token estimate
const CHARS_PER_TOKEN: usize = 4;

/// Signals derived from a conversation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct Features {
    /// Approximate token count of the whole conversation
    pub approx_token_count: usize,
    /// Approximate number of files included in the conversation
    pub approx_file_count: usize,
}

impl Features {
    pub fn new(approx_token_count: usize, approx_file_count: usize) -> Self {
        Self {
            approx_token_count,
            approx_file_count,
        }
    }
}

/// Derive routing features from a conversation
pub fn estimate(conversation: &Conversation) -> Features {
    let text = conversation.joined_text();
    Features {
        approx_token_count: estimate_tokens(&text),
        approx_file_count: count_context_files(&text),
    }
}

/// Estimate token count from text (chars / 4)
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}

/// Estimate how many files are included in the text
///
/// Either a fenced code block or a cluster of three file-like mentions counts
/// as one file. Taking the max keeps a fenced file that is also mentioned by
/// name from being counted twice.
pub fn count_context_files(text: &str) -> usize {
    let fences = text.matches(CODE_FENCE).count() / 2;
    let file_refs = FILE_REFERENCE.find_iter(text).count();
    fences.max(file_refs / FILE_REFS_PER_FILE)
}

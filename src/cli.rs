//! Command-line interface for Tierroute
//!
//! Provides argument parsing, subcommand handling, and output rendering for
//! the Tierroute binary.

use crate::execution::{ExecutionOutcome, ExecutionResult};
use crate::router::TierDecision;
use clap::{Parser, Subcommand};

/// Config file looked up when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "tierroute.toml";

/// Tiered model router with retry and escalation
#[derive(Parser, Debug)]
#[command(name = "tierroute")]
#[command(version)]
#[command(about = "Tiered model router with retry and escalation")]
#[command(
    long_about = "Tierroute classifies a prompt into one of four capability tiers (L1-L4), \
    sends it to the tier's model through an OpenAI-compatible proxy, retries on failure, \
    and escalates failing local requests to the L3 cloud model.\n\n\
    With no subcommand, the remaining arguments are joined into the prompt. \
    Without arguments the prompt is read from stdin.\n\n\
    A prompt whose first word is a subcommand name (classify, config, serve) \
    must follow `--`, e.g. `tierroute -- classify this error`."
)]
pub struct Cli {
    /// Path to configuration file [default: tierroute.toml, built-in defaults if missing]
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Attempts at the classified tier before escalating (overrides config)
    #[arg(long, value_name = "N")]
    pub max_local_retries: Option<usize>,

    /// Prompt to run (words are joined with spaces)
    #[arg(value_name = "PROMPT")]
    pub prompt: Vec<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Config path to load and whether it was given explicitly
    pub fn config_path(&self) -> (&str, bool) {
        match &self.config {
            Some(path) => (path.as_str(), true),
            None => (DEFAULT_CONFIG_PATH, false),
        }
    }

    /// Prompt from the positional arguments, if any
    pub fn prompt_text(&self) -> Option<String> {
        join_prompt(&self.prompt)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify a prompt and print the routing decision without calling a model
    Classify {
        #[arg(required = true, value_name = "PROMPT")]
        prompt: Vec<String>,
    },
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Serve the HTTP API
    Serve {
        /// Override server.host
        #[arg(long)]
        host: Option<String>,
        /// Override server.port
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Join prompt words; `None` when nothing but whitespace remains
pub fn join_prompt(words: &[String]) -> Option<String> {
    let prompt = words.join(" ");
    if prompt.trim().is_empty() {
        None
    } else {
        Some(prompt)
    }
}

/// Text printed for an execution result
pub fn render_result(result: &ExecutionResult) -> String {
    match result.outcome() {
        ExecutionOutcome::Completed(content) => format!(
            "--- Response from {} ({}) ---\n{}",
            result.tier(),
            result.model_id(),
            content
        ),
        ExecutionOutcome::Failed(error) => format!("[ERROR] {}", error),
    }
}

/// Text printed by `tierroute classify`
pub fn render_decision(decision: &TierDecision) -> String {
    let features = decision.features();
    format!(
        "Tier:    {}\nModel:   {}\nRule:    {}\nReason:  {}\nContext: ~{} tokens, {} files",
        decision.tier(),
        decision.model_id(),
        decision.rule().as_str(),
        decision.reason(),
        features.approx_token_count,
        features.approx_file_count
    )
}

/// Generate template configuration content
///
/// Every value shown is the built-in default, so the generated file loads to
/// the same configuration as no file at all.
pub fn generate_config_template() -> &'static str {
    r#"# Tierroute Configuration
# ========================
#
# Every section and field is optional; omitted values use the defaults shown.

# ─────────────────────────────────────────────────────────────────────────────
# COMPLETION PROXY
# ─────────────────────────────────────────────────────────────────────────────
#
# Any OpenAI-compatible chat-completions endpoint (e.g. a LiteLLM proxy).

[proxy]
# Base URL (http or https, must end with /v1)
base_url = "http://localhost:4000/v1"

# Environment variable holding the bearer token
api_key_env = "LITELLM_MASTER_KEY"

# Fallback token used when the environment variable is unset
# api_key = "sk-..."

# ─────────────────────────────────────────────────────────────────────────────
# ROUTING
# ─────────────────────────────────────────────────────────────────────────────
#
# Rules, first match wins:
#   1. Large context + L4 keyword -> L4
#   2. Large context              -> L3
#   3. L4 keyword                 -> L4
#   4. L1 keyword                 -> L1
#   5. L2 keyword                 -> L2
#   6. Otherwise                  -> L3
#
# Keywords match case-insensitively as substrings of the prompt.

[routing]
# Simple lookups, file operations, formatting
l1_keywords = [
    "list files", "what does this command", "show me", "find file",
    "rename", "move", "copy", "delete", "ls", "cat", "grep", "dir",
    "format this", "convert", "what is", "explain this error",
]

# Unit tests, boilerplate, small functions
l2_keywords = [
    "write a test", "unit test", "write a function", "boilerplate",
    "add a method", "css", "html", "simple script", "regex", "parse",
    "validate", "serialize", "type definition",
]

# Architecture, large refactors, system design
l4_keywords = [
    "architect", "design", "system design", "refactor the entire",
    "breaking change", "migration strategy", "redesign", "evaluate tradeoffs",
    "review this architecture", "spec", "technical requirements",
    "interface design",
]

# Context is "large" when it references more files or tokens than this
max_local_files = 3
max_local_tokens = 8000

# ─────────────────────────────────────────────────────────────────────────────
# MODELS
# ─────────────────────────────────────────────────────────────────────────────
#
# Model identifiers sent to the proxy. L1/L2 are local, L3/L4 are cloud.

[models]
l1 = "l1-intern"
l2 = "l2-junior"
l3 = "l3-senior"
l4 = "l4-architect"

# ─────────────────────────────────────────────────────────────────────────────
# EXECUTION
# ─────────────────────────────────────────────────────────────────────────────

[execution]
# Attempts at the classified tier (at least 1). When a local tier (L1/L2)
# fails every attempt, the request is sent once to L3.
max_local_retries = 2

# Timeout per regular attempt, in seconds (1-3600)
local_timeout_seconds = 120

# Timeout for the escalation attempt, in seconds (1-3600)
escalation_timeout_seconds = 300

# ─────────────────────────────────────────────────────────────────────────────
# SERVER (tierroute serve)
# ─────────────────────────────────────────────────────────────────────────────

[server]
host = "127.0.0.1"
port = 4100

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error" (RUST_LOG overrides)
log_level = "info"
"#
}

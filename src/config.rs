//! Configuration management for Tierroute
//!
//! Parses TOML configuration files and provides typed access to settings.
//! Every section has defaults, so an empty file (or no file at all) yields the
//! stock keyword lists, tier models, and retry budget.

use crate::error::{AppError, AppResult};
use crate::router::Tier;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound for any completion timeout
pub const MAX_TIMEOUT_SECONDS: u64 = 3600;

/// Levels accepted for `observability.log_level`
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub models: TierModels,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Completion proxy configuration (OpenAI-compatible, e.g. LiteLLM)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProxyConfig {
    pub base_url: String,
    /// Environment variable holding the proxy key
    pub api_key_env: String,
    /// Key used when the environment variable is unset
    pub api_key: Option<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000/v1".to_string(),
            api_key_env: "LITELLM_MASTER_KEY".to_string(),
            api_key: None,
        }
    }
}

impl ProxyConfig {
    /// Resolve the API key: environment variable first, then the config value
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.api_key.clone())
    }
}

/// Case-insensitive substring keyword list for one tier
///
/// Keywords are lowercased and de-duplicated on construction, keeping the
/// first occurrence of each.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().to_lowercase();
            if !normalized.contains(&keyword) {
                normalized.push(keyword);
            }
        }
        Self {
            keywords: normalized,
        }
    }

    /// First keyword contained in the (already lowercased) text
    pub fn first_match(&self, lowered_text: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|keyword| lowered_text.contains(keyword.as_str()))
            .map(String::as_str)
    }

    /// True when any keyword is a substring of the (already lowercased) text
    pub fn matches(&self, lowered_text: &str) -> bool {
        self.first_match(lowered_text).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

impl From<Vec<String>> for KeywordSet {
    fn from(keywords: Vec<String>) -> Self {
        Self::new(keywords)
    }
}

impl From<KeywordSet> for Vec<String> {
    fn from(set: KeywordSet) -> Self {
        set.keywords
    }
}

/// Simple lookups, file operations, formatting
pub const DEFAULT_L1_KEYWORDS: &[&str] = &[
    "list files",
    "what does this command",
    "show me",
    "find file",
    "rename",
    "move",
    "copy",
    "delete",
    "ls",
    "cat",
    "grep",
    "dir",
    "format this",
    "convert",
    "what is",
    "explain this error",
];

/// Unit tests, boilerplate, small functions
pub const DEFAULT_L2_KEYWORDS: &[&str] = &[
    "write a test",
    "unit test",
    "write a function",
    "boilerplate",
    "add a method",
    "css",
    "html",
    "simple script",
    "regex",
    "parse",
    "validate",
    "serialize",
    "type definition",
];

/// Architecture, large refactors, system design
pub const DEFAULT_L4_KEYWORDS: &[&str] = &[
    "architect",
    "design",
    "system design",
    "refactor the entire",
    "breaking change",
    "migration strategy",
    "redesign",
    "evaluate tradeoffs",
    "review this architecture",
    "spec",
    "technical requirements",
    "interface design",
];

/// Routing configuration: keyword lists and large-context thresholds
///
/// There is no L3 keyword list. L3 is reached by default,
/// by the large-context rule, or by escalation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutingConfig {
    pub l1_keywords: KeywordSet,
    pub l2_keywords: KeywordSet,
    pub l4_keywords: KeywordSet,
    /// Conversations with more files than this skip the local tiers
    pub max_local_files: usize,
    /// Conversations with more tokens than this skip the local tiers
    pub max_local_tokens: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            l1_keywords: KeywordSet::new(DEFAULT_L1_KEYWORDS),
            l2_keywords: KeywordSet::new(DEFAULT_L2_KEYWORDS),
            l4_keywords: KeywordSet::new(DEFAULT_L4_KEYWORDS),
            max_local_files: 3,
            max_local_tokens: 8000,
        }
    }
}

/// Static tier → model identifier table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TierModels {
    pub l1: String,
    pub l2: String,
    pub l3: String,
    pub l4: String,
}

impl Default for TierModels {
    fn default() -> Self {
        Self {
            l1: "l1-intern".to_string(),
            l2: "l2-junior".to_string(),
            l3: "l3-senior".to_string(),
            l4: "l4-architect".to_string(),
        }
    }
}

impl TierModels {
    /// Model identifier configured for a tier
    pub fn model_for(&self, tier: Tier) -> &str {
        match tier {
            Tier::L1 => &self.l1,
            Tier::L2 => &self.l2,
            Tier::L3 => &self.l3,
            Tier::L4 => &self.l4,
        }
    }
}

/// Retry budget and completion timeouts
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutionConfig {
    /// Attempts per request at the classified tier (at least 1)
    pub max_local_retries: usize,
    /// Timeout for each regular attempt
    pub local_timeout_seconds: u64,
    /// Timeout for the single L3 escalation attempt
    pub escalation_timeout_seconds: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_local_retries: 2,
            local_timeout_seconds: 120,
            escalation_timeout_seconds: 300,
        }
    }
}

impl ExecutionConfig {
    pub fn local_timeout(&self) -> Duration {
        Duration::from_secs(self.local_timeout_seconds)
    }

    pub fn escalation_timeout(&self) -> Duration {
        Duration::from_secs(self.escalation_timeout_seconds)
    }
}

/// HTTP server configuration (`tierroute serve`)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4100,
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        // Phase 1: Read file (preserves io::Error context)
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|source| AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            })?;

        // Phase 2: Parse TOML (preserves toml::de::Error context)
        let config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        // Phase 3: Validate parsed config (provides contextual reason)
        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Load from `path`, or fall back to defaults when the file does not exist
    ///
    /// Any other failure (unreadable, unparsable, invalid) is still an error.
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        if !path.as_ref().exists() {
            tracing::debug!(
                path = %path.as_ref().display(),
                "Config file not found, using built-in defaults"
            );
            return Ok(Self::default());
        }
        Self::from_file(path)
    }

    /// Validate configuration after parsing
    ///
    /// This is called automatically by `from_file()` and `from_str()`, but can
    /// also be called explicitly when constructing Config in code.
    pub fn validate(&self) -> AppResult<()> {
        // Keywords: an empty keyword is a substring of every prompt and
        // would make its tier match unconditionally
        for (list_name, keywords) in [
            ("l1_keywords", &self.routing.l1_keywords),
            ("l2_keywords", &self.routing.l2_keywords),
            ("l4_keywords", &self.routing.l4_keywords),
        ] {
            if keywords.iter().any(|keyword| keyword.trim().is_empty()) {
                return Err(AppError::Config(format!(
                    "routing.{} contains an empty keyword. \
                    Empty keywords match every prompt; remove the entry.",
                    list_name
                )));
            }
        }

        // Models
        for tier in Tier::ALL {
            if self.models.model_for(tier).trim().is_empty() {
                return Err(AppError::Config(format!(
                    "models.{} must name a model identifier",
                    tier.as_str().to_lowercase()
                )));
            }
        }

        // Execution
        if self.execution.max_local_retries == 0 {
            return Err(AppError::Config(
                "execution.max_local_retries must be at least 1".to_string(),
            ));
        }
        for (field, seconds) in [
            ("local_timeout_seconds", self.execution.local_timeout_seconds),
            (
                "escalation_timeout_seconds",
                self.execution.escalation_timeout_seconds,
            ),
        ] {
            if seconds == 0 {
                return Err(AppError::Config(format!(
                    "execution.{} must be greater than 0",
                    field
                )));
            }
            if seconds > MAX_TIMEOUT_SECONDS {
                return Err(AppError::Config(format!(
                    "execution.{} cannot exceed {} seconds, got {}",
                    field, MAX_TIMEOUT_SECONDS, seconds
                )));
            }
        }

        // Proxy
        let base_url = &self.proxy.base_url;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "proxy.base_url '{}' must start with 'http://' or 'https://'",
                base_url
            )));
        }
        if !base_url.ends_with("/v1") {
            return Err(AppError::Config(format!(
                "proxy.base_url '{}' must end with '/v1' (e.g., 'http://localhost:4000/v1')",
                base_url
            )));
        }
        if self.proxy.api_key_env.trim().is_empty() {
            return Err(AppError::Config(
                "proxy.api_key_env must name an environment variable".to_string(),
            ));
        }

        // Observability: EnvFilter silently drops a directive it cannot parse
        let log_level = &self.observability.log_level;
        if !LOG_LEVELS
            .iter()
            .any(|level| level.eq_ignore_ascii_case(log_level))
        {
            return Err(AppError::Config(format!(
                "observability.log_level '{}' must be one of: {}",
                log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}

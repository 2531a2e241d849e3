//! Rule-based tier classification
//!
//! Fast, deterministic routing using keyword matching on the prompt and the
//! size of the conversation. Zero LLM overhead - all decisions are pure CPU
//! logic.
//!
//! Rules are an ordered table evaluated first-match-wins. The order encodes
//! priority:
//! 1. Large context + architecture keywords → L4
//! 2. Large context → L3 (local tiers are too slow for big inputs)
//! 3. Architecture keywords → L4
//! 4. Simple-task keywords → L1
//! 5. Standard-coding keywords → L2
//! 6. Default → L3

use super::features::{self, Features};
use super::{Tier, TierDecision};
use crate::config::{Config, KeywordSet, RoutingConfig, TierModels};
use crate::conversation::Conversation;
use serde::Serialize;

/// Identifies which classification rule produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    LargeContextArchitecture,
    LargeContext,
    Architecture,
    SimpleTask,
    StandardCoding,
    Default,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LargeContextArchitecture => "large_context_architecture",
            Self::LargeContext => "large_context",
            Self::Architecture => "architecture",
            Self::SimpleTask => "simple_task",
            Self::StandardCoding => "standard_coding",
            Self::Default => "default",
        }
    }

    fn reason(&self, features: &Features) -> String {
        match self {
            Self::LargeContextArchitecture => format!(
                "Large context ({} files, ~{} tokens) + architecture signals",
                features.approx_file_count, features.approx_token_count
            ),
            Self::LargeContext => format!(
                "Large context ({} files, ~{} tokens) -> cloud",
                features.approx_file_count, features.approx_token_count
            ),
            Self::Architecture => "Architecture/design task detected".to_string(),
            Self::SimpleTask => "Simple lookup/command task".to_string(),
            Self::StandardCoding => "Standard coding task, local model capable".to_string(),
            Self::Default => "No strong signals, defaulting to cloud senior".to_string(),
        }
    }
}

/// Everything a rule predicate may look at
#[derive(Debug, Clone, Copy)]
struct Signals {
    large_context: bool,
    architecture: bool,
    simple_task: bool,
    standard_coding: bool,
}

#[derive(Clone, Copy)]
struct Rule {
    kind: RuleKind,
    tier: Tier,
    applies: fn(&Signals) -> bool,
}

fn large_context_architecture(s: &Signals) -> bool {
    s.large_context && s.architecture
}

fn large_context(s: &Signals) -> bool {
    s.large_context
}

fn architecture(s: &Signals) -> bool {
    s.architecture
}

fn simple_task(s: &Signals) -> bool {
    s.simple_task
}

fn standard_coding(s: &Signals) -> bool {
    s.standard_coding
}

fn always(_: &Signals) -> bool {
    true
}

const DEFAULT_RULE: Rule = Rule {
    kind: RuleKind::Default,
    tier: Tier::L3,
    applies: always,
};

/// Classification rules in priority order; the last one always applies
const RULES: [Rule; 6] = [
    Rule {
        kind: RuleKind::LargeContextArchitecture,
        tier: Tier::L4,
        applies: large_context_architecture,
    },
    Rule {
        kind: RuleKind::LargeContext,
        tier: Tier::L3,
        applies: large_context,
    },
    Rule {
        kind: RuleKind::Architecture,
        tier: Tier::L4,
        applies: architecture,
    },
    Rule {
        kind: RuleKind::SimpleTask,
        tier: Tier::L1,
        applies: simple_task,
    },
    Rule {
        kind: RuleKind::StandardCoding,
        tier: Tier::L2,
        applies: standard_coding,
    },
    DEFAULT_RULE,
];

/// Rule order as (rule, tier) pairs, highest priority first
pub fn rule_order() -> impl Iterator<Item = (RuleKind, Tier)> {
    RULES.iter().map(|rule| (rule.kind, rule.tier))
}

/// Rule-based classifier mapping requests to tiers
#[derive(Debug, Clone)]
pub struct TierClassifier {
    l1_keywords: KeywordSet,
    l2_keywords: KeywordSet,
    l4_keywords: KeywordSet,
    max_local_files: usize,
    max_local_tokens: usize,
    models: TierModels,
}

impl Default for TierClassifier {
    fn default() -> Self {
        Self::new(&RoutingConfig::default(), &TierModels::default())
    }
}

impl TierClassifier {
    /// Create a classifier from routing settings and the tier → model table
    pub fn new(routing: &RoutingConfig, models: &TierModels) -> Self {
        Self {
            l1_keywords: routing.l1_keywords.clone(),
            l2_keywords: routing.l2_keywords.clone(),
            l4_keywords: routing.l4_keywords.clone(),
            max_local_files: routing.max_local_files,
            max_local_tokens: routing.max_local_tokens,
            models: models.clone(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.routing, &config.models)
    }

    /// Tier → model table used for decisions
    pub fn models(&self) -> &TierModels {
        &self.models
    }

    /// Classify a request from its prompt and conversation history
    ///
    /// Total and deterministic: every input yields exactly one decision.
    pub fn classify(&self, prompt: &str, conversation: &Conversation) -> TierDecision {
        self.classify_features(prompt, features::estimate(conversation))
    }

    /// Classify a request from precomputed features
    pub fn classify_features(&self, prompt: &str, features: Features) -> TierDecision {
        let prompt_lower = prompt.to_lowercase();
        let signals = Signals {
            large_context: features.approx_file_count > self.max_local_files
                || features.approx_token_count > self.max_local_tokens,
            architecture: self.l4_keywords.matches(&prompt_lower),
            simple_task: self.l1_keywords.matches(&prompt_lower),
            standard_coding: self.l2_keywords.matches(&prompt_lower),
        };

        let rule = RULES
            .iter()
            .find(|rule| (rule.applies)(&signals))
            .unwrap_or(&DEFAULT_RULE);

        tracing::debug!(
            rule = rule.kind.as_str(),
            tier = %rule.tier,
            token_estimate = features.approx_token_count,
            file_estimate = features.approx_file_count,
            "Classification rule matched"
        );

        TierDecision::new(
            rule.tier,
            self.models.model_for(rule.tier),
            rule.kind.reason(&features),
            rule.kind,
            features,
        )
    }
}

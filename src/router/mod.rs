//! Routing logic for Tierroute
//!
//! Estimates request features and classifies each request into one of four
//! capability tiers.

pub mod features;
pub mod rule_based;

pub use features::{Features, estimate};
pub use rule_based::{RuleKind, TierClassifier};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Capability/cost tier
///
/// L1 and L2 run on local models; L3 and L4 are cloud models.
/// Model identifiers for each tier live in `config.toml` under `[models]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    /// Local 1.5B class: file ops, simple lookups, formatting
    L1,
    /// Local 7B class: unit tests, boilerplate, simple functions
    L2,
    /// Cloud senior: features, debugging, multi-file changes
    L3,
    /// Cloud architect: architecture, complex refactors, system design
    L4,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::L1, Tier::L2, Tier::L3, Tier::L4];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::L3 => "L3",
            Self::L4 => "L4",
        }
    }

    /// True for tiers served by local models (eligible for escalation)
    pub fn is_local(&self) -> bool {
        matches!(self, Self::L1 | Self::L2)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a request
///
/// Produced once per request and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierDecision {
    tier: Tier,
    #[serde(rename = "model")]
    model_id: String,
    reason: String,
    rule: RuleKind,
    features: Features,
}

impl TierDecision {
    pub fn new(
        tier: Tier,
        model_id: impl Into<String>,
        reason: impl Into<String>,
        rule: RuleKind,
        features: Features,
    ) -> Self {
        Self {
            tier,
            model_id: model_id.into(),
            reason: reason.into(),
            rule,
            features,
        }
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Human-readable explanation of which rule fired and on what signals
    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn rule(&self) -> RuleKind {
        self.rule
    }

    pub fn features(&self) -> Features {
        self.features
    }
}

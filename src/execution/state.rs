//! Attempt state machine
//!
//! States: `Attempting { attempt }` → `EscalatedAttempt` → `Succeeded` | `Failed`.
//!
//! `EscalatedAttempt` is entered only from `Attempting` on a local tier after
//! the last permitted attempt, switches the route to L3, and can only move to
//! a terminal state. That makes "at most one escalation, only from L1/L2, only
//! to L3" a property of the transition table.

use super::ExecutionResult;
use super::policy::ExecutionPolicy;
use crate::error::AppError;
use crate::router::{Tier, TierDecision};
use std::time::Duration;

/// Error text of a result whose attempts all failed without escalation
pub const ALL_ATTEMPTS_FAILED: &str = "all attempts failed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
    /// Regular attempt at the classified tier (1-indexed)
    Attempting { attempt: usize },
    /// The single L3 attempt after a local tier ran out of retries
    EscalatedAttempt,
    Succeeded { content: String },
    Failed { error: String },
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }
}

/// A completion call the driver must perform next
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCall {
    pub tier: Tier,
    pub model: String,
    pub timeout: Duration,
    /// Attempt number at the classified tier, or `None` for the escalation
    pub attempt: Option<usize>,
}

impl PlannedCall {
    pub fn is_escalation(&self) -> bool {
        self.attempt.is_none()
    }
}

/// Next thing the driver should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Call(PlannedCall),
    Done(ExecutionResult),
}

/// Per-request attempt machine
///
/// Owns the request's attempt counter and current tier/model; nothing here is
/// shared between requests.
#[derive(Debug)]
pub struct AttemptMachine {
    state: AttemptState,
    tier: Tier,
    model: String,
    escalation_model: String,
    policy: ExecutionPolicy,
    calls: usize,
    escalated: bool,
}

impl AttemptMachine {
    pub fn new(
        decision: &TierDecision,
        escalation_model: impl Into<String>,
        policy: ExecutionPolicy,
    ) -> Self {
        Self {
            state: AttemptState::Attempting { attempt: 1 },
            tier: decision.tier(),
            model: decision.model_id().to_string(),
            escalation_model: escalation_model.into(),
            policy,
            calls: 0,
            escalated: false,
        }
    }

    pub fn state(&self) -> &AttemptState {
        &self.state
    }

    /// Step for the current state without consuming an outcome
    pub fn current(&self) -> Step {
        match &self.state {
            AttemptState::Attempting { attempt } => Step::Call(PlannedCall {
                tier: self.tier,
                model: self.model.clone(),
                timeout: self.policy.local_timeout(),
                attempt: Some(*attempt),
            }),
            AttemptState::EscalatedAttempt => Step::Call(PlannedCall {
                tier: self.tier,
                model: self.model.clone(),
                timeout: self.policy.escalation_timeout(),
                attempt: None,
            }),
            AttemptState::Succeeded { content } => Step::Done(ExecutionResult::completed(
                self.tier,
                self.model.clone(),
                content.clone(),
                self.calls,
                self.escalated,
            )),
            AttemptState::Failed { error } => Step::Done(ExecutionResult::failed(
                self.tier,
                self.model.clone(),
                error.clone(),
                self.calls,
                self.escalated,
            )),
        }
    }

    /// Feed the outcome of the planned call and return the next step
    ///
    /// Outcomes fed in a terminal state are ignored.
    pub fn advance(&mut self, outcome: Result<String, AppError>) -> Step {
        let next = match (&self.state, outcome) {
            (AttemptState::Succeeded { .. } | AttemptState::Failed { .. }, _) => {
                return self.current();
            }
            (AttemptState::Attempting { attempt }, Ok(content)) => {
                self.calls += 1;
                tracing::info!(
                    tier = %self.tier,
                    model = %self.model,
                    attempt = *attempt,
                    "Success on attempt {}",
                    attempt
                );
                AttemptState::Succeeded { content }
            }
            (AttemptState::Attempting { attempt }, Err(error)) => {
                self.calls += 1;
                let attempt = *attempt;
                tracing::warn!(
                    tier = %self.tier,
                    model = %self.model,
                    attempt = attempt,
                    max_local_retries = self.policy.max_local_retries(),
                    error = %error,
                    "Attempt {} failed: {}",
                    attempt,
                    error
                );
                self.after_failed_attempt(attempt)
            }
            (AttemptState::EscalatedAttempt, Ok(content)) => {
                self.calls += 1;
                tracing::info!(
                    tier = %self.tier,
                    model = %self.model,
                    "Escalated attempt succeeded"
                );
                AttemptState::Succeeded { content }
            }
            (AttemptState::EscalatedAttempt, Err(error)) => {
                self.calls += 1;
                tracing::error!(
                    tier = %self.tier,
                    model = %self.model,
                    error = %error,
                    "Escalated attempt failed, giving up"
                );
                AttemptState::Failed {
                    error: error.to_string(),
                }
            }
        };

        self.state = next;
        self.current()
    }

    fn after_failed_attempt(&mut self, attempt: usize) -> AttemptState {
        if attempt < self.policy.max_local_retries() {
            return AttemptState::Attempting {
                attempt: attempt + 1,
            };
        }

        if self.tier.is_local() {
            tracing::info!(
                from_tier = %self.tier,
                from_model = %self.model,
                to_model = %self.escalation_model,
                attempts = attempt,
                "Escalating to L3 (cloud)"
            );
            self.tier = Tier::L3;
            self.model = self.escalation_model.clone();
            self.escalated = true;
            return AttemptState::EscalatedAttempt;
        }

        tracing::error!(
            tier = %self.tier,
            model = %self.model,
            attempts = attempt,
            "All retry attempts exhausted"
        );
        AttemptState::Failed {
            error: ALL_ATTEMPTS_FAILED.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{Features, RuleKind};

    fn decision(tier: Tier, model: &str) -> TierDecision {
        TierDecision::new(tier, model, "test", RuleKind::Default, Features::default())
    }

    fn fail() -> Result<String, AppError> {
        Err(AppError::CompletionFailed {
            model: "m".to_string(),
            reason: "boom".to_string(),
        })
    }

    fn expect_call(step: Step) -> PlannedCall {
        match step {
            Step::Call(call) => call,
            Step::Done(result) => panic!("expected a call, got {:?}", result),
        }
    }

    fn expect_done(step: Step) -> ExecutionResult {
        match step {
            Step::Done(result) => result,
            Step::Call(call) => panic!("expected a result, got {:?}", call),
        }
    }

    #[test]
    fn test_starts_attempting_at_classified_tier() {
        let machine = AttemptMachine::new(
            &decision(Tier::L2, "l2-junior"),
            "l3-senior",
            ExecutionPolicy::default(),
        );
        assert_eq!(machine.state(), &AttemptState::Attempting { attempt: 1 });
        let call = expect_call(machine.current());
        assert_eq!(call.tier, Tier::L2);
        assert_eq!(call.model, "l2-junior");
        assert_eq!(call.timeout, Duration::from_secs(120));
        assert_eq!(call.attempt, Some(1));
    }

    #[test]
    fn test_success_terminates_immediately() {
        let mut machine = AttemptMachine::new(
            &decision(Tier::L1, "l1-intern"),
            "l3-senior",
            ExecutionPolicy::default(),
        );
        let result = expect_done(machine.advance(Ok("done".to_string())));
        assert_eq!(result.tier(), Tier::L1);
        assert_eq!(result.content(), Some("done"));
        assert_eq!(result.attempts(), 1);
        assert!(!result.escalated());
    }

    #[test]
    fn test_local_failure_retries_then_escalates() {
        let mut machine = AttemptMachine::new(
            &decision(Tier::L1, "l1-intern"),
            "l3-senior",
            ExecutionPolicy::default(),
        );
        let second = expect_call(machine.advance(fail()));
        assert_eq!(second.attempt, Some(2));
        assert_eq!(second.tier, Tier::L1);

        let escalation = expect_call(machine.advance(fail()));
        assert!(escalation.is_escalation());
        assert_eq!(escalation.tier, Tier::L3);
        assert_eq!(escalation.model, "l3-senior");
        assert_eq!(escalation.timeout, Duration::from_secs(300));
        assert_eq!(machine.state(), &AttemptState::EscalatedAttempt);
    }

    #[test]
    fn test_escalation_failure_is_terminal_with_its_error() {
        let mut machine = AttemptMachine::new(
            &decision(Tier::L2, "l2-junior"),
            "l3-senior",
            ExecutionPolicy::default(),
        );
        machine.advance(fail());
        machine.advance(fail());
        let result = expect_done(machine.advance(Err(AppError::CompletionTimeout {
            model: "l3-senior".to_string(),
            timeout_seconds: 300,
        })));
        assert_eq!(result.tier(), Tier::L3);
        assert_eq!(result.model_id(), "l3-senior");
        assert_eq!(
            result.error(),
            Some("Completion request to l3-senior timed out after 300 seconds")
        );
        assert_eq!(result.attempts(), 3);
        assert!(result.escalated());
    }

    #[test]
    fn test_cloud_tier_exhaustion_does_not_escalate() {
        let mut machine = AttemptMachine::new(
            &decision(Tier::L4, "l4-architect"),
            "l3-senior",
            ExecutionPolicy::default(),
        );
        expect_call(machine.advance(fail()));
        let result = expect_done(machine.advance(fail()));
        assert_eq!(result.tier(), Tier::L4);
        assert_eq!(result.model_id(), "l4-architect");
        assert_eq!(result.error(), Some(ALL_ATTEMPTS_FAILED));
        assert!(!result.escalated());
    }

    #[test]
    fn test_single_attempt_budget_escalates_after_first_failure() {
        let policy = ExecutionPolicy::default().with_max_local_retries(1).unwrap();
        let mut machine = AttemptMachine::new(&decision(Tier::L1, "l1-intern"), "l3-senior", policy);
        let call = expect_call(machine.advance(fail()));
        assert!(call.is_escalation());
    }

    #[test]
    fn test_outcomes_after_terminal_state_are_ignored() {
        let mut machine = AttemptMachine::new(
            &decision(Tier::L3, "l3-senior"),
            "l3-senior",
            ExecutionPolicy::default(),
        );
        machine.advance(Ok("first".to_string()));
        let result = expect_done(machine.advance(fail()));
        assert_eq!(result.content(), Some("first"));
        assert_eq!(result.attempts(), 1);
        assert!(machine.state().is_terminal());
    }
}

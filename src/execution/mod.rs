//! Execution controller
//!
//! Classifies a request, then drives completion calls through the attempt
//! state machine: bounded retries at the classified tier, and a single
//! escalation to L3 when a local tier runs out of attempts.

pub mod policy;
pub mod state;

pub use policy::ExecutionPolicy;
pub use state::{ALL_ATTEMPTS_FAILED, AttemptMachine, AttemptState, PlannedCall, Step};

use crate::config::Config;
use crate::conversation::Conversation;
use crate::error::{AppError, AppResult};
use crate::metrics::{Metrics, Outcome};
use crate::models::CompletionClient;
use crate::router::{Tier, TierClassifier, TierDecision};
use serde::Serialize;
use std::sync::Arc;

/// Terminal outcome of an execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ExecutionOutcome {
    #[serde(rename = "content")]
    Completed(String),
    #[serde(rename = "error")]
    Failed(String),
}

/// Result of executing one request
///
/// Exactly one of content and error is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    tier: Tier,
    #[serde(rename = "model")]
    model_id: String,
    #[serde(flatten)]
    outcome: ExecutionOutcome,
    attempts: usize,
    escalated: bool,
}

impl ExecutionResult {
    pub fn completed(
        tier: Tier,
        model_id: impl Into<String>,
        content: impl Into<String>,
        attempts: usize,
        escalated: bool,
    ) -> Self {
        Self {
            tier,
            model_id: model_id.into(),
            outcome: ExecutionOutcome::Completed(content.into()),
            attempts,
            escalated,
        }
    }

    pub fn failed(
        tier: Tier,
        model_id: impl Into<String>,
        error: impl Into<String>,
        attempts: usize,
        escalated: bool,
    ) -> Self {
        Self {
            tier,
            model_id: model_id.into(),
            outcome: ExecutionOutcome::Failed(error.into()),
            attempts,
            escalated,
        }
    }

    /// Tier that produced the final outcome (L3 after escalation)
    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn outcome(&self) -> &ExecutionOutcome {
        &self.outcome
    }

    pub fn content(&self) -> Option<&str> {
        match &self.outcome {
            ExecutionOutcome::Completed(content) => Some(content),
            ExecutionOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            ExecutionOutcome::Completed(_) => None,
            ExecutionOutcome::Failed(error) => Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ExecutionOutcome::Completed(_))
    }

    /// Number of completion calls made
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn escalated(&self) -> bool {
        self.escalated
    }
}

/// Runs requests against the completion collaborator
///
/// Holds no per-request state; share it behind `Arc` across tasks.
#[derive(Clone)]
pub struct Executor {
    classifier: TierClassifier,
    client: Arc<dyn CompletionClient>,
    policy: ExecutionPolicy,
    metrics: Option<Arc<Metrics>>,
}

impl Executor {
    pub fn new(
        classifier: TierClassifier,
        client: Arc<dyn CompletionClient>,
        policy: ExecutionPolicy,
    ) -> Self {
        Self {
            classifier,
            client,
            policy,
            metrics: None,
        }
    }

    /// Build an executor from configuration
    ///
    /// # Errors
    /// Returns a config error if the `[execution]` section is invalid.
    pub fn from_config(config: &Config, client: Arc<dyn CompletionClient>) -> AppResult<Self> {
        Ok(Self::new(
            TierClassifier::from_config(config),
            client,
            ExecutionPolicy::from_config(&config.execution)?,
        ))
    }

    /// Attach a metrics collector
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn policy(&self) -> &ExecutionPolicy {
        &self.policy
    }

    /// Classify without calling any model
    pub fn classify(&self, prompt: &str, conversation: &Conversation) -> TierDecision {
        self.classifier.classify(prompt, conversation)
    }

    /// Execute with the configured policy
    pub async fn execute(&self, prompt: &str, conversation: &Conversation) -> ExecutionResult {
        self.execute_with_policy(prompt, conversation, &self.policy)
            .await
    }

    /// Execute a bare prompt as a single-message conversation
    pub async fn run_prompt(&self, prompt: &str) -> ExecutionResult {
        let conversation = Conversation::from_prompt(prompt);
        self.execute(prompt, &conversation).await
    }

    /// Execute with an explicit policy
    ///
    /// Never fails: completion errors are retried, escalated, and finally
    /// reported in the returned result.
    pub async fn execute_with_policy(
        &self,
        prompt: &str,
        conversation: &Conversation,
        policy: &ExecutionPolicy,
    ) -> ExecutionResult {
        let decision = self.classifier.classify(prompt, conversation);

        tracing::info!(
            tier = %decision.tier(),
            model = %decision.model_id(),
            reason = %decision.reason(),
            rule = decision.rule().as_str(),
            "Routing to {} ({}): {}",
            decision.tier(),
            decision.model_id(),
            decision.reason()
        );
        self.record(|m| m.record_request(decision.tier()), "record_request");

        let mut machine =
            AttemptMachine::new(&decision, self.classifier.models().l3.clone(), *policy);
        let mut step = machine.current();

        loop {
            match step {
                Step::Call(call) => {
                    if call.is_escalation() {
                        self.record(
                            |m| m.record_escalation(decision.tier()),
                            "record_escalation",
                        );
                    }
                    let outcome = self.invoke(&call, conversation).await;
                    let attempt_outcome = if outcome.is_ok() {
                        Outcome::Success
                    } else {
                        Outcome::Failure
                    };
                    self.record(
                        |m| m.record_attempt(call.tier, attempt_outcome),
                        "record_attempt",
                    );
                    step = machine.advance(outcome);
                }
                Step::Done(result) => {
                    let final_outcome = if result.is_success() {
                        Outcome::Success
                    } else {
                        Outcome::Failure
                    };
                    self.record(
                        |m| m.record_result(result.tier(), final_outcome),
                        "record_result",
                    );
                    return result;
                }
            }
        }
    }

    /// Perform one completion call, enforcing its timeout locally
    async fn invoke(&self, call: &PlannedCall, conversation: &Conversation) -> AppResult<String> {
        let request = self.client.complete(&call.model, conversation, call.timeout);
        match tokio::time::timeout(call.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(AppError::CompletionTimeout {
                model: call.model.clone(),
                timeout_seconds: call.timeout.as_secs(),
            }),
        }
    }

    /// Run a metrics recording, logging failures without affecting execution
    fn record<F>(&self, record: F, operation: &'static str)
    where
        F: FnOnce(&Metrics) -> Result<(), prometheus::Error>,
    {
        let Some(metrics) = &self.metrics else {
            return;
        };
        if let Err(e) = record(metrics) {
            tracing::error!(
                error = %e,
                operation = operation,
                "Metrics recording failed (non-fatal): {}. Execution will continue.",
                e
            );
            metrics.metrics_recording_failure(operation);
        }
    }
}

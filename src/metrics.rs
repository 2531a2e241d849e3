//! Prometheus metrics collection for Tierroute
//!
//! This module provides metrics instrumentation for tracking:
//! - Routing decisions by tier
//! - Completion attempts by tier and outcome
//! - Escalations from local tiers to L3
//! - Terminal execution results by tier and outcome
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.
//! Recording is best-effort: callers log failures and carry on, so metrics can
//! never change a routing or execution outcome.

use crate::router::Tier;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Outcome label for attempts and results
///
/// Restricting outcomes to an enum keeps label cardinality fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    /// Convert outcome to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
        }
    }
}

/// Metrics collector for Tierroute
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    requests_total: IntCounterVec,
    attempts_total: IntCounterVec,
    escalations_total: IntCounterVec,
    results_total: IntCounterVec,
    metrics_recording_failures: IntCounterVec,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// Registers all metrics with a new Prometheus registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 4 tiers
        let requests_total = IntCounterVec::new(
            Opts::new(
                "tierroute_requests_total",
                "Total number of routing decisions by classified tier",
            ),
            &["tier"],
        )?;

        // Cardinality: 4 tiers × 2 outcomes
        let attempts_total = IntCounterVec::new(
            Opts::new(
                "tierroute_attempts_total",
                "Total completion attempts by tier and outcome (escalation attempts included)",
            ),
            &["tier", "outcome"],
        )?;

        // Cardinality: 2 local tiers
        let escalations_total = IntCounterVec::new(
            Opts::new(
                "tierroute_escalations_total",
                "Total escalations from a local tier (L1/L2) to L3 after the retry budget ran out",
            ),
            &["from_tier"],
        )?;

        // Cardinality: 4 tiers × 2 outcomes
        let results_total = IntCounterVec::new(
            Opts::new(
                "tierroute_results_total",
                "Total terminal execution results by final tier and outcome",
            ),
            &["tier", "outcome"],
        )?;

        let metrics_recording_failures = IntCounterVec::new(
            Opts::new(
                "tierroute_metrics_recording_failures_total",
                "Total number of metrics recording operation failures by operation. \
                Indicates Prometheus internal errors - frequent failures require investigation.",
            ),
            &["operation"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(attempts_total.clone()))?;
        registry.register(Box::new(escalations_total.clone()))?;
        registry.register(Box::new(results_total.clone()))?;
        registry.register(Box::new(metrics_recording_failures.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            attempts_total,
            escalations_total,
            results_total,
            metrics_recording_failures,
        })
    }

    /// Record a routing decision for a tier
    ///
    /// # Errors
    ///
    /// Returns an error if the label set does not match the metric.
    pub fn record_request(&self, tier: Tier) -> Result<(), prometheus::Error> {
        self.requests_total
            .get_metric_with_label_values(&[tier.as_str()])?
            .inc();
        Ok(())
    }

    /// Record one completion attempt
    pub fn record_attempt(&self, tier: Tier, outcome: Outcome) -> Result<(), prometheus::Error> {
        self.attempts_total
            .get_metric_with_label_values(&[tier.as_str(), outcome.as_str()])?
            .inc();
        Ok(())
    }

    /// Record an escalation to L3 from the classified local tier
    pub fn record_escalation(&self, from_tier: Tier) -> Result<(), prometheus::Error> {
        self.escalations_total
            .get_metric_with_label_values(&[from_tier.as_str()])?
            .inc();
        Ok(())
    }

    /// Record the terminal result of one execution
    pub fn record_result(&self, tier: Tier, outcome: Outcome) -> Result<(), prometheus::Error> {
        self.results_total
            .get_metric_with_label_values(&[tier.as_str(), outcome.as_str()])?
            .inc();
        Ok(())
    }

    /// Record a metrics recording operation failure
    ///
    /// `operation` is one of "record_request", "record_attempt",
    /// "record_escalation", "record_result".
    pub fn metrics_recording_failure(&self, operation: &str) {
        self.metrics_recording_failures
            .with_label_values(&[operation])
            .inc();
    }

    pub fn requests_count(&self, tier: Tier) -> u64 {
        self.requests_total.with_label_values(&[tier.as_str()]).get()
    }

    pub fn attempts_count(&self, tier: Tier, outcome: Outcome) -> u64 {
        self.attempts_total
            .with_label_values(&[tier.as_str(), outcome.as_str()])
            .get()
    }

    /// Escalations summed over every source tier
    pub fn escalations_count(&self) -> u64 {
        Tier::ALL
            .iter()
            .map(|tier| self.escalations_from_count(*tier))
            .sum()
    }

    pub fn escalations_from_count(&self, from_tier: Tier) -> u64 {
        self.escalations_total
            .with_label_values(&[from_tier.as_str()])
            .get()
    }

    pub fn results_count(&self, tier: Tier, outcome: Outcome) -> u64 {
        self.results_total
            .with_label_values(&[tier.as_str(), outcome.as_str()])
            .get()
    }

    /// Total metrics recording failures across all operations
    ///
    /// Used by the /health endpoint to report metrics system status.
    pub fn metrics_recording_failures_count(&self) -> u64 {
        ["record_request", "record_attempt", "record_result"]
            .iter()
            .map(|op| {
                self.metrics_recording_failures
                    .with_label_values(&[*op])
                    .get()
            })
            .sum()
    }

    /// Encode all metrics in Prometheus text exposition format
    ///
    /// # Errors
    ///
    /// Returns an error if metric encoding fails.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();

        tracing::debug!(
            metric_family_count = metric_families.len(),
            "Encoding metrics to Prometheus text format"
        );

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&metric_families, &mut buffer)?;

        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!(
                "Failed to convert metrics to UTF-8 at byte {}: {}",
                e.utf8_error().valid_up_to(),
                e
            ))
        })
    }
}

//! Retry budget and timeouts for one execution

use crate::config::ExecutionConfig;
use crate::error::{AppError, AppResult};
use std::time::Duration;

/// Default number of attempts at the classified tier
pub const DEFAULT_MAX_LOCAL_RETRIES: usize = 2;
/// Default timeout for each regular attempt
pub const DEFAULT_LOCAL_TIMEOUT: Duration = Duration::from_secs(120);
/// Default timeout for the escalation attempt
pub const DEFAULT_ESCALATION_TIMEOUT: Duration = Duration::from_secs(300);

/// Configuration for execution with retries and escalation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionPolicy {
    /// Attempts at the classified tier (must be at least 1)
    max_local_retries: usize,
    local_timeout: Duration,
    escalation_timeout: Duration,
}

impl ExecutionPolicy {
    /// Create a new execution policy
    ///
    /// # Errors
    /// Returns an error if `max_local_retries` is 0 or either timeout is zero.
    pub fn new(
        max_local_retries: usize,
        local_timeout: Duration,
        escalation_timeout: Duration,
    ) -> AppResult<Self> {
        if max_local_retries == 0 {
            return Err(AppError::Config(
                "max_local_retries must be at least 1".to_string(),
            ));
        }
        if local_timeout.is_zero() || escalation_timeout.is_zero() {
            return Err(AppError::Config(
                "completion timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            max_local_retries,
            local_timeout,
            escalation_timeout,
        })
    }

    /// Build a policy from the `[execution]` config section
    pub fn from_config(execution: &ExecutionConfig) -> AppResult<Self> {
        Self::new(
            execution.max_local_retries,
            execution.local_timeout(),
            execution.escalation_timeout(),
        )
    }

    /// Same policy with a different retry budget
    pub fn with_max_local_retries(self, max_local_retries: usize) -> AppResult<Self> {
        Self::new(max_local_retries, self.local_timeout, self.escalation_timeout)
    }

    pub fn max_local_retries(&self) -> usize {
        self.max_local_retries
    }

    pub fn local_timeout(&self) -> Duration {
        self.local_timeout
    }

    pub fn escalation_timeout(&self) -> Duration {
        self.escalation_timeout
    }
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            max_local_retries: DEFAULT_MAX_LOCAL_RETRIES,
            local_timeout: DEFAULT_LOCAL_TIMEOUT,
            escalation_timeout: DEFAULT_ESCALATION_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = ExecutionPolicy::default();
        assert_eq!(policy.max_local_retries(), 2);
        assert_eq!(policy.local_timeout(), Duration::from_secs(120));
        assert_eq!(policy.escalation_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn test_default_equivalent_to_config_defaults() {
        let from_config =
            ExecutionPolicy::from_config(&ExecutionConfig::default()).expect("defaults valid");
        assert_eq!(from_config, ExecutionPolicy::default());
    }

    #[test]
    fn test_rejects_zero_retries() {
        let result = ExecutionPolicy::new(0, DEFAULT_LOCAL_TIMEOUT, DEFAULT_ESCALATION_TIMEOUT);
        let err = result.expect_err("should reject zero retries");
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_accepts_one_retry() {
        let policy = ExecutionPolicy::new(1, DEFAULT_LOCAL_TIMEOUT, DEFAULT_ESCALATION_TIMEOUT)
            .expect("should accept 1 retry");
        assert_eq!(policy.max_local_retries(), 1);
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(ExecutionPolicy::new(2, Duration::ZERO, DEFAULT_ESCALATION_TIMEOUT).is_err());
        assert!(ExecutionPolicy::new(2, DEFAULT_LOCAL_TIMEOUT, Duration::ZERO).is_err());
    }

    #[test]
    fn test_with_max_local_retries_keeps_timeouts() {
        let policy = ExecutionPolicy::default()
            .with_max_local_retries(5)
            .expect("valid");
        assert_eq!(policy.max_local_retries(), 5);
        assert_eq!(policy.local_timeout(), DEFAULT_LOCAL_TIMEOUT);
        assert!(ExecutionPolicy::default().with_max_local_retries(0).is_err());
    }
}

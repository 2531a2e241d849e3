//! Concurrent execution tests
//!
//! One `Executor` is shared by many in-flight requests. Each request owns its
//! attempt counter and tier/model, so interleaved failures in one request
//! must never leak into another.

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tierroute::conversation::Conversation;
use tierroute::error::{AppError, AppResult};
use tierroute::execution::{ExecutionPolicy, Executor};
use tierroute::metrics::{Metrics, Outcome};
use tierroute::models::CompletionClient;
use tierroute::router::{Tier, TierClassifier};

/// Fails local models, answers cloud models, yielding between calls
struct LocalDownClient;

#[async_trait]
impl CompletionClient for LocalDownClient {
    async fn complete(
        &self,
        model_id: &str,
        conversation: &Conversation,
        _timeout: Duration,
    ) -> AppResult<String> {
        tokio::task::yield_now().await;
        match model_id {
            "l1-intern" | "l2-junior" => Err(AppError::CompletionFailed {
                model: model_id.to_string(),
                reason: "local runtime offline".to_string(),
            }),
            _ => Ok(conversation.joined_text()),
        }
    }
}

fn shared_executor(metrics: Arc<Metrics>) -> Arc<Executor> {
    Arc::new(
        Executor::new(
            TierClassifier::default(),
            Arc::new(LocalDownClient),
            ExecutionPolicy::default(),
        )
        .with_metrics(metrics),
    )
}

#[tokio::test]
async fn test_concurrent_requests_keep_independent_state() {
    let metrics = Arc::new(Metrics::new().unwrap());
    let executor = shared_executor(metrics.clone());

    let prompts: Vec<String> = (0..20)
        .map(|i| match i % 4 {
            0 => format!("rename file_{}.txt", i),
            1 => format!("write a unit test for case {}", i),
            2 => format!("help me think about problem {}", i),
            _ => format!("redesign module {}", i),
        })
        .collect();

    let results = join_all(prompts.iter().map(|prompt| {
        let executor = executor.clone();
        async move { (prompt.clone(), executor.run_prompt(prompt).await) }
    }))
    .await;

    for (prompt, result) in &results {
        // Every request answers with its own prompt text
        assert_eq!(result.content(), Some(prompt.as_str()));
        if prompt.starts_with("rename") || prompt.starts_with("write") {
            assert_eq!(result.tier(), Tier::L3, "{}", prompt);
            assert!(result.escalated());
            assert_eq!(result.attempts(), 3);
        } else if prompt.starts_with("redesign") {
            assert_eq!(result.tier(), Tier::L4);
            assert_eq!(result.attempts(), 1);
        } else {
            assert_eq!(result.tier(), Tier::L3);
            assert!(!result.escalated());
            assert_eq!(result.attempts(), 1);
        }
    }

    assert_eq!(metrics.escalations_count(), 10);
    assert_eq!(metrics.attempts_count(Tier::L1, Outcome::Failure), 10);
    assert_eq!(metrics.attempts_count(Tier::L2, Outcome::Failure), 10);
    assert_eq!(metrics.results_count(Tier::L3, Outcome::Success), 15);
    assert_eq!(metrics.results_count(Tier::L4, Outcome::Success), 5);
}

#[tokio::test]
async fn test_spawned_tasks_share_executor() {
    let executor = shared_executor(Arc::new(Metrics::new().unwrap()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let executor = executor.clone();
            tokio::spawn(async move { executor.run_prompt(&format!("list files {}", i)).await })
        })
        .collect();

    for handle in handles {
        let result = handle.await.expect("task should not panic");
        assert_eq!(result.tier(), Tier::L3);
        assert!(result.escalated());
    }
}

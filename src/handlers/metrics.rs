//! Prometheus metrics endpoint
//!
//! Exposes metrics in Prometheus text format for scraping.

use axum::{extract::State, http::StatusCode};

use crate::handlers::AppState;

/// Metrics handler for Prometheus scraping
///
/// # Response
///
/// - `200 OK` with metrics in Prometheus text format
/// - `500 Internal Server Error` if metrics collection fails
///
/// # Example
///
/// ```bash
/// curl http://localhost:4100/metrics
/// # HELP tierroute_requests_total Total number of routing decisions by classified tier
/// # TYPE tierroute_requests_total counter
/// tierroute_requests_total{tier="L2"} 42
/// ```
pub async fn handler(State(state): State<AppState>) -> (StatusCode, String) {
    match state.metrics().gather() {
        Ok(output) => (StatusCode::OK, output),
        Err(e) => {
            tracing::error!(
                error = %e,
                "Failed to gather metrics for Prometheus scraping: {}",
                e
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to gather metrics: {}", e),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::test_state;
    use crate::router::Tier;

    #[tokio::test]
    async fn test_metrics_handler_returns_prometheus_format() {
        let state = test_state();
        state.metrics().record_request(Tier::L1).unwrap();

        let (status, body) = handler(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("# HELP"));
        assert!(body.contains("# TYPE"));
        assert!(body.contains(r#"tierroute_requests_total{tier="L1"} 1"#));
    }

    #[tokio::test]
    async fn test_concurrent_metrics_scraping() {
        let state = test_state();
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let state = state.clone();
                tokio::spawn(async move { handler(State(state)).await })
            })
            .collect();

        for handle in handles {
            let (status, _) = handle.await.expect("task should not panic");
            assert_eq!(status, StatusCode::OK);
        }
    }
}

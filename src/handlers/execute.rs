//! Execution endpoint handler
//!
//! Handles POST /v1/execute: classify, call the model with retries and
//! escalation, and return the terminal `ExecutionResult`.

use crate::execution::ExecutionResult;
use crate::handlers::AppState;
use crate::handlers::extractor::ApiJson;
use crate::handlers::request::PromptRequest;
use crate::middleware::RequestId;
use axum::{Extension, Json, extract::State, http::StatusCode};
use tracing::Instrument;

/// POST /v1/execute handler
///
/// # Response
///
/// - `200 OK` with the result when a model answered
/// - `502 Bad Gateway` with the result (carrying `error`) when every attempt failed
///
/// Worst-case latency with defaults is two 120s local attempts plus one 300s
/// escalation attempt.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ApiJson(request): ApiJson<PromptRequest>,
) -> (StatusCode, Json<ExecutionResult>) {
    let conversation = request.conversation();

    tracing::debug!(
        request_id = %request_id,
        prompt_length = request.prompt().len(),
        message_count = conversation.len(),
        "Received execute request"
    );

    let span = tracing::info_span!("execute", request_id = %request_id);
    let result = state
        .executor()
        .execute(request.prompt(), &conversation)
        .instrument(span)
        .await;

    let status = if result.is_success() {
        StatusCode::OK
    } else {
        tracing::warn!(
            request_id = %request_id,
            tier = %result.tier(),
            model = %result.model_id(),
            attempts = result.attempts(),
            error = result.error().unwrap_or_default(),
            "Execution failed"
        );
        StatusCode::BAD_GATEWAY
    };

    (status, Json(result))
}

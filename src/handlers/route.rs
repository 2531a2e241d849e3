//! Routing endpoint handler
//!
//! Handles POST /v1/route: classification only, no model is called.

use crate::handlers::AppState;
use crate::handlers::extractor::ApiJson;
use crate::handlers::request::PromptRequest;
use crate::middleware::RequestId;
use crate::router::TierDecision;
use axum::{Extension, Json, extract::State};

/// POST /v1/route handler
///
/// Returns the `TierDecision` the executor would act on.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ApiJson(request): ApiJson<PromptRequest>,
) -> Json<TierDecision> {
    let conversation = request.conversation();
    let decision = state.executor().classify(request.prompt(), &conversation);

    tracing::info!(
        request_id = %request_id,
        tier = %decision.tier(),
        model = %decision.model_id(),
        rule = decision.rule().as_str(),
        reason = %decision.reason(),
        "Classified request"
    );

    Json(decision)
}

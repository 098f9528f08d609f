//! Chat completion API

use axum::{extract::State, Extension, Json};

use relay_core::llm::{ChatCompletionRequest, ChatCompletionResponse};
use relay_core::Principal;
use relay_llm::unified::filter::RequestContext;

use crate::api::ApiError;
use crate::state::AppState;

/// POST /v1/chat/completions
pub async fn chat_completions(
    State(state): State<AppState>,
    Extension(_principal): Extension<Principal>,
    Json(request): Json<ChatCompletionRequest>,
) -> Result<Json<ChatCompletionResponse>, ApiError> {
    // Plain chat requests reference no managed resource, so the deployment
    // filter passes the healthy list through unchanged.
    let context = RequestContext::default();
    let response = state.router.chat_completion(request, &context).await?;

    Ok(Json(response))
}

//! Vector store API
//!
//! Creation fans the store out across the configured target models and
//! returns a unified id. Retrieval, deletion and search accept both unified
//! ids (resolved through the gateway's records) and provider-native ids
//! (passed through untouched).

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use relay_core::llm::{DeletedObject, VectorStoreCreateRequest, VectorStoreSearchRequest, VectorStoreSearchResponse};
use relay_core::Principal;
use relay_llm::unified::filter::RequestContext;
use relay_llm::unified::protocol::ResourcePage;
use relay_storage::ResourceRecord;

use crate::api::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<u32>,
    pub after: Option<String>,
}

fn object_with_unified_id(mut record: ResourceRecord) -> serde_json::Value {
    if let Some(map) = record.resource_object.as_object_mut() {
        map.insert(
            "id".to_string(),
            serde_json::Value::String(record.unified_resource_id.clone()),
        );
    }
    record.resource_object
}

/// POST /v1/vector_stores
pub async fn create_vector_store(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<VectorStoreCreateRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let targets = if request.target_model_names.is_empty() {
        state.config.llm.default_resource_targets.clone()
    } else {
        request.target_model_names.clone()
    };
    if targets.is_empty() {
        return Err(ApiError::BadRequest(
            "No target models: set target_model_names or configure default targets".to_string(),
        ));
    }

    let payload =
        serde_json::to_value(&request).map_err(|e| ApiError::Internal(e.to_string()))?;
    let (_, record) = state
        .vector_stores
        .create_across_models(&payload, &targets, &principal)
        .await?;

    Ok(Json(object_with_unified_id(record)))
}

/// GET /v1/vector_stores
pub async fn list_vector_stores(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<ListParams>,
) -> Result<Json<ResourcePage>, ApiError> {
    let page = state
        .vector_stores
        .list_user_resources(&principal, params.limit, params.after.as_deref())
        .await?;
    Ok(Json(page))
}

/// GET /v1/vector_stores/:id
pub async fn get_vector_store(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.hook.authorize(&id, &principal).await?;

    let record = state
        .vector_stores
        .get_unified_resource(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Vector store {id} not found")))?;

    Ok(Json(object_with_unified_id(record)))
}

/// DELETE /v1/vector_stores/:id
pub async fn delete_vector_store(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<DeletedObject>, ApiError> {
    state.hook.authorize(&id, &principal).await?;
    state.vector_stores.delete_unified_resource(&id).await?;

    Ok(Json(DeletedObject {
        id,
        object: "vector_store.deleted".to_string(),
        deleted: true,
    }))
}

/// POST /v1/vector_stores/:id/search
pub async fn search_vector_store(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(request): Json<VectorStoreSearchRequest>,
) -> Result<Json<VectorStoreSearchResponse>, ApiError> {
    let response = match state.hook.intercept_search(&id, &principal).await? {
        Some(rewrite) => {
            state
                .router
                .search_vector_store(
                    &rewrite.routing_model,
                    &rewrite.backend_resource_id,
                    &request,
                    &rewrite.context,
                )
                .await?
        }
        None => {
            let model = request.model.clone().ok_or_else(|| {
                ApiError::BadRequest(
                    "model is required to search a provider-native vector store id".to_string(),
                )
            })?;
            state
                .router
                .search_vector_store(&model, &id, &request, &RequestContext::default())
                .await?
        }
    };

    Ok(Json(response))
}

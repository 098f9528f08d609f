//! File API
//!
//! Uploads are JSON bodies with base64 content so one request can be fanned
//! out to several backends. Unified ids come back from creation; retrieval
//! and deletion resolve them through the gateway's records.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use relay_core::llm::{DeletedObject, FileUploadRequest};
use relay_core::Principal;
use relay_llm::unified::protocol::ResourcePage;
use relay_storage::ResourceRecord;

use crate::api::vector_stores::ListParams;
use crate::api::ApiError;
use crate::state::AppState;

fn object_with_unified_id(mut record: ResourceRecord) -> serde_json::Value {
    if let Some(map) = record.resource_object.as_object_mut() {
        map.insert(
            "id".to_string(),
            serde_json::Value::String(record.unified_resource_id.clone()),
        );
    }
    record.resource_object
}

/// POST /v1/files
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<FileUploadRequest>,
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
        .files
        .create_across_models(&payload, &targets, &principal)
        .await?;

    Ok(Json(object_with_unified_id(record)))
}

/// GET /v1/files
pub async fn list_files(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<ListParams>,
) -> Result<Json<ResourcePage>, ApiError> {
    let page = state
        .files
        .list_user_resources(&principal, params.limit, params.after.as_deref())
        .await?;
    Ok(Json(page))
}

/// GET /v1/files/:id
pub async fn get_file(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.hook.authorize(&id, &principal).await?;

    let record = state
        .files
        .get_unified_resource(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("File {id} not found")))?;

    Ok(Json(object_with_unified_id(record)))
}

/// DELETE /v1/files/:id
pub async fn delete_file(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<DeletedObject>, ApiError> {
    state.hook.authorize(&id, &principal).await?;
    state.files.delete_unified_resource(&id).await?;

    Ok(Json(DeletedObject {
        id,
        object: "file".to_string(),
        deleted: true,
    }))
}

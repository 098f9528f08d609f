//! Concrete resource adapters
//!
//! Thin per-kind glue: each adapter deserializes the opaque creation payload
//! into its typed request and delegates to the router's single-backend call.

use async_trait::async_trait;
use std::sync::Arc;

use relay_core::llm::{FileUploadRequest, VectorStoreCreateRequest};

use super::protocol::ResourceAdapter;
use super::{BackendResource, ResourceError, ResourceKind};
use crate::router::Router;

/// Vector store adapter
pub struct VectorStoreAdapter;

#[async_trait]
impl ResourceAdapter for VectorStoreAdapter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::VectorStore
    }

    async fn create_for_model(
        &self,
        router: &Router,
        model_name: &str,
        payload: &serde_json::Value,
    ) -> Result<BackendResource, ResourceError> {
        let request: VectorStoreCreateRequest = serde_json::from_value(payload.clone())?;
        let (deployment, store) = router.create_vector_store(model_name, &request).await?;

        Ok(BackendResource {
            id: store.id.clone(),
            deployment_id: deployment.id,
            object: serde_json::to_value(store)?,
            storage_metadata: None,
        })
    }
}

/// Uploaded file adapter
pub struct FileAdapter;

#[async_trait]
impl ResourceAdapter for FileAdapter {
    fn kind(&self) -> ResourceKind {
        ResourceKind::File
    }

    async fn create_for_model(
        &self,
        router: &Router,
        model_name: &str,
        payload: &serde_json::Value,
    ) -> Result<BackendResource, ResourceError> {
        let request: FileUploadRequest = serde_json::from_value(payload.clone())?;
        let (deployment, file) = router.upload_file(model_name, &request).await?;

        Ok(BackendResource {
            id: file.id.clone(),
            deployment_id: deployment.id,
            object: serde_json::to_value(file)?,
            storage_metadata: None,
        })
    }
}

/// Select the adapter for a resource kind
pub fn adapter_for(kind: ResourceKind) -> Arc<dyn ResourceAdapter> {
    match kind {
        ResourceKind::VectorStore => Arc::new(VectorStoreAdapter),
        ResourceKind::File => Arc::new(FileAdapter),
    }
}

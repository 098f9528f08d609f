//! Request routing across backend deployments
//!
//! A deployment is one provider endpoint serving a logical model. Routing
//! picks candidate deployments for the requested model, lets the unified
//! resource filter narrow them to backends that actually hold a referenced
//! resource, then tries candidates in order with failover.

use crate::provider::{Provider, ProviderError, ProviderRegistry, ProviderResult};
use crate::unified::filter::{filter_deployments, RequestContext};
use relay_core::config::DeploymentConfig;
use relay_core::llm::{
    ChatCompletionRequest, ChatCompletionResponse, FileObject, FileUploadRequest,
    VectorStoreCreateRequest, VectorStoreObject, VectorStoreSearchRequest,
    VectorStoreSearchResponse,
};
use std::sync::Arc;
use tracing::{info, warn};

/// One backend deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub id: String,
    pub model_name: String,
    pub provider: String,
    pub provider_model: String,
}

impl From<DeploymentConfig> for Deployment {
    fn from(config: DeploymentConfig) -> Self {
        Self {
            id: config.id,
            model_name: config.model_name,
            provider: config.provider,
            provider_model: config.provider_model,
        }
    }
}

/// LLM request router
pub struct Router {
    registry: Arc<ProviderRegistry>,
    deployments: Vec<Deployment>,
}

impl Router {
    pub fn new(registry: Arc<ProviderRegistry>, deployments: Vec<Deployment>) -> Self {
        Self {
            registry,
            deployments,
        }
    }

    /// Deployments serving the given model, in configuration order.
    ///
    /// Accepts either a logical model name or a deployment id, since unified
    /// resource ids carry deployment ids as routing hints.
    pub fn healthy_deployments(&self, model: &str) -> Vec<Deployment> {
        self.deployments
            .iter()
            .filter(|d| d.model_name == model || d.id == model)
            .cloned()
            .collect()
    }

    /// Candidate deployments for a request, after the unified resource
    /// filter has narrowed the healthy list.
    pub fn candidate_deployments(&self, model: &str, context: &RequestContext) -> Vec<Deployment> {
        let healthy = self.healthy_deployments(model);
        filter_deployments(model, healthy, context)
    }

    fn provider_for(&self, deployment: &Deployment) -> ProviderResult<Arc<dyn Provider>> {
        self.registry
            .get(&deployment.provider)
            .ok_or_else(|| ProviderError::Unavailable(format!("Provider {}", deployment.provider)))
    }

    /// Route a chat completion request with failover across candidates
    pub async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
        context: &RequestContext,
    ) -> ProviderResult<ChatCompletionResponse> {
        let model = request.model.clone();
        let candidates = self.candidate_deployments(&model, context);
        if candidates.is_empty() {
            return Err(ProviderError::ModelNotSupported(model));
        }

        for deployment in &candidates {
            let provider = match self.provider_for(deployment) {
                Ok(p) => p,
                Err(e) => {
                    warn!(deployment = %deployment.id, error = %e, "Skipping deployment");
                    continue;
                }
            };

            let mut backend_request = request.clone();
            backend_request.model = deployment.provider_model.clone();

            match provider.chat_completion(backend_request).await {
                Ok(mut response) => {
                    response.model = model;
                    return Ok(response);
                }
                Err(e) => {
                    warn!(
                        deployment = %deployment.id,
                        provider = %deployment.provider,
                        error = %e,
                        "Deployment failed, trying next candidate"
                    );
                }
            }
        }

        Err(ProviderError::Unavailable(
            "All deployments failed".to_string(),
        ))
    }

    /// Create a vector store on exactly one deployment serving `model`.
    /// Returns the deployment used so callers can record the mapping.
    pub async fn create_vector_store(
        &self,
        model: &str,
        request: &VectorStoreCreateRequest,
    ) -> ProviderResult<(Deployment, VectorStoreObject)> {
        let deployment = self
            .healthy_deployments(model)
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ModelNotSupported(model.to_string()))?;

        let provider = self.provider_for(&deployment)?;
        let store = provider.create_vector_store(request).await?;

        info!(
            deployment = %deployment.id,
            vector_store_id = %store.id,
            "Created vector store on backend"
        );
        Ok((deployment, store))
    }

    /// Upload a file to exactly one deployment serving `model`
    pub async fn upload_file(
        &self,
        model: &str,
        request: &FileUploadRequest,
    ) -> ProviderResult<(Deployment, FileObject)> {
        let deployment = self
            .healthy_deployments(model)
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ModelNotSupported(model.to_string()))?;

        let provider = self.provider_for(&deployment)?;
        let file = provider.upload_file(request).await?;

        info!(
            deployment = %deployment.id,
            file_id = %file.id,
            "Uploaded file to backend"
        );
        Ok((deployment, file))
    }

    /// Search a vector store through a deployment chosen by the routing
    /// model and the resource-aware filter
    pub async fn search_vector_store(
        &self,
        model: &str,
        vector_store_id: &str,
        request: &VectorStoreSearchRequest,
        context: &RequestContext,
    ) -> ProviderResult<VectorStoreSearchResponse> {
        let deployment = self
            .candidate_deployments(model, context)
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ModelNotSupported(model.to_string()))?;

        let provider = self.provider_for(&deployment)?;
        provider.search_vector_store(vector_store_id, request).await
    }
}

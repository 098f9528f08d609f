//! LLM Provider abstraction

use async_trait::async_trait;
use relay_core::llm::{
    ChatCompletionRequest, ChatCompletionResponse, FileObject, FileUploadRequest,
    VectorStoreCreateRequest, VectorStoreObject, VectorStoreSearchRequest,
    VectorStoreSearchResponse,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Provider error types
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Authentication failed")]
    AuthFailed,

    #[error("Model not supported: {0}")]
    ModelNotSupported(String),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Provider trait for LLM backends.
///
/// Requests arrive with the provider-native model already substituted by the
/// router; providers never see logical model names.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name (e.g., "openai", "anthropic")
    fn name(&self) -> &str;

    /// Send chat completion request
    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> ProviderResult<ChatCompletionResponse>;

    /// Create a vector store on this backend
    async fn create_vector_store(
        &self,
        request: &VectorStoreCreateRequest,
    ) -> ProviderResult<VectorStoreObject>;

    /// Search a vector store by its backend-native id
    async fn search_vector_store(
        &self,
        vector_store_id: &str,
        request: &VectorStoreSearchRequest,
    ) -> ProviderResult<VectorStoreSearchResponse>;

    /// Upload a file to this backend
    async fn upload_file(&self, request: &FileUploadRequest) -> ProviderResult<FileObject>;

    /// Health check
    async fn health_check(&self) -> bool {
        true
    }
}

/// Registry of available providers
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn Provider>> {
        self.providers.values()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

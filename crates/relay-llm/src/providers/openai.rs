//! OpenAI provider implementation

use crate::provider::{Provider, ProviderError, ProviderResult};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use relay_core::llm::{
    ChatCompletionRequest, ChatCompletionResponse, FileObject, FileUploadRequest,
    VectorStoreCreateRequest, VectorStoreObject, VectorStoreSearchRequest,
    VectorStoreSearchResponse,
};
use reqwest::Client;
use tracing::{debug, instrument};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI provider
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    api_base: String,
}

impl OpenAIProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base: OPENAI_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base = base_url.into();
        self
    }

    fn check_status(status: reqwest::StatusCode, error_text: String) -> ProviderError {
        if status.as_u16() == 429 {
            return ProviderError::RateLimited {
                retry_after_ms: 1000,
            };
        }
        if status.as_u16() == 401 {
            return ProviderError::AuthFailed;
        }
        ProviderError::Api {
            status: status.as_u16(),
            message: error_text,
        }
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> ProviderResult<ChatCompletionResponse> {
        debug!("Sending chat completion request to OpenAI");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::check_status(status, error_text));
        }

        let completion: ChatCompletionResponse = response.json().await?;
        Ok(completion)
    }

    #[instrument(skip(self, request))]
    async fn create_vector_store(
        &self,
        request: &VectorStoreCreateRequest,
    ) -> ProviderResult<VectorStoreObject> {
        debug!("Creating vector store on OpenAI");

        let response = self
            .client
            .post(format!("{}/vector_stores", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::check_status(status, error_text));
        }

        let store: VectorStoreObject = response.json().await?;
        Ok(store)
    }

    #[instrument(skip(self, request), fields(vector_store_id = %vector_store_id))]
    async fn search_vector_store(
        &self,
        vector_store_id: &str,
        request: &VectorStoreSearchRequest,
    ) -> ProviderResult<VectorStoreSearchResponse> {
        debug!("Searching vector store on OpenAI");

        let response = self
            .client
            .post(format!(
                "{}/vector_stores/{}/search",
                self.api_base, vector_store_id
            ))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::check_status(status, error_text));
        }

        let results: VectorStoreSearchResponse = response.json().await?;
        Ok(results)
    }

    #[instrument(skip(self, request), fields(filename = %request.filename))]
    async fn upload_file(&self, request: &FileUploadRequest) -> ProviderResult<FileObject> {
        debug!("Uploading file to OpenAI");

        let bytes = STANDARD
            .decode(&request.content)
            .map_err(|e| ProviderError::Unavailable(format!("invalid file content: {e}")))?;

        let part = reqwest::multipart::Part::bytes(bytes).file_name(request.filename.clone());
        let form = reqwest::multipart::Form::new()
            .text("purpose", request.purpose.clone())
            .part("file", part);

        let response = self
            .client
            .post(format!("{}/files", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::check_status(status, error_text));
        }

        let file: FileObject = response.json().await?;
        Ok(file)
    }

    async fn health_check(&self) -> bool {
        self.client
            .get(format!("{}/models", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

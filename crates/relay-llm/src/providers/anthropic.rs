//! Anthropic Claude provider implementation

use crate::provider::{Provider, ProviderError, ProviderResult};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use relay_core::llm::{
    ChatChoice, ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatRole, FileObject,
    FileUploadRequest, Usage, VectorStoreCreateRequest, VectorStoreObject,
    VectorStoreSearchRequest, VectorStoreSearchResponse,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude provider
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    api_base: String,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base: ANTHROPIC_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base = base_url.into();
        self
    }

    fn convert_to_anthropic_request(&self, request: &ChatCompletionRequest) -> AnthropicRequest {
        let mut system = None;
        let mut messages = Vec::new();

        for msg in &request.messages {
            match msg.role {
                ChatRole::System => {
                    system = Some(msg.content.clone());
                }
                ChatRole::User => {
                    messages.push(AnthropicMessage {
                        role: "user".to_string(),
                        content: msg.content.clone(),
                    });
                }
                ChatRole::Assistant => {
                    messages.push(AnthropicMessage {
                        role: "assistant".to_string(),
                        content: msg.content.clone(),
                    });
                }
                ChatRole::Tool => {
                    messages.push(AnthropicMessage {
                        role: "user".to_string(),
                        content: format!("[Tool Result]: {}", msg.content),
                    });
                }
            }
        }

        AnthropicRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens.unwrap_or(4096),
            messages,
            system,
            temperature: request.temperature,
            stop_sequences: request.stop.clone(),
        }
    }

    fn convert_from_anthropic_response(
        &self,
        response: AnthropicResponse,
        model: String,
    ) -> ChatCompletionResponse {
        let content = response
            .content
            .into_iter()
            .filter_map(|c| {
                if c.content_type == "text" {
                    Some(c.text)
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");

        ChatCompletionResponse {
            id: response.id,
            object: "chat.completion".to_string(),
            created: chrono::Utc::now().timestamp(),
            model,
            choices: vec![ChatChoice {
                index: 0,
                message: ChatMessage {
                    role: ChatRole::Assistant,
                    content,
                    name: None,
                },
                finish_reason: Some(response.stop_reason.unwrap_or_else(|| "stop".to_string())),
            }],
            usage: Some(Usage {
                prompt_tokens: response.usage.input_tokens,
                completion_tokens: response.usage.output_tokens,
                total_tokens: response.usage.input_tokens + response.usage.output_tokens,
            }),
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> ProviderResult<ChatCompletionResponse> {
        debug!("Sending chat completion request to Anthropic");

        let model = request.model.clone();
        let anthropic_request = self.convert_to_anthropic_request(&request);

        let response = self
            .client
            .post(format!("{}/messages", self.api_base))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&anthropic_request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited {
                    retry_after_ms: 1000,
                });
            }
            if status.as_u16() == 401 {
                return Err(ProviderError::AuthFailed);
            }

            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let anthropic_response: AnthropicResponse = response.json().await?;
        Ok(self.convert_from_anthropic_response(anthropic_response, model))
    }

    async fn create_vector_store(
        &self,
        _request: &VectorStoreCreateRequest,
    ) -> ProviderResult<VectorStoreObject> {
        Err(ProviderError::Unavailable(
            "Anthropic does not host vector stores".to_string(),
        ))
    }

    async fn search_vector_store(
        &self,
        _vector_store_id: &str,
        _request: &VectorStoreSearchRequest,
    ) -> ProviderResult<VectorStoreSearchResponse> {
        Err(ProviderError::Unavailable(
            "Anthropic does not host vector stores".to_string(),
        ))
    }

    #[instrument(skip(self, request), fields(filename = %request.filename))]
    async fn upload_file(&self, request: &FileUploadRequest) -> ProviderResult<FileObject> {
        debug!("Uploading file to Anthropic");

        let bytes = STANDARD
            .decode(&request.content)
            .map_err(|e| ProviderError::Unavailable(format!("invalid file content: {e}")))?;
        let size = bytes.len() as i64;

        let part = reqwest::multipart::Part::bytes(bytes).file_name(request.filename.clone());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/files", self.api_base))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("anthropic-beta", "files-api-2025-04-14")
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let file: AnthropicFile = response.json().await?;
        Ok(FileObject {
            id: file.id,
            object: "file".to_string(),
            bytes: file.size_bytes.unwrap_or(size),
            created_at: chrono::Utc::now().timestamp(),
            filename: file.filename,
            purpose: request.purpose.clone(),
        })
    }

    async fn health_check(&self) -> bool {
        // Anthropic doesn't have a simple health endpoint
        true
    }
}

// Anthropic API types

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    id: String,
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicFile {
    id: String,
    filename: String,
    #[serde(default)]
    size_bytes: Option<i64>,
}

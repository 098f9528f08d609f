//! LLM types - OpenAI-compatible request/response types
//!
//! Covers the chat surface plus the managed resource payloads (vector stores,
//! uploaded files) that the unified addressing layer replicates across
//! backends.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Chat completion request (OpenAI-compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Chat role
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
}

/// Chat completion response (OpenAI-compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    pub usage: Option<Usage>,
}

/// Chat choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    pub index: u32,
    pub message: ChatMessage,
    pub finish_reason: Option<String>,
}

/// Token usage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Vector store creation request (OpenAI-compatible body).
///
/// `target_model_names` selects which logical models the store is replicated
/// to; when empty the gateway falls back to its configured default targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreCreateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing)]
    pub target_model_names: Vec<String>,
}

/// Vector store object (OpenAI-compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreObject {
    pub id: String,
    pub object: String,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
}

/// Vector store search request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreSearchRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_num_results: Option<u32>,
    /// Routing model for provider-native store ids. Ignored for unified ids,
    /// which carry their own routing information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Vector store search response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreSearchResponse {
    pub object: String,
    pub search_query: String,
    pub data: Vec<VectorStoreSearchResult>,
}

/// One search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreSearchResult {
    pub file_id: String,
    pub filename: String,
    pub score: f64,
    pub content: Vec<SearchContent>,
}

/// Search hit content chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

/// File upload request.
///
/// JSON body with base64 content rather than multipart, so the payload can be
/// fanned out to several backends without re-reading a stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUploadRequest {
    pub filename: String,
    pub purpose: String,
    /// Base64-encoded file content
    pub content: String,
    #[serde(default, skip_serializing)]
    pub target_model_names: Vec<String>,
}

/// File object (OpenAI-compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileObject {
    pub id: String,
    pub object: String,
    pub bytes: i64,
    pub created_at: i64,
    pub filename: String,
    pub purpose: String,
}

/// Deletion confirmation returned by DELETE endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedObject {
    pub id: String,
    pub object: String,
    pub deleted: bool,
}

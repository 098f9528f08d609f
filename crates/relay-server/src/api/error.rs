//! API error type
//!
//! Converts the layered errors (resource protocol, providers, storage) into
//! OpenAI-style error bodies with the right status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use relay_llm::provider::ProviderError;
use relay_llm::unified::ResourceError;
use relay_storage::StorageError;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Forbidden(String),
    NotFound(String),
    RateLimited(String),
    Provider(String),
    ServiceUnavailable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request_error", msg)
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "permission_error", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found_error", msg),
            ApiError::RateLimited(msg) => {
                (StatusCode::TOO_MANY_REQUESTS, "rate_limit_error", msg)
            }
            ApiError::Provider(msg) => (StatusCode::BAD_GATEWAY, "api_error", msg),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "api_error", msg)
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "api_error", msg),
        };

        let body = serde_json::json!({
            "error": {
                "message": message,
                "type": error_type,
            }
        });

        (status, Json(body)).into_response()
    }
}

impl From<ResourceError> for ApiError {
    fn from(e: ResourceError) -> Self {
        match e {
            ResourceError::AccessDenied { .. } => ApiError::Forbidden(e.to_string()),
            ResourceError::NotFound(_) => ApiError::NotFound(e.to_string()),
            ResourceError::InvalidDescriptor(_) | ResourceError::Serialization(_) => {
                ApiError::BadRequest(e.to_string())
            }
            ResourceError::RouterNotInitialized => ApiError::ServiceUnavailable(e.to_string()),
            ResourceError::Storage(err) => ApiError::Internal(err.to_string()),
            ResourceError::Provider(err) => err.into(),
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::RateLimited { .. } => ApiError::RateLimited(e.to_string()),
            ProviderError::ModelNotSupported(_) => ApiError::BadRequest(e.to_string()),
            _ => ApiError::Provider(e.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(_) => ApiError::NotFound(e.to_string()),
            _ => ApiError::Internal(e.to_string()),
        }
    }
}

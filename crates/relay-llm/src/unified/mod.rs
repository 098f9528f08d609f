//! Unified cross-backend resource addressing
//!
//! A managed resource (vector store, uploaded file) is created redundantly on
//! several backends, then addressed through one opaque unified id. This module
//! holds the identifier codec, the managed resource protocol over the two
//! storage tiers, the deployment filter that feeds routing, and the request
//! hook that rewrites inbound calls.

pub mod adapters;
pub mod codec;
pub mod filter;
pub mod hook;
pub mod protocol;

use relay_storage::StorageError;
use thiserror::Error;

use crate::provider::ProviderError;

/// Errors of the unified resource layer
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("Router not initialized: no backends configured for managed resources")]
    RouterNotInitialized,

    #[error("Access denied: principal {principal} cannot access resource {resource_id}")]
    AccessDenied {
        resource_id: String,
        principal: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid resource descriptor: {0}")]
    InvalidDescriptor(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The closed set of managed resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    VectorStore,
    File,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::VectorStore => "vector_store",
            ResourceKind::File => "file",
        }
    }

    pub fn table_name(self) -> &'static str {
        match self {
            ResourceKind::VectorStore => "managed_vector_stores",
            ResourceKind::File => "managed_files",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "vector_store" => Some(ResourceKind::VectorStore),
            "file" => Some(ResourceKind::File),
            _ => None,
        }
    }
}

/// Backend storage location metadata, when a backend exposes one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageMetadata {
    pub backend: String,
    pub url: String,
}

/// One backend's view of a created resource
#[derive(Debug, Clone, PartialEq)]
pub struct BackendResource {
    /// Backend-native resource id
    pub id: String,
    /// Deployment the resource was created on
    pub deployment_id: String,
    /// The backend's response, kept as opaque JSON
    pub object: serde_json::Value,
    pub storage_metadata: Option<StorageMetadata>,
}

//! Gateway configuration types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub storage: StorageConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// LLM providers and deployments configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmConfig {
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Configured backend deployments, in declaration order
    #[serde(default)]
    pub deployments: Vec<DeploymentConfig>,
    /// Default target models for fan-out creation when a request names none
    #[serde(default)]
    pub default_resource_targets: Vec<String>,
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    #[serde(default)]
    pub enabled: bool,
}

/// One backend deployment: a provider endpoint serving a logical model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Unique deployment id, referenced by resource model mappings
    pub id: String,
    /// Logical model name callers route on
    pub model_name: String,
    /// Which provider hosts this deployment
    pub provider: String,
    /// Provider-native model identifier
    pub provider_model: String,
}

/// Storage configuration for the record store tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Record cache backend; in-process memory cache when unset
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
}

fn default_database_url() -> String {
    "sqlite::memory:".to_string()
}

fn default_cache_ttl() -> u64 {
    3600
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            redis_url: None,
            cache_ttl_seconds: default_cache_ttl(),
        }
    }
}

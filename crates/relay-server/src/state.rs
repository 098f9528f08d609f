//! Application state

use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use relay_core::config::GatewayConfig;
use relay_core::{GatewayError, GatewayResult};
use relay_llm::unified::adapters::adapter_for;
use relay_llm::unified::hook::RequestHook;
use relay_llm::unified::protocol::ManagedResourceService;
use relay_llm::unified::ResourceKind;
use relay_llm::{AnthropicProvider, Deployment, OpenAIProvider, ProviderRegistry, Router};
use relay_storage::{MemoryRecordCache, RecordCache, RecordStore, RedisRecordCache};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub router: Arc<Router>,
    pub vector_stores: Arc<ManagedResourceService>,
    pub files: Arc<ManagedResourceService>,
    pub hook: Arc<RequestHook>,
    pub records: RecordStore,
}

impl AppState {
    pub async fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let registry = Arc::new(build_registry(&config));

        let deployments: Vec<Deployment> = config
            .llm
            .deployments
            .iter()
            .cloned()
            .map(Deployment::from)
            .collect();
        let router = Arc::new(Router::new(registry, deployments));

        let records = RecordStore::new(&config.storage.database_url)
            .await
            .map_err(|e| GatewayError::Storage(e.to_string()))?;

        let cache: Arc<dyn RecordCache> = match &config.storage.redis_url {
            Some(url) => Arc::new(
                RedisRecordCache::connect(url)
                    .await
                    .map_err(|e| GatewayError::Storage(e.to_string()))?,
            ),
            None => Arc::new(MemoryRecordCache::new()),
        };
        let cache_ttl = Some(Duration::from_secs(config.storage.cache_ttl_seconds));

        for kind in [ResourceKind::VectorStore, ResourceKind::File] {
            records
                .ensure_resource_table(kind.table_name())
                .await
                .map_err(|e| GatewayError::Storage(e.to_string()))?;
        }

        let service_for = |kind: ResourceKind| {
            Arc::new(ManagedResourceService::new(
                adapter_for(kind),
                cache.clone(),
                records.clone(),
                Some(router.clone()),
                cache_ttl,
            ))
        };
        let vector_stores = service_for(ResourceKind::VectorStore);
        let files = service_for(ResourceKind::File);

        let hook = Arc::new(
            RequestHook::new()
                .with_service(vector_stores.clone())
                .with_service(files.clone()),
        );

        Ok(Self {
            config: Arc::new(config),
            router,
            vector_stores,
            files,
            hook,
            records,
        })
    }
}

fn build_registry(config: &GatewayConfig) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();

    for (name, provider_config) in &config.llm.providers {
        if !provider_config.enabled {
            continue;
        }
        let Some(api_key) = provider_config.api_key.clone() else {
            warn!(provider = %name, "Provider enabled without an API key, skipping");
            continue;
        };

        match name.as_str() {
            "openai" => {
                let provider = match &provider_config.api_base {
                    Some(base) => OpenAIProvider::new(api_key).with_base_url(base.clone()),
                    None => OpenAIProvider::new(api_key),
                };
                registry.register(Arc::new(provider));
            }
            "anthropic" => {
                let provider = match &provider_config.api_base {
                    Some(base) => AnthropicProvider::new(api_key).with_base_url(base.clone()),
                    None => AnthropicProvider::new(api_key),
                };
                registry.register(Arc::new(provider));
            }
            other => {
                warn!(provider = %other, "Unknown provider in configuration, skipping");
            }
        }
    }

    registry
}

//! Request hook
//!
//! Intercepts inbound calls that reference a resource id. Unified ids are
//! authorized and rewritten into a single backend-native call plus a routing
//! hint; anything that does not decode is a provider-native id and passes
//! through untouched. Creation is never intercepted here; it goes through
//! the dedicated create-across-models entry point.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use relay_core::Principal;

use super::codec;
use super::filter::RequestContext;
use super::protocol::ManagedResourceService;
use super::{ResourceError, ResourceKind};

/// The rewrite produced for a search-like call on a unified id
#[derive(Debug, Clone)]
pub struct SearchRewrite {
    /// Model (or deployment id) the request should be routed on
    pub routing_model: String,
    /// Representative backend-native resource id substituted into the call
    pub backend_resource_id: String,
    /// Routing hint for the deployment filter
    pub context: RequestContext,
}

/// Per-request interception over the registered resource services
pub struct RequestHook {
    services: HashMap<ResourceKind, Arc<ManagedResourceService>>,
}

impl RequestHook {
    pub fn new() -> Self {
        Self {
            services: HashMap::new(),
        }
    }

    pub fn with_service(mut self, service: Arc<ManagedResourceService>) -> Self {
        self.services.insert(service.kind(), service);
        self
    }

    fn service_for(&self, kind: ResourceKind) -> Option<&Arc<ManagedResourceService>> {
        self.services.get(&kind)
    }

    /// Intercept a search-like call carrying a resource id.
    ///
    /// `Ok(None)` means the id is provider-native: forward the request
    /// unchanged. For a unified id the caller must apply the returned
    /// rewrite. Routing model priority: the explicit representative model
    /// id, else the first target model name.
    pub async fn intercept_search(
        &self,
        raw_id: &str,
        principal: &Principal,
    ) -> Result<Option<SearchRewrite>, ResourceError> {
        let Some(descriptor) = codec::decode(raw_id) else {
            debug!(id = %raw_id, "Not a unified id, passing through");
            return Ok(None);
        };

        let kind = ResourceKind::from_tag(&descriptor.resource_type)
            .ok_or_else(|| ResourceError::NotFound(raw_id.to_string()))?;
        let service = self
            .service_for(kind)
            .ok_or_else(|| ResourceError::NotFound(raw_id.to_string()))?;

        let record = service
            .get_unified_resource(raw_id)
            .await?
            .filter(|r| r.created_by == principal.id)
            .ok_or_else(|| ResourceError::AccessDenied {
                resource_id: raw_id.to_string(),
                principal: principal.id.clone(),
            })?;

        let routing_model = if !descriptor.representative_model_id.is_empty() {
            descriptor.representative_model_id.clone()
        } else {
            descriptor
                .target_model_names
                .first()
                .cloned()
                .ok_or_else(|| {
                    ResourceError::InvalidDescriptor(
                        "descriptor carries no routing model".to_string(),
                    )
                })?
        };

        Ok(Some(SearchRewrite {
            routing_model,
            backend_resource_id: descriptor.representative_resource_id,
            context: RequestContext::for_resource(raw_id.to_string(), record.model_mappings),
        }))
    }

    /// Authorize a retrieve or delete call. The concrete lookup or deletion
    /// stays with the owning endpoint; this only decides access. Ids that do
    /// not decode are outside this subsystem's authority and pass.
    pub async fn authorize(&self, raw_id: &str, principal: &Principal) -> Result<(), ResourceError> {
        let Some(descriptor) = codec::decode(raw_id) else {
            return Ok(());
        };

        let kind = ResourceKind::from_tag(&descriptor.resource_type)
            .ok_or_else(|| ResourceError::NotFound(raw_id.to_string()))?;
        let service = self
            .service_for(kind)
            .ok_or_else(|| ResourceError::NotFound(raw_id.to_string()))?;

        if service.can_access(raw_id, principal).await? {
            Ok(())
        } else {
            Err(ResourceError::AccessDenied {
                resource_id: raw_id.to_string(),
                principal: principal.id.clone(),
            })
        }
    }
}

impl Default for RequestHook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderRegistry;
    use crate::router::Router;
    use crate::unified::protocol::ResourceAdapter;
    use crate::unified::BackendResource;
    use async_trait::async_trait;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use relay_storage::{MemoryRecordCache, RecordStore};

    struct StubAdapter;

    #[async_trait]
    impl ResourceAdapter for StubAdapter {
        fn kind(&self) -> ResourceKind {
            ResourceKind::VectorStore
        }

        async fn create_for_model(
            &self,
            _router: &Router,
            model_name: &str,
            _payload: &serde_json::Value,
        ) -> Result<BackendResource, ResourceError> {
            Ok(BackendResource {
                id: format!("vs_{model_name}"),
                deployment_id: format!("dep-{model_name}"),
                object: serde_json::json!({"id": format!("vs_{model_name}"), "object": "vector_store"}),
                storage_metadata: None,
            })
        }
    }

    async fn hook_with_service() -> (RequestHook, Arc<ManagedResourceService>) {
        let records = RecordStore::in_memory().await.unwrap();
        records
            .ensure_resource_table(ResourceKind::VectorStore.table_name())
            .await
            .unwrap();
        let router = Arc::new(Router::new(Arc::new(ProviderRegistry::new()), Vec::new()));
        let service = Arc::new(ManagedResourceService::new(
            Arc::new(StubAdapter),
            Arc::new(MemoryRecordCache::new()),
            records,
            Some(router),
            None,
        ));
        (RequestHook::new().with_service(service.clone()), service)
    }

    fn principal(id: &str) -> Principal {
        Principal::new(id, format!("key-{id}"))
    }

    #[tokio::test]
    async fn test_provider_native_id_passes_through() {
        let (hook, _) = hook_with_service().await;
        let p = principal("u1");

        assert!(hook.intercept_search("vs_native", &p).await.unwrap().is_none());
        hook.authorize("vs_native", &p).await.unwrap();
    }

    #[tokio::test]
    async fn test_search_rewrite_for_owner() {
        let (hook, service) = hook_with_service().await;
        let owner = principal("u1");
        let targets = vec!["m1".to_string(), "m2".to_string()];
        let (id, _) = service
            .create_across_models(&serde_json::json!({}), &targets, &owner)
            .await
            .unwrap();

        let rewrite = hook.intercept_search(&id, &owner).await.unwrap().unwrap();
        assert_eq!(rewrite.routing_model, "dep-m1");
        assert_eq!(rewrite.backend_resource_id, "vs_m1");

        let mappings = rewrite.context.model_mappings.unwrap();
        assert_eq!(mappings["dep-m1"], "vs_m1");
        assert_eq!(mappings["dep-m2"], "vs_m2");
        assert_eq!(rewrite.context.unified_resource_id.as_deref(), Some(id.as_str()));
    }

    #[tokio::test]
    async fn test_search_denied_for_other_principal() {
        let (hook, service) = hook_with_service().await;
        let owner = principal("u1");
        let intruder = principal("u2");
        let (id, _) = service
            .create_across_models(&serde_json::json!({}), &["m1".to_string()], &owner)
            .await
            .unwrap();

        let err = hook.intercept_search(&id, &intruder).await.unwrap_err();
        assert!(matches!(err, ResourceError::AccessDenied { .. }));

        let err = hook.authorize(&id, &intruder).await.unwrap_err();
        assert!(matches!(err, ResourceError::AccessDenied { .. }));
    }

    #[tokio::test]
    async fn test_routing_model_falls_back_to_first_target() {
        let (hook, service) = hook_with_service().await;
        let owner = principal("u1");

        // Hand-built id with an empty representative model field
        let raw =
            "relay-gw:vector_store;unified_id,u-1;target_model_names,m1,m2;resource_id,vs_1;model_id,";
        let id = URL_SAFE_NO_PAD.encode(raw);

        let mappings =
            HashMap::from([("dep-m1".to_string(), "vs_1".to_string())]);
        service
            .store_unified_resource(&id, None, &mappings, &owner)
            .await
            .unwrap();

        let rewrite = hook.intercept_search(&id, &owner).await.unwrap().unwrap();
        assert_eq!(rewrite.routing_model, "m1");
    }

    #[tokio::test]
    async fn test_unknown_unified_id_denied() {
        let (hook, _) = hook_with_service().await;
        let p = principal("u1");

        // Well-formed unified id that was never stored
        let raw =
            "relay-gw:vector_store;unified_id,u-9;target_model_names,m1;resource_id,vs_9;model_id,dep9";
        let id = URL_SAFE_NO_PAD.encode(raw);

        let err = hook.intercept_search(&id, &p).await.unwrap_err();
        assert!(matches!(err, ResourceError::AccessDenied { .. }));
    }
}

//! Managed resource protocol
//!
//! Generic over a resource adapter: fan-out creation across target backends,
//! unified-id generation, store/get/delete/list against the record store
//! tiers, and ownership checks.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use relay_core::Principal;
use relay_storage::{RecordCache, RecordStore, ResourceRecord};

use super::codec::{self, UnifiedResourceDescriptor};
use super::{BackendResource, ResourceError, ResourceKind};
use crate::router::Router;

/// One managed resource kind's backend-specific behavior.
///
/// The set of adapters is closed (vector stores, files); each supplies the
/// single-backend create call the protocol fans out, plus its identity.
#[async_trait]
pub trait ResourceAdapter: Send + Sync {
    fn kind(&self) -> ResourceKind;

    fn table_name(&self) -> &'static str {
        self.kind().table_name()
    }

    /// Create the resource on exactly one backend, chosen by the router for
    /// `model_name`
    async fn create_for_model(
        &self,
        router: &Router,
        model_name: &str,
        payload: &serde_json::Value,
    ) -> Result<BackendResource, ResourceError>;
}

/// One page of a user's resources
#[derive(Debug, Serialize)]
pub struct ResourcePage {
    pub object: String,
    pub data: Vec<serde_json::Value>,
    pub first_id: Option<String>,
    pub last_id: Option<String>,
    pub has_more: bool,
}

/// The managed resource protocol over one adapter and the two storage tiers
pub struct ManagedResourceService {
    adapter: Arc<dyn ResourceAdapter>,
    cache: Arc<dyn RecordCache>,
    records: RecordStore,
    router: Option<Arc<Router>>,
    cache_ttl: Option<Duration>,
}

impl ManagedResourceService {
    pub fn new(
        adapter: Arc<dyn ResourceAdapter>,
        cache: Arc<dyn RecordCache>,
        records: RecordStore,
        router: Option<Arc<Router>>,
        cache_ttl: Option<Duration>,
    ) -> Self {
        Self {
            adapter,
            cache,
            records,
            router,
            cache_ttl,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.adapter.kind()
    }

    fn table(&self) -> &'static str {
        self.adapter.table_name()
    }

    /// Sequential fan-out: create the resource on each target backend in
    /// list order. The first failure aborts the loop; backends already
    /// created are not rolled back.
    pub async fn create_for_each_model(
        &self,
        payload: &serde_json::Value,
        target_model_names: &[String],
    ) -> Result<Vec<BackendResource>, ResourceError> {
        let router = self
            .router
            .as_ref()
            .ok_or(ResourceError::RouterNotInitialized)?;

        let mut created = Vec::with_capacity(target_model_names.len());
        for model_name in target_model_names {
            match self.adapter.create_for_model(router, model_name, payload).await {
                Ok(resource) => created.push(resource),
                Err(e) => {
                    warn!(
                        model = %model_name,
                        already_created = created.len(),
                        error = %e,
                        "Fan-out creation aborted; earlier backends are not rolled back"
                    );
                    return Err(e);
                }
            }
        }
        Ok(created)
    }

    /// Build the descriptor for a completed fan-out. Representative fields
    /// come from the first backend resource only; creation order is
    /// caller-controlled, so "first target model listed" is the contract.
    pub fn generate_unified_id(
        &self,
        resources: &[BackendResource],
        target_model_names: &[String],
    ) -> Result<UnifiedResourceDescriptor, ResourceError> {
        let representative = resources.first().ok_or_else(|| {
            ResourceError::InvalidDescriptor("no backend resources to describe".to_string())
        })?;

        Ok(UnifiedResourceDescriptor::mint(
            self.kind().as_str(),
            target_model_names.to_vec(),
            representative.id.clone(),
            representative.deployment_id.clone(),
        ))
    }

    /// Authoritative routing table for a completed fan-out
    pub fn model_mappings(resources: &[BackendResource]) -> HashMap<String, String> {
        resources
            .iter()
            .map(|r| (r.deployment_id.clone(), r.id.clone()))
            .collect()
    }

    /// Write-through store: cache when a resource object is present, then
    /// unconditionally persist to the durable store.
    pub async fn store_unified_resource(
        &self,
        unified_resource_id: &str,
        resource_object: Option<&BackendResource>,
        model_mappings: &HashMap<String, String>,
        principal: &Principal,
    ) -> Result<ResourceRecord, ResourceError> {
        let (storage_backend, storage_url) = resource_object
            .and_then(|r| r.storage_metadata.as_ref())
            .map(|m| (Some(m.backend.clone()), Some(m.url.clone())))
            .unwrap_or((None, None));

        let record = ResourceRecord {
            unified_resource_id: unified_resource_id.to_string(),
            resource_type: self.kind().as_str().to_string(),
            resource_object: resource_object
                .map(|r| r.object.clone())
                .unwrap_or(serde_json::Value::Null),
            model_mappings: model_mappings.clone(),
            flat_model_resource_ids: ResourceRecord::flatten_mappings(model_mappings),
            storage_backend,
            storage_url,
            created_by: principal.id.clone(),
            updated_by: principal.id.clone(),
            created_at: Utc::now(),
        };

        if resource_object.is_some() {
            self.cache
                .put(unified_resource_id, &record, self.cache_ttl)
                .await?;
        }
        self.records.insert_record(self.table(), &record).await?;

        Ok(record)
    }

    /// Cache-first lookup with durable fallback.
    ///
    /// A durable-store hit is not written back to the cache; rarely-read
    /// rows stay cold.
    pub async fn get_unified_resource(
        &self,
        unified_resource_id: &str,
    ) -> Result<Option<ResourceRecord>, ResourceError> {
        if let Some(record) = self.cache.get(unified_resource_id).await? {
            return Ok(Some(record));
        }
        Ok(self
            .records
            .get_record(self.table(), unified_resource_id)
            .await?)
    }

    /// Delete from both tiers. The cache entry is overwritten with a
    /// tombstone rather than evicted. Returns the pre-delete resource
    /// object.
    pub async fn delete_unified_resource(
        &self,
        unified_resource_id: &str,
    ) -> Result<serde_json::Value, ResourceError> {
        let record = self
            .records
            .get_record(self.table(), unified_resource_id)
            .await?
            .ok_or_else(|| ResourceError::NotFound(unified_resource_id.to_string()))?;

        self.cache.tombstone(unified_resource_id).await?;
        self.records
            .delete_record(self.table(), unified_resource_id)
            .await?;

        info!(
            unified_resource_id = %unified_resource_id,
            resource_type = %record.resource_type,
            "Deleted unified resource"
        );
        Ok(record.resource_object)
    }

    /// Page through one owner's resources, newest first. Each returned
    /// object's `id` is overwritten with the row's unified id; callers never
    /// see backend-native ids here.
    pub async fn list_user_resources(
        &self,
        principal: &Principal,
        limit: Option<u32>,
        after: Option<&str>,
    ) -> Result<ResourcePage, ResourceError> {
        let limit = limit.unwrap_or(20);
        let (records, has_more) = self
            .records
            .list_records(self.table(), &principal.id, i64::from(limit), after)
            .await?;

        let mut data = Vec::with_capacity(records.len());
        for record in records {
            let mut object = record.resource_object;
            match object.as_object_mut() {
                Some(map) => {
                    map.insert(
                        "id".to_string(),
                        serde_json::Value::String(record.unified_resource_id.clone()),
                    );
                    data.push(object);
                }
                None => {
                    warn!(
                        unified_resource_id = %record.unified_resource_id,
                        "Skipping record with non-object resource payload"
                    );
                }
            }
        }

        let first_id = data
            .first()
            .and_then(|o| o.get("id"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let last_id = data
            .last()
            .and_then(|o| o.get("id"))
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Ok(ResourcePage {
            object: "list".to_string(),
            data,
            first_id,
            last_id,
            has_more,
        })
    }

    /// Owner-only access rule: the principal that created a record is the
    /// only one that may touch it. Absent record means no access.
    pub async fn can_access(
        &self,
        unified_resource_id: &str,
        principal: &Principal,
    ) -> Result<bool, ResourceError> {
        match self.get_unified_resource(unified_resource_id).await? {
            Some(record) => Ok(record.created_by == principal.id),
            None => Ok(false),
        }
    }

    /// The create-across-models entry point: fan out, mint the unified id,
    /// persist the record. Returns the encoded id with the stored record.
    pub async fn create_across_models(
        &self,
        payload: &serde_json::Value,
        target_model_names: &[String],
        principal: &Principal,
    ) -> Result<(String, ResourceRecord), ResourceError> {
        let resources = self
            .create_for_each_model(payload, target_model_names)
            .await?;
        let descriptor = self.generate_unified_id(&resources, target_model_names)?;
        let encoded = codec::encode(&descriptor)?;
        let mappings = Self::model_mappings(&resources);

        let record = self
            .store_unified_resource(&encoded, resources.first(), &mappings, principal)
            .await?;

        info!(
            unified_resource_id = %encoded,
            resource_type = %self.kind().as_str(),
            backends = resources.len(),
            "Created resource across backends"
        );
        Ok((encoded, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderRegistry;
    use crate::unified::codec;
    use relay_storage::MemoryRecordCache;
    use std::sync::Mutex;

    /// Adapter stub that fabricates backend resources and records call order
    struct StubAdapter {
        calls: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    impl StubAdapter {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }

        fn failing_on(model: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: Some(model.to_string()),
            }
        }
    }

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
            self.calls.lock().unwrap().push(model_name.to_string());
            if self.fail_on.as_deref() == Some(model_name) {
                return Err(ResourceError::NotFound(format!("backend for {model_name}")));
            }
            Ok(BackendResource {
                id: format!("vs_{model_name}"),
                deployment_id: format!("dep-{model_name}"),
                object: serde_json::json!({
                    "id": format!("vs_{model_name}"),
                    "object": "vector_store",
                    "name": "stub",
                }),
                storage_metadata: None,
            })
        }
    }

    fn empty_router() -> Arc<Router> {
        Arc::new(Router::new(Arc::new(ProviderRegistry::new()), Vec::new()))
    }

    async fn service_with(
        adapter: Arc<StubAdapter>,
        router: Option<Arc<Router>>,
    ) -> ManagedResourceService {
        let records = RecordStore::in_memory().await.unwrap();
        records
            .ensure_resource_table(ResourceKind::VectorStore.table_name())
            .await
            .unwrap();
        ManagedResourceService::new(
            adapter,
            Arc::new(MemoryRecordCache::new()),
            records,
            router,
            None,
        )
    }

    async fn service(router: Option<Arc<Router>>) -> ManagedResourceService {
        service_with(Arc::new(StubAdapter::new()), router).await
    }

    fn targets(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn principal(id: &str) -> Principal {
        Principal::new(id, format!("key-{id}"))
    }

    #[tokio::test]
    async fn test_fan_out_order_and_representative() {
        let svc = service(Some(empty_router())).await;
        let targets = targets(&["m1", "m2", "m3"]);

        let resources = svc
            .create_for_each_model(&serde_json::json!({}), &targets)
            .await
            .unwrap();
        assert_eq!(resources.len(), 3);

        let descriptor = svc.generate_unified_id(&resources, &targets).unwrap();
        assert_eq!(descriptor.target_model_names, vec!["m1", "m2", "m3"]);
        assert_eq!(descriptor.representative_resource_id, "vs_m1");
        assert_eq!(descriptor.representative_model_id, "dep-m1");

        // The encoded form preserves the exact input order
        let encoded = codec::encode(&descriptor).unwrap();
        assert_eq!(
            codec::extract_target_model_names(&encoded).unwrap(),
            vec!["m1", "m2", "m3"]
        );
    }

    #[tokio::test]
    async fn test_fan_out_aborts_on_first_error() {
        let adapter = Arc::new(StubAdapter::failing_on("m2"));
        let svc = service_with(adapter.clone(), Some(empty_router())).await;

        let err = svc
            .create_for_each_model(&serde_json::json!({}), &targets(&["m1", "m2", "m3"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ResourceError::NotFound(_)));

        // m3 was never attempted
        assert_eq!(*adapter.calls.lock().unwrap(), vec!["m1", "m2"]);
    }

    #[tokio::test]
    async fn test_fan_out_requires_router() {
        let svc = service(None).await;
        let err = svc
            .create_for_each_model(&serde_json::json!({}), &targets(&["m1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ResourceError::RouterNotInitialized));
    }

    #[tokio::test]
    async fn test_store_then_get_round_trip() {
        let svc = service(Some(empty_router())).await;
        let owner = principal("u1");

        let mut mappings = HashMap::new();
        mappings.insert("dep1".to_string(), "vs_1".to_string());
        mappings.insert("dep2".to_string(), "vs_2".to_string());

        let resource = BackendResource {
            id: "vs_1".to_string(),
            deployment_id: "dep1".to_string(),
            object: serde_json::json!({"id": "vs_1", "object": "vector_store"}),
            storage_metadata: None,
        };

        svc.store_unified_resource("X", Some(&resource), &mappings, &owner)
            .await
            .unwrap();

        let record = svc.get_unified_resource("X").await.unwrap().unwrap();
        assert_eq!(record.model_mappings, mappings);
        assert_eq!(record.created_by, "u1");
        assert_eq!(
            record.flat_model_resource_ids,
            vec!["vs_1".to_string(), "vs_2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_get_falls_back_to_durable_store() {
        let svc = service(Some(empty_router())).await;
        let owner = principal("u1");
        let mappings = HashMap::from([("dep1".to_string(), "vs_1".to_string())]);

        // Store without an object: nothing is cached, only the durable row
        svc.store_unified_resource("Y", None, &mappings, &owner)
            .await
            .unwrap();
        assert!(svc.cache.get("Y").await.unwrap().is_none());

        let record = svc.get_unified_resource("Y").await.unwrap().unwrap();
        assert_eq!(record.model_mappings, mappings);
        // No refill on a durable-store hit
        assert!(svc.cache.get("Y").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_scenario() {
        let svc = service(Some(empty_router())).await;
        let owner = principal("u1");
        let (id, _) = svc
            .create_across_models(&serde_json::json!({}), &targets(&["m1"]), &owner)
            .await
            .unwrap();

        let object = svc.delete_unified_resource(&id).await.unwrap();
        assert_eq!(object["id"], "vs_m1");

        assert!(svc.get_unified_resource(&id).await.unwrap().is_none());
        let err = svc.delete_unified_resource(&id).await.unwrap_err();
        assert!(matches!(err, ResourceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_ownership_invariant() {
        let svc = service(Some(empty_router())).await;
        let owner = principal("u1");
        let other = principal("u2");

        let (id, _) = svc
            .create_across_models(&serde_json::json!({}), &targets(&["m1"]), &owner)
            .await
            .unwrap();

        assert!(svc.can_access(&id, &owner).await.unwrap());
        assert!(!svc.can_access(&id, &other).await.unwrap());
        assert!(!svc.can_access("missing-id", &owner).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_pagination_newest_first() {
        let svc = service(Some(empty_router())).await;
        let u1 = principal("u1");
        let u2 = principal("u2");

        for owner in [&u1, &u1, &u1, &u2] {
            svc.create_across_models(&serde_json::json!({}), &targets(&["m1"]), owner)
                .await
                .unwrap();
            // Separate creation timestamps for deterministic ordering
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let page = svc.list_user_resources(&u1, Some(2), None).await.unwrap();
        assert_eq!(page.data.len(), 2);
        assert!(page.has_more);
        assert_eq!(page.first_id.as_deref(), page.data[0]["id"].as_str());
        assert_eq!(page.last_id.as_deref(), page.data[1]["id"].as_str());

        // Every object's id is the unified id, not the backend-native one
        for object in &page.data {
            let id = object["id"].as_str().unwrap();
            assert!(codec::is_unified_id(id));
        }
    }

    #[tokio::test]
    async fn test_created_record_decodes_to_unified_descriptor() {
        let svc = service(Some(empty_router())).await;
        let owner = principal("u1");

        let (id, record) = svc
            .create_across_models(&serde_json::json!({}), &targets(&["m1", "m2"]), &owner)
            .await
            .unwrap();

        let descriptor = codec::decode(&id).unwrap();
        assert_eq!(descriptor.resource_type, "vector_store");
        assert_eq!(descriptor.target_model_names, vec!["m1", "m2"]);
        assert_eq!(record.model_mappings["dep-m1"], "vs_m1");
        assert_eq!(record.model_mappings["dep-m2"], "vs_m2");
    }
}

//! Resource-aware deployment filtering
//!
//! When a request references a unified resource, only the deployments that
//! actually hold that resource are viable. The hook records the decoded
//! model mapping in the request context; this filter intersects it with the
//! healthy deployment list. With no resource in play the list passes through
//! unchanged (fail-open): a resource-unaware request must never be narrowed
//! to an empty candidate set by this layer.

use std::collections::HashMap;
use tracing::debug;

use crate::router::Deployment;

/// Per-request routing context carried from the hook to the router
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// The unified id the request referenced, if any
    pub unified_resource_id: Option<String>,
    /// Decoded deployment id -> backend-native resource id mapping
    pub model_mappings: Option<HashMap<String, String>>,
}

impl RequestContext {
    pub fn for_resource(unified_resource_id: String, model_mappings: HashMap<String, String>) -> Self {
        Self {
            unified_resource_id: Some(unified_resource_id),
            model_mappings: Some(model_mappings),
        }
    }
}

/// Narrow `healthy` to deployments hosting the referenced resource.
/// Preserves input order; fail-open when the context has no resource.
pub fn filter_deployments(
    model: &str,
    healthy: Vec<Deployment>,
    context: &RequestContext,
) -> Vec<Deployment> {
    let (Some(resource_id), Some(mappings)) =
        (&context.unified_resource_id, &context.model_mappings)
    else {
        return healthy;
    };

    let filtered: Vec<Deployment> = healthy
        .into_iter()
        .filter(|d| mappings.contains_key(&d.id))
        .collect();

    debug!(
        model = %model,
        resource_id = %resource_id,
        candidates = filtered.len(),
        "Narrowed deployments to resource hosts"
    );
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deployments() -> Vec<Deployment> {
        ["dep1", "dep2", "dep3"]
            .iter()
            .map(|id| Deployment {
                id: id.to_string(),
                model_name: "m1".to_string(),
                provider: "openai".to_string(),
                provider_model: "gpt-4o".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_fail_open_without_context() {
        let healthy = deployments();
        let filtered = filter_deployments("m1", healthy.clone(), &RequestContext::default());
        assert_eq!(filtered, healthy);
    }

    #[test]
    fn test_fail_open_with_partial_context() {
        let healthy = deployments();
        let context = RequestContext {
            unified_resource_id: Some("someid".to_string()),
            model_mappings: None,
        };
        assert_eq!(filter_deployments("m1", healthy.clone(), &context), healthy);
    }

    #[test]
    fn test_narrows_to_hosting_deployments() {
        let mut mappings = HashMap::new();
        mappings.insert("dep2".to_string(), "vs_2".to_string());
        mappings.insert("dep3".to_string(), "vs_3".to_string());
        let context = RequestContext::for_resource("someid".to_string(), mappings);

        let filtered = filter_deployments("m1", deployments(), &context);
        let ids: Vec<&str> = filtered.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["dep2", "dep3"]);
    }

    #[test]
    fn test_unknown_mapping_narrows_to_empty() {
        let mut mappings = HashMap::new();
        mappings.insert("other".to_string(), "vs_9".to_string());
        let context = RequestContext::for_resource("someid".to_string(), mappings);

        assert!(filter_deployments("m1", deployments(), &context).is_empty());
    }
}

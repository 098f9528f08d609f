//! The resource record shared by both storage tiers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One record per unified resource id.
///
/// `model_mappings` is the authoritative routing table: one entry per backend
/// deployment the resource actually exists on. `flat_model_resource_ids` is a
/// derived, order-independent view of its values kept for indexing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceRecord {
    /// The encoded unified id (primary key)
    pub unified_resource_id: String,
    pub resource_type: String,
    /// One representative backend's response, kept as opaque JSON
    pub resource_object: serde_json::Value,
    /// deployment id -> backend-native resource id
    pub model_mappings: HashMap<String, String>,
    pub flat_model_resource_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_url: Option<String>,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
}

impl ResourceRecord {
    /// Derive the flat id view from a mapping. Sorted so the stored value is
    /// stable regardless of map iteration order.
    pub fn flatten_mappings(model_mappings: &HashMap<String, String>) -> Vec<String> {
        let mut ids: Vec<String> = model_mappings.values().cloned().collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

//! Searchset `Bundle` envelope for multi-record responses.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire representation of a `Bundle` resource.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct BundleWire {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    pub id: String,

    #[serde(rename = "type")]
    pub bundle_type: String,

    pub total: usize,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<BundleEntryWire>,
}

/// One bundle entry: a resource plus its absolute URL.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct BundleEntryWire {
    #[serde(rename = "fullUrl")]
    pub full_url: String,

    pub resource: serde_json::Value,
}

impl BundleEntryWire {
    pub fn new(full_url: String, resource: serde_json::Value) -> Self {
        Self { full_url, resource }
    }
}

impl BundleWire {
    /// Build a searchset bundle; `total` is the entry count.
    pub fn searchset(entries: Vec<BundleEntryWire>) -> Self {
        Self {
            resource_type: "Bundle".to_string(),
            id: Uuid::new_v4().to_string(),
            bundle_type: "searchset".to_string(),
            total: entries.len(),
            entry: entries,
        }
    }
}

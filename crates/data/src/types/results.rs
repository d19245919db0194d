//! Uniform result shapes returned by provider operations.

use serde::{Deserialize, Serialize};

use super::params::{Record, RecordId};

/// Result of `getList` and `getManyReference`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListResult {
    /// Records on the requested page.
    pub data: Vec<Record>,
    /// Total number of matching records across all pages.
    pub total: u64,
    /// Facet counts, when the listing was served by the search engine.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facets: Vec<FacetCount>,
}

impl ListResult {
    /// Creates a result without facets.
    pub fn new(data: Vec<Record>, total: u64) -> Self {
        Self {
            data,
            total,
            facets: Vec::new(),
        }
    }

    /// Returns the identifiers of the records on this page.
    pub fn ids(&self) -> Vec<RecordId> {
        self.data.iter().filter_map(RecordId::of).collect()
    }
}

/// Result of `getOne`, `create`, `update` and `delete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneResult {
    /// The record.
    pub data: Record,
}

/// Result of `getMany`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManyResult {
    /// The records that were found.
    pub data: Vec<Record>,
}

/// Result of `updateMany` and `deleteMany`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdsResult {
    /// Identifiers of the affected records.
    pub data: Vec<RecordId>,
}

/// Value counts for one faceted field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    /// The faceted field.
    pub field_name: String,
    /// Counts per distinct value.
    #[serde(default)]
    pub counts: Vec<FacetValueCount>,
}

/// Count of records holding one facet value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetValueCount {
    /// The value.
    pub value: String,
    /// Number of matching records holding it.
    pub count: u64,
}

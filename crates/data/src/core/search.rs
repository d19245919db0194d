//! Search engine adapter trait.
//!
//! This module defines [`SearchBackend`], the contract the provider consumes
//! for the search engine:
//!
//! - Collection-scoped document CRUD, bulk import/export, and `search`
//! - Administrative sub-resources (collections, aliases, API keys, synonym
//!   sets, curation overrides, stopword sets, analytics rules), addressed
//!   through [`AdminTarget`]
//!
//! The search engine is optional. A provider built without one serves every
//! hybrid listing from the relational store and rejects native search-admin
//! resources with a configuration error.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SearchResult;
use crate::types::{FacetCount, Record};

/// Administrative object kinds owned by the search engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchAdminKind {
    /// Collections (schemas).
    Collections,
    /// Collection aliases.
    Aliases,
    /// API keys.
    Keys,
    /// Synonym sets of a collection.
    Synonyms,
    /// Curation overrides of a collection.
    Overrides,
    /// Stopword sets.
    Stopwords,
    /// Analytics rules.
    AnalyticsRules,
    /// Documents of a collection.
    Documents,
}

impl SearchAdminKind {
    /// All kinds.
    pub const ALL: [SearchAdminKind; 8] = [
        SearchAdminKind::Collections,
        SearchAdminKind::Aliases,
        SearchAdminKind::Keys,
        SearchAdminKind::Synonyms,
        SearchAdminKind::Overrides,
        SearchAdminKind::Stopwords,
        SearchAdminKind::AnalyticsRules,
        SearchAdminKind::Documents,
    ];

    /// Returns `true` if objects of this kind live inside a collection.
    pub fn is_collection_scoped(&self) -> bool {
        matches!(
            self,
            SearchAdminKind::Synonyms | SearchAdminKind::Overrides | SearchAdminKind::Documents
        )
    }

    /// The field the search engine uses as the object's key.
    pub fn key_field(&self) -> &'static str {
        match self {
            SearchAdminKind::Collections
            | SearchAdminKind::Aliases
            | SearchAdminKind::AnalyticsRules => "name",
            _ => "id",
        }
    }

    /// Kebab-case name, as used in configuration and stock resource names.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchAdminKind::Collections => "collections",
            SearchAdminKind::Aliases => "aliases",
            SearchAdminKind::Keys => "keys",
            SearchAdminKind::Synonyms => "synonyms",
            SearchAdminKind::Overrides => "overrides",
            SearchAdminKind::Stopwords => "stopwords",
            SearchAdminKind::AnalyticsRules => "analytics-rules",
            SearchAdminKind::Documents => "documents",
        }
    }
}

impl fmt::Display for SearchAdminKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of an administrative sub-resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminTarget {
    /// Object kind.
    pub kind: SearchAdminKind,
    /// Owning collection, for collection-scoped kinds.
    pub collection: Option<String>,
}

impl AdminTarget {
    /// Targets a kind that is not collection-scoped.
    pub fn global(kind: SearchAdminKind) -> Self {
        Self {
            kind,
            collection: None,
        }
    }

    /// Targets a kind inside `collection`.
    pub fn in_collection(kind: SearchAdminKind, collection: impl Into<String>) -> Self {
        Self {
            kind,
            collection: Some(collection.into()),
        }
    }
}

/// A search request against one collection.
///
/// Field names follow the search engine's query parameters so the struct can
/// be sent as a query string as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query text.
    pub q: String,
    /// Comma-separated fields to search.
    pub query_by: String,
    /// Filter expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_by: Option<String>,
    /// Sort expression, `field:direction`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    /// Comma-separated fields to facet on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facet_by: Option<String>,
    /// 1-based page.
    pub page: u32,
    /// Hits per page.
    pub per_page: u32,
    /// Typo tolerance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_typos: Option<u8>,
    /// Prefix matching on the last query token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<bool>,
}

/// A search engine response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Matching documents on the requested page.
    #[serde(default)]
    pub hits: Vec<SearchHit>,
    /// Total number of matching documents.
    #[serde(default)]
    pub found: u64,
    /// Facet counts for the requested facet fields.
    #[serde(default)]
    pub facet_counts: Vec<FacetCount>,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// The matched document.
    pub document: Record,
    /// Relevance score reported by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_match: Option<u64>,
}

/// How bulk import treats documents that already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportAction {
    /// Fail on existing ids.
    #[default]
    Create,
    /// Replace existing documents.
    Upsert,
    /// Update existing documents, fail on new ids.
    Update,
    /// Merge into existing documents, create new ones.
    Emplace,
}

impl ImportAction {
    /// The engine's parameter value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportAction::Create => "create",
            ImportAction::Upsert => "upsert",
            ImportAction::Update => "update",
            ImportAction::Emplace => "emplace",
        }
    }
}

/// Per-document outcome of a bulk import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    /// Whether the document was written.
    pub success: bool,
    /// The engine's error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Generic document search and CRUD client for the search engine.
///
/// Document operations take the collection explicitly. Admin operations take
/// an [`AdminTarget`]; implementations answer
/// [`SearchError::UnsupportedOperation`](crate::error::SearchError::UnsupportedOperation)
/// for combinations the engine does not offer (for example updating an API key)
/// and for [`SearchAdminKind::Documents`], which goes through the document
/// methods instead.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Returns a human-readable name for this backend.
    fn backend_name(&self) -> &'static str;

    /// Runs a search against `collection`.
    async fn search(&self, collection: &str, request: &SearchRequest)
    -> SearchResult<SearchResponse>;

    /// Reads one document.
    async fn retrieve_document(&self, collection: &str, id: &str) -> SearchResult<Record>;

    /// Indexes a new document.
    async fn create_document(&self, collection: &str, document: Record) -> SearchResult<Record>;

    /// Indexes a document, replacing any document with the same id.
    async fn upsert_document(&self, collection: &str, document: Record) -> SearchResult<Record>;

    /// Partially updates a document.
    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Record,
    ) -> SearchResult<Record>;

    /// Removes a document and returns it.
    async fn delete_document(&self, collection: &str, id: &str) -> SearchResult<Record>;

    /// Writes many documents at once.
    async fn import_documents(
        &self,
        collection: &str,
        documents: Vec<Record>,
        action: ImportAction,
    ) -> SearchResult<Vec<ImportOutcome>>;

    /// Reads every document of a collection.
    async fn export_documents(&self, collection: &str) -> SearchResult<Vec<Record>>;

    /// Lists every object of an admin kind.
    async fn list_admin(&self, target: &AdminTarget) -> SearchResult<Vec<Record>>;

    /// Reads one admin object.
    async fn retrieve_admin(&self, target: &AdminTarget, id: &str) -> SearchResult<Record>;

    /// Creates an admin object.
    async fn create_admin(&self, target: &AdminTarget, data: Record) -> SearchResult<Record>;

    /// Updates an admin object.
    async fn update_admin(
        &self,
        target: &AdminTarget,
        id: &str,
        data: Record,
    ) -> SearchResult<Record>;

    /// Deletes an admin object and returns it.
    async fn delete_admin(&self, target: &AdminTarget, id: &str) -> SearchResult<Record>;
}

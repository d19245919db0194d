//! Fixtures for provider tests.

use std::sync::Arc;

use serde_json::{Value, json};

use atrium_data::composite::{CompositeDataProvider, HybridSearchConfig, RetryConfig, RoutingConfig};
use atrium_data::core::DynSearch;
use atrium_data::tenant::{MemoryKeyValueStore, PersistentScope, ScopeStore, TenantId};
use atrium_data::types::Record;

use super::doubles::RecordingRelational;

/// Converts a JSON object literal into a record.
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Routing used across the provider tests.
///
/// - `documents`: tenant-scoped and hybrid over `title`, `content`
/// - `invoices`: tenant-scoped
/// - `tags`: plain
/// - the stock `typesense-*` admin resources
pub fn routing() -> RoutingConfig {
    RoutingConfig::builder()
        .tenant_scoped_all(["documents", "invoices"])
        .with_default_search_admin()
        .hybrid_search("documents", documents_search())
        .build()
        .expect("valid routing")
}

/// Hybrid search configuration of the `documents` resource.
pub fn documents_search() -> HybridSearchConfig {
    HybridSearchConfig::new("documents", ["title", "content"])
        .with_filterable(["status", "author_id"])
        .with_sortable(["created_at"])
}

/// Returns a scope with `tenant` selected and view-all set as given.
pub fn scope(tenant: Option<&str>, view_all: bool) -> Arc<PersistentScope<MemoryKeyValueStore>> {
    let scope = Arc::new(PersistentScope::in_memory());
    if let Some(tenant) = tenant {
        scope.set_active_tenant(TenantId::new(tenant));
    }
    scope.set_view_all_mode(view_all);
    scope
}

/// Provider over a recording relational double and an optional search engine.
pub struct Harness {
    /// The provider under test.
    pub provider: CompositeDataProvider,
    /// The relational double.
    pub relational: Arc<RecordingRelational>,
    /// The scope store.
    pub scope: Arc<PersistentScope<MemoryKeyValueStore>>,
}

impl Harness {
    /// Builds a provider without a search engine.
    pub fn new(tenant: Option<&str>, view_all: bool) -> Self {
        let relational = Arc::new(RecordingRelational::new());
        let scope = scope(tenant, view_all);
        let provider =
            CompositeDataProvider::new(relational.clone(), scope.clone(), Arc::new(routing()))
                .with_retry(RetryConfig::default());
        Self {
            provider,
            relational,
            scope,
        }
    }

    /// Builds a provider with `search` configured.
    pub fn with_search(tenant: Option<&str>, view_all: bool, search: DynSearch) -> Self {
        let harness = Self::new(tenant, view_all);
        Self {
            provider: harness.provider.with_search(search),
            ..harness
        }
    }
}

/// A canned relational row.
pub fn relational_row(id: i64, title: &str) -> Record {
    record(json!({"id": id, "title": title, "source": "relational"}))
}

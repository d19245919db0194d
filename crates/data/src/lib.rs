//! Atrium Data Access Layer
//!
//! This crate provides the data access layer behind a multi-tenant admin
//! interface. A single [`CompositeDataProvider`] answers the admin UI's nine
//! uniform CRUD operations by routing them to a relational store or a search
//! engine, keeping the operator's tenant scope in force on the way.
//!
//! # Features
//!
//! - **Tenant scoping**: listings of tenant-scoped resources are narrowed to
//!   the active tenant, new records are stamped with it
//! - **Hybrid search**: free-text listings of search-enabled resources go to
//!   the search engine first and fall back to the relational store on failure
//! - **Native search administration**: collections, aliases, keys, synonyms,
//!   overrides, stopwords, analytics rules and documents served straight from
//!   the search engine
//! - **Persistent scope**: the tenant selection survives restarts
//!
//! # Backend Features
//!
//! Enable the HTTP adapters with feature flags in `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! atrium-data = { version = "0.1", features = ["postgrest", "typesense"] }
//! ```
//!
//! Available backend features:
//! - `postgrest` - Supabase / PostgREST relational store
//! - `typesense` - Typesense search engine
//!
//! The in-memory backends are always available.
//!
//! # Architecture
//!
//! - [`tenant`] - Tenant selection and its persistence
//! - [`types`] - Request envelopes and uniform results
//! - [`error`] - Error types for all operations
//! - [`core`] - Backend adapter traits
//! - [`composite`] - Routing, tenant injection, search fallback and the provider
//! - [`backends`] - Backend implementations
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use atrium_data::backends::memory::{MemoryRelationalBackend, MemorySearchBackend};
//! use atrium_data::composite::{CompositeDataProvider, HybridSearchConfig, RoutingConfig};
//! use atrium_data::tenant::{PersistentScope, ScopeStore, TenantId};
//! use atrium_data::types::ListParams;
//! use serde_json::json;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let relational = Arc::new(MemoryRelationalBackend::new());
//! relational.insert_records(
//!     "documents",
//!     [
//!         json!({"id": 1, "tenant_id": "acme", "title": "Lease"}),
//!         json!({"id": 2, "tenant_id": "globex", "title": "Lease"}),
//!     ]
//!     .into_iter()
//!     .filter_map(|v| v.as_object().cloned()),
//! );
//!
//! let routing = RoutingConfig::builder()
//!     .tenant_scoped("documents")
//!     .hybrid_search("documents", HybridSearchConfig::new("documents", ["title"]))
//!     .build()
//!     .unwrap();
//!
//! let scope = Arc::new(PersistentScope::in_memory());
//! scope.set_active_tenant(TenantId::new("acme"));
//!
//! let provider = CompositeDataProvider::new(relational, scope, Arc::new(routing))
//!     .with_search(Arc::new(MemorySearchBackend::new()));
//!
//! // No collection is indexed yet, so the query falls back to the relational store.
//! let page = provider
//!     .get_list("documents", ListParams::new().with_query("lease"))
//!     .await
//!     .unwrap();
//! assert_eq!(page.total, 1);
//! assert_eq!(page.data[0]["tenant_id"], json!("acme"));
//! # });
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod composite;
pub mod core;
pub mod error;
pub mod tenant;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{ProviderError, ProviderResult};
pub use tenant::{ScopeStore, TenantId, TenantScope};
pub use types::{ListParams, ListResult, Operation, Record, RecordId};

// Re-export core traits
pub use core::{DynRelational, DynSearch, RelationalBackend, SearchBackend};

// Re-export the provider and its configuration
pub use composite::{
    CompositeDataProvider, HybridSearchConfig, ResourceClass, RetryConfig, RoutingConfig,
    RoutingSettings,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

//! Composite data access over a relational store and a search engine.
//!
//! This module routes the admin UI's uniform CRUD operations to the backend
//! that serves them and keeps tenant scoping in force on the way.
//!
//! # Overview
//!
//! | Resource | Listing with `q` | Listing without `q` | Other operations |
//! |----------|------------------|---------------------|------------------|
//! | Native search-admin | Search engine | Search engine | Search engine |
//! | Hybrid | Search engine, relational fallback | Relational | Relational |
//! | Tenant-scoped | Relational + tenant filter | Relational + tenant filter | Relational (`create` stamped) |
//! | Plain | Relational | Relational | Relational |
//!
//! # Design Principles
//!
//! 1. **Scope over intent**: an active tenant always overwrites a
//!    caller-supplied `tenant_id`, on both the relational and the search path.
//!
//! 2. **Graceful degradation**: a failing search engine never fails a hybrid
//!    listing; the relational store answers instead.
//!
//! 3. **Fail fast on misconfiguration**: native search-admin resources have no
//!    relational equivalent, so a missing search engine is an error.
//!
//! # Example
//!
//! ```ignore
//! use atrium_data::composite::{CompositeDataProvider, HybridSearchConfig, RoutingConfig};
//!
//! let routing = RoutingConfig::builder()
//!     .tenant_scoped_all(["documents", "invoices"])
//!     .with_default_search_admin()
//!     .hybrid_search(
//!         "documents",
//!         HybridSearchConfig::new("documents", ["title", "content"])
//!             .with_filterable(["status"])
//!             .with_sortable(["created_at"]),
//!     )
//!     .build()?;
//!
//! let provider = CompositeDataProvider::new(relational, scope, Arc::new(routing))
//!     .with_search(search);
//! ```
//!
//! # Module Structure
//!
//! - [`config`] - Routing, hybrid search and retry configuration
//! - [`router`] - Resource classification and dispatch
//! - [`injector`] - Tenant filter injection
//! - [`query`] - Search request translation
//! - [`retry`] - Bounded backoff for search reads
//! - [`fallback`] - Search-first listing with relational fallback
//! - [`native`] - Native search-admin dispatch
//! - [`provider`] - The composite provider

pub mod config;
pub mod fallback;
pub mod injector;
pub mod native;
pub mod provider;
pub mod query;
pub mod retry;
pub mod router;

// Re-export main types
pub use config::{
    ConfigWarning, DEFAULT_SEARCH_ADMIN_RESOURCES, HybridSearchConfig, RetryConfig,
    RoutingConfig, RoutingConfigBuilder, RoutingSettings,
};
pub use fallback::{SearchAttempt, SearchFallbackOrchestrator};
pub use injector::TenantFilterInjector;
pub use native::NativeDispatcher;
pub use provider::CompositeDataProvider;
pub use query::{NotApplicable, QueryTranslator, SearchTranslation};
pub use retry::retry_search;
pub use router::{Dispatch, ResourceClass, ResourceRouter};

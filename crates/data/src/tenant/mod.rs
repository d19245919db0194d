//! Tenant scope management.
//!
//! This module holds the operator's tenant selection and the "view all"
//! override, and the storage it persists to.
//!
//! # Core Types
//!
//! - [`TenantId`] - Opaque tenant identifier
//! - [`TenantScope`] - Snapshot of the selection taken once per provider call
//! - [`ScopeStore`] - Read/mutate the selection
//! - [`PersistentScope`] - `ScopeStore` over any [`KeyValueStore`]
//!
//! # Isolation Model
//!
//! Scoping narrows listings and stamps new records; it is best effort and not
//! a security boundary by itself. With view-all off and no tenant selected,
//! tenant-scoped resources go out unfiltered and the relational store's own
//! access control (row-level security) decides visibility.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use atrium_data::tenant::{MemoryKeyValueStore, PersistentScope, ScopeStore, TenantId};
//!
//! let scope = PersistentScope::new(Arc::new(MemoryKeyValueStore::new()));
//! scope.set_active_tenant(TenantId::new("acme"));
//!
//! let snapshot = scope.scope();
//! assert_eq!(snapshot.effective_tenant().map(|t| t.as_str()), Some("acme"));
//! ```

mod id;
mod scope;
mod storage;

pub use id::TenantId;
pub use scope::{PersistentScope, ScopeStore, TENANT_KEY, TenantScope, VIEW_ALL_KEY};
pub use storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, ScopeStorageError};

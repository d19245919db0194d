//! Tenant scope selection.
//!
//! The scope is the operator's current tenant selection plus the "view all
//! tenants" override. It is session state, not an entity: it starts empty,
//! changes only through explicit calls, and never expires.
//!
//! The composite provider takes one [`TenantScope`] snapshot at the start of
//! every call, so a scope change while a request is in flight never affects
//! that request.

use std::sync::Arc;

use tracing::{debug, warn};

use super::id::TenantId;
use super::storage::{KeyValueStore, MemoryKeyValueStore};

/// Storage key holding the selected tenant identifier.
pub const TENANT_KEY: &str = "selected_tenant_id";

/// Storage key holding the view-all flag as `"true"` / `"false"`.
pub const VIEW_ALL_KEY: &str = "view_all_tenants";

/// A point-in-time snapshot of the scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantScope {
    /// The selected tenant, regardless of view-all mode.
    pub tenant_id: Option<TenantId>,
    /// When `true`, tenant filtering is suppressed entirely.
    pub view_all: bool,
}

impl TenantScope {
    /// A scope pinned to `tenant_id` with view-all off.
    pub fn tenant(tenant_id: impl Into<TenantId>) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
            view_all: false,
        }
    }

    /// A scope with view-all on.
    pub fn view_all() -> Self {
        Self {
            tenant_id: None,
            view_all: true,
        }
    }

    /// Returns the tenant that filtering should use.
    ///
    /// `None` when view-all is on (whatever tenant is selected) or when no
    /// tenant is selected.
    pub fn effective_tenant(&self) -> Option<&TenantId> {
        if self.view_all {
            None
        } else {
            self.tenant_id.as_ref()
        }
    }
}

/// Read and mutate the tenant scope.
///
/// Reads of unset state return defaults (no tenant, view-all off). There are
/// no error conditions at this level; persistence failures are logged by the
/// implementation.
pub trait ScopeStore: Send + Sync {
    /// Returns the current snapshot.
    fn scope(&self) -> TenantScope;

    /// Selects `tenant_id`. Does not change view-all mode.
    fn set_active_tenant(&self, tenant_id: TenantId);

    /// Clears the tenant selection.
    fn clear_active_tenant(&self);

    /// Turns view-all mode on or off.
    fn set_view_all_mode(&self, view_all: bool);

    /// Returns the tenant filtering should use right now.
    ///
    /// `None` whenever view-all mode is on.
    fn active_tenant(&self) -> Option<TenantId> {
        self.scope().effective_tenant().cloned()
    }

    /// Returns `true` if view-all mode is on.
    fn view_all_mode(&self) -> bool {
        self.scope().view_all
    }
}

/// Scope store persisted through a [`KeyValueStore`].
///
/// The tenant and the flag live under two independent keys ([`TENANT_KEY`],
/// [`VIEW_ALL_KEY`]). Every read goes to the key-value store, so a write is
/// visible to the next read immediately.
///
/// # Examples
///
/// ```
/// use atrium_data::tenant::{PersistentScope, ScopeStore, TenantId};
///
/// let scope = PersistentScope::in_memory();
/// scope.set_active_tenant(TenantId::new("tenant-2"));
/// assert_eq!(scope.active_tenant(), Some(TenantId::new("tenant-2")));
///
/// scope.set_view_all_mode(true);
/// assert_eq!(scope.active_tenant(), None);
/// ```
pub struct PersistentScope<K: KeyValueStore> {
    store: Arc<K>,
}

impl PersistentScope<MemoryKeyValueStore> {
    /// Creates a scope backed by a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()))
    }
}

impl<K: KeyValueStore> PersistentScope<K> {
    /// Creates a scope over the given key-value store.
    pub fn new(store: Arc<K>) -> Self {
        Self { store }
    }

    /// Returns the underlying key-value store.
    pub fn store(&self) -> &Arc<K> {
        &self.store
    }
}

impl<K: KeyValueStore> ScopeStore for PersistentScope<K> {
    fn scope(&self) -> TenantScope {
        let tenant_id = self
            .store
            .get(TENANT_KEY)
            .and_then(|raw| TenantId::parse(&raw));
        let view_all = self.store.get(VIEW_ALL_KEY).as_deref() == Some("true");
        TenantScope {
            tenant_id,
            view_all,
        }
    }

    fn set_active_tenant(&self, tenant_id: TenantId) {
        debug!(tenant_id = %tenant_id, "Selecting tenant");
        if let Err(e) = self.store.set(TENANT_KEY, tenant_id.as_str()) {
            warn!(error = %e, "Failed to persist tenant selection");
        }
    }

    fn clear_active_tenant(&self) {
        debug!("Clearing tenant selection");
        if let Err(e) = self.store.remove(TENANT_KEY) {
            warn!(error = %e, "Failed to persist tenant selection");
        }
    }

    fn set_view_all_mode(&self, view_all: bool) {
        debug!(view_all, "Setting view-all mode");
        let value = if view_all { "true" } else { "false" };
        if let Err(e) = self.store.set(VIEW_ALL_KEY, value) {
            warn!(error = %e, "Failed to persist view-all mode");
        }
    }
}

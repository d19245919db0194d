//! Tenant filter injection.
//!
//! Listings and creations of tenant-scoped resources are narrowed to the
//! active tenant: `filter.tenant_id` for `getList`/`getManyReference`,
//! `data.tenant_id` for `create`. The scope is authoritative, so a
//! caller-supplied `tenant_id` is overwritten, never merged.
//!
//! Reads by id, updates and deletes are left untouched; their isolation is
//! the backend's access control.

use serde_json::Value;
use tracing::{debug, warn};

use crate::tenant::{TenantId, TenantScope};
use crate::types::{CreateParams, Filter, GetManyReferenceParams, ListParams, TENANT_FIELD};

use super::router::ResourceClass;

/// Injects the tenant of one call's scope snapshot into outgoing params.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantFilterInjector {
    tenant: Option<TenantId>,
}

impl TenantFilterInjector {
    /// Creates an injector for a call on a resource of class `class`.
    ///
    /// The injector is inert unless the resource is tenant-scoped, view-all is
    /// off and a tenant is selected.
    pub fn new(scope: &TenantScope, class: ResourceClass) -> Self {
        let tenant = if class.is_tenant_scoped() {
            scope.effective_tenant().cloned()
        } else {
            None
        };
        Self { tenant }
    }

    /// The tenant this injector stamps, if any.
    pub fn tenant(&self) -> Option<&TenantId> {
        self.tenant.as_ref()
    }

    /// Narrows a `getList` call.
    pub fn inject_list(&self, mut params: ListParams) -> ListParams {
        self.stamp(&mut params.filter, "filter");
        params
    }

    /// Narrows a `getManyReference` call.
    pub fn inject_reference(&self, mut params: GetManyReferenceParams) -> GetManyReferenceParams {
        self.stamp(&mut params.filter, "filter");
        params
    }

    /// Stamps the record of a `create` call.
    pub fn inject_create(&self, mut params: CreateParams) -> CreateParams {
        self.stamp(&mut params.data, "data");
        params
    }

    fn stamp(&self, target: &mut Filter, location: &'static str) {
        let Some(tenant) = &self.tenant else {
            return;
        };
        let value = Value::String(tenant.as_str().to_string());
        match target.insert(TENANT_FIELD.to_string(), value) {
            Some(previous) if previous.as_str() != Some(tenant.as_str()) => {
                warn!(
                    location,
                    tenant_id = %tenant,
                    supplied = %previous,
                    "Overriding caller-supplied tenant_id with the active tenant"
                );
            }
            _ => debug!(location, tenant_id = %tenant, "Injected tenant scope"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Record;
    use serde_json::json;

    fn scoped(tenant: &str) -> TenantFilterInjector {
        TenantFilterInjector::new(&TenantScope::tenant(tenant), ResourceClass::TenantScoped)
    }

    #[test]
    fn test_list_filter_gets_active_tenant() {
        let params = scoped("tenant-2").inject_list(ListParams::new().with_filter("status", "draft"));
        assert_eq!(params.filter.get("tenant_id"), Some(&json!("tenant-2")));
        assert_eq!(params.filter.get("status"), Some(&json!("draft")));
    }

    #[test]
    fn test_caller_tenant_is_overwritten() {
        let params =
            scoped("tenant-2").inject_list(ListParams::new().with_filter("tenant_id", "tenant-9"));
        assert_eq!(params.filter.get("tenant_id"), Some(&json!("tenant-2")));

        let reference = scoped("tenant-2").inject_reference(
            GetManyReferenceParams::new("author_id", "1").with_filter("tenant_id", 9),
        );
        assert_eq!(reference.filter.get("tenant_id"), Some(&json!("tenant-2")));
    }

    #[test]
    fn test_create_payload_is_stamped() {
        let mut data = Record::new();
        data.insert("title".to_string(), json!("Q3 invoice"));
        data.insert("tenant_id".to_string(), json!("tenant-1"));

        let params = scoped("tenant-2").inject_create(CreateParams::new(data));
        assert_eq!(params.data.get("tenant_id"), Some(&json!("tenant-2")));
        assert_eq!(params.data.get("title"), Some(&json!("Q3 invoice")));
    }

    #[test]
    fn test_view_all_injects_nothing() {
        let scope = TenantScope {
            tenant_id: Some(TenantId::new("tenant-2")),
            view_all: true,
        };
        let injector = TenantFilterInjector::new(&scope, ResourceClass::TenantScoped);
        assert_eq!(injector.tenant(), None);

        let params = injector.inject_list(ListParams::new().with_filter("tenant_id", "tenant-9"));
        assert_eq!(params.filter.get("tenant_id"), Some(&json!("tenant-9")));
    }

    #[test]
    fn test_no_tenant_injects_nothing() {
        let injector = TenantFilterInjector::new(&TenantScope::default(), ResourceClass::TenantScoped);
        let params = injector.inject_list(ListParams::new());
        assert!(params.filter.is_empty());
    }

    #[test]
    fn test_plain_resources_are_untouched() {
        let injector = TenantFilterInjector::new(&TenantScope::tenant("tenant-2"), ResourceClass::Plain);
        let params = injector.inject_create(CreateParams::new(Record::new()));
        assert!(params.data.is_empty());
    }
}

//! Integration tests for tenant scoping through the composite provider.
//!
//! These tests check what reaches the relational store for tenant-scoped and
//! plain resources under every combination of tenant selection and view-all
//! mode.

mod common;

use serde_json::json;

use atrium_data::composite::ResourceClass;
use atrium_data::tenant::{ScopeStore, TenantId};
use atrium_data::types::{CreateParams, GetManyReferenceParams, GetOneParams, ListParams};

use common::{Harness, RelationalCall, record};

// ============================================================================
// Listing
// ============================================================================

/// An active tenant is added to the filter of a tenant-scoped listing.
#[tokio::test]
async fn test_active_tenant_filters_listing() {
    let h = Harness::new(Some("tenant-2"), false);

    h.provider
        .get_list("documents", ListParams::new())
        .await
        .unwrap();

    let sent = h.relational.single_list();
    assert_eq!(sent.filter.get("tenant_id"), Some(&json!("tenant-2")));
}

/// View-all mode leaves the filter untouched even with a tenant selected.
#[tokio::test]
async fn test_view_all_leaves_filter_unchanged() {
    let h = Harness::new(Some("tenant-2"), true);
    let params = ListParams::new().with_filter("status", "draft");

    h.provider
        .get_list("documents", params.clone())
        .await
        .unwrap();

    assert_eq!(h.relational.single_list(), params);
}

/// A caller-supplied tenant is overwritten, never merged.
#[tokio::test]
async fn test_caller_tenant_is_overwritten() {
    for caller in [json!("tenant-9"), json!(["tenant-1", "tenant-9"]), json!(null)] {
        let h = Harness::new(Some("tenant-2"), false);
        let params = ListParams::new().with_filter("tenant_id", caller);

        h.provider.get_list("invoices", params).await.unwrap();

        let sent = h.relational.single_list();
        assert_eq!(sent.filter.get("tenant_id"), Some(&json!("tenant-2")));
    }
}

/// Without a selection the listing goes out unfiltered.
#[tokio::test]
async fn test_no_tenant_means_no_filter() {
    let h = Harness::new(None, false);

    h.provider
        .get_list("invoices", ListParams::new())
        .await
        .unwrap();

    assert!(h.relational.single_list().filter.is_empty());
}

/// Plain resources are never filtered.
#[tokio::test]
async fn test_plain_resource_is_not_filtered() {
    let h = Harness::new(Some("tenant-2"), false);
    assert_eq!(h.provider.classify("tags"), ResourceClass::Plain);

    h.provider
        .get_list("tags", ListParams::new().with_filter("tenant_id", "other"))
        .await
        .unwrap();

    let sent = h.relational.single_list();
    assert_eq!(sent.filter.get("tenant_id"), Some(&json!("other")));
}

/// The scope is read per call, so a change applies to the next call.
#[tokio::test]
async fn test_scope_change_applies_to_next_call() {
    let h = Harness::new(Some("tenant-1"), false);
    h.provider
        .get_list("invoices", ListParams::new())
        .await
        .unwrap();

    h.scope.set_active_tenant(TenantId::new("tenant-3"));
    h.provider
        .get_list("invoices", ListParams::new())
        .await
        .unwrap();

    let tenants: Vec<_> = h
        .relational
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            RelationalCall::List(_, params) => params.filter.get("tenant_id").cloned(),
            _ => None,
        })
        .collect();
    assert_eq!(tenants, vec![json!("tenant-1"), json!("tenant-3")]);
}

// ============================================================================
// References and writes
// ============================================================================

/// `getManyReference` on a tenant-scoped resource is filtered too.
#[tokio::test]
async fn test_reference_listing_is_filtered() {
    let h = Harness::new(Some("tenant-2"), false);

    h.provider
        .get_many_reference("invoices", GetManyReferenceParams::new("customer_id", 5_i64))
        .await
        .unwrap();

    match h.relational.calls().as_slice() {
        [RelationalCall::Reference(resource, params)] => {
            assert_eq!(resource, "invoices");
            assert_eq!(params.filter.get("tenant_id"), Some(&json!("tenant-2")));
            assert_eq!(params.target, "customer_id");
        }
        other => panic!("unexpected calls: {other:?}"),
    }
}

/// New tenant-scoped records are stamped with the active tenant.
#[tokio::test]
async fn test_create_stamps_tenant() {
    let h = Harness::new(Some("tenant-2"), false);

    let created = h
        .provider
        .create(
            "invoices",
            CreateParams::new(record(json!({"amount": 10, "tenant_id": "tenant-7"}))),
        )
        .await
        .unwrap();

    assert_eq!(created.data["tenant_id"], json!("tenant-2"));
    assert_eq!(created.data["amount"], json!(10));
}

/// View-all mode leaves create payloads untouched.
#[tokio::test]
async fn test_create_in_view_all_is_untouched() {
    let h = Harness::new(Some("tenant-2"), true);

    let created = h
        .provider
        .create("invoices", CreateParams::new(record(json!({"amount": 10}))))
        .await
        .unwrap();

    assert!(created.data.get("tenant_id").is_none());
}

/// Reads by id are not tenant-filtered.
#[tokio::test]
async fn test_get_one_is_passed_through() {
    let h = Harness::new(Some("tenant-2"), false);

    h.provider
        .get_one("invoices", GetOneParams::new("inv-1"))
        .await
        .unwrap();

    assert_eq!(h.relational.calls().len(), 1);
    assert_eq!(h.relational.calls()[0].resource(), "invoices");
}

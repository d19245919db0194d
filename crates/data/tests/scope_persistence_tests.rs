//! Integration tests for the persisted tenant scope.

mod common;

use std::sync::Arc;

use serde_json::json;

use atrium_data::composite::CompositeDataProvider;
use atrium_data::tenant::{
    FileKeyValueStore, KeyValueStore, PersistentScope, ScopeStore, TENANT_KEY, TenantId,
    VIEW_ALL_KEY,
};
use atrium_data::types::ListParams;

use common::{RecordingRelational, routing};

/// The selection survives reopening the state file.
#[test]
fn test_scope_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scope.json");

    {
        let scope = PersistentScope::new(Arc::new(FileKeyValueStore::open(&path).unwrap()));
        scope.set_active_tenant(TenantId::new("tenant-2"));
        assert_eq!(scope.active_tenant(), Some(TenantId::new("tenant-2")));
    }

    let reopened = PersistentScope::new(Arc::new(FileKeyValueStore::open(&path).unwrap()));
    assert_eq!(reopened.active_tenant(), Some(TenantId::new("tenant-2")));
    assert!(!reopened.view_all_mode());

    reopened.set_view_all_mode(true);
    assert_eq!(reopened.active_tenant(), None);

    let store = FileKeyValueStore::open(&path).unwrap();
    assert_eq!(store.get(TENANT_KEY).as_deref(), Some("tenant-2"));
    assert_eq!(store.get(VIEW_ALL_KEY).as_deref(), Some("true"));
}

/// View-all hides the tenant regardless of call order.
#[test]
fn test_view_all_wins_over_later_selection() {
    let dir = tempfile::tempdir().unwrap();
    let scope = PersistentScope::new(Arc::new(
        FileKeyValueStore::open(dir.path().join("scope.json")).unwrap(),
    ));

    scope.set_view_all_mode(true);
    scope.set_active_tenant(TenantId::new("tenant-5"));
    assert_eq!(scope.active_tenant(), None);

    scope.set_view_all_mode(false);
    assert_eq!(scope.active_tenant(), Some(TenantId::new("tenant-5")));

    scope.clear_active_tenant();
    assert_eq!(scope.active_tenant(), None);
}

/// A provider over a file-backed scope filters by the persisted tenant.
#[tokio::test]
async fn test_provider_reads_persisted_scope() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scope.json");
    PersistentScope::new(Arc::new(FileKeyValueStore::open(&path).unwrap()))
        .set_active_tenant(TenantId::new("tenant-8"));

    let relational = Arc::new(RecordingRelational::new());
    let scope = Arc::new(PersistentScope::new(Arc::new(
        FileKeyValueStore::open(&path).unwrap(),
    )));
    let provider = CompositeDataProvider::new(relational.clone(), scope, Arc::new(routing()));

    provider
        .get_list("invoices", ListParams::new())
        .await
        .unwrap();

    assert_eq!(
        relational.single_list().filter.get("tenant_id"),
        Some(&json!("tenant-8"))
    );
}

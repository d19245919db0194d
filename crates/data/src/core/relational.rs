//! Relational store adapter trait.
//!
//! This module defines [`RelationalBackend`], the generic CRUD + filter
//! contract the provider consumes for the primary store. The provider treats
//! the store as opaque: filter keys are matched against column names and the
//! only key it ever rewrites is `tenant_id`.

use async_trait::async_trait;

use crate::error::ProviderResult;
use crate::types::{
    CreateParams, DeleteManyParams, DeleteParams, GetManyParams, GetManyReferenceParams,
    GetOneParams, IdsResult, ListParams, ListResult, ManyResult, OneResult, UpdateManyParams,
    UpdateParams,
};

/// Generic CRUD + filter client for the primary store.
///
/// Errors are returned as [`ProviderError::Relational`](crate::error::ProviderError::Relational)
/// and the provider propagates them unchanged: this is the backend of last
/// resort, so nothing above it retries or suppresses.
///
/// # Example
///
/// ```ignore
/// use atrium_data::core::RelationalBackend;
/// use atrium_data::types::ListParams;
///
/// async fn first_page<R: RelationalBackend>(store: &R) -> ProviderResult<()> {
///     let page = store
///         .get_list("documents", &ListParams::new().with_filter("status", "draft"))
///         .await?;
///     println!("{} of {}", page.data.len(), page.total);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait RelationalBackend: Send + Sync {
    /// Returns a human-readable name for this backend.
    fn backend_name(&self) -> &'static str;

    /// Lists one page of `resource` matching the filter.
    async fn get_list(&self, resource: &str, params: &ListParams) -> ProviderResult<ListResult>;

    /// Reads one record.
    ///
    /// # Errors
    ///
    /// * `RelationalError::NotFound` - If no record has the identifier
    async fn get_one(&self, resource: &str, params: &GetOneParams) -> ProviderResult<OneResult>;

    /// Reads several records by identifier. Missing identifiers are skipped.
    async fn get_many(&self, resource: &str, params: &GetManyParams)
    -> ProviderResult<ManyResult>;

    /// Lists one page of records whose `target` field references `id`.
    async fn get_many_reference(
        &self,
        resource: &str,
        params: &GetManyReferenceParams,
    ) -> ProviderResult<ListResult>;

    /// Inserts a record and returns it as stored.
    async fn create(&self, resource: &str, params: &CreateParams) -> ProviderResult<OneResult>;

    /// Updates a record and returns it as stored.
    async fn update(&self, resource: &str, params: &UpdateParams) -> ProviderResult<OneResult>;

    /// Applies the same change to several records.
    async fn update_many(
        &self,
        resource: &str,
        params: &UpdateManyParams,
    ) -> ProviderResult<IdsResult>;

    /// Deletes a record and returns it as it was.
    async fn delete(&self, resource: &str, params: &DeleteParams) -> ProviderResult<OneResult>;

    /// Deletes several records.
    async fn delete_many(
        &self,
        resource: &str,
        params: &DeleteManyParams,
    ) -> ProviderResult<IdsResult>;
}

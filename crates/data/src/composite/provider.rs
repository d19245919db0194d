//! The composite data provider.
//!
//! This module provides [`CompositeDataProvider`], the single entry point
//! exposing the uniform CRUD operations over a relational store and an
//! optional search engine.
//!
//! # Overview
//!
//! Every call is dispatched in three steps:
//!
//! 1. Classify the resource ([`ResourceRouter`]).
//! 2. Native search-admin resources go to the search engine's admin API and
//!    nowhere else. Without a search engine they fail with
//!    [`ConfigurationError::SearchBackendMissing`].
//! 3. Listings of hybrid resources with a free-text query try the search
//!    engine first ([`SearchFallbackOrchestrator`]); everything else goes
//!    through the [`TenantFilterInjector`] to the relational store.
//!
//! The tenant scope is read once at the start of a call.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use atrium_data::backends::memory::MemoryRelationalBackend;
//! use atrium_data::composite::{CompositeDataProvider, RoutingConfig};
//! use atrium_data::tenant::{PersistentScope, ScopeStore, TenantId};
//! use atrium_data::types::ListParams;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let routing = RoutingConfig::builder().tenant_scoped("documents").build().unwrap();
//! let scope = Arc::new(PersistentScope::in_memory());
//! scope.set_active_tenant(TenantId::new("tenant-2"));
//!
//! let provider = CompositeDataProvider::new(
//!     Arc::new(MemoryRelationalBackend::new()),
//!     scope,
//!     Arc::new(routing),
//! );
//! let page = provider.get_list("documents", ListParams::new()).await.unwrap();
//! assert_eq!(page.total, 0);
//! # });
//! ```

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::core::{DynRelational, DynSearch, ImportAction, ImportOutcome, SearchAdminKind};
use crate::error::{ConfigurationError, ProviderResult};
use crate::tenant::{ScopeStore, TenantScope};
use crate::types::{
    CreateParams, DeleteManyParams, DeleteParams, GetManyParams, GetManyReferenceParams,
    GetOneParams, IdsResult, ListParams, ListResult, ManyResult, OneResult, Operation, Record,
    UpdateManyParams, UpdateParams,
};

use super::config::{HybridSearchConfig, RetryConfig, RoutingConfig};
use super::fallback::SearchFallbackOrchestrator;
use super::injector::TenantFilterInjector;
use super::native::NativeDispatcher;
use super::router::{Dispatch, ResourceClass, ResourceRouter};

/// Composite provider over a relational store and an optional search engine.
///
/// The provider holds no per-call state; it can be shared behind an `Arc` and
/// called concurrently.
pub struct CompositeDataProvider {
    /// Primary store.
    relational: DynRelational,

    /// Search engine, if configured.
    search: Option<DynSearch>,

    /// Tenant scope.
    scope: Arc<dyn ScopeStore>,

    /// Resource router.
    router: ResourceRouter,

    /// Retry policy for search reads.
    retry: RetryConfig,

    /// Hybrid listing orchestrator.
    fallback: SearchFallbackOrchestrator,
}

impl CompositeDataProvider {
    /// Creates a provider without a search engine.
    pub fn new(
        relational: DynRelational,
        scope: Arc<dyn ScopeStore>,
        routing: Arc<RoutingConfig>,
    ) -> Self {
        let retry = RetryConfig::default();
        let fallback = SearchFallbackOrchestrator::new(relational.clone(), None, retry.clone());
        Self {
            relational,
            search: None,
            scope,
            router: ResourceRouter::new(routing),
            retry,
            fallback,
        }
    }

    /// Adds a search engine.
    pub fn with_search(mut self, search: DynSearch) -> Self {
        self.search = Some(search);
        self.rebuild_fallback();
        self
    }

    /// Sets the retry policy for search reads.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self.rebuild_fallback();
        self
    }

    fn rebuild_fallback(&mut self) {
        self.fallback = SearchFallbackOrchestrator::new(
            self.relational.clone(),
            self.search.clone(),
            self.retry.clone(),
        );
    }

    /// Returns `true` if a search engine is configured.
    pub fn has_search(&self) -> bool {
        self.search.is_some()
    }

    /// Returns the tenant scope.
    pub fn scope(&self) -> &Arc<dyn ScopeStore> {
        &self.scope
    }

    /// Returns the resource router.
    pub fn router(&self) -> &ResourceRouter {
        &self.router
    }

    /// Classifies a resource.
    pub fn classify(&self, resource: &str) -> ResourceClass {
        self.router.classify(resource)
    }

    /// Registers a hybrid search resource at runtime.
    pub fn register_hybrid(
        &self,
        resource: impl Into<String>,
        config: HybridSearchConfig,
    ) -> Result<(), ConfigurationError> {
        self.router.config().register_hybrid(resource, config)
    }

    fn native<'a>(
        &'a self,
        resource: &'a str,
        kind: SearchAdminKind,
    ) -> ProviderResult<NativeDispatcher<'a>> {
        let search = self
            .search
            .as_deref()
            .ok_or_else(|| ConfigurationError::SearchBackendMissing {
                resource: resource.to_string(),
            })?;
        Ok(NativeDispatcher::new(search, &self.retry, resource, kind))
    }

    fn injector(scope: &TenantScope, tenant_scoped: bool) -> TenantFilterInjector {
        let class = if tenant_scoped {
            ResourceClass::TenantScoped
        } else {
            ResourceClass::Plain
        };
        TenantFilterInjector::new(scope, class)
    }

    /// Lists one page of a resource.
    #[instrument(skip(self, params), fields(resource = %resource))]
    pub async fn get_list(&self, resource: &str, params: ListParams) -> ProviderResult<ListResult> {
        let scope = self.scope.scope();
        let has_query = params.query_text().is_some();
        match self.router.dispatch(resource, Operation::GetList, has_query) {
            Dispatch::Native(kind) => self.native(resource, kind)?.get_list(&params).await,
            Dispatch::HybridSearch {
                config,
                tenant_scoped,
            } => {
                let injector = Self::injector(&scope, tenant_scoped);
                self.fallback
                    .get_list(resource, &config, &injector, params)
                    .await
            }
            Dispatch::Relational { tenant_scoped } => {
                let params = Self::injector(&scope, tenant_scoped).inject_list(params);
                self.relational.get_list(resource, &params).await
            }
        }
    }

    /// Reads one record.
    #[instrument(skip(self, params), fields(resource = %resource, id = %params.id))]
    pub async fn get_one(&self, resource: &str, params: GetOneParams) -> ProviderResult<OneResult> {
        match self.router.dispatch(resource, Operation::GetOne, false) {
            Dispatch::Native(kind) => self.native(resource, kind)?.get_one(&params).await,
            _ => self.relational.get_one(resource, &params).await,
        }
    }

    /// Reads several records by identifier.
    #[instrument(skip(self, params), fields(resource = %resource, count = params.ids.len()))]
    pub async fn get_many(
        &self,
        resource: &str,
        params: GetManyParams,
    ) -> ProviderResult<ManyResult> {
        match self.router.dispatch(resource, Operation::GetMany, false) {
            Dispatch::Native(kind) => self.native(resource, kind)?.get_many(&params).await,
            _ => self.relational.get_many(resource, &params).await,
        }
    }

    /// Lists one page of records referencing another record.
    #[instrument(skip(self, params), fields(resource = %resource, target = %params.target))]
    pub async fn get_many_reference(
        &self,
        resource: &str,
        params: GetManyReferenceParams,
    ) -> ProviderResult<ListResult> {
        let scope = self.scope.scope();
        let has_query = params.query_text().is_some();
        match self
            .router
            .dispatch(resource, Operation::GetManyReference, has_query)
        {
            Dispatch::Native(kind) => {
                self.native(resource, kind)?
                    .get_many_reference(&params)
                    .await
            }
            Dispatch::HybridSearch {
                config,
                tenant_scoped,
            } => {
                let injector = Self::injector(&scope, tenant_scoped);
                self.fallback
                    .get_many_reference(resource, &config, &injector, params)
                    .await
            }
            Dispatch::Relational { tenant_scoped } => {
                let params = Self::injector(&scope, tenant_scoped).inject_reference(params);
                self.relational.get_many_reference(resource, &params).await
            }
        }
    }

    /// Creates a record. Tenant-scoped records are stamped with the active tenant.
    #[instrument(skip(self, params), fields(resource = %resource))]
    pub async fn create(&self, resource: &str, params: CreateParams) -> ProviderResult<OneResult> {
        let scope = self.scope.scope();
        match self.router.dispatch(resource, Operation::Create, false) {
            Dispatch::Native(kind) => self.native(resource, kind)?.create(&params).await,
            Dispatch::Relational { tenant_scoped } | Dispatch::HybridSearch { tenant_scoped, .. } => {
                let params = Self::injector(&scope, tenant_scoped).inject_create(params);
                self.relational.create(resource, &params).await
            }
        }
    }

    /// Updates a record.
    #[instrument(skip(self, params), fields(resource = %resource, id = %params.id))]
    pub async fn update(&self, resource: &str, params: UpdateParams) -> ProviderResult<OneResult> {
        match self.router.dispatch(resource, Operation::Update, false) {
            Dispatch::Native(kind) => self.native(resource, kind)?.update(&params).await,
            _ => self.relational.update(resource, &params).await,
        }
    }

    /// Applies the same change to several records.
    #[instrument(skip(self, params), fields(resource = %resource, count = params.ids.len()))]
    pub async fn update_many(
        &self,
        resource: &str,
        params: UpdateManyParams,
    ) -> ProviderResult<IdsResult> {
        match self.router.dispatch(resource, Operation::UpdateMany, false) {
            Dispatch::Native(kind) => self.native(resource, kind)?.update_many(&params).await,
            _ => self.relational.update_many(resource, &params).await,
        }
    }

    /// Deletes a record.
    #[instrument(skip(self, params), fields(resource = %resource, id = %params.id))]
    pub async fn delete(&self, resource: &str, params: DeleteParams) -> ProviderResult<OneResult> {
        match self.router.dispatch(resource, Operation::Delete, false) {
            Dispatch::Native(kind) => self.native(resource, kind)?.delete(&params).await,
            _ => self.relational.delete(resource, &params).await,
        }
    }

    /// Deletes several records.
    #[instrument(skip(self, params), fields(resource = %resource, count = params.ids.len()))]
    pub async fn delete_many(
        &self,
        resource: &str,
        params: DeleteManyParams,
    ) -> ProviderResult<IdsResult> {
        match self.router.dispatch(resource, Operation::DeleteMany, false) {
            Dispatch::Native(kind) => self.native(resource, kind)?.delete_many(&params).await,
            _ => self.relational.delete_many(resource, &params).await,
        }
    }

    /// Bulk-writes documents into a search collection.
    #[instrument(skip(self, documents), fields(collection = %collection, count = documents.len()))]
    pub async fn import_documents(
        &self,
        collection: &str,
        documents: Vec<Record>,
        action: ImportAction,
    ) -> ProviderResult<Vec<ImportOutcome>> {
        let search = self.require_search(collection)?;
        let outcomes = search
            .import_documents(collection, documents, action)
            .await?;
        let failed = outcomes.iter().filter(|o| !o.success).count();
        debug!(
            imported = outcomes.len() - failed,
            failed,
            action = action.as_str(),
            "Imported documents"
        );
        Ok(outcomes)
    }

    /// Reads every document of a search collection.
    #[instrument(skip(self), fields(collection = %collection))]
    pub async fn export_documents(&self, collection: &str) -> ProviderResult<Vec<Record>> {
        let search = self.require_search(collection)?;
        Ok(search.export_documents(collection).await?)
    }

    fn require_search(&self, resource: &str) -> ProviderResult<&DynSearch> {
        self.search.as_ref().ok_or_else(|| {
            ConfigurationError::SearchBackendMissing {
                resource: resource.to_string(),
            }
            .into()
        })
    }
}

//! Search-first listing with relational fallback.
//!
//! A hybrid listing runs as a two-step state machine:
//!
//! 1. **Attempt**: translate the params and query the search engine with
//!    bounded retry. The outcome is a [`SearchAttempt`].
//! 2. **Resolve**: a [`SearchAttempt::Fulfilled`] result is returned as-is.
//!    Anything else falls back to the relational store with the caller's
//!    original params, passed through the tenant injector like any other
//!    relational listing.
//!
//! Search errors never leave this module. Relational errors from the fallback
//! propagate unchanged.

use tracing::{debug, warn};

use crate::core::{DynRelational, DynSearch};
use crate::error::{ProviderResult, SearchError};
use crate::tenant::TenantId;
use crate::types::{GetManyReferenceParams, ListParams, ListResult};

use super::config::{HybridSearchConfig, RetryConfig};
use super::injector::TenantFilterInjector;
use super::query::{NotApplicable, QueryTranslator, SearchTranslation, into_list_result};
use super::retry::retry_search;

/// Outcome of a search attempt.
#[derive(Debug)]
pub enum SearchAttempt {
    /// The search engine served the listing.
    Fulfilled(ListResult),
    /// The listing cannot be served by the search engine.
    NotApplicable(NotApplicable),
    /// The search engine failed after all retries.
    Failed(SearchError),
}

impl SearchAttempt {
    /// Returns `true` if the search engine served the listing.
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, SearchAttempt::Fulfilled(_))
    }
}

/// Runs hybrid listings.
#[derive(Clone)]
pub struct SearchFallbackOrchestrator {
    relational: DynRelational,
    search: Option<DynSearch>,
    retry: RetryConfig,
}

impl SearchFallbackOrchestrator {
    /// Creates an orchestrator. `search` is `None` when no engine is configured.
    pub fn new(relational: DynRelational, search: Option<DynSearch>, retry: RetryConfig) -> Self {
        Self {
            relational,
            search,
            retry,
        }
    }

    /// Returns the retry policy.
    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Tries to serve a `getList` call from the search engine.
    pub async fn attempt_list(
        &self,
        resource: &str,
        config: &HybridSearchConfig,
        tenant: Option<&TenantId>,
        params: &ListParams,
    ) -> SearchAttempt {
        let translation = QueryTranslator::new(resource, config, tenant).translate_list(params);
        self.attempt(resource, config, translation).await
    }

    /// Tries to serve a `getManyReference` call from the search engine.
    pub async fn attempt_reference(
        &self,
        resource: &str,
        config: &HybridSearchConfig,
        tenant: Option<&TenantId>,
        params: &GetManyReferenceParams,
    ) -> SearchAttempt {
        let translation =
            QueryTranslator::new(resource, config, tenant).translate_reference(params);
        self.attempt(resource, config, translation).await
    }

    async fn attempt(
        &self,
        resource: &str,
        config: &HybridSearchConfig,
        translation: Result<SearchTranslation, NotApplicable>,
    ) -> SearchAttempt {
        let Some(search) = &self.search else {
            return SearchAttempt::NotApplicable(NotApplicable::NoSearchBackend);
        };
        let translation = match translation {
            Ok(translation) => translation,
            Err(reason) => return SearchAttempt::NotApplicable(reason),
        };
        if !translation.dropped.is_empty() {
            debug!(resource, dropped = ?translation.dropped, "Search request narrowed by allow-list");
        }

        let request = &translation.request;
        let collection = config.collection.as_str();
        match retry_search(&self.retry, "search", move || search.search(collection, request)).await {
            Ok(response) => {
                debug!(resource, collection, found = response.found, "Listing served by search");
                SearchAttempt::Fulfilled(into_list_result(response))
            }
            Err(e) => SearchAttempt::Failed(e),
        }
    }

    /// Serves a `getList` call, search first.
    pub async fn get_list(
        &self,
        resource: &str,
        config: &HybridSearchConfig,
        injector: &TenantFilterInjector,
        params: ListParams,
    ) -> ProviderResult<ListResult> {
        let attempt = self
            .attempt_list(resource, config, injector.tenant(), &params)
            .await;
        if let Some(result) = resolve(resource, attempt) {
            return Ok(result);
        }
        let params = injector.inject_list(params);
        self.relational.get_list(resource, &params).await
    }

    /// Serves a `getManyReference` call, search first.
    pub async fn get_many_reference(
        &self,
        resource: &str,
        config: &HybridSearchConfig,
        injector: &TenantFilterInjector,
        params: GetManyReferenceParams,
    ) -> ProviderResult<ListResult> {
        let attempt = self
            .attempt_reference(resource, config, injector.tenant(), &params)
            .await;
        if let Some(result) = resolve(resource, attempt) {
            return Ok(result);
        }
        let params = injector.inject_reference(params);
        self.relational.get_many_reference(resource, &params).await
    }
}

fn resolve(resource: &str, attempt: SearchAttempt) -> Option<ListResult> {
    match attempt {
        SearchAttempt::Fulfilled(result) => Some(result),
        SearchAttempt::NotApplicable(reason) => {
            debug!(resource, %reason, "Search not applicable, using relational store");
            None
        }
        SearchAttempt::Failed(error) => {
            warn!(resource, %error, "Search failed, falling back to relational store");
            None
        }
    }
}

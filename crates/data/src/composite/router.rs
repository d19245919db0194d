//! Resource routing.
//!
//! This module decides, per resource and operation, which backend serves a
//! call.
//!
//! # Routing Rules
//!
//! Classification (first match wins):
//! - Native search-admin resource → [`ResourceClass::NativeSearch`]
//! - Tenant-scoped resource → [`ResourceClass::TenantScoped`]
//! - Anything else → [`ResourceClass::Plain`]
//!
//! Dispatch additionally considers the hybrid registry:
//! - NativeSearch → search engine, every operation
//! - `getList`/`getManyReference` with a hybrid config and a free-text query → search first
//! - Otherwise → relational store (through the tenant injector when tenant-scoped)

use std::fmt;
use std::sync::Arc;

use crate::core::SearchAdminKind;
use crate::types::Operation;

use super::config::{HybridSearchConfig, RoutingConfig};

/// Classification of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceClass {
    /// Served entirely by the search engine's admin API.
    NativeSearch(SearchAdminKind),
    /// Relational, filtered by the active tenant.
    TenantScoped,
    /// Relational, unfiltered.
    Plain,
}

impl ResourceClass {
    /// Returns `true` for tenant-scoped resources.
    pub fn is_tenant_scoped(&self) -> bool {
        matches!(self, ResourceClass::TenantScoped)
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceClass::NativeSearch(kind) => write!(f, "native-search ({})", kind),
            ResourceClass::TenantScoped => f.write_str("tenant-scoped"),
            ResourceClass::Plain => f.write_str("plain"),
        }
    }
}

/// Where one call is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Search engine admin API.
    Native(SearchAdminKind),
    /// Search engine first, relational store as fallback.
    HybridSearch {
        /// The resource's search configuration.
        config: Arc<HybridSearchConfig>,
        /// Whether the resource is also tenant-scoped.
        tenant_scoped: bool,
    },
    /// Relational store.
    Relational {
        /// Whether the tenant injector applies.
        tenant_scoped: bool,
    },
}

/// Pure lookup over a [`RoutingConfig`].
#[derive(Debug, Clone)]
pub struct ResourceRouter {
    config: Arc<RoutingConfig>,
}

impl ResourceRouter {
    /// Creates a router over `config`.
    pub fn new(config: Arc<RoutingConfig>) -> Self {
        Self { config }
    }

    /// Returns the routing configuration.
    pub fn config(&self) -> &Arc<RoutingConfig> {
        &self.config
    }

    /// Classifies `resource`.
    ///
    /// ```
    /// use atrium_data::composite::{ResourceClass, ResourceRouter, RoutingConfig};
    /// use atrium_data::core::SearchAdminKind;
    /// use std::sync::Arc;
    ///
    /// let config = RoutingConfig::builder()
    ///     .tenant_scoped("documents")
    ///     .native_search("typesense-keys", SearchAdminKind::Keys)
    ///     .build()
    ///     .unwrap();
    /// let router = ResourceRouter::new(Arc::new(config));
    ///
    /// assert_eq!(router.classify("documents"), ResourceClass::TenantScoped);
    /// assert_eq!(
    ///     router.classify("typesense-keys"),
    ///     ResourceClass::NativeSearch(SearchAdminKind::Keys)
    /// );
    /// assert_eq!(router.classify("countries"), ResourceClass::Plain);
    /// ```
    pub fn classify(&self, resource: &str) -> ResourceClass {
        if let Some(kind) = self.config.native_kind(resource) {
            ResourceClass::NativeSearch(kind)
        } else if self.config.is_tenant_scoped(resource) {
            ResourceClass::TenantScoped
        } else {
            ResourceClass::Plain
        }
    }

    /// Decides where a call is dispatched.
    ///
    /// `has_query` is whether the call carries a non-blank free-text query.
    pub fn dispatch(&self, resource: &str, operation: Operation, has_query: bool) -> Dispatch {
        let class = self.classify(resource);
        if let ResourceClass::NativeSearch(kind) = class {
            return Dispatch::Native(kind);
        }

        let tenant_scoped = class.is_tenant_scoped();
        if operation.is_listing() && has_query {
            if let Some(config) = self.config.hybrid(resource) {
                return Dispatch::HybridSearch {
                    config,
                    tenant_scoped,
                };
            }
        }
        Dispatch::Relational { tenant_scoped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> ResourceRouter {
        let config = RoutingConfig::builder()
            .tenant_scoped_all(["documents", "invoices", "shared"])
            .native_search("shared", SearchAdminKind::Collections)
            .with_default_search_admin()
            .hybrid_search(
                "documents",
                HybridSearchConfig::new("documents", ["title", "content"]),
            )
            .hybrid_search("countries", HybridSearchConfig::new("countries", ["name"]))
            .build()
            .unwrap();
        ResourceRouter::new(Arc::new(config))
    }

    #[test]
    fn test_native_takes_precedence_over_tenant_scope() {
        assert_eq!(
            router().classify("shared"),
            ResourceClass::NativeSearch(SearchAdminKind::Collections)
        );
    }

    #[test]
    fn test_every_name_has_exactly_one_class() {
        let router = router();
        for name in ["documents", "invoices", "shared", "countries", "", "typesense-keys"] {
            let class = router.classify(name);
            let matches = [
                matches!(class, ResourceClass::NativeSearch(_)),
                class == ResourceClass::TenantScoped,
                class == ResourceClass::Plain,
            ];
            assert_eq!(matches.iter().filter(|m| **m).count(), 1, "{name}");
        }
    }

    #[test]
    fn test_classification_is_case_sensitive() {
        assert_eq!(router().classify("Documents"), ResourceClass::Plain);
    }

    #[test]
    fn test_dispatch_hybrid_needs_listing_and_query() {
        let router = router();

        match router.dispatch("documents", Operation::GetList, true) {
            Dispatch::HybridSearch {
                config,
                tenant_scoped,
            } => {
                assert_eq!(config.collection, "documents");
                assert!(tenant_scoped);
            }
            other => panic!("unexpected dispatch: {other:?}"),
        }

        assert_eq!(
            router.dispatch("documents", Operation::GetList, false),
            Dispatch::Relational {
                tenant_scoped: true
            }
        );
        assert_eq!(
            router.dispatch("documents", Operation::GetOne, true),
            Dispatch::Relational {
                tenant_scoped: true
            }
        );
        assert!(matches!(
            router.dispatch("countries", Operation::GetManyReference, true),
            Dispatch::HybridSearch {
                tenant_scoped: false,
                ..
            }
        ));
    }

    #[test]
    fn test_dispatch_native_for_every_operation() {
        let router = router();
        for operation in Operation::ALL {
            assert_eq!(
                router.dispatch("typesense-keys", operation, false),
                Dispatch::Native(SearchAdminKind::Keys)
            );
        }
    }

    #[test]
    fn test_runtime_registration_is_visible() {
        let router = router();
        assert_eq!(
            router.dispatch("invoices", Operation::GetList, true),
            Dispatch::Relational {
                tenant_scoped: true
            }
        );
        router
            .config()
            .register_hybrid("invoices", HybridSearchConfig::new("invoices", ["number"]))
            .unwrap();
        assert!(matches!(
            router.dispatch("invoices", Operation::GetList, true),
            Dispatch::HybridSearch { .. }
        ));
    }
}

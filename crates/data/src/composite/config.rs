//! Configuration types for the composite data provider.
//!
//! This module contains the static resource classification the router
//! consults, the per-resource search configuration of hybrid resources, and
//! the retry policy for search engine calls.
//!
//! All three resource sets are explicit inputs. Nothing is hard-coded except
//! the stock search-admin resource names offered by
//! [`RoutingConfigBuilder::with_default_search_admin`].

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::SearchAdminKind;
use crate::error::ConfigurationError;

/// Stock resource names for the search engine's administrative objects.
pub const DEFAULT_SEARCH_ADMIN_RESOURCES: [(&str, SearchAdminKind); 8] = [
    ("typesense-collections", SearchAdminKind::Collections),
    ("typesense-aliases", SearchAdminKind::Aliases),
    ("typesense-keys", SearchAdminKind::Keys),
    ("typesense-synonyms", SearchAdminKind::Synonyms),
    ("typesense-overrides", SearchAdminKind::Overrides),
    ("typesense-stopwords", SearchAdminKind::Stopwords),
    ("typesense-analytics-rules", SearchAdminKind::AnalyticsRules),
    ("typesense-documents", SearchAdminKind::Documents),
];

/// Retry policy for search engine calls.
///
/// Relational calls and writes are never retried by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt.
    #[serde(with = "humantime_serde", default = "default_initial_delay")]
    pub initial_delay: Duration,

    /// Upper bound for any delay.
    #[serde(with = "humantime_serde", default = "default_max_delay")]
    pub max_delay: Duration,

    /// Backoff multiplier.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryConfig {
    /// A policy that makes exactly one attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Sets the total number of attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the delay before the second attempt.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Returns the delay to wait before `attempt` (1-based).
    ///
    /// The first attempt never waits. Attempt `n >= 2` waits
    /// `initial_delay * backoff_multiplier^(n - 2)`, capped at `max_delay`.
    ///
    /// ```
    /// use std::time::Duration;
    /// use atrium_data::composite::RetryConfig;
    ///
    /// let retry = RetryConfig::default();
    /// assert_eq!(retry.delay_before(1), Duration::ZERO);
    /// assert_eq!(retry.delay_before(2), Duration::from_millis(500));
    /// assert_eq!(retry.delay_before(3), Duration::from_secs(1));
    /// assert_eq!(retry.delay_before(40), Duration::from_secs(10));
    /// ```
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt - 2).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else if secs <= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Validates the policy.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.max_attempts == 0 {
            return Err(ConfigurationError::InvalidSetting {
                setting: "retry.max_attempts".to_string(),
                message: "at least one attempt is required".to_string(),
            });
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(ConfigurationError::InvalidSetting {
                setting: "retry.backoff_multiplier".to_string(),
                message: format!("must be >= 1.0, got {}", self.backoff_multiplier),
            });
        }
        if self.initial_delay > self.max_delay {
            return Err(ConfigurationError::InvalidSetting {
                setting: "retry.initial_delay".to_string(),
                message: "must not exceed retry.max_delay".to_string(),
            });
        }
        Ok(())
    }
}

fn default_prefix() -> bool {
    true
}

/// Search configuration of a hybrid resource.
///
/// Records of a hybrid resource live in the relational store and are mirrored
/// into `collection`. Listings with a free-text query try the search engine
/// first. Only fields named here may reach the engine as filters, sorts or
/// facets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HybridSearchConfig {
    /// Search collection mirroring the resource.
    pub collection: String,

    /// Fields searched by the query text, in weight order.
    pub searchable_fields: Vec<String>,

    /// Fields that may be filtered on.
    #[serde(default)]
    pub filterable_fields: BTreeSet<String>,

    /// Fields that may be sorted on.
    #[serde(default)]
    pub sortable_fields: BTreeSet<String>,

    /// Fields to compute facet counts for.
    #[serde(default)]
    pub facet_fields: Vec<String>,

    /// Typo tolerance override.
    #[serde(default)]
    pub num_typos: Option<u8>,

    /// Prefix matching on the last query token.
    #[serde(default = "default_prefix")]
    pub prefix: bool,
}

impl HybridSearchConfig {
    /// Creates a configuration searching `searchable_fields` of `collection`.
    pub fn new<I, S>(collection: impl Into<String>, searchable_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            collection: collection.into(),
            searchable_fields: searchable_fields.into_iter().map(Into::into).collect(),
            filterable_fields: BTreeSet::new(),
            sortable_fields: BTreeSet::new(),
            facet_fields: Vec::new(),
            num_typos: None,
            prefix: default_prefix(),
        }
    }

    /// Sets the filter allow-list.
    pub fn with_filterable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filterable_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the sort allow-list.
    pub fn with_sortable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sortable_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the facet fields.
    pub fn with_facets<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facet_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the typo tolerance.
    pub fn with_num_typos(mut self, num_typos: u8) -> Self {
        self.num_typos = Some(num_typos);
        self
    }

    /// Enables or disables prefix matching.
    pub fn with_prefix(mut self, prefix: bool) -> Self {
        self.prefix = prefix;
        self
    }

    /// Returns `true` if `field` may be filtered on.
    pub fn is_filterable(&self, field: &str) -> bool {
        self.filterable_fields.contains(field)
    }

    /// Returns `true` if `field` may be sorted on.
    pub fn is_sortable(&self, field: &str) -> bool {
        self.sortable_fields.contains(field)
    }

    /// The `query_by` expression.
    pub fn query_by(&self) -> String {
        self.searchable_fields.join(",")
    }

    /// The `facet_by` expression, if any facets are configured.
    pub fn facet_by(&self) -> Option<String> {
        if self.facet_fields.is_empty() {
            None
        } else {
            Some(self.facet_fields.join(","))
        }
    }

    /// Validates the configuration for `resource`.
    pub fn validate(&self, resource: &str) -> Result<(), ConfigurationError> {
        let invalid = |message: String| ConfigurationError::InvalidResourceConfig {
            resource: resource.to_string(),
            message,
        };

        if self.collection.trim().is_empty() {
            return Err(invalid("collection must not be blank".to_string()));
        }
        if self.searchable_fields.is_empty() {
            return Err(invalid("at least one searchable field is required".to_string()));
        }

        let fields = self
            .searchable_fields
            .iter()
            .chain(&self.filterable_fields)
            .chain(&self.sortable_fields)
            .chain(&self.facet_fields);
        for field in fields {
            if field.trim().is_empty() {
                return Err(invalid("field names must not be blank".to_string()));
            }
            if field.contains(',') {
                return Err(invalid(format!("field name '{}' contains a comma", field)));
            }
        }
        Ok(())
    }
}

/// Static classification of resources, plus the runtime hybrid registry.
///
/// Tenant-scoped and native search-admin sets are fixed at build time. Hybrid
/// configurations can be added later through [`register_hybrid`](Self::register_hybrid);
/// existing entries can never be replaced or removed.
#[derive(Debug, Default)]
pub struct RoutingConfig {
    tenant_scoped: HashSet<String>,
    native_search: HashMap<String, SearchAdminKind>,
    hybrid: RwLock<HashMap<String, Arc<HybridSearchConfig>>>,
}

impl RoutingConfig {
    /// Creates an empty configuration: every resource is plain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a builder.
    pub fn builder() -> RoutingConfigBuilder {
        RoutingConfigBuilder::new()
    }

    /// Returns `true` if `resource` is filtered by tenant.
    pub fn is_tenant_scoped(&self, resource: &str) -> bool {
        self.tenant_scoped.contains(resource)
    }

    /// Returns the admin kind if `resource` is a native search-admin resource.
    pub fn native_kind(&self, resource: &str) -> Option<SearchAdminKind> {
        self.native_search.get(resource).copied()
    }

    /// Returns the hybrid search configuration of `resource`, if registered.
    pub fn hybrid(&self, resource: &str) -> Option<Arc<HybridSearchConfig>> {
        self.hybrid.read().get(resource).cloned()
    }

    /// Registers a hybrid search resource.
    ///
    /// # Errors
    ///
    /// * `ConfigurationError::InvalidResourceConfig` - If the configuration is invalid
    /// * `ConfigurationError::DuplicateResource` - If `resource` is already registered
    pub fn register_hybrid(
        &self,
        resource: impl Into<String>,
        config: HybridSearchConfig,
    ) -> Result<(), ConfigurationError> {
        let resource = resource.into();
        config.validate(&resource)?;

        let mut hybrid = self.hybrid.write();
        if hybrid.contains_key(&resource) {
            return Err(ConfigurationError::DuplicateResource { resource });
        }
        if self.native_search.contains_key(&resource) {
            warn!(
                resource = %resource,
                "Hybrid search config registered for a native search-admin resource; it will never be consulted"
            );
        }
        debug!(resource = %resource, collection = %config.collection, "Registered hybrid search resource");
        hybrid.insert(resource, Arc::new(config));
        Ok(())
    }

    /// Tenant-scoped resource names, sorted.
    pub fn tenant_scoped_resources(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.tenant_scoped.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Native search-admin resource names and kinds, sorted by name.
    pub fn native_resources(&self) -> Vec<(&str, SearchAdminKind)> {
        let mut entries: Vec<_> = self
            .native_search
            .iter()
            .map(|(name, kind)| (name.as_str(), *kind))
            .collect();
        entries.sort_unstable_by_key(|(name, _)| *name);
        entries
    }

    /// Hybrid resource names, sorted.
    pub fn hybrid_resources(&self) -> Vec<String> {
        let mut names: Vec<_> = self.hybrid.read().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Checks the configuration for overlapping entries.
    pub fn warnings(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let mut shadowed: Vec<_> = self
            .tenant_scoped
            .iter()
            .filter(|name| self.native_search.contains_key(*name))
            .cloned()
            .collect();
        shadowed.sort_unstable();
        for resource in shadowed {
            warnings.push(ConfigWarning::NativeShadowsTenantScope { resource });
        }

        let mut unused: Vec<_> = self
            .hybrid
            .read()
            .keys()
            .filter(|name| self.native_search.contains_key(*name))
            .cloned()
            .collect();
        unused.sort_unstable();
        for resource in unused {
            warnings.push(ConfigWarning::NativeShadowsHybrid { resource });
        }

        warnings
    }
}

/// Builder for constructing [`RoutingConfig`].
#[derive(Debug, Default)]
pub struct RoutingConfigBuilder {
    tenant_scoped: HashSet<String>,
    native_search: HashMap<String, SearchAdminKind>,
    hybrid: Vec<(String, HybridSearchConfig)>,
}

impl RoutingConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a resource as tenant-scoped.
    pub fn tenant_scoped(mut self, resource: impl Into<String>) -> Self {
        self.tenant_scoped.insert(resource.into());
        self
    }

    /// Marks several resources as tenant-scoped.
    pub fn tenant_scoped_all<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tenant_scoped
            .extend(resources.into_iter().map(Into::into));
        self
    }

    /// Maps a resource name to a search engine admin kind.
    pub fn native_search(mut self, resource: impl Into<String>, kind: SearchAdminKind) -> Self {
        self.native_search.insert(resource.into(), kind);
        self
    }

    /// Registers the stock `typesense-*` admin resource names.
    pub fn with_default_search_admin(mut self) -> Self {
        for (name, kind) in DEFAULT_SEARCH_ADMIN_RESOURCES {
            self.native_search.insert(name.to_string(), kind);
        }
        self
    }

    /// Adds a hybrid search resource.
    pub fn hybrid_search(mut self, resource: impl Into<String>, config: HybridSearchConfig) -> Self {
        self.hybrid.push((resource.into(), config));
        self
    }

    /// Builds the configuration, validating it first. Warnings are logged.
    pub fn build(self) -> Result<RoutingConfig, ConfigurationError> {
        let (config, warnings) = self.build_with_warnings()?;
        for warning in &warnings {
            warn!(%warning, "Routing configuration warning");
        }
        Ok(config)
    }

    /// Builds the configuration and returns warnings.
    pub fn build_with_warnings(
        self,
    ) -> Result<(RoutingConfig, Vec<ConfigWarning>), ConfigurationError> {
        for name in self.tenant_scoped.iter().chain(self.native_search.keys()) {
            if name.trim().is_empty() {
                return Err(ConfigurationError::InvalidSetting {
                    setting: "resource".to_string(),
                    message: "resource names must not be blank".to_string(),
                });
            }
        }

        let config = RoutingConfig {
            tenant_scoped: self.tenant_scoped,
            native_search: self.native_search,
            hybrid: RwLock::new(HashMap::new()),
        };
        for (resource, hybrid) in self.hybrid {
            config.register_hybrid(resource, hybrid)?;
        }

        let warnings = config.warnings();
        Ok((config, warnings))
    }
}

/// Configuration warnings (non-fatal issues).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A resource is both native search-admin and tenant-scoped; native wins.
    NativeShadowsTenantScope {
        /// The resource name.
        resource: String,
    },

    /// A resource is both native search-admin and hybrid; the hybrid config is unused.
    NativeShadowsHybrid {
        /// The resource name.
        resource: String,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::NativeShadowsTenantScope { resource } => write!(
                f,
                "resource '{}' is both native search-admin and tenant-scoped; it is routed to the search engine",
                resource
            ),
            ConfigWarning::NativeShadowsHybrid { resource } => write!(
                f,
                "resource '{}' is native search-admin; its hybrid search config is never used",
                resource
            ),
        }
    }
}

/// Routing and retry settings as read from a JSON settings document.
///
/// ```
/// use atrium_data::composite::RoutingSettings;
///
/// let settings: RoutingSettings = serde_json::from_str(r#"{
///     "tenant_scoped_resources": ["documents", "invoices"],
///     "default_search_admin": true,
///     "hybrid_search": {
///         "documents": {
///             "collection": "documents",
///             "searchable_fields": ["title", "content"],
///             "filterable_fields": ["status"]
///         }
///     },
///     "retry": {"max_attempts": 2, "initial_delay": "750ms"}
/// }"#).unwrap();
///
/// let (routing, retry) = settings.into_config().unwrap();
/// assert!(routing.is_tenant_scoped("invoices"));
/// assert!(routing.hybrid("documents").is_some());
/// assert_eq!(retry.max_attempts, 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    /// Resources filtered by tenant.
    pub tenant_scoped_resources: Vec<String>,

    /// Resource name to search engine admin kind.
    pub native_search_resources: BTreeMap<String, SearchAdminKind>,

    /// Also register the stock `typesense-*` admin resource names.
    pub default_search_admin: bool,

    /// Hybrid search resources.
    pub hybrid_search: BTreeMap<String, HybridSearchConfig>,

    /// Retry policy for search engine calls.
    pub retry: RetryConfig,
}

impl RoutingSettings {
    /// Parses settings from JSON text.
    pub fn from_json(raw: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(raw).map_err(|e| ConfigurationError::InvalidSetting {
            setting: "routing".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates the settings and builds the routing and retry configuration.
    pub fn into_config(self) -> Result<(RoutingConfig, RetryConfig), ConfigurationError> {
        self.retry.validate()?;

        let mut builder = RoutingConfig::builder().tenant_scoped_all(self.tenant_scoped_resources);
        if self.default_search_admin {
            builder = builder.with_default_search_admin();
        }
        for (resource, kind) in self.native_search_resources {
            builder = builder.native_search(resource, kind);
        }
        for (resource, hybrid) in self.hybrid_search {
            builder = builder.hybrid_search(resource, hybrid);
        }

        Ok((builder.build()?, self.retry))
    }
}

/// Serde module for Duration with humantime format.
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn documents_config() -> HybridSearchConfig {
        HybridSearchConfig::new("documents", ["title", "content"])
            .with_filterable(["status", "tags"])
            .with_sortable(["created_at"])
            .with_facets(["status"])
    }

    #[test]
    fn test_retry_delays_grow_and_cap() {
        let retry = RetryConfig {
            max_attempts: 6,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        };
        assert_eq!(retry.delay_before(1), Duration::ZERO);
        assert_eq!(retry.delay_before(2), Duration::from_secs(1));
        assert_eq!(retry.delay_before(3), Duration::from_secs(2));
        assert_eq!(retry.delay_before(4), Duration::from_secs(4));
        assert_eq!(retry.delay_before(5), Duration::from_secs(5));
        assert_eq!(retry.delay_before(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn test_retry_validation() {
        assert!(RetryConfig::default().validate().is_ok());
        assert!(RetryConfig::default().with_max_attempts(0).validate().is_err());
        let shrinking = RetryConfig {
            backoff_multiplier: 0.5,
            ..Default::default()
        };
        assert!(shrinking.validate().is_err());
        let inverted = RetryConfig::default().with_initial_delay(Duration::from_secs(60));
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_retry_serde_humantime() {
        let retry: RetryConfig =
            serde_json::from_str(r#"{"initial_delay": "1s", "max_delay": "30s"}"#).unwrap();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.initial_delay, Duration::from_secs(1));
        assert_eq!(retry.max_delay, Duration::from_secs(30));

        let json = serde_json::to_value(RetryConfig::default()).unwrap();
        assert_eq!(json["initial_delay"], "500ms");
    }

    #[test]
    fn test_hybrid_config_expressions() {
        let config = documents_config();
        assert_eq!(config.query_by(), "title,content");
        assert_eq!(config.facet_by(), Some("status".to_string()));
        assert!(config.is_filterable("status"));
        assert!(!config.is_filterable("secret"));
        assert!(config.is_sortable("created_at"));
        assert!(config.prefix);
    }

    #[test]
    fn test_hybrid_config_validation() {
        assert!(documents_config().validate("documents").is_ok());

        let blank = HybridSearchConfig::new(" ", ["title"]);
        assert!(matches!(
            blank.validate("documents"),
            Err(ConfigurationError::InvalidResourceConfig { .. })
        ));

        let no_fields = HybridSearchConfig::new("documents", Vec::<String>::new());
        assert!(no_fields.validate("documents").is_err());

        let comma = HybridSearchConfig::new("documents", ["title,content"]);
        assert!(comma.validate("documents").is_err());
    }

    #[test]
    fn test_register_hybrid_rejects_duplicates() {
        let config = RoutingConfig::new();
        config
            .register_hybrid("documents", documents_config())
            .unwrap();
        let err = config
            .register_hybrid("documents", HybridSearchConfig::new("other", ["name"]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DuplicateResource {
                resource: "documents".to_string()
            }
        );
        assert_eq!(config.hybrid("documents").unwrap().collection, "documents");
    }

    #[test]
    fn test_builder_with_default_search_admin() {
        let config = RoutingConfig::builder()
            .tenant_scoped_all(["documents", "invoices"])
            .with_default_search_admin()
            .build()
            .unwrap();

        assert_eq!(config.tenant_scoped_resources(), vec!["documents", "invoices"]);
        assert_eq!(
            config.native_kind("typesense-keys"),
            Some(SearchAdminKind::Keys)
        );
        assert_eq!(config.native_resources().len(), 8);
    }

    #[test]
    fn test_builder_warns_on_overlap() {
        let (_, warnings) = RoutingConfig::builder()
            .tenant_scoped("shared")
            .native_search("shared", SearchAdminKind::Collections)
            .build_with_warnings()
            .unwrap();
        assert_eq!(
            warnings,
            vec![ConfigWarning::NativeShadowsTenantScope {
                resource: "shared".to_string()
            }]
        );
    }

    #[test]
    fn test_builder_rejects_invalid_hybrid() {
        let result = RoutingConfig::builder()
            .hybrid_search("documents", HybridSearchConfig::new("", ["title"]))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_reject_bad_json() {
        assert!(RoutingSettings::from_json("{\"retry\": 3}").is_err());
        let settings = RoutingSettings::from_json("{}").unwrap();
        assert_eq!(settings, RoutingSettings::default());
    }
}

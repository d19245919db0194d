//! Error types for the data access layer.
//!
//! This module defines all error types used throughout the crate, following a
//! hierarchy that separates configuration errors, search engine errors,
//! relational store errors, and request validation errors.
//!
//! The categories map onto the propagation policy of the composite provider:
//!
//! - [`ConfigurationError`] is never retried. A native search-admin call without a
//!   configured search engine fails fast with it.
//! - [`SearchError`] is retried (when [transient](SearchError::is_transient)) and,
//!   for hybrid listings, swallowed in favour of the relational fallback.
//! - [`RelationalError`] is always propagated unchanged.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// The primary error type for all data provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Missing or invalid configuration
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Search engine errors
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Relational store errors
    #[error(transparent)]
    Relational(#[from] RelationalError),

    /// Request validation errors
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ProviderError {
    /// Returns `true` if this error was caused by missing or invalid configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, ProviderError::Configuration(_))
    }
}

/// Errors related to configuration of backends and resources.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// A call needs the search engine but none is configured.
    #[error("search backend is not configured; cannot serve resource '{resource}'")]
    SearchBackendMissing { resource: String },

    /// A hybrid search resource configuration failed validation.
    #[error("invalid search configuration for resource '{resource}': {message}")]
    InvalidResourceConfig { resource: String, message: String },

    /// The resource name is already registered.
    #[error("resource '{resource}' is already registered")]
    DuplicateResource { resource: String },

    /// A setting is out of range or malformed.
    #[error("invalid setting '{setting}': {message}")]
    InvalidSetting { setting: String, message: String },

    /// Connection settings for a backend are incomplete or malformed.
    #[error("invalid connection settings for {backend_name}: {message}")]
    InvalidConnection {
        backend_name: String,
        message: String,
    },
}

/// Errors originating from the search engine.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The request never reached the search engine or the connection dropped.
    #[error("search transport failed: {message}")]
    Transport { message: String },

    /// The search engine did not answer in time.
    #[error("search request timed out")]
    Timeout,

    /// The search engine answered with a non-success status.
    #[error("search engine returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The search engine response could not be decoded.
    #[error("failed to decode search response: {message}")]
    Decode { message: String },

    /// The requested object does not exist in the search engine.
    #[error("search object not found: {kind}/{id}")]
    NotFound { kind: String, id: String },

    /// The operation is not supported for this kind of admin object.
    #[error("operation '{operation}' is not supported for {kind}")]
    UnsupportedOperation { kind: String, operation: String },
}

impl SearchError {
    /// Returns `true` if retrying the same request may succeed.
    ///
    /// Transport failures, timeouts, throttling (429) and server errors (5xx)
    /// are transient. Client errors and decode failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            SearchError::Transport { .. } | SearchError::Timeout => true,
            SearchError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Errors originating from the relational store.
#[derive(Error, Debug)]
pub enum RelationalError {
    /// The request never reached the relational store or the connection dropped.
    #[error("relational transport failed for {resource}: {message}")]
    Transport { resource: String, message: String },

    /// The relational store answered with a non-success status.
    #[error("relational store returned status {status} for {resource}: {message}")]
    Status {
        resource: String,
        status: u16,
        message: String,
    },

    /// The relational store response could not be decoded.
    #[error("failed to decode relational response: {message}")]
    Decode { message: String },

    /// The requested record was not found.
    #[error("record not found: {resource}/{id}")]
    NotFound { resource: String, id: String },

    /// The relational store rejected the payload.
    #[error("relational store rejected {resource} payload: {message}")]
    Rejected { resource: String, message: String },
}

/// Errors related to malformed requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A collection-scoped admin resource was called without a collection.
    #[error("resource '{resource}' requires a collection (meta.collection or '<collection>/<id>')")]
    MissingCollection { resource: String },

    /// A required field is missing from the payload.
    #[error("missing required field '{field}' for resource '{resource}'")]
    MissingField { resource: String, field: String },

    /// The payload or document is not a JSON object.
    #[error("expected a JSON object for resource '{resource}'")]
    NotAnObject { resource: String },
}

/// Result type alias for data provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Result type alias for search engine operations.
pub type SearchResult<T> = Result<T, SearchError>;

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Decode {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for RelationalError {
    fn from(err: serde_json::Error) -> Self {
        RelationalError::Decode {
            message: err.to_string(),
        }
    }
}

//! Typesense search backend.
//!
//! Covers document search and CRUD, JSONL bulk import/export and the
//! administrative API. Every request carries the `X-TYPESENSE-API-KEY`
//! header.
//!
//! # Admin endpoints
//!
//! | Kind | Path | Create | Update |
//! |------|------|--------|--------|
//! | Collections | `/collections` | `POST` | `PATCH /collections/{name}` |
//! | Aliases | `/aliases` | `PUT /aliases/{name}` | `PUT` |
//! | Keys | `/keys` | `POST` | unsupported |
//! | Synonyms | `/collections/{c}/synonyms` | `PUT .../{id}` | `PUT` |
//! | Overrides | `/collections/{c}/overrides` | `PUT .../{id}` | `PUT` |
//! | Stopwords | `/stopwords` | `PUT /stopwords/{id}` | `PUT` |
//! | Analytics rules | `/analytics/rules` | `PUT /analytics/rules/{name}` | `PUT` |

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::http::{build_client, error_message, join, parse_base_url};
use crate::core::{
    AdminTarget, ImportAction, ImportOutcome, SearchAdminKind, SearchBackend, SearchRequest,
    SearchResponse,
};
use crate::error::{ConfigurationError, SearchError, SearchResult};
use crate::types::Record;

const BACKEND_NAME: &str = "typesense";

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-TYPESENSE-API-KEY";

/// Configuration for the Typesense backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypesenseConfig {
    /// Server URL (e.g., `"http://localhost:8108"`).
    pub url: String,

    /// Admin API key.
    pub api_key: String,

    /// Request timeout in milliseconds (default: 10000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    10000
}

impl TypesenseConfig {
    /// Creates a configuration with the default timeout.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

/// Search backend talking to a Typesense server.
pub struct TypesenseBackend {
    client: reqwest::Client,
    base: Url,
    config: TypesenseConfig,
}

impl Debug for TypesenseBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypesenseBackend")
            .field("base", &self.base.as_str())
            .field("request_timeout_ms", &self.config.request_timeout_ms)
            .finish_non_exhaustive()
    }
}

/// What a 404 refers to.
struct Subject<'a> {
    kind: &'a str,
    id: &'a str,
}

impl TypesenseBackend {
    /// Creates a backend from configuration.
    pub fn new(config: TypesenseConfig) -> Result<Self, ConfigurationError> {
        if config.api_key.trim().is_empty() {
            return Err(ConfigurationError::InvalidConnection {
                backend_name: BACKEND_NAME.to_string(),
                message: "api key is empty".to_string(),
            });
        }
        let base = parse_base_url(BACKEND_NAME, &config.url)?;
        let client = build_client(
            BACKEND_NAME,
            Duration::from_millis(config.request_timeout_ms),
        )?;
        Ok(Self {
            client,
            base,
            config,
        })
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.client
            .request(method, join(&self.base, segments))
            .header(API_KEY_HEADER, &self.config.api_key)
    }

    async fn send_raw(&self, request: RequestBuilder, subject: Subject<'_>) -> SearchResult<String> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        if status.is_success() {
            return Ok(body);
        }

        let message = error_message(&body);
        if status == StatusCode::NOT_FOUND {
            return Err(SearchError::NotFound {
                kind: subject.kind.to_string(),
                id: subject.id.to_string(),
            });
        }
        warn!(status = status.as_u16(), %message, "Typesense request failed");
        Err(SearchError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        subject: Subject<'_>,
    ) -> SearchResult<T> {
        let body = self.send_raw(request, subject).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn collection_subject(collection: &str) -> Subject<'_> {
        Subject {
            kind: SearchAdminKind::Collections.as_str(),
            id: collection,
        }
    }

    /// Path segments of an admin listing.
    fn admin_path<'a>(target: &'a AdminTarget) -> SearchResult<Vec<&'a str>> {
        let scoped = move |leaf: &'static str| match target.collection.as_deref() {
            Some(collection) => Ok(vec!["collections", collection, leaf]),
            None => Err(SearchError::Status {
                status: 400,
                message: format!("{} requires a collection", target.kind),
            }),
        };
        match target.kind {
            SearchAdminKind::Collections => Ok(vec!["collections"]),
            SearchAdminKind::Aliases => Ok(vec!["aliases"]),
            SearchAdminKind::Keys => Ok(vec!["keys"]),
            SearchAdminKind::Stopwords => Ok(vec!["stopwords"]),
            SearchAdminKind::AnalyticsRules => Ok(vec!["analytics", "rules"]),
            SearchAdminKind::Synonyms => scoped("synonyms"),
            SearchAdminKind::Overrides => scoped("overrides"),
            SearchAdminKind::Documents => Err(unsupported(target.kind, "admin")),
        }
    }

    /// Envelope key of a listing response; collections are a bare array.
    fn list_envelope(kind: SearchAdminKind) -> Option<&'static str> {
        match kind {
            SearchAdminKind::Collections | SearchAdminKind::Documents => None,
            SearchAdminKind::Aliases => Some("aliases"),
            SearchAdminKind::Keys => Some("keys"),
            SearchAdminKind::Synonyms => Some("synonyms"),
            SearchAdminKind::Overrides => Some("overrides"),
            SearchAdminKind::Stopwords => Some("stopwords"),
            SearchAdminKind::AnalyticsRules => Some("rules"),
        }
    }
}

fn transport_error(err: reqwest::Error) -> SearchError {
    if err.is_timeout() {
        SearchError::Timeout
    } else {
        SearchError::Transport {
            message: err.to_string(),
        }
    }
}

fn unsupported(kind: SearchAdminKind, operation: &str) -> SearchError {
    SearchError::UnsupportedOperation {
        kind: kind.to_string(),
        operation: operation.to_string(),
    }
}

/// Single stopword sets come back wrapped as `{"stopwords": {...}}`.
fn unwrap_stopwords(kind: SearchAdminKind, mut object: Record) -> Record {
    if kind == SearchAdminKind::Stopwords {
        if let Some(Value::Object(inner)) = object.remove("stopwords") {
            return inner;
        }
    }
    object
}

fn unwrap_list(kind: SearchAdminKind, value: Value) -> SearchResult<Vec<Record>> {
    let items = match (TypesenseBackend::list_envelope(kind), value) {
        (None, Value::Array(items)) => items,
        (Some(key), Value::Object(mut envelope)) => match envelope.remove(key) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(SearchError::Decode {
                    message: format!("missing `{}` array in {} listing", key, kind),
                });
            }
        },
        _ => {
            return Err(SearchError::Decode {
                message: format!("unexpected {} listing shape", kind),
            });
        }
    };
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => Ok(map),
            _ => Err(SearchError::Decode {
                message: format!("{} listing item is not an object", kind),
            }),
        })
        .collect()
}

fn parse_jsonl<T: DeserializeOwned>(body: &str) -> SearchResult<Vec<T>> {
    body.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(SearchError::from))
        .collect()
}

fn to_jsonl(documents: &[Record]) -> SearchResult<String> {
    let mut body = String::new();
    for document in documents {
        body.push_str(&serde_json::to_string(document)?);
        body.push('\n');
    }
    Ok(body)
}

#[async_trait]
impl SearchBackend for TypesenseBackend {
    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn search(
        &self,
        collection: &str,
        request: &SearchRequest,
    ) -> SearchResult<SearchResponse> {
        let http = self
            .request(Method::GET, &["collections", collection, "documents", "search"])
            .query(request);
        let response: SearchResponse = self
            .send(http, Self::collection_subject(collection))
            .await?;
        debug!(collection, found = response.found, hits = response.hits.len(), "Search completed");
        Ok(response)
    }

    async fn retrieve_document(&self, collection: &str, id: &str) -> SearchResult<Record> {
        let http = self.request(Method::GET, &["collections", collection, "documents", id]);
        self.send(http, Subject { kind: "documents", id }).await
    }

    async fn create_document(&self, collection: &str, document: Record) -> SearchResult<Record> {
        let http = self
            .request(Method::POST, &["collections", collection, "documents"])
            .json(&document);
        self.send(http, Self::collection_subject(collection)).await
    }

    async fn upsert_document(&self, collection: &str, document: Record) -> SearchResult<Record> {
        let http = self
            .request(Method::POST, &["collections", collection, "documents"])
            .query(&[("action", "upsert")])
            .json(&document);
        self.send(http, Self::collection_subject(collection)).await
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Record,
    ) -> SearchResult<Record> {
        let http = self
            .request(Method::PATCH, &["collections", collection, "documents", id])
            .json(&fields);
        self.send(http, Subject { kind: "documents", id }).await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> SearchResult<Record> {
        let http = self.request(Method::DELETE, &["collections", collection, "documents", id]);
        self.send(http, Subject { kind: "documents", id }).await
    }

    async fn import_documents(
        &self,
        collection: &str,
        documents: Vec<Record>,
        action: ImportAction,
    ) -> SearchResult<Vec<ImportOutcome>> {
        let body = to_jsonl(&documents)?;
        let http = self
            .request(Method::POST, &["collections", collection, "documents", "import"])
            .query(&[("action", action.as_str())])
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(body);
        let response = self
            .send_raw(http, Self::collection_subject(collection))
            .await?;
        parse_jsonl(&response)
    }

    async fn export_documents(&self, collection: &str) -> SearchResult<Vec<Record>> {
        let http = self.request(Method::GET, &["collections", collection, "documents", "export"]);
        let response = self
            .send_raw(http, Self::collection_subject(collection))
            .await?;
        parse_jsonl(&response)
    }

    async fn list_admin(&self, target: &AdminTarget) -> SearchResult<Vec<Record>> {
        let path = Self::admin_path(target)?;
        let subject = match target.collection.as_deref() {
            Some(collection) => Self::collection_subject(collection),
            None => Subject {
                kind: target.kind.as_str(),
                id: "",
            },
        };
        let value: Value = self.send(self.request(Method::GET, &path), subject).await?;
        unwrap_list(target.kind, value)
    }

    async fn retrieve_admin(&self, target: &AdminTarget, id: &str) -> SearchResult<Record> {
        let mut path = Self::admin_path(target)?;
        path.push(id);
        let subject = Subject {
            kind: target.kind.as_str(),
            id,
        };
        let object = self.send(self.request(Method::GET, &path), subject).await?;
        Ok(unwrap_stopwords(target.kind, object))
    }

    async fn create_admin(&self, target: &AdminTarget, data: Record) -> SearchResult<Record> {
        let mut path = Self::admin_path(target)?;
        let subject = Subject {
            kind: target.kind.as_str(),
            id: "",
        };
        match target.kind {
            SearchAdminKind::Collections | SearchAdminKind::Keys => {
                let http = self.request(Method::POST, &path).json(&data);
                self.send(http, subject).await
            }
            kind => {
                let key_field = kind.key_field();
                let key = match data.get(key_field) {
                    Some(Value::String(s)) if !s.is_empty() => s.clone(),
                    _ => {
                        return Err(SearchError::Status {
                            status: 400,
                            message: format!("missing `{}`", key_field),
                        });
                    }
                };
                path.push(&key);
                let mut body = data.clone();
                if kind != SearchAdminKind::AnalyticsRules {
                    body.remove(key_field);
                }
                let http = self.request(Method::PUT, &path).json(&body);
                let object = self.send(http, subject).await?;
                Ok(unwrap_stopwords(kind, object))
            }
        }
    }

    async fn update_admin(
        &self,
        target: &AdminTarget,
        id: &str,
        data: Record,
    ) -> SearchResult<Record> {
        let method = match target.kind {
            SearchAdminKind::Keys => return Err(unsupported(target.kind, "update")),
            SearchAdminKind::Collections => Method::PATCH,
            _ => Method::PUT,
        };
        let mut path = Self::admin_path(target)?;
        path.push(id);
        let mut body = data;
        if target.kind != SearchAdminKind::AnalyticsRules {
            body.remove(target.kind.key_field());
        }
        let subject = Subject {
            kind: target.kind.as_str(),
            id,
        };
        let object = self
            .send(self.request(method, &path).json(&body), subject)
            .await?;
        Ok(unwrap_stopwords(target.kind, object))
    }

    async fn delete_admin(&self, target: &AdminTarget, id: &str) -> SearchResult<Record> {
        let mut path = Self::admin_path(target)?;
        path.push(id);
        let subject = Subject {
            kind: target.kind.as_str(),
            id,
        };
        let object = self.send(self.request(Method::DELETE, &path), subject).await?;
        Ok(unwrap_stopwords(target.kind, object))
    }
}

//! Supabase / PostgREST relational backend.
//!
//! Each resource is a table or view exposed under the REST root. Filters are
//! translated to PostgREST operators:
//!
//! | Filter value | Query parameter |
//! |--------------|-----------------|
//! | `"paid"`, `7` | `status=eq.paid` |
//! | `null` | `field=is.null` |
//! | `true` | `field=is.true` |
//! | `["a", "b"]` | `field=in.(a,b)` |
//! | `{"gte": 1, "lt": 5}` | `field=gte.1&field=lt.5` |
//! | `q: "text"` | `or=(col.ilike.*text*,...)` over the resource's search columns |
//!
//! Totals come from the `Content-Range` header returned for
//! `Prefer: count=exact`.

use std::collections::HashMap;
use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_RANGE, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::http::{build_client, error_message, join, parse_base_url};
use crate::core::RelationalBackend;
use crate::error::{ConfigurationError, ProviderResult, RelationalError};
use crate::types::{
    CreateParams, DeleteManyParams, DeleteParams, Filter, GetManyParams, GetManyReferenceParams,
    GetOneParams, IdsResult, ListParams, ListResult, ManyResult, OneResult, QUERY_KEY, Record,
    RecordId, UpdateManyParams, UpdateParams,
};

const BACKEND_NAME: &str = "postgrest";

/// Configuration for the PostgREST backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgrestConfig {
    /// Project URL (e.g., `"https://project.supabase.co"`).
    pub url: String,

    /// REST root below the project URL (default: `"rest/v1"`).
    #[serde(default = "default_rest_path")]
    pub rest_path: String,

    /// API key sent as `apikey`.
    pub api_key: String,

    /// Bearer token; the API key is used when absent.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Primary key column (default: `"id"`).
    #[serde(default = "default_id_column")]
    pub id_column: String,

    /// Columns matched by the free-text query, per resource.
    /// Resources without an entry ignore `q`.
    #[serde(default)]
    pub search_columns: HashMap<String, Vec<String>>,

    /// Request timeout in milliseconds (default: 30000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_rest_path() -> String {
    "rest/v1".to_string()
}

fn default_id_column() -> String {
    "id".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30000
}

impl PostgrestConfig {
    /// Creates a configuration with defaults for everything but the
    /// connection.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            rest_path: default_rest_path(),
            api_key: api_key.into(),
            access_token: None,
            id_column: default_id_column(),
            search_columns: HashMap::new(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }

    /// Sets the columns searched by `q` for a resource.
    pub fn with_search_columns(
        mut self,
        resource: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.search_columns.insert(
            resource.into(),
            columns.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

/// Relational backend talking to PostgREST.
pub struct PostgrestBackend {
    client: reqwest::Client,
    root: Url,
    config: PostgrestConfig,
}

impl Debug for PostgrestBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgrestBackend")
            .field("root", &self.root.as_str())
            .field("id_column", &self.config.id_column)
            .field("search_columns", &self.config.search_columns)
            .finish_non_exhaustive()
    }
}

impl PostgrestBackend {
    /// Creates a backend from configuration.
    pub fn new(config: PostgrestConfig) -> Result<Self, ConfigurationError> {
        if config.api_key.trim().is_empty() {
            return Err(ConfigurationError::InvalidConnection {
                backend_name: BACKEND_NAME.to_string(),
                message: "api key is empty".to_string(),
            });
        }
        let base = parse_base_url(BACKEND_NAME, &config.url)?;
        let segments: Vec<&str> = config
            .rest_path
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let root = join(&base, &segments);
        let client = build_client(
            BACKEND_NAME,
            Duration::from_millis(config.request_timeout_ms),
        )?;
        Ok(Self {
            client,
            root,
            config,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &PostgrestConfig {
        &self.config
    }

    fn request(&self, method: Method, resource: &str) -> RequestBuilder {
        let token = self
            .config
            .access_token
            .as_deref()
            .unwrap_or(&self.config.api_key);
        self.client
            .request(method, join(&self.root, &[resource]))
            .header("apikey", &self.config.api_key)
            .bearer_auth(token)
    }

    async fn send(&self, resource: &str, request: RequestBuilder) -> ProviderResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| RelationalError::Transport {
                resource: resource.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);
        warn!(resource, status = status.as_u16(), %message, "PostgREST request failed");
        let err = match status.as_u16() {
            400 | 409 | 422 => RelationalError::Rejected {
                resource: resource.to_string(),
                message,
            },
            code => RelationalError::Status {
                resource: resource.to_string(),
                status: code,
                message,
            },
        };
        Err(err.into())
    }

    async fn rows(response: Response) -> ProviderResult<Vec<Record>> {
        let body = response
            .text()
            .await
            .map_err(|e| RelationalError::Decode {
                message: e.to_string(),
            })?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&body).map_err(RelationalError::from)?)
    }

    fn filter_query(&self, resource: &str, filter: &Filter) -> Vec<(String, String)> {
        let mut query = Vec::new();
        for (key, value) in filter {
            if key == QUERY_KEY {
                if let Some(clause) = self.text_search(resource, value) {
                    query.push(("or".to_string(), clause));
                }
                continue;
            }
            match value {
                Value::Null => query.push((key.clone(), "is.null".to_string())),
                Value::Bool(b) => query.push((key.clone(), format!("is.{}", b))),
                Value::Array(items) => {
                    let list: Vec<String> = items.iter().filter_map(list_item).collect();
                    query.push((key.clone(), format!("in.({})", list.join(","))));
                }
                Value::Object(range) => {
                    for (op, bound) in range {
                        match (op.as_str(), scalar(bound)) {
                            ("gte" | "gt" | "lte" | "lt", Some(bound)) => {
                                query.push((key.clone(), format!("{}.{}", op, bound)))
                            }
                            _ => warn!(resource, field = %key, op = %op, "Ignoring unsupported filter operator"),
                        }
                    }
                }
                other => {
                    if let Some(v) = scalar(other) {
                        query.push((key.clone(), format!("eq.{}", v)));
                    }
                }
            }
        }
        query
    }

    fn text_search(&self, resource: &str, value: &Value) -> Option<String> {
        let q = value.as_str().map(str::trim).filter(|q| !q.is_empty())?;
        let Some(columns) = self.config.search_columns.get(resource) else {
            debug!(resource, "No search columns configured; ignoring q");
            return None;
        };
        let pattern = q.replace(['*', ',', '(', ')'], " ");
        let clauses: Vec<String> = columns
            .iter()
            .map(|column| format!("{}.ilike.*{}*", column, pattern.trim()))
            .collect();
        (!clauses.is_empty()).then(|| format!("({})", clauses.join(",")))
    }

    fn id_query(&self, id: &RecordId) -> (String, String) {
        (self.config.id_column.clone(), format!("eq.{}", id))
    }

    fn ids_query(&self, ids: &[RecordId]) -> (String, String) {
        let list: Vec<String> = ids.iter().map(|id| quote(id.as_str())).collect();
        (
            self.config.id_column.clone(),
            format!("in.({})", list.join(",")),
        )
    }

    fn returned_ids(&self, rows: &[Record]) -> Vec<RecordId> {
        rows.iter()
            .filter_map(|row| row.get(&self.config.id_column).and_then(RecordId::from_value))
            .collect()
    }

    fn not_found(resource: &str, id: &RecordId) -> RelationalError {
        RelationalError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    fn first_or_not_found(
        resource: &str,
        id: &RecordId,
        rows: Vec<Record>,
    ) -> ProviderResult<OneResult> {
        rows.into_iter()
            .next()
            .map(|data| OneResult { data })
            .ok_or_else(|| Self::not_found(resource, id).into())
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn list_item(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(quote(s)),
        other => scalar(other),
    }
}

/// Double-quotes list items containing PostgREST delimiters.
fn quote(s: &str) -> String {
    if s.contains([',', '(', ')', '"', ' ']) {
        format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        s.to_string()
    }
}

/// Reads the total from a `Content-Range` header such as `0-9/42` or `*/0`.
fn content_range_total(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_RANGE)
        .and_then(|value| value.to_str().ok())
        .and_then(|range| range.rsplit_once('/'))
        .and_then(|(_, total)| total.parse().ok())
}

fn return_representation() -> HeaderValue {
    HeaderValue::from_static("return=representation")
}

#[async_trait]
impl RelationalBackend for PostgrestBackend {
    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }

    async fn get_list(&self, resource: &str, params: &ListParams) -> ProviderResult<ListResult> {
        let mut query = self.filter_query(resource, &params.filter);
        if let Some(sort) = &params.sort {
            query.push(("order".to_string(), format!("{}.{}", sort.field, sort.order.as_str())));
        }
        query.push(("limit".to_string(), params.pagination.per_page.to_string()));
        query.push(("offset".to_string(), params.pagination.offset().to_string()));

        let request = self
            .request(Method::GET, resource)
            .query(&[("select", "*")])
            .query(&query)
            .header("Prefer", "count=exact");
        let response = self.send(resource, request).await?;
        let total = content_range_total(response.headers());
        let data = Self::rows(response).await?;
        let total = total.unwrap_or(data.len() as u64);
        debug!(resource, returned = data.len(), total, "Listed records");
        Ok(ListResult::new(data, total))
    }

    async fn get_one(&self, resource: &str, params: &GetOneParams) -> ProviderResult<OneResult> {
        let request = self
            .request(Method::GET, resource)
            .query(&[("select", "*"), ("limit", "1")])
            .query(&[self.id_query(&params.id)]);
        let rows = Self::rows(self.send(resource, request).await?).await?;
        Self::first_or_not_found(resource, &params.id, rows)
    }

    async fn get_many(
        &self,
        resource: &str,
        params: &GetManyParams,
    ) -> ProviderResult<ManyResult> {
        if params.ids.is_empty() {
            return Ok(ManyResult { data: Vec::new() });
        }
        let request = self
            .request(Method::GET, resource)
            .query(&[("select", "*")])
            .query(&[self.ids_query(&params.ids)]);
        let data = Self::rows(self.send(resource, request).await?).await?;
        Ok(ManyResult { data })
    }

    async fn get_many_reference(
        &self,
        resource: &str,
        params: &GetManyReferenceParams,
    ) -> ProviderResult<ListResult> {
        self.get_list(resource, &params.to_list_params()).await
    }

    async fn create(&self, resource: &str, params: &CreateParams) -> ProviderResult<OneResult> {
        let request = self
            .request(Method::POST, resource)
            .header("Prefer", return_representation())
            .json(&params.data);
        let rows = Self::rows(self.send(resource, request).await?).await?;
        let data = rows
            .into_iter()
            .next()
            .unwrap_or_else(|| params.data.clone());
        Ok(OneResult { data })
    }

    async fn update(&self, resource: &str, params: &UpdateParams) -> ProviderResult<OneResult> {
        let mut data = params.data.clone();
        data.remove(&self.config.id_column);
        let request = self
            .request(Method::PATCH, resource)
            .query(&[self.id_query(&params.id)])
            .header("Prefer", return_representation())
            .json(&data);
        let rows = Self::rows(self.send(resource, request).await?).await?;
        Self::first_or_not_found(resource, &params.id, rows)
    }

    async fn update_many(
        &self,
        resource: &str,
        params: &UpdateManyParams,
    ) -> ProviderResult<IdsResult> {
        if params.ids.is_empty() {
            return Ok(IdsResult { data: Vec::new() });
        }
        let mut data = params.data.clone();
        data.remove(&self.config.id_column);
        let request = self
            .request(Method::PATCH, resource)
            .query(&[self.ids_query(&params.ids)])
            .header("Prefer", return_representation())
            .json(&data);
        let rows = Self::rows(self.send(resource, request).await?).await?;
        Ok(IdsResult {
            data: self.returned_ids(&rows),
        })
    }

    async fn delete(&self, resource: &str, params: &DeleteParams) -> ProviderResult<OneResult> {
        let request = self
            .request(Method::DELETE, resource)
            .query(&[self.id_query(&params.id)])
            .header("Prefer", return_representation());
        let rows = Self::rows(self.send(resource, request).await?).await?;
        Self::first_or_not_found(resource, &params.id, rows)
    }

    async fn delete_many(
        &self,
        resource: &str,
        params: &DeleteManyParams,
    ) -> ProviderResult<IdsResult> {
        if params.ids.is_empty() {
            return Ok(IdsResult { data: Vec::new() });
        }
        let request = self
            .request(Method::DELETE, resource)
            .query(&[self.ids_query(&params.ids)])
            .header("Prefer", return_representation());
        let rows = Self::rows(self.send(resource, request).await?).await?;
        Ok(IdsResult {
            data: self.returned_ids(&rows),
        })
    }
}

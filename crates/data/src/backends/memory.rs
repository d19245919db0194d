//! In-memory backends.
//!
//! [`MemoryRelationalBackend`] and [`MemorySearchBackend`] keep everything in
//! process. They back the CLI's offline mode and the test suites, and follow
//! the semantics of the real stores closely enough for both: the relational
//! backend filters, searches, sorts and pages like the PostgREST adapter, and
//! the search backend understands the `filter_by` syntax the provider emits.
//!
//! The search backend can be switched off with
//! [`MemorySearchBackend::set_available`] to drill the relational fallback.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Number, Value};
use tracing::debug;
use uuid::Uuid;

use crate::core::{
    AdminTarget, ImportAction, ImportOutcome, RelationalBackend, SearchAdminKind, SearchBackend,
    SearchHit, SearchRequest, SearchResponse,
};
use crate::error::{ProviderResult, RelationalError, SearchError, SearchResult};
use crate::types::matching::{
    compare_values, contains_text, paginate, record_matches, sort_records, value_contains_text,
    value_matches,
};
use crate::types::{
    CreateParams, DeleteManyParams, DeleteParams, FacetCount, FacetValueCount, GetManyParams,
    GetManyReferenceParams, GetOneParams, IdsResult, ListParams, ListResult, ManyResult,
    OneResult, Pagination, Record, RecordId, SortDirective, UpdateManyParams, UpdateParams,
};

/// Relational store kept in memory, one table per resource.
#[derive(Debug, Default)]
pub struct MemoryRelationalBackend {
    tables: RwLock<HashMap<String, Vec<Record>>>,
}

impl MemoryRelationalBackend {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends records to a table, as-is.
    pub fn insert_records(&self, resource: &str, records: impl IntoIterator<Item = Record>) {
        self.tables
            .write()
            .entry(resource.to_string())
            .or_default()
            .extend(records);
    }

    /// Returns a copy of a table.
    pub fn records(&self, resource: &str) -> Vec<Record> {
        self.tables.read().get(resource).cloned().unwrap_or_default()
    }

    fn list(&self, resource: &str, params: &ListParams) -> ListResult {
        let mut matched: Vec<Record> = self
            .tables
            .read()
            .get(resource)
            .map(|rows| {
                rows.iter()
                    .filter(|row| record_matches(row, &params.filter, &[]))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let total = matched.len() as u64;
        if let Some(sort) = &params.sort {
            sort_records(&mut matched, sort);
        }
        ListResult::new(paginate(matched, params.pagination), total)
    }

    fn not_found(resource: &str, id: &RecordId) -> RelationalError {
        RelationalError::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }
}

fn has_id(row: &Record, id: &RecordId) -> bool {
    row.get("id").is_some_and(|value| id.matches(value))
}

fn merge_into(record: &mut Record, changes: &Record) {
    let mut document = Value::Object(std::mem::take(record));
    let mut patch = changes.clone();
    patch.remove("id");
    json_patch::merge(&mut document, &Value::Object(patch));
    if let Value::Object(map) = document {
        *record = map;
    }
}

#[async_trait]
impl RelationalBackend for MemoryRelationalBackend {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get_list(&self, resource: &str, params: &ListParams) -> ProviderResult<ListResult> {
        Ok(self.list(resource, params))
    }

    async fn get_one(&self, resource: &str, params: &GetOneParams) -> ProviderResult<OneResult> {
        let tables = self.tables.read();
        let row = tables
            .get(resource)
            .and_then(|rows| rows.iter().find(|row| has_id(row, &params.id)))
            .ok_or_else(|| Self::not_found(resource, &params.id))?;
        Ok(OneResult { data: row.clone() })
    }

    async fn get_many(
        &self,
        resource: &str,
        params: &GetManyParams,
    ) -> ProviderResult<ManyResult> {
        let tables = self.tables.read();
        let data = match tables.get(resource) {
            Some(rows) => params
                .ids
                .iter()
                .filter_map(|id| rows.iter().find(|row| has_id(row, id)).cloned())
                .collect(),
            None => Vec::new(),
        };
        Ok(ManyResult { data })
    }

    async fn get_many_reference(
        &self,
        resource: &str,
        params: &GetManyReferenceParams,
    ) -> ProviderResult<ListResult> {
        Ok(self.list(resource, &params.to_list_params()))
    }

    async fn create(&self, resource: &str, params: &CreateParams) -> ProviderResult<OneResult> {
        let mut data = params.data.clone();
        let id = match RecordId::of(&data) {
            Some(id) => id,
            None => {
                let id = RecordId::new(Uuid::new_v4().to_string());
                data.insert("id".to_string(), Value::String(id.to_string()));
                id
            }
        };

        let mut tables = self.tables.write();
        let rows = tables.entry(resource.to_string()).or_default();
        if rows.iter().any(|row| has_id(row, &id)) {
            return Err(RelationalError::Rejected {
                resource: resource.to_string(),
                message: format!("duplicate id {}", id),
            }
            .into());
        }
        rows.push(data.clone());
        debug!(resource, id = %id, "Inserted record");
        Ok(OneResult { data })
    }

    async fn update(&self, resource: &str, params: &UpdateParams) -> ProviderResult<OneResult> {
        let mut tables = self.tables.write();
        let row = tables
            .get_mut(resource)
            .and_then(|rows| rows.iter_mut().find(|row| has_id(row, &params.id)))
            .ok_or_else(|| Self::not_found(resource, &params.id))?;
        merge_into(row, &params.data);
        Ok(OneResult { data: row.clone() })
    }

    async fn update_many(
        &self,
        resource: &str,
        params: &UpdateManyParams,
    ) -> ProviderResult<IdsResult> {
        let mut tables = self.tables.write();
        let mut data = Vec::new();
        if let Some(rows) = tables.get_mut(resource) {
            for id in &params.ids {
                if let Some(row) = rows.iter_mut().find(|row| has_id(row, id)) {
                    merge_into(row, &params.data);
                    data.push(id.clone());
                }
            }
        }
        Ok(IdsResult { data })
    }

    async fn delete(&self, resource: &str, params: &DeleteParams) -> ProviderResult<OneResult> {
        let mut tables = self.tables.write();
        let rows = tables
            .get_mut(resource)
            .ok_or_else(|| Self::not_found(resource, &params.id))?;
        let position = rows
            .iter()
            .position(|row| has_id(row, &params.id))
            .ok_or_else(|| Self::not_found(resource, &params.id))?;
        Ok(OneResult {
            data: rows.remove(position),
        })
    }

    async fn delete_many(
        &self,
        resource: &str,
        params: &DeleteManyParams,
    ) -> ProviderResult<IdsResult> {
        let mut tables = self.tables.write();
        let mut data = Vec::new();
        if let Some(rows) = tables.get_mut(resource) {
            for id in &params.ids {
                if let Some(position) = rows.iter().position(|row| has_id(row, id)) {
                    rows.remove(position);
                    data.push(id.clone());
                }
            }
        }
        Ok(IdsResult { data })
    }
}

type AdminKey = (SearchAdminKind, Option<String>);

/// Page size when a request leaves `per_page` at zero.
const DEFAULT_PER_PAGE: u32 = 10;

/// Search engine kept in memory.
#[derive(Debug)]
pub struct MemorySearchBackend {
    collections: RwLock<BTreeMap<String, BTreeMap<String, Record>>>,
    admin: RwLock<HashMap<AdminKey, BTreeMap<String, Record>>>,
    available: AtomicBool,
    search_calls: AtomicUsize,
    next_key_id: AtomicU64,
}

impl Default for MemorySearchBackend {
    fn default() -> Self {
        Self {
            collections: RwLock::new(BTreeMap::new()),
            admin: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            search_calls: AtomicUsize::new(0),
            next_key_id: AtomicU64::new(1),
        }
    }
}

impl MemorySearchBackend {
    /// Creates an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `collection` if needed and indexes `documents` into it.
    pub fn seed_collection(&self, collection: &str, documents: impl IntoIterator<Item = Record>) {
        self.admin
            .write()
            .entry((SearchAdminKind::Collections, None))
            .or_default()
            .entry(collection.to_string())
            .or_insert_with(|| {
                let mut schema = Record::new();
                schema.insert("name".to_string(), Value::String(collection.to_string()));
                schema.insert("fields".to_string(), Value::Array(Vec::new()));
                schema
            });

        let mut collections = self.collections.write();
        let store = collections.entry(collection.to_string()).or_default();
        for mut document in documents {
            let id = RecordId::of(&document)
                .map(|id| id.to_string())
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            document.insert("id".to_string(), Value::String(id.clone()));
            store.insert(id, document);
        }
    }

    /// Makes every call fail with a transport error while `false`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of `search` calls received, including failed ones.
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> SearchResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SearchError::Transport {
                message: "search engine unavailable".to_string(),
            })
        }
    }

    fn missing_collection(collection: &str) -> SearchError {
        SearchError::NotFound {
            kind: SearchAdminKind::Collections.to_string(),
            id: collection.to_string(),
        }
    }

    fn missing_document(id: &str) -> SearchError {
        SearchError::NotFound {
            kind: SearchAdminKind::Documents.to_string(),
            id: id.to_string(),
        }
    }

    fn with_collection<T>(
        &self,
        collection: &str,
        f: impl FnOnce(&mut BTreeMap<String, Record>) -> SearchResult<T>,
    ) -> SearchResult<T> {
        self.check_available()?;
        let mut collections = self.collections.write();
        let store = collections
            .get_mut(collection)
            .ok_or_else(|| Self::missing_collection(collection))?;
        f(store)
    }

    fn document_id(document: &mut Record) -> String {
        match RecordId::of(document) {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                document.insert("id".to_string(), Value::String(id.clone()));
                id
            }
        }
    }

    fn admin_key(target: &AdminTarget) -> SearchResult<AdminKey> {
        if target.kind == SearchAdminKind::Documents {
            return Err(SearchError::UnsupportedOperation {
                kind: target.kind.to_string(),
                operation: "admin".to_string(),
            });
        }
        Ok((target.kind, target.collection.clone()))
    }

    fn check_parent(&self, target: &AdminTarget) -> SearchResult<()> {
        match &target.collection {
            Some(collection) if !self.collections.read().contains_key(collection) => {
                Err(Self::missing_collection(collection))
            }
            _ => Ok(()),
        }
    }

    fn with_document_count(&self, kind: SearchAdminKind, mut object: Record) -> Record {
        if kind == SearchAdminKind::Collections {
            let count = object
                .get("name")
                .and_then(Value::as_str)
                .and_then(|name| self.collections.read().get(name).map(BTreeMap::len))
                .unwrap_or(0);
            object.insert("num_documents".to_string(), Value::from(count as u64));
        }
        object
    }
}

#[async_trait]
impl SearchBackend for MemorySearchBackend {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn search(
        &self,
        collection: &str,
        request: &SearchRequest,
    ) -> SearchResult<SearchResponse> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let clauses = match &request.filter_by {
            Some(expr) => parse_filter(expr)?,
            None => Vec::new(),
        };
        let query_by: Vec<&str> = request
            .query_by
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .collect();
        let q = request.q.trim();

        let collections = self.collections.read();
        let store = collections
            .get(collection)
            .ok_or_else(|| Self::missing_collection(collection))?;

        let mut matched: Vec<Record> = store
            .values()
            .filter(|doc| {
                q == "*"
                    || if query_by.is_empty() {
                        contains_text(doc, q)
                    } else {
                        query_by
                            .iter()
                            .any(|f| doc.get(*f).is_some_and(|v| value_contains_text(v, q)))
                    }
            })
            .filter(|doc| {
                clauses
                    .iter()
                    .all(|(field, expected)| value_matches(doc.get(field), expected))
            })
            .cloned()
            .collect();
        drop(collections);

        if let Some(sort) = request.sort_by.as_deref().and_then(SortDirective::parse) {
            sort_records(&mut matched, &sort);
        }

        let facet_counts = request
            .facet_by
            .as_deref()
            .map(|fields| facet_counts(&matched, fields))
            .unwrap_or_default();

        let found = matched.len() as u64;
        let per_page = match request.per_page {
            0 => DEFAULT_PER_PAGE,
            n => n,
        };
        let pagination = Pagination::new(request.page, per_page);
        let hits = paginate(matched, pagination)
            .into_iter()
            .map(|document| SearchHit {
                document,
                text_match: None,
            })
            .collect();

        Ok(SearchResponse {
            hits,
            found,
            facet_counts,
        })
    }

    async fn retrieve_document(&self, collection: &str, id: &str) -> SearchResult<Record> {
        self.with_collection(collection, |store| {
            store.get(id).cloned().ok_or_else(|| Self::missing_document(id))
        })
    }

    async fn create_document(&self, collection: &str, document: Record) -> SearchResult<Record> {
        let mut document = document;
        self.with_collection(collection, |store| {
            let id = Self::document_id(&mut document);
            if store.contains_key(&id) {
                return Err(SearchError::Status {
                    status: 409,
                    message: format!("a document with id {} already exists", id),
                });
            }
            store.insert(id, document.clone());
            Ok(document)
        })
    }

    async fn upsert_document(&self, collection: &str, document: Record) -> SearchResult<Record> {
        let mut document = document;
        self.with_collection(collection, |store| {
            let id = Self::document_id(&mut document);
            store.insert(id, document.clone());
            Ok(document)
        })
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: Record,
    ) -> SearchResult<Record> {
        self.with_collection(collection, |store| {
            let document = store.get_mut(id).ok_or_else(|| Self::missing_document(id))?;
            merge_into(document, &fields);
            Ok(document.clone())
        })
    }

    async fn delete_document(&self, collection: &str, id: &str) -> SearchResult<Record> {
        self.with_collection(collection, |store| {
            store.remove(id).ok_or_else(|| Self::missing_document(id))
        })
    }

    async fn import_documents(
        &self,
        collection: &str,
        documents: Vec<Record>,
        action: ImportAction,
    ) -> SearchResult<Vec<ImportOutcome>> {
        self.with_collection(collection, |store| {
            let outcomes = documents
                .into_iter()
                .map(|mut document| {
                    let id = Self::document_id(&mut document);
                    let exists = store.contains_key(&id);
                    let result = match action {
                        ImportAction::Create if exists => Err("document already exists"),
                        ImportAction::Update if !exists => Err("document not found"),
                        ImportAction::Update | ImportAction::Emplace if exists => {
                            if let Some(current) = store.get_mut(&id) {
                                merge_into(current, &document);
                            }
                            Ok(())
                        }
                        _ => {
                            store.insert(id, document);
                            Ok(())
                        }
                    };
                    match result {
                        Ok(()) => ImportOutcome {
                            success: true,
                            error: None,
                        },
                        Err(message) => ImportOutcome {
                            success: false,
                            error: Some(message.to_string()),
                        },
                    }
                })
                .collect();
            Ok(outcomes)
        })
    }

    async fn export_documents(&self, collection: &str) -> SearchResult<Vec<Record>> {
        self.with_collection(collection, |store| Ok(store.values().cloned().collect()))
    }

    async fn list_admin(&self, target: &AdminTarget) -> SearchResult<Vec<Record>> {
        self.check_available()?;
        let key = Self::admin_key(target)?;
        self.check_parent(target)?;
        let objects: Vec<Record> = self
            .admin
            .read()
            .get(&key)
            .map(|store| store.values().cloned().collect())
            .unwrap_or_default();
        Ok(objects
            .into_iter()
            .map(|object| self.with_document_count(target.kind, object))
            .collect())
    }

    async fn retrieve_admin(&self, target: &AdminTarget, id: &str) -> SearchResult<Record> {
        self.check_available()?;
        let key = Self::admin_key(target)?;
        let object = self
            .admin
            .read()
            .get(&key)
            .and_then(|store| store.get(id).cloned())
            .ok_or_else(|| SearchError::NotFound {
                kind: target.kind.to_string(),
                id: id.to_string(),
            })?;
        Ok(self.with_document_count(target.kind, object))
    }

    async fn create_admin(&self, target: &AdminTarget, data: Record) -> SearchResult<Record> {
        self.check_available()?;
        let key = Self::admin_key(target)?;
        self.check_parent(target)?;

        let mut data = data;
        let key_field = target.kind.key_field();
        if target.kind == SearchAdminKind::Keys {
            let id = self.next_key_id.fetch_add(1, Ordering::SeqCst);
            data.insert("id".to_string(), Value::from(id));
            data.entry("value")
                .or_insert_with(|| Value::String(Uuid::new_v4().simple().to_string()));
        }
        let id = data
            .get(key_field)
            .and_then(RecordId::from_value)
            .ok_or_else(|| SearchError::Status {
                status: 400,
                message: format!("missing `{}`", key_field),
            })?
            .to_string();

        let mut admin = self.admin.write();
        let store = admin.entry(key).or_default();
        if store.contains_key(&id) {
            return Err(SearchError::Status {
                status: 409,
                message: format!("{} `{}` already exists", target.kind, id),
            });
        }
        store.insert(id.clone(), data.clone());
        drop(admin);

        if target.kind == SearchAdminKind::Collections {
            self.collections.write().entry(id).or_default();
        }
        Ok(self.with_document_count(target.kind, data))
    }

    async fn update_admin(
        &self,
        target: &AdminTarget,
        id: &str,
        data: Record,
    ) -> SearchResult<Record> {
        self.check_available()?;
        if target.kind == SearchAdminKind::Keys {
            return Err(SearchError::UnsupportedOperation {
                kind: target.kind.to_string(),
                operation: "update".to_string(),
            });
        }
        let key = Self::admin_key(target)?;
        let mut admin = self.admin.write();
        let object = admin
            .get_mut(&key)
            .and_then(|store| store.get_mut(id))
            .ok_or_else(|| SearchError::NotFound {
                kind: target.kind.to_string(),
                id: id.to_string(),
            })?;
        let mut changes = data;
        changes.remove(target.kind.key_field());
        merge_into(object, &changes);
        let updated = object.clone();
        drop(admin);
        Ok(self.with_document_count(target.kind, updated))
    }

    async fn delete_admin(&self, target: &AdminTarget, id: &str) -> SearchResult<Record> {
        self.check_available()?;
        let key = Self::admin_key(target)?;
        let removed = self
            .admin
            .write()
            .get_mut(&key)
            .and_then(|store| store.remove(id))
            .ok_or_else(|| SearchError::NotFound {
                kind: target.kind.to_string(),
                id: id.to_string(),
            })?;

        if target.kind == SearchAdminKind::Collections {
            self.collections.write().remove(id);
            self.admin
                .write()
                .retain(|(_, collection), _| collection.as_deref() != Some(id));
        }
        Ok(removed)
    }
}

/// Parses a `filter_by` expression into `(field, expected)` pairs for
/// [`value_matches`].
fn parse_filter(expr: &str) -> SearchResult<Vec<(String, Value)>> {
    split_outside_backticks(expr, "&&")
        .iter()
        .map(|clause| parse_clause(clause.trim()))
        .collect()
}

fn parse_clause(clause: &str) -> SearchResult<(String, Value)> {
    let invalid = || SearchError::Status {
        status: 400,
        message: format!("could not parse the filter query: `{}`", clause),
    };

    let (field, rest) = clause.split_once(':').ok_or_else(invalid)?;
    let field = field.trim();
    if field.is_empty() {
        return Err(invalid());
    }
    let rest = rest.trim();

    for (symbol, op) in [(">=", "gte"), ("<=", "lte"), (">", "gt"), ("<", "lt")] {
        if let Some(bound) = rest.strip_prefix(symbol) {
            let bound = literal(bound.trim());
            if !bound.is_number() {
                return Err(invalid());
            }
            let mut range = Map::new();
            range.insert(op.to_string(), bound);
            return Ok((field.to_string(), Value::Object(range)));
        }
    }

    let value = rest.strip_prefix('=').unwrap_or(rest).trim();
    if value.is_empty() {
        return Err(invalid());
    }
    let expected = match value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        Some(items) => Value::Array(
            split_outside_backticks(items, ",")
                .iter()
                .map(|item| literal(item.trim()))
                .collect(),
        ),
        None => literal(value),
    };
    Ok((field.to_string(), expected))
}

fn literal(raw: &str) -> Value {
    if let Some(inner) = raw.strip_prefix('`').and_then(|r| r.strip_suffix('`')) {
        return Value::String(inner.to_string());
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(n) = raw.parse::<i64>() {
                Value::from(n)
            } else if let Some(n) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
                Value::Number(n)
            } else {
                Value::String(raw.to_string())
            }
        }
    }
}

fn split_outside_backticks(s: &str, separator: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut rest = s;

    while let Some(c) = rest.chars().next() {
        if !quoted && rest.starts_with(separator) {
            parts.push(std::mem::take(&mut current));
            rest = &rest[separator.len()..];
            continue;
        }
        if c == '`' {
            quoted = !quoted;
        }
        current.push(c);
        rest = &rest[c.len_utf8()..];
    }
    parts.push(current);
    parts
}

fn facet_counts(documents: &[Record], fields: &str) -> Vec<FacetCount> {
    fields
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(|field| {
            let mut counts: BTreeMap<String, u64> = BTreeMap::new();
            for document in documents {
                let values = match document.get(field) {
                    Some(Value::Array(items)) => items.iter().collect(),
                    Some(value) => vec![value],
                    None => Vec::new(),
                };
                for value in values {
                    let key = match value {
                        Value::String(s) => s.clone(),
                        Value::Number(_) | Value::Bool(_) => value.to_string(),
                        _ => continue,
                    };
                    *counts.entry(key).or_default() += 1;
                }
            }

            let mut counts: Vec<FacetValueCount> = counts
                .into_iter()
                .map(|(value, count)| FacetValueCount { value, count })
                .collect();
            counts.sort_by(|a, b| {
                b.count.cmp(&a.count).then_with(|| {
                    compare_values(
                        Some(&Value::String(a.value.clone())),
                        Some(&Value::String(b.value.clone())),
                    )
                })
            });
            FacetCount {
                field_name: field.to_string(),
                counts,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn invoices() -> MemoryRelationalBackend {
        let store = MemoryRelationalBackend::new();
        store.insert_records(
            "invoices",
            [
                record(json!({"id": 1, "tenant_id": "t1", "title": "Rent", "amount": 900})),
                record(json!({"id": 2, "tenant_id": "t2", "title": "Rent", "amount": 700})),
                record(json!({"id": 3, "tenant_id": "t1", "title": "Power", "amount": 80})),
            ],
        );
        store
    }

    #[tokio::test]
    async fn test_relational_list_filters_sorts_and_pages() {
        let store = invoices();
        let params = ListParams::new()
            .with_filter("tenant_id", "t1")
            .with_sort(SortDirective::asc("amount"))
            .with_pagination(1, 1);
        let page = store.get_list("invoices", &params).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.data[0]["title"], json!("Power"));

        let params = ListParams::new().with_query("rent");
        let page = store.get_list("invoices", &params).await.unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_relational_create_assigns_id_and_rejects_duplicates() {
        let store = invoices();
        let created = store
            .create("invoices", &CreateParams::new(record(json!({"title": "Water"}))))
            .await
            .unwrap();
        assert!(created.data["id"].is_string());

        let err = store
            .create("invoices", &CreateParams::new(record(json!({"id": 1}))))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::ProviderError::Relational(RelationalError::Rejected { .. })
        ));
    }

    #[tokio::test]
    async fn test_relational_update_merges_and_delete_reports_missing() {
        let store = invoices();
        let updated = store
            .update(
                "invoices",
                &UpdateParams::new(3_i64, record(json!({"id": 99, "amount": 85, "title": null}))),
            )
            .await
            .unwrap();
        assert_eq!(updated.data["id"], json!(3));
        assert_eq!(updated.data["amount"], json!(85));
        assert!(updated.data.get("title").is_none());

        let ids = store
            .delete_many(
                "invoices",
                &DeleteManyParams {
                    ids: vec![RecordId::from(1_i64), RecordId::from("404")],
                    meta: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(ids.data, vec![RecordId::from(1_i64)]);

        let err = store
            .delete("invoices", &DeleteParams::new(1_i64))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::ProviderError::Relational(RelationalError::NotFound { .. })
        ));
    }

    fn catalog() -> MemorySearchBackend {
        let search = MemorySearchBackend::new();
        search.seed_collection(
            "products",
            [
                record(json!({"id": "1", "title": "Trail Shoe", "brand": "Acme", "price": 120, "tenant_id": "t1"})),
                record(json!({"id": "2", "title": "Road Shoe", "brand": "Bolt", "price": 90, "tenant_id": "t1"})),
                record(json!({"id": "3", "title": "Trail Sock", "brand": "Acme", "price": 15, "tenant_id": "t2"})),
            ],
        );
        search
    }

    fn request(q: &str, filter_by: Option<&str>) -> SearchRequest {
        SearchRequest {
            q: q.to_string(),
            query_by: "title".to_string(),
            filter_by: filter_by.map(str::to_string),
            page: 1,
            per_page: 10,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_search_applies_text_and_filter_by() {
        let search = catalog();
        let response = search
            .search("products", &request("trail", Some("tenant_id:=`t1` && price:>=100")))
            .await
            .unwrap();
        assert_eq!(response.found, 1);
        assert_eq!(response.hits[0].document["id"], json!("1"));

        let response = search
            .search("products", &request("*", Some("brand:[`Acme`, `Bolt`] && price:<100")))
            .await
            .unwrap();
        assert_eq!(response.found, 2);
        assert_eq!(search.search_calls(), 2);
    }

    #[tokio::test]
    async fn test_search_backtick_literal_may_contain_separator() {
        let search = MemorySearchBackend::new();
        search.seed_collection(
            "notes",
            [record(json!({"id": "a", "title": "x", "tag": "a && b"}))],
        );
        let response = search
            .search("notes", &request("*", Some("tag:=`a && b`")))
            .await
            .unwrap();
        assert_eq!(response.found, 1);
    }

    #[tokio::test]
    async fn test_search_facets_and_sort() {
        let search = catalog();
        let mut req = request("*", None);
        req.facet_by = Some("brand".to_string());
        req.sort_by = Some("price:asc".to_string());
        let response = search.search("products", &req).await.unwrap();

        assert_eq!(response.hits[0].document["id"], json!("3"));
        let brand = &response.facet_counts[0];
        assert_eq!(brand.field_name, "brand");
        assert_eq!(brand.counts[0].value, "Acme");
        assert_eq!(brand.counts[0].count, 2);
    }

    #[tokio::test]
    async fn test_search_rejects_malformed_filter() {
        let search = catalog();
        let err = search
            .search("products", &request("*", Some("price")))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Status { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_unavailable_engine_fails_transiently() {
        let search = catalog();
        search.set_available(false);
        let err = search
            .search("products", &request("*", None))
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(search.search_calls(), 1);

        search.set_available(true);
        assert!(search.search("products", &request("*", None)).await.is_ok());
    }

    #[tokio::test]
    async fn test_document_writes() {
        let search = catalog();
        let err = search
            .create_document("products", record(json!({"id": "1"})))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Status { status: 409, .. }));

        let updated = search
            .update_document("products", "2", record(json!({"price": 85})))
            .await
            .unwrap();
        assert_eq!(updated["price"], json!(85));
        assert_eq!(updated["brand"], json!("Bolt"));

        let outcomes = search
            .import_documents(
                "products",
                vec![record(json!({"id": "1"})), record(json!({"id": "4", "title": "Cap"}))],
                ImportAction::Create,
            )
            .await
            .unwrap();
        assert!(!outcomes[0].success);
        assert!(outcomes[1].success);
        assert_eq!(search.export_documents("products").await.unwrap().len(), 4);

        let err = search.retrieve_document("missing", "1").await.unwrap_err();
        assert!(matches!(err, SearchError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_admin_objects() {
        let search = catalog();
        let collections = search
            .list_admin(&AdminTarget::global(SearchAdminKind::Collections))
            .await
            .unwrap();
        assert_eq!(collections[0]["num_documents"], json!(3));

        let keys = AdminTarget::global(SearchAdminKind::Keys);
        let key = search
            .create_admin(&keys, record(json!({"description": "search only"})))
            .await
            .unwrap();
        assert_eq!(key["id"], json!(1));
        assert!(key["value"].is_string());
        let err = search
            .update_admin(&keys, "1", record(json!({"description": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::UnsupportedOperation { .. }));

        let synonyms = AdminTarget::in_collection(SearchAdminKind::Synonyms, "products");
        search
            .create_admin(&synonyms, record(json!({"id": "s1", "synonyms": ["a", "b"]})))
            .await
            .unwrap();
        search
            .delete_admin(&AdminTarget::global(SearchAdminKind::Collections), "products")
            .await
            .unwrap();
        let err = search.list_admin(&synonyms).await.unwrap_err();
        assert!(matches!(err, SearchError::NotFound { .. }));
    }
}

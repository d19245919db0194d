//! Dispatch of native search-admin resources.
//!
//! Each native resource maps 1:1 onto one kind of search engine admin object.
//! The uniform operations are translated as follows:
//!
//! | Operation | Documents | Other kinds |
//! |-----------|-----------|-------------|
//! | `getList` | `search` (`q` defaults to `*`) | `list_admin`, then filtered, sorted and paged in process |
//! | `getOne` | `retrieve_document` | `retrieve_admin` |
//! | `getMany` | one `getOne` per id | one `getOne` per id |
//! | `getManyReference` | `getList` with `target = id` | `getList` with `target = id` |
//! | `create` | `create_document` (or `upsert_document` with `meta.action = "upsert"`) | `create_admin` |
//! | `update` | `update_document` | `update_admin` |
//! | `delete` | `delete_document` | `delete_admin` |
//! | `updateMany`/`deleteMany` | sequential fan-out | sequential fan-out |
//!
//! Collection-scoped kinds need a collection. It is taken from, in order,
//! `meta.collection`, the list filter's `collection`, the payload's
//! `collection`, or a composite id `"<collection>/<id>"`. Records of scoped
//! kinds are returned with composite ids so they round-trip.

use serde_json::Value;
use tracing::{debug, warn};

use crate::core::{AdminTarget, SearchAdminKind, SearchBackend, SearchRequest};
use crate::error::{ProviderResult, SearchError, ValidationError};
use crate::types::matching::{paginate, record_matches, sort_records};
use crate::types::{
    CreateParams, DeleteManyParams, DeleteParams, Filter, GetManyParams, GetManyReferenceParams,
    GetOneParams, IdsResult, ListParams, ListResult, ManyResult, OneResult, QUERY_KEY, Record,
    RecordId, UpdateManyParams, UpdateParams,
};

use super::config::RetryConfig;
use super::query::{exact_literal, filter_expression, into_list_result};
use super::retry::retry_search;

/// Hint key naming the collection of a collection-scoped call.
pub const COLLECTION_KEY: &str = "collection";

/// Hint key naming the fields a document listing searches.
pub const QUERY_BY_KEY: &str = "query_by";

/// Filter key carrying a raw `filter_by` expression for document listings.
pub const FILTER_BY_KEY: &str = "filter_by";

/// Meta key selecting the document write action.
pub const ACTION_KEY: &str = "action";

const WILDCARD_QUERY: &str = "*";

/// Serves the uniform operations of one native resource.
pub struct NativeDispatcher<'a> {
    search: &'a dyn SearchBackend,
    retry: &'a RetryConfig,
    resource: &'a str,
    kind: SearchAdminKind,
}

impl<'a> NativeDispatcher<'a> {
    /// Creates a dispatcher for `resource`, an admin resource of kind `kind`.
    pub fn new(
        search: &'a dyn SearchBackend,
        retry: &'a RetryConfig,
        resource: &'a str,
        kind: SearchAdminKind,
    ) -> Self {
        Self {
            search,
            retry,
            resource,
            kind,
        }
    }

    /// `getList`.
    pub async fn get_list(&self, params: &ListParams) -> ProviderResult<ListResult> {
        let collection = hint(params.meta.as_ref(), COLLECTION_KEY)
            .or_else(|| non_blank(params.filter.get(COLLECTION_KEY)))
            .map(str::to_string);

        if self.kind == SearchAdminKind::Documents {
            let collection = self.require_collection(collection)?;
            return self.list_documents(&collection, params, None).await;
        }

        let target = self.target(collection)?;
        let objects = retry_search(self.retry, "list_admin", || self.search.list_admin(&target))
            .await?;

        let mut records: Vec<Record> = objects
            .into_iter()
            .map(|object| self.present(target.collection.as_deref(), object))
            .filter(|record| record_matches(record, &params.filter, &[COLLECTION_KEY]))
            .collect();
        let total = records.len() as u64;
        if let Some(sort) = &params.sort {
            sort_records(&mut records, sort);
        }
        debug!(resource = self.resource, kind = %self.kind, total, "Listed admin objects");
        Ok(ListResult::new(paginate(records, params.pagination), total))
    }

    /// `getManyReference`.
    pub async fn get_many_reference(
        &self,
        params: &GetManyReferenceParams,
    ) -> ProviderResult<ListResult> {
        if self.kind != SearchAdminKind::Documents {
            return self.get_list(&params.to_list_params()).await;
        }

        let mut list = params.to_list_params();
        list.filter.remove(&params.target);
        let collection = hint(list.meta.as_ref(), COLLECTION_KEY)
            .or_else(|| non_blank(list.filter.get(COLLECTION_KEY)))
            .map(str::to_string);
        let collection = self.require_collection(collection)?;
        let clause = format!("{}:={}", params.target, exact_literal(params.id.as_str()));
        self.list_documents(&collection, &list, Some(clause)).await
    }

    /// `getOne`.
    pub async fn get_one(&self, params: &GetOneParams) -> ProviderResult<OneResult> {
        let (target, id) = self.locate(&params.id, params.meta.as_ref())?;
        let record = self.retrieve(&target, &id).await?;
        Ok(OneResult {
            data: self.present(target.collection.as_deref(), record),
        })
    }

    /// `getMany`. Identifiers the engine does not know are skipped.
    pub async fn get_many(&self, params: &GetManyParams) -> ProviderResult<ManyResult> {
        let mut data = Vec::with_capacity(params.ids.len());
        for id in &params.ids {
            let (target, raw) = self.locate(id, params.meta.as_ref())?;
            match self.retrieve(&target, &raw).await {
                Ok(record) => data.push(self.present(target.collection.as_deref(), record)),
                Err(SearchError::NotFound { .. }) => {
                    debug!(resource = self.resource, id = %id, "Skipping missing admin object");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(ManyResult { data })
    }

    /// `create`.
    pub async fn create(&self, params: &CreateParams) -> ProviderResult<OneResult> {
        let mut data = params.data.clone();
        let mut collection = hint(params.meta.as_ref(), COLLECTION_KEY).map(str::to_string);
        if self.kind.is_collection_scoped() && collection.is_none() {
            collection = match data.remove(COLLECTION_KEY) {
                Some(Value::String(c)) if !c.trim().is_empty() => Some(c),
                _ => None,
            };
        }
        let target = self.target(collection)?;

        let created = if self.kind == SearchAdminKind::Documents {
            let collection = target.collection.as_deref().unwrap_or_default();
            if hint(params.meta.as_ref(), ACTION_KEY) == Some("upsert") {
                self.search.upsert_document(collection, data).await?
            } else {
                self.search.create_document(collection, data).await?
            }
        } else {
            self.require_key(&mut data)?;
            self.search.create_admin(&target, data).await?
        };

        debug!(resource = self.resource, kind = %self.kind, "Created admin object");
        Ok(OneResult {
            data: self.present(target.collection.as_deref(), created),
        })
    }

    /// `update`. Only fields that differ from `previous_data` are sent.
    pub async fn update(&self, params: &UpdateParams) -> ProviderResult<OneResult> {
        let (target, id) = self.locate(&params.id, params.meta.as_ref())?;
        let changes = self.changes(&params.data, params.previous_data.as_ref());

        let updated = match &target.collection {
            Some(collection) if self.kind == SearchAdminKind::Documents => {
                self.search.update_document(collection, &id, changes).await?
            }
            _ => self.search.update_admin(&target, &id, changes).await?,
        };
        Ok(OneResult {
            data: self.present(target.collection.as_deref(), updated),
        })
    }

    /// `updateMany`, one call per id.
    pub async fn update_many(&self, params: &UpdateManyParams) -> ProviderResult<IdsResult> {
        let mut data = Vec::with_capacity(params.ids.len());
        for id in &params.ids {
            let single = UpdateParams {
                id: id.clone(),
                data: params.data.clone(),
                previous_data: None,
                meta: params.meta.clone(),
            };
            self.update(&single).await?;
            data.push(id.clone());
        }
        Ok(IdsResult { data })
    }

    /// `delete`.
    pub async fn delete(&self, params: &DeleteParams) -> ProviderResult<OneResult> {
        let (target, id) = self.locate(&params.id, params.meta.as_ref())?;
        let deleted = match &target.collection {
            Some(collection) if self.kind == SearchAdminKind::Documents => {
                self.search.delete_document(collection, &id).await?
            }
            _ => self.search.delete_admin(&target, &id).await?,
        };
        debug!(resource = self.resource, kind = %self.kind, id = %id, "Deleted admin object");
        Ok(OneResult {
            data: self.present(target.collection.as_deref(), deleted),
        })
    }

    /// `deleteMany`, one call per id.
    pub async fn delete_many(&self, params: &DeleteManyParams) -> ProviderResult<IdsResult> {
        let mut data = Vec::with_capacity(params.ids.len());
        for id in &params.ids {
            let single = DeleteParams {
                id: id.clone(),
                previous_data: None,
                meta: params.meta.clone(),
            };
            self.delete(&single).await?;
            data.push(id.clone());
        }
        Ok(IdsResult { data })
    }

    async fn list_documents(
        &self,
        collection: &str,
        params: &ListParams,
        extra_clause: Option<String>,
    ) -> ProviderResult<ListResult> {
        let filter = &params.filter;
        let q = params.query_text().unwrap_or(WILDCARD_QUERY).to_string();
        let query_by = non_blank(filter.get(QUERY_BY_KEY))
            .or_else(|| hint(params.meta.as_ref(), QUERY_BY_KEY))
            .map(str::to_string);
        let query_by = match query_by {
            Some(query_by) => query_by,
            None if q == WILDCARD_QUERY => String::new(),
            None => {
                return Err(ValidationError::MissingField {
                    resource: self.resource.to_string(),
                    field: QUERY_BY_KEY.to_string(),
                }
                .into());
            }
        };

        let mut clauses: Vec<String> = non_blank(filter.get(FILTER_BY_KEY))
            .map(str::to_string)
            .into_iter()
            .collect();
        clauses.extend(self.document_clauses(filter));
        clauses.extend(extra_clause);

        let request = SearchRequest {
            q,
            query_by,
            filter_by: (!clauses.is_empty()).then(|| clauses.join(" && ")),
            sort_by: params
                .sort
                .as_ref()
                .map(|sort| format!("{}:{}", sort.field, sort.order)),
            page: params.pagination.page.max(1),
            per_page: params.pagination.per_page,
            ..Default::default()
        };

        let response = retry_search(self.retry, "search", || {
            self.search.search(collection, &request)
        })
        .await?;
        let mut result = into_list_result(response);
        result.data = result
            .data
            .into_iter()
            .map(|document| self.present(Some(collection), document))
            .collect();
        Ok(result)
    }

    fn document_clauses(&self, filter: &Filter) -> Vec<String> {
        const RESERVED: [&str; 4] = [QUERY_KEY, QUERY_BY_KEY, FILTER_BY_KEY, COLLECTION_KEY];
        let mut clauses = Vec::new();
        for (field, value) in filter {
            if RESERVED.contains(&field.as_str()) || value.is_null() {
                continue;
            }
            match filter_expression(field, value) {
                Some(clause) => clauses.push(clause),
                None => {
                    warn!(resource = self.resource, field = %field, "Dropping document filter that cannot be expressed");
                }
            }
        }
        clauses
    }

    async fn retrieve(&self, target: &AdminTarget, id: &str) -> Result<Record, SearchError> {
        match &target.collection {
            Some(collection) if self.kind == SearchAdminKind::Documents => {
                retry_search(self.retry, "retrieve_document", || {
                    self.search.retrieve_document(collection, id)
                })
                .await
            }
            _ => {
                retry_search(self.retry, "retrieve_admin", || {
                    self.search.retrieve_admin(target, id)
                })
                .await
            }
        }
    }

    fn require_collection(&self, collection: Option<String>) -> Result<String, ValidationError> {
        collection.ok_or_else(|| ValidationError::MissingCollection {
            resource: self.resource.to_string(),
        })
    }

    fn target(&self, collection: Option<String>) -> Result<AdminTarget, ValidationError> {
        if self.kind.is_collection_scoped() {
            let collection = self.require_collection(collection)?;
            Ok(AdminTarget::in_collection(self.kind, collection))
        } else {
            Ok(AdminTarget::global(self.kind))
        }
    }

    /// Resolves an identifier into its target and the engine's own key.
    fn locate(
        &self,
        id: &RecordId,
        meta: Option<&Record>,
    ) -> Result<(AdminTarget, String), ValidationError> {
        if !self.kind.is_collection_scoped() {
            return Ok((AdminTarget::global(self.kind), id.as_str().to_string()));
        }

        if let Some(collection) = hint(meta, COLLECTION_KEY) {
            let raw = id
                .as_str()
                .strip_prefix(collection)
                .and_then(|rest| rest.strip_prefix('/'))
                .unwrap_or(id.as_str());
            return Ok((
                AdminTarget::in_collection(self.kind, collection),
                raw.to_string(),
            ));
        }

        match id.as_str().split_once('/') {
            Some((collection, raw)) if !collection.is_empty() && !raw.is_empty() => Ok((
                AdminTarget::in_collection(self.kind, collection),
                raw.to_string(),
            )),
            _ => Err(ValidationError::MissingCollection {
                resource: self.resource.to_string(),
            }),
        }
    }

    /// Makes sure an admin object carries its key field.
    fn require_key(&self, data: &mut Record) -> Result<(), ValidationError> {
        if self.kind == SearchAdminKind::Keys {
            return Ok(());
        }
        let key_field = self.kind.key_field();
        if data.get(key_field).is_some_and(|v| !v.is_null()) {
            return Ok(());
        }
        match data.get("id").cloned() {
            Some(id) if !id.is_null() => {
                data.insert(key_field.to_string(), id);
                Ok(())
            }
            _ => Err(ValidationError::MissingField {
                resource: self.resource.to_string(),
                field: key_field.to_string(),
            }),
        }
    }

    /// The fields to send for an update.
    fn changes(&self, data: &Record, previous: Option<&Record>) -> Record {
        data.iter()
            .filter(|(key, _)| key.as_str() != "id" && key.as_str() != COLLECTION_KEY)
            .filter(|(key, _)| {
                self.kind == SearchAdminKind::Documents || key.as_str() != self.kind.key_field()
            })
            .filter(|(key, value)| previous.and_then(|p| p.get(*key)) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Gives an engine object the id the admin UI addresses it by.
    fn present(&self, collection: Option<&str>, mut record: Record) -> Record {
        let key = record
            .get(self.kind.key_field())
            .or_else(|| record.get("id"))
            .and_then(RecordId::from_value);

        match (collection, key) {
            (Some(collection), Some(key)) if self.kind.is_collection_scoped() => {
                record.insert(
                    "id".to_string(),
                    Value::String(format!("{}/{}", collection, key)),
                );
                record
                    .entry(COLLECTION_KEY)
                    .or_insert_with(|| Value::String(collection.to_string()));
            }
            (_, Some(key)) => {
                record.insert("id".to_string(), Value::String(key.to_string()));
            }
            (_, None) => {}
        }
        record
    }
}

fn non_blank(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn hint<'m>(meta: Option<&'m Record>, key: &str) -> Option<&'m str> {
    non_blank(meta.and_then(|m| m.get(key)))
}

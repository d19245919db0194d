//! Backend doubles.
//!
//! - [`RecordingRelational`] records every call and answers listings with a
//!   canned page.
//! - [`RecordingSearch`] records search requests and answers with canned hits.
//! - [`FailingSearch`] fails every call with a transient error.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use atrium_data::core::{
    AdminTarget, ImportAction, ImportOutcome, RelationalBackend, SearchBackend, SearchHit,
    SearchRequest, SearchResponse,
};
use atrium_data::error::{ProviderResult, SearchError, SearchResult};
use atrium_data::types::{
    CreateParams, DeleteManyParams, DeleteParams, GetManyParams, GetManyReferenceParams,
    GetOneParams, IdsResult, ListParams, ListResult, ManyResult, OneResult, Operation, Record,
    UpdateManyParams, UpdateParams,
};

/// One call received by [`RecordingRelational`].
#[derive(Debug, Clone, PartialEq)]
pub enum RelationalCall {
    /// `get_list`
    List(String, ListParams),
    /// `get_many_reference`
    Reference(String, GetManyReferenceParams),
    /// `create`
    Create(String, CreateParams),
    /// Any other operation.
    Other(Operation, String),
}

impl RelationalCall {
    /// The resource the call addressed.
    pub fn resource(&self) -> &str {
        match self {
            RelationalCall::List(r, _)
            | RelationalCall::Reference(r, _)
            | RelationalCall::Create(r, _)
            | RelationalCall::Other(_, r) => r,
        }
    }
}

/// Relational double that records calls.
#[derive(Debug, Default)]
pub struct RecordingRelational {
    calls: Mutex<Vec<RelationalCall>>,
    page: Mutex<ListResult>,
}

impl RecordingRelational {
    /// Creates a double answering listings with an empty page.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page returned by listings.
    pub fn respond_with(&self, rows: Vec<Record>) {
        let total = rows.len() as u64;
        *self.page.lock() = ListResult::new(rows, total);
    }

    /// Returns the calls received so far.
    pub fn calls(&self) -> Vec<RelationalCall> {
        self.calls.lock().clone()
    }

    /// Returns the params of the only `get_list` call.
    pub fn single_list(&self) -> ListParams {
        let lists: Vec<ListParams> = self
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                RelationalCall::List(_, params) => Some(params),
                _ => None,
            })
            .collect();
        assert_eq!(lists.len(), 1, "expected exactly one get_list call");
        lists.into_iter().next().unwrap()
    }

    fn record(&self, call: RelationalCall) {
        self.calls.lock().push(call);
    }

    fn echo(data: Record) -> OneResult {
        OneResult { data }
    }
}

#[async_trait]
impl RelationalBackend for RecordingRelational {
    fn backend_name(&self) -> &'static str {
        "recording"
    }

    async fn get_list(&self, resource: &str, params: &ListParams) -> ProviderResult<ListResult> {
        self.record(RelationalCall::List(resource.to_string(), params.clone()));
        Ok(self.page.lock().clone())
    }

    async fn get_one(&self, resource: &str, _params: &GetOneParams) -> ProviderResult<OneResult> {
        self.record(RelationalCall::Other(Operation::GetOne, resource.to_string()));
        Ok(Self::echo(Record::new()))
    }

    async fn get_many(
        &self,
        resource: &str,
        _params: &GetManyParams,
    ) -> ProviderResult<ManyResult> {
        self.record(RelationalCall::Other(Operation::GetMany, resource.to_string()));
        Ok(ManyResult::default())
    }

    async fn get_many_reference(
        &self,
        resource: &str,
        params: &GetManyReferenceParams,
    ) -> ProviderResult<ListResult> {
        self.record(RelationalCall::Reference(resource.to_string(), params.clone()));
        Ok(self.page.lock().clone())
    }

    async fn create(&self, resource: &str, params: &CreateParams) -> ProviderResult<OneResult> {
        self.record(RelationalCall::Create(resource.to_string(), params.clone()));
        Ok(Self::echo(params.data.clone()))
    }

    async fn update(&self, resource: &str, params: &UpdateParams) -> ProviderResult<OneResult> {
        self.record(RelationalCall::Other(Operation::Update, resource.to_string()));
        Ok(Self::echo(params.data.clone()))
    }

    async fn update_many(
        &self,
        resource: &str,
        params: &UpdateManyParams,
    ) -> ProviderResult<IdsResult> {
        self.record(RelationalCall::Other(Operation::UpdateMany, resource.to_string()));
        Ok(IdsResult {
            data: params.ids.clone(),
        })
    }

    async fn delete(&self, resource: &str, _params: &DeleteParams) -> ProviderResult<OneResult> {
        self.record(RelationalCall::Other(Operation::Delete, resource.to_string()));
        Ok(Self::echo(Record::new()))
    }

    async fn delete_many(
        &self,
        resource: &str,
        params: &DeleteManyParams,
    ) -> ProviderResult<IdsResult> {
        self.record(RelationalCall::Other(Operation::DeleteMany, resource.to_string()));
        Ok(IdsResult {
            data: params.ids.clone(),
        })
    }
}

/// Search double that records requests and answers with canned hits.
#[derive(Debug, Default)]
pub struct RecordingSearch {
    requests: Mutex<Vec<(String, SearchRequest)>>,
    hits: Mutex<Vec<Record>>,
    admin_calls: AtomicUsize,
}

impl RecordingSearch {
    /// Creates a double answering with no hits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hits returned by `search`.
    pub fn respond_with(&self, hits: Vec<Record>) {
        *self.hits.lock() = hits;
    }

    /// Returns the `(collection, request)` pairs received so far.
    pub fn requests(&self) -> Vec<(String, SearchRequest)> {
        self.requests.lock().clone()
    }

    /// Number of calls to admin or document endpoints.
    pub fn admin_calls(&self) -> usize {
        self.admin_calls.load(Ordering::SeqCst)
    }

    fn admin(&self) -> SearchResult<Record> {
        self.admin_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Record::new())
    }
}

#[async_trait]
impl SearchBackend for RecordingSearch {
    fn backend_name(&self) -> &'static str {
        "recording"
    }

    async fn search(
        &self,
        collection: &str,
        request: &SearchRequest,
    ) -> SearchResult<SearchResponse> {
        self.requests
            .lock()
            .push((collection.to_string(), request.clone()));
        let hits: Vec<SearchHit> = self
            .hits
            .lock()
            .iter()
            .cloned()
            .map(|document| SearchHit {
                document,
                text_match: Some(100),
            })
            .collect();
        Ok(SearchResponse {
            found: hits.len() as u64,
            hits,
            facet_counts: Vec::new(),
        })
    }

    async fn retrieve_document(&self, _collection: &str, _id: &str) -> SearchResult<Record> {
        self.admin()
    }

    async fn create_document(&self, _collection: &str, document: Record) -> SearchResult<Record> {
        self.admin()?;
        Ok(document)
    }

    async fn upsert_document(&self, _collection: &str, document: Record) -> SearchResult<Record> {
        self.admin()?;
        Ok(document)
    }

    async fn update_document(
        &self,
        _collection: &str,
        _id: &str,
        fields: Record,
    ) -> SearchResult<Record> {
        self.admin()?;
        Ok(fields)
    }

    async fn delete_document(&self, _collection: &str, _id: &str) -> SearchResult<Record> {
        self.admin()
    }

    async fn import_documents(
        &self,
        _collection: &str,
        documents: Vec<Record>,
        _action: ImportAction,
    ) -> SearchResult<Vec<ImportOutcome>> {
        self.admin()?;
        Ok(documents
            .iter()
            .map(|_| ImportOutcome {
                success: true,
                error: None,
            })
            .collect())
    }

    async fn export_documents(&self, _collection: &str) -> SearchResult<Vec<Record>> {
        self.admin()?;
        Ok(self.hits.lock().clone())
    }

    async fn list_admin(&self, _target: &AdminTarget) -> SearchResult<Vec<Record>> {
        self.admin()?;
        Ok(Vec::new())
    }

    async fn retrieve_admin(&self, _target: &AdminTarget, _id: &str) -> SearchResult<Record> {
        self.admin()
    }

    async fn create_admin(&self, _target: &AdminTarget, data: Record) -> SearchResult<Record> {
        self.admin()?;
        Ok(data)
    }

    async fn update_admin(
        &self,
        _target: &AdminTarget,
        _id: &str,
        data: Record,
    ) -> SearchResult<Record> {
        self.admin()?;
        Ok(data)
    }

    async fn delete_admin(&self, _target: &AdminTarget, _id: &str) -> SearchResult<Record> {
        self.admin()
    }
}

/// Search double whose every call fails with a transport error.
#[derive(Debug, Default)]
pub struct FailingSearch {
    calls: AtomicUsize,
}

impl FailingSearch {
    /// Creates the double.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> SearchResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SearchError::Transport {
            message: "connection refused".to_string(),
        })
    }
}

#[async_trait]
impl SearchBackend for FailingSearch {
    fn backend_name(&self) -> &'static str {
        "failing"
    }

    async fn search(
        &self,
        _collection: &str,
        _request: &SearchRequest,
    ) -> SearchResult<SearchResponse> {
        self.fail()
    }

    async fn retrieve_document(&self, _collection: &str, _id: &str) -> SearchResult<Record> {
        self.fail()
    }

    async fn create_document(&self, _collection: &str, _document: Record) -> SearchResult<Record> {
        self.fail()
    }

    async fn upsert_document(&self, _collection: &str, _document: Record) -> SearchResult<Record> {
        self.fail()
    }

    async fn update_document(
        &self,
        _collection: &str,
        _id: &str,
        _fields: Record,
    ) -> SearchResult<Record> {
        self.fail()
    }

    async fn delete_document(&self, _collection: &str, _id: &str) -> SearchResult<Record> {
        self.fail()
    }

    async fn import_documents(
        &self,
        _collection: &str,
        _documents: Vec<Record>,
        _action: ImportAction,
    ) -> SearchResult<Vec<ImportOutcome>> {
        self.fail()
    }

    async fn export_documents(&self, _collection: &str) -> SearchResult<Vec<Record>> {
        self.fail()
    }

    async fn list_admin(&self, _target: &AdminTarget) -> SearchResult<Vec<Record>> {
        self.fail()
    }

    async fn retrieve_admin(&self, _target: &AdminTarget, _id: &str) -> SearchResult<Record> {
        self.fail()
    }

    async fn create_admin(&self, _target: &AdminTarget, _data: Record) -> SearchResult<Record> {
        self.fail()
    }

    async fn update_admin(
        &self,
        _target: &AdminTarget,
        _id: &str,
        _data: Record,
    ) -> SearchResult<Record> {
        self.fail()
    }

    async fn delete_admin(&self, _target: &AdminTarget, _id: &str) -> SearchResult<Record> {
        self.fail()
    }
}

//! Core types for provider requests and results.
//!
//! - [`params`] - Request envelopes, one per operation
//! - [`results`] - Uniform result shapes
//! - [`operation`] - The operation kinds
//! - [`matching`] - In-process filter, sort and paging helpers

pub mod matching;
pub mod operation;
pub mod params;
pub mod results;

pub use operation::Operation;
pub use params::{
    CreateParams, DeleteManyParams, DeleteParams, Filter, GetManyParams, GetManyReferenceParams,
    GetOneParams, ListParams, Pagination, QUERY_KEY, Record, RecordId, SortDirective, SortOrder,
    TENANT_FIELD, UpdateManyParams, UpdateParams, query_text,
};
pub use results::{FacetCount, FacetValueCount, IdsResult, ListResult, ManyResult, OneResult};

//! Request envelopes for provider operations.
//!
//! One params struct per operation, shaped after the admin UI's data provider
//! contract. Every struct carries an optional `meta` object for
//! resource-specific hints (for example the collection of a collection-scoped
//! search admin resource).

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A record as exchanged with backends: a JSON object.
pub type Record = Map<String, Value>;

/// A filter map: arbitrary keys matched against backend field names.
pub type Filter = Map<String, Value>;

/// Reserved filter key carrying the free-text query.
pub const QUERY_KEY: &str = "q";

/// Field holding the owning tenant on tenant-scoped records.
pub const TENANT_FIELD: &str = "tenant_id";

/// Identifier of a record.
///
/// Backends may use string or numeric keys; both are carried as their string
/// form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Creates an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Reads an identifier from a JSON string or number.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    /// Reads the `id` field of a record.
    pub fn of(record: &Record) -> Option<Self> {
        record.get("id").and_then(Self::from_value)
    }

    /// Returns `true` if `value` is this identifier as a string or number.
    pub fn matches(&self, value: &Value) -> bool {
        Self::from_value(value).is_some_and(|id| id == *self)
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

/// Page-based pagination. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Page number, starting at 1.
    pub page: u32,
    /// Records per page.
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

impl Pagination {
    /// Creates pagination for `page` with `per_page` records.
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }

    /// Number of records before this page. Page 0 is treated as page 1.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.per_page)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    /// Returns `"asc"` or `"desc"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    /// Parses `asc`/`desc` case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Some(SortOrder::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(SortOrder::Desc)
        } else {
            None
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sort field and direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDirective {
    /// Field to sort by.
    pub field: String,
    /// Direction.
    pub order: SortOrder,
}

impl SortDirective {
    /// Ascending sort on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    /// Descending sort on `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }

    /// Parses `field`, `field:asc` or `field:desc`.
    ///
    /// ```
    /// use atrium_data::types::{SortDirective, SortOrder};
    ///
    /// let sort = SortDirective::parse("created_at:desc").unwrap();
    /// assert_eq!(sort.field, "created_at");
    /// assert_eq!(sort.order, SortOrder::Desc);
    /// assert!(SortDirective::parse("title:sideways").is_none());
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let (field, order) = match s.rsplit_once(':') {
            Some((field, order)) => (field, SortOrder::parse(order)?),
            None => (s, SortOrder::Asc),
        };
        let field = field.trim();
        if field.is_empty() {
            return None;
        }
        Some(Self {
            field: field.to_string(),
            order,
        })
    }
}

/// Returns the trimmed free-text query of a filter, if present and non-blank.
pub fn query_text(filter: &Filter) -> Option<&str> {
    filter
        .get(QUERY_KEY)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|q| !q.is_empty())
}

/// Parameters for `getList`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListParams {
    /// Page to return.
    #[serde(default)]
    pub pagination: Pagination,
    /// Optional sort.
    #[serde(default)]
    pub sort: Option<SortDirective>,
    /// Filter map; the `q` key carries the free-text query.
    #[serde(default)]
    pub filter: Filter,
    /// Resource-specific hints.
    #[serde(default)]
    pub meta: Option<Record>,
}

impl ListParams {
    /// Creates params for the first page with no sort or filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pagination.
    pub fn with_pagination(mut self, page: u32, per_page: u32) -> Self {
        self.pagination = Pagination::new(page, per_page);
        self
    }

    /// Sets the sort.
    pub fn with_sort(mut self, sort: SortDirective) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Adds a filter entry.
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.insert(key.into(), value.into());
        self
    }

    /// Sets the free-text query.
    pub fn with_query(self, q: impl Into<String>) -> Self {
        self.with_filter(QUERY_KEY, q.into())
    }

    /// Adds a meta entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta
            .get_or_insert_with(Record::new)
            .insert(key.into(), value.into());
        self
    }

    /// Returns the trimmed free-text query, if any.
    pub fn query_text(&self) -> Option<&str> {
        query_text(&self.filter)
    }
}

/// Parameters for `getOne`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetOneParams {
    /// Record identifier.
    pub id: RecordId,
    /// Resource-specific hints.
    #[serde(default)]
    pub meta: Option<Record>,
}

impl GetOneParams {
    /// Creates params for `id`.
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            meta: None,
        }
    }
}

/// Parameters for `getMany`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetManyParams {
    /// Record identifiers.
    pub ids: Vec<RecordId>,
    /// Resource-specific hints.
    #[serde(default)]
    pub meta: Option<Record>,
}

impl GetManyParams {
    /// Creates params for `ids`.
    pub fn new(ids: impl IntoIterator<Item = impl Into<RecordId>>) -> Self {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
            meta: None,
        }
    }
}

/// Parameters for `getManyReference`: records whose `target` field equals `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetManyReferenceParams {
    /// Referencing field.
    pub target: String,
    /// Referenced identifier.
    pub id: RecordId,
    /// Page to return.
    #[serde(default)]
    pub pagination: Pagination,
    /// Optional sort.
    #[serde(default)]
    pub sort: Option<SortDirective>,
    /// Additional filter.
    #[serde(default)]
    pub filter: Filter,
    /// Resource-specific hints.
    #[serde(default)]
    pub meta: Option<Record>,
}

impl GetManyReferenceParams {
    /// Creates params for records where `target == id`.
    pub fn new(target: impl Into<String>, id: impl Into<RecordId>) -> Self {
        Self {
            target: target.into(),
            id: id.into(),
            pagination: Pagination::default(),
            sort: None,
            filter: Filter::new(),
            meta: None,
        }
    }

    /// Adds a filter entry.
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.insert(key.into(), value.into());
        self
    }

    /// Returns the trimmed free-text query, if any.
    pub fn query_text(&self) -> Option<&str> {
        query_text(&self.filter)
    }

    /// The same listing expressed as `getList` params with `target = id` in the filter.
    pub fn to_list_params(&self) -> ListParams {
        let mut filter = self.filter.clone();
        filter.insert(
            self.target.clone(),
            Value::String(self.id.as_str().to_string()),
        );
        ListParams {
            pagination: self.pagination,
            sort: self.sort.clone(),
            filter,
            meta: self.meta.clone(),
        }
    }
}

/// Parameters for `create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateParams {
    /// The new record.
    pub data: Record,
    /// Resource-specific hints.
    #[serde(default)]
    pub meta: Option<Record>,
}

impl CreateParams {
    /// Creates params for `data`.
    pub fn new(data: Record) -> Self {
        Self { data, meta: None }
    }
}

/// Parameters for `update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateParams {
    /// Record identifier.
    pub id: RecordId,
    /// Fields to change.
    pub data: Record,
    /// The record as last read, if known.
    #[serde(default)]
    pub previous_data: Option<Record>,
    /// Resource-specific hints.
    #[serde(default)]
    pub meta: Option<Record>,
}

impl UpdateParams {
    /// Creates params updating `id` with `data`.
    pub fn new(id: impl Into<RecordId>, data: Record) -> Self {
        Self {
            id: id.into(),
            data,
            previous_data: None,
            meta: None,
        }
    }
}

/// Parameters for `updateMany`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateManyParams {
    /// Record identifiers.
    pub ids: Vec<RecordId>,
    /// Fields to change on every record.
    pub data: Record,
    /// Resource-specific hints.
    #[serde(default)]
    pub meta: Option<Record>,
}

/// Parameters for `delete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteParams {
    /// Record identifier.
    pub id: RecordId,
    /// The record as last read, if known.
    #[serde(default)]
    pub previous_data: Option<Record>,
    /// Resource-specific hints.
    #[serde(default)]
    pub meta: Option<Record>,
}

impl DeleteParams {
    /// Creates params deleting `id`.
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            previous_data: None,
            meta: None,
        }
    }
}

/// Parameters for `deleteMany`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteManyParams {
    /// Record identifiers.
    pub ids: Vec<RecordId>,
    /// Resource-specific hints.
    #[serde(default)]
    pub meta: Option<Record>,
}

//! Translation of listing params into search requests.
//!
//! Only allow-listed fields reach the search engine. Anything else is dropped
//! and reported back in [`SearchTranslation::dropped`]; the listing still
//! runs.
//!
//! # Filter Syntax
//!
//! | Filter value | `filter_by` clause |
//! |--------------|--------------------|
//! | `"paid"` | ``status:=`paid` `` |
//! | `42`, `true` | `amount:=42`, `archived:=true` |
//! | `["a", "b"]` | ``tags:[`a`,`b`]`` |
//! | `{"gte": 10, "lt": 20}` | `amount:>=10 && amount:<20` |
//! | `null` | *(no clause)* |
//!
//! When a tenant is active on a tenant-scoped resource, ``tenant_id:=`T` `` is
//! always appended, allow-list or not, and a caller-supplied `tenant_id` is
//! discarded.

use std::collections::BTreeSet;
use std::fmt;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::core::{SearchRequest, SearchResponse};
use crate::tenant::TenantId;
use crate::types::{
    Filter, GetManyReferenceParams, ListParams, ListResult, Pagination, QUERY_KEY,
    SortDirective, TENANT_FIELD,
};

use super::config::HybridSearchConfig;

/// Range operators accepted in filter objects, in clause order.
const RANGE_OPERATORS: [(&str, &str); 4] = [("gte", ">="), ("gt", ">"), ("lte", "<="), ("lt", "<")];

/// A translated search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTranslation {
    /// The request to send.
    pub request: SearchRequest,
    /// Filter and sort fields that were not allow-listed, sorted.
    pub dropped: BTreeSet<String>,
}

/// Why a listing cannot be served by the search engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotApplicable {
    /// No free-text query.
    NoQuery,
    /// The reference target is not a filterable field.
    TargetNotFilterable {
        /// The target field.
        target: String,
    },
    /// An allow-listed filter value has no equivalent in the filter syntax.
    UnsupportedFilter {
        /// The filter field.
        field: String,
    },
    /// No search backend is configured.
    NoSearchBackend,
}

impl fmt::Display for NotApplicable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotApplicable::NoQuery => f.write_str("no free-text query"),
            NotApplicable::TargetNotFilterable { target } => {
                write!(f, "reference target '{}' is not filterable", target)
            }
            NotApplicable::UnsupportedFilter { field } => {
                write!(f, "filter on '{}' cannot be expressed for search", field)
            }
            NotApplicable::NoSearchBackend => f.write_str("search backend not configured"),
        }
    }
}

/// Translates params for one hybrid resource.
#[derive(Debug, Clone, Copy)]
pub struct QueryTranslator<'a> {
    resource: &'a str,
    config: &'a HybridSearchConfig,
    tenant: Option<&'a TenantId>,
}

impl<'a> QueryTranslator<'a> {
    /// Creates a translator.
    ///
    /// `tenant` is the tenant to enforce, already resolved against the
    /// resource's classification and the scope snapshot.
    pub fn new(
        resource: &'a str,
        config: &'a HybridSearchConfig,
        tenant: Option<&'a TenantId>,
    ) -> Self {
        Self {
            resource,
            config,
            tenant,
        }
    }

    /// Translates a `getList` call.
    pub fn translate_list(&self, params: &ListParams) -> Result<SearchTranslation, NotApplicable> {
        let q = params.query_text().ok_or(NotApplicable::NoQuery)?;
        self.translate(
            q,
            &params.filter,
            params.sort.as_ref(),
            params.pagination,
            None,
        )
    }

    /// Translates a `getManyReference` call.
    ///
    /// The target becomes an exact-match clause, so it has to be filterable.
    pub fn translate_reference(
        &self,
        params: &GetManyReferenceParams,
    ) -> Result<SearchTranslation, NotApplicable> {
        let q = params.query_text().ok_or(NotApplicable::NoQuery)?;
        if !self.config.is_filterable(&params.target) {
            return Err(NotApplicable::TargetNotFilterable {
                target: params.target.clone(),
            });
        }
        let target_clause = format!("{}:={}", params.target, exact_literal(params.id.as_str()));

        let mut filter = params.filter.clone();
        filter.remove(&params.target);
        self.translate(
            q,
            &filter,
            params.sort.as_ref(),
            params.pagination,
            Some(target_clause),
        )
    }

    fn translate(
        &self,
        q: &str,
        filter: &Filter,
        sort: Option<&SortDirective>,
        pagination: Pagination,
        extra_clause: Option<String>,
    ) -> Result<SearchTranslation, NotApplicable> {
        let mut dropped = BTreeSet::new();
        let mut clauses = Vec::new();

        for (field, value) in filter {
            if field == QUERY_KEY {
                continue;
            }
            if field == TENANT_FIELD && self.tenant.is_some() {
                debug!(resource = %self.resource, "Discarding caller-supplied tenant_id filter");
                continue;
            }
            if !self.config.is_filterable(field) {
                warn!(resource = %self.resource, field = %field, "Dropping filter on non-filterable field");
                dropped.insert(field.clone());
                continue;
            }
            match filter_clause(field, value) {
                Clause::Expr(clause) => clauses.push(clause),
                Clause::Skip => {}
                Clause::Drop => {
                    warn!(resource = %self.resource, field = %field, "Dropping filter with unsupported operators");
                    dropped.insert(field.clone());
                }
                Clause::Unsupported => {
                    return Err(NotApplicable::UnsupportedFilter {
                        field: field.clone(),
                    });
                }
            }
        }

        clauses.extend(extra_clause);
        if let Some(tenant) = self.tenant {
            clauses.push(format!("{}:={}", TENANT_FIELD, quoted(tenant.as_str())));
        }

        let sort_by = match sort {
            Some(sort) if self.config.is_sortable(&sort.field) => {
                Some(format!("{}:{}", sort.field, sort.order))
            }
            Some(sort) => {
                warn!(resource = %self.resource, field = %sort.field, "Dropping sort on non-sortable field");
                dropped.insert(sort.field.clone());
                None
            }
            None => None,
        };

        let request = SearchRequest {
            q: q.to_string(),
            query_by: self.config.query_by(),
            filter_by: if clauses.is_empty() {
                None
            } else {
                Some(clauses.join(" && "))
            },
            sort_by,
            facet_by: self.config.facet_by(),
            page: pagination.page.max(1),
            per_page: pagination.per_page,
            num_typos: self.config.num_typos,
            prefix: Some(self.config.prefix),
        };

        Ok(SearchTranslation { request, dropped })
    }
}

/// Converts a search response into the uniform listing shape.
pub fn into_list_result(response: SearchResponse) -> ListResult {
    ListResult {
        data: response.hits.into_iter().map(|hit| hit.document).collect(),
        total: response.found,
        facets: response.facet_counts,
    }
}

/// Translates one filter entry into a `filter_by` clause, if expressible.
pub(crate) fn filter_expression(field: &str, value: &Value) -> Option<String> {
    match filter_clause(field, value) {
        Clause::Expr(clause) => Some(clause),
        _ => None,
    }
}

/// A literal for an exact match on an identifier.
pub(crate) fn exact_literal(id: &str) -> String {
    if id.parse::<i64>().is_ok() {
        id.to_string()
    } else {
        quoted(id)
    }
}

enum Clause {
    Expr(String),
    Skip,
    Drop,
    Unsupported,
}

fn filter_clause(field: &str, value: &Value) -> Clause {
    match value {
        Value::Null => Clause::Skip,
        Value::Array(items) => {
            if items.is_empty() {
                return Clause::Unsupported;
            }
            let mut literals = Vec::with_capacity(items.len());
            for item in items {
                match scalar_literal(item) {
                    Some(literal) => literals.push(literal),
                    None => return Clause::Unsupported,
                }
            }
            Clause::Expr(format!("{}:[{}]", field, literals.join(",")))
        }
        Value::Object(map) => range_clause(field, map),
        scalar => match scalar_literal(scalar) {
            Some(literal) => Clause::Expr(format!("{}:={}", field, literal)),
            None => Clause::Unsupported,
        },
    }
}

fn range_clause(field: &str, map: &Map<String, Value>) -> Clause {
    if map.is_empty()
        || map
            .keys()
            .any(|key| !RANGE_OPERATORS.iter().any(|(op, _)| op == key))
    {
        return Clause::Drop;
    }

    let mut parts = Vec::new();
    for (op, symbol) in RANGE_OPERATORS {
        match map.get(op) {
            Some(Value::Number(n)) => parts.push(format!("{}:{}{}", field, symbol, n)),
            Some(_) => return Clause::Drop,
            None => {}
        }
    }
    Clause::Expr(parts.join(" && "))
}

fn scalar_literal(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.contains('`') => Some(quoted(s)),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn quoted(s: &str) -> String {
    format!("`{}`", s)
}

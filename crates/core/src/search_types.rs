//! Request and response types for indexing and search
//!
//! This module defines the value objects exchanged with the engine:
//! - SearchRequest: query, fields, filter, sort, facets, pagination
//! - Filter / FilterCondition / Op: typed filter expression
//! - SortSpec / SortOrder: ordering
//! - SearchResponse / Hit / FacetResult: results
//! - IndexMode / BulkResult / BulkError: indexing
//!
//! None of these are persisted; they are built per call.

use crate::document::Document;
use crate::error::Error;
use crate::value::FieldValue;
use std::time::Duration;

/// Reserved sort field referring to the relevance score
pub const SCORE_FIELD: &str = "_score";

// ============================================================================
// Filter
// ============================================================================

/// Comparison operator of a filter condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `IN`: membership in a list
    In,
}

impl Op {
    /// Parse the textual operator (`==`, `!=`, `>`, `>=`, `<`, `<=`, `IN`)
    pub fn parse(s: &str) -> Option<Op> {
        match s {
            "==" => Some(Op::Eq),
            "!=" => Some(Op::Ne),
            ">" => Some(Op::Gt),
            ">=" => Some(Op::Gte),
            "<" => Some(Op::Lt),
            "<=" => Some(Op::Lte),
            _ if s.eq_ignore_ascii_case("in") => Some(Op::In),
            _ => None,
        }
    }

    /// Whether the operator needs an ordering (not just equality)
    pub fn is_range(self) -> bool {
        matches!(self, Op::Gt | Op::Gte | Op::Lt | Op::Lte)
    }
}

/// Right-hand side of a filter condition
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Single value for comparison operators
    Scalar(FieldValue),
    /// Candidate list for `IN`
    List(Vec<FieldValue>),
}

impl From<FieldValue> for FilterValue {
    fn from(v: FieldValue) -> Self {
        FilterValue::Scalar(v)
    }
}

impl From<Vec<FieldValue>> for FilterValue {
    fn from(values: Vec<FieldValue>) -> Self {
        FilterValue::List(values)
    }
}

impl From<i64> for FilterValue {
    fn from(i: i64) -> Self {
        FilterValue::Scalar(FieldValue::Int(i))
    }
}

impl From<f64> for FilterValue {
    fn from(f: f64) -> Self {
        FilterValue::Scalar(FieldValue::Float(f))
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Scalar(FieldValue::Bool(b))
    }
}

/// A single condition: `field op value`
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    /// Field name (must be declared `filter`)
    pub field: String,
    /// Operator
    pub op: Op,
    /// Compared value
    pub value: FilterValue,
}

impl FilterCondition {
    /// Create a condition
    pub fn new(field: impl Into<String>, op: Op, value: impl Into<FilterValue>) -> Self {
        FilterCondition {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// `field == value`
    pub fn eq(field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Op::Eq, FilterValue::Scalar(value.into()))
    }

    /// `field IN values`
    pub fn is_in(field: impl Into<String>, values: Vec<FieldValue>) -> Self {
        Self::new(field, Op::In, FilterValue::List(values))
    }
}

/// Filter expression: `(AND...) AND (OR...)`
///
/// An empty list imposes no constraint; both empty means no filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    /// Conditions that must all hold
    pub and: Vec<FilterCondition>,
    /// Conditions of which at least one must hold (when non-empty)
    pub or: Vec<FilterCondition>,
}

impl Filter {
    /// Create an empty filter (matches all)
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add an AND condition
    pub fn and(mut self, condition: FilterCondition) -> Self {
        self.and.push(condition);
        self
    }

    /// Builder: add an OR condition
    pub fn or(mut self, condition: FilterCondition) -> Self {
        self.or.push(condition);
        self
    }

    /// Check if filter is empty (matches all)
    pub fn is_empty(&self) -> bool {
        self.and.is_empty() && self.or.is_empty()
    }

    /// All conditions, AND list first
    pub fn conditions(&self) -> impl Iterator<Item = &FilterCondition> {
        self.and.iter().chain(self.or.iter())
    }
}

// ============================================================================
// Sorting
// ============================================================================

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Smallest first
    #[default]
    Asc,
    /// Largest first
    Desc,
}

/// One sort key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    /// Sortable field name, or [`SCORE_FIELD`]
    pub field: String,
    /// Direction
    pub order: SortOrder,
}

impl SortSpec {
    /// Ascending on `field`
    pub fn asc(field: impl Into<String>) -> Self {
        SortSpec {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    /// Descending on `field`
    pub fn desc(field: impl Into<String>) -> Self {
        SortSpec {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }
}

// ============================================================================
// SearchRequest
// ============================================================================

/// Search request against one collection
///
/// # Examples
///
/// ```
/// use typelite_core::{SearchRequest, SortSpec};
///
/// let req = SearchRequest::new("products", "iphone 15")
///     .with_prefix_search(true)
///     .with_sort(SortSpec::desc("price"))
///     .with_page(2, 20);
///
/// assert_eq!(req.query, "iphone 15");
/// assert_eq!(req.page, 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    /// Collection to search
    pub collection: String,

    /// Raw user query; empty means browse every document
    pub query: String,

    /// Fields to search; empty means every searchable field
    pub query_by: Vec<String>,

    /// Typed filter
    pub filter: Filter,

    /// Ordering; empty means relevance when the query is non-empty
    pub sort_by: Vec<SortSpec>,

    /// Fields to compute facets for
    pub facet_by: Vec<String>,

    /// Results per page; 0 means the configured default
    pub per_page: usize,

    /// 1-based page number; 0 means 1
    pub page: usize,

    /// Expand the last query token to every dictionary term it prefixes
    pub prefix_search: bool,

    /// Cap on candidates kept (top by score) before filtering; 0 means no cap
    pub max_hits: usize,
}

impl SearchRequest {
    /// Create a request with defaults
    pub fn new(collection: impl Into<String>, query: impl Into<String>) -> Self {
        SearchRequest {
            collection: collection.into(),
            query: query.into(),
            ..Default::default()
        }
    }

    /// Builder: restrict searched fields
    pub fn with_query_by(mut self, fields: Vec<String>) -> Self {
        self.query_by = fields;
        self
    }

    /// Builder: set filter
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Builder: append a sort key
    pub fn with_sort(mut self, spec: SortSpec) -> Self {
        self.sort_by.push(spec);
        self
    }

    /// Builder: append a facet field
    pub fn with_facet(mut self, field: impl Into<String>) -> Self {
        self.facet_by.push(field.into());
        self
    }

    /// Builder: set page and page size
    pub fn with_page(mut self, page: usize, per_page: usize) -> Self {
        self.page = page;
        self.per_page = per_page;
        self
    }

    /// Builder: toggle prefix search
    pub fn with_prefix_search(mut self, enabled: bool) -> Self {
        self.prefix_search = enabled;
        self
    }

    /// Builder: cap candidates
    pub fn with_max_hits(mut self, max_hits: usize) -> Self {
        self.max_hits = max_hits;
        self
    }
}

// ============================================================================
// SearchResponse
// ============================================================================

/// A single result
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Primary key
    pub id: String,
    /// Aggregate relevance score
    pub score: f64,
    /// Stored document
    pub document: Document,
}

/// Count of one distinct value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetCount {
    /// Rendered value
    pub value: String,
    /// Number of matching documents
    pub count: u64,
}

/// Distinct-value breakdown for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetResult {
    /// Field name
    pub field: String,
    /// Counts, descending by count then ascending by value
    pub counts: Vec<FacetCount>,
}

/// Search results
#[derive(Debug, Clone)]
pub struct SearchResponse {
    /// Hits on the requested page
    pub hits: Vec<Hit>,
    /// Filtered matches before pagination
    pub total: u64,
    /// Effective page number
    pub page: usize,
    /// Effective page size
    pub per_page: usize,
    /// Facets over all filtered matches
    pub facets: Vec<FacetResult>,
    /// Wall time spent
    pub took: Duration,
    /// Echoed query string
    pub query: String,
}

impl SearchResponse {
    /// Check if response has no hits
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Get number of hits on this page
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Primary keys of the hits, in order
    pub fn ids(&self) -> Vec<&str> {
        self.hits.iter().map(|h| h.id.as_str()).collect()
    }

    /// Facet for a field, if it was requested
    pub fn facet(&self, field: &str) -> Option<&FacetResult> {
        self.facets.iter().find(|f| f.field == field)
    }
}

// ============================================================================
// Indexing
// ============================================================================

/// Behavior when the primary key already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexMode {
    /// Replace the existing document
    #[default]
    Upsert,
    /// Fail with `DuplicateKey`
    InsertOnly,
}

/// One failed item of a bulk call
#[derive(Debug)]
pub struct BulkError {
    /// Position in the input
    pub index: usize,
    /// Primary key, if it could be determined
    pub id: String,
    /// Why it failed
    pub error: Error,
}

/// Outcome of a bulk call
#[derive(Debug, Default)]
pub struct BulkResult {
    /// Items processed successfully
    pub indexed: usize,
    /// Failed items, in input order
    pub errors: Vec<BulkError>,
}

impl BulkResult {
    /// True when no item failed
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

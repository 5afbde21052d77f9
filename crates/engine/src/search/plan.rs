//! Request validation and per-document evaluation
//!
//! A [`QueryPlan`] is built from a `SearchRequest` and its collection
//! before any store call. Building it is where every reference to a field
//! is checked, so a request that fails validation never touches the store.
//! Once built, the plan evaluates filters, sort order and facets against
//! resolved documents without further checks.

use std::cmp::Ordering;
use std::collections::HashMap;
use typelite_core::{
    Collection, Document, Error, FacetCount, FacetResult, FieldType, FieldValue, FilterCondition,
    FilterValue, Op, Result, SearchRequest, SortOrder, SCORE_FIELD,
};

/// A candidate resolved to its stored document
#[derive(Debug, Clone)]
pub struct Match {
    /// Primary key
    pub id: String,
    /// Aggregate score
    pub score: f64,
    /// Stored document
    pub document: Document,
}

/// Filter condition with its values coerced to the field type
#[derive(Debug, Clone)]
struct Condition {
    field: String,
    op: Op,
    values: Vec<FieldValue>,
}

impl Condition {
    fn matches(&self, doc: &Document) -> bool {
        let Some(actual) = doc.get(&self.field) else {
            return false;
        };
        let cmp = |expected: &FieldValue| actual.compare(expected);
        match self.op {
            Op::Eq => self.values.iter().any(|v| cmp(v) == Some(Ordering::Equal)),
            Op::Ne => self.values.iter().all(|v| cmp(v) != Some(Ordering::Equal)),
            Op::Gt => self.values.iter().all(|v| cmp(v) == Some(Ordering::Greater)),
            Op::Gte => self
                .values
                .iter()
                .all(|v| matches!(cmp(v), Some(Ordering::Greater | Ordering::Equal))),
            Op::Lt => self.values.iter().all(|v| cmp(v) == Some(Ordering::Less)),
            Op::Lte => self
                .values
                .iter()
                .all(|v| matches!(cmp(v), Some(Ordering::Less | Ordering::Equal))),
            Op::In => self.values.iter().any(|v| cmp(v) == Some(Ordering::Equal)),
        }
    }
}

#[derive(Debug, Clone)]
enum SortKey {
    Score(SortOrder),
    Field(String, SortOrder),
}

/// Validated form of a search request
#[derive(Debug, Clone)]
pub struct QueryPlan {
    /// Full-text fields the query runs against
    pub query_fields: Vec<String>,
    and: Vec<Condition>,
    or: Vec<Condition>,
    sort: Vec<SortKey>,
    facets: Vec<String>,
}

impl QueryPlan {
    /// Validate `request` against `schema`
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` naming the first offending field.
    pub fn build(schema: &Collection, request: &SearchRequest) -> Result<Self> {
        let query_fields = resolve_query_fields(schema, &request.query_by)?;

        let and = request
            .filter
            .and
            .iter()
            .map(|c| resolve_condition(schema, c))
            .collect::<Result<Vec<_>>>()?;
        let or = request
            .filter
            .or
            .iter()
            .map(|c| resolve_condition(schema, c))
            .collect::<Result<Vec<_>>>()?;

        let mut sort = Vec::with_capacity(request.sort_by.len());
        for spec in &request.sort_by {
            if spec.field == SCORE_FIELD {
                sort.push(SortKey::Score(spec.order));
                continue;
            }
            match schema.get_field(&spec.field) {
                Some(f) if f.sortable && f.field_type != FieldType::Geo => {
                    sort.push(SortKey::Field(spec.field.clone(), spec.order))
                }
                Some(_) => {
                    return Err(Error::InvalidRequest(format!(
                        "field {:?} is not sortable",
                        spec.field
                    )))
                }
                None => return Err(unknown_field("sort", &spec.field, schema)),
            }
        }

        let mut facets = Vec::with_capacity(request.facet_by.len());
        for name in &request.facet_by {
            match schema.get_field(name) {
                Some(f) if f.filter && f.field_type != FieldType::Geo => {
                    facets.push(name.clone())
                }
                Some(_) => {
                    return Err(Error::InvalidRequest(format!(
                        "field {:?} is not filterable and cannot be faceted",
                        name
                    )))
                }
                None => return Err(unknown_field("facet", name, schema)),
            }
        }

        Ok(QueryPlan {
            query_fields,
            and,
            or,
            sort,
            facets,
        })
    }

    /// Whether a document passes `(AND...) AND (OR...)`
    pub fn matches(&self, doc: &Document) -> bool {
        self.and.iter().all(|c| c.matches(doc))
            && (self.or.is_empty() || self.or.iter().any(|c| c.matches(doc)))
    }

    /// Check whether the request carries any filter condition
    pub fn has_filter(&self) -> bool {
        !self.and.is_empty() || !self.or.is_empty()
    }

    /// Order matches in place
    ///
    /// With no sort keys, relevance orders scored queries and primary key
    /// orders browse queries. Ties always fall back to primary key.
    pub fn sort(&self, matches: &mut [Match], relevance: bool) {
        if self.sort.is_empty() {
            if relevance {
                matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
            } else {
                matches.sort_by(|a, b| a.id.cmp(&b.id));
            }
            return;
        }

        matches.sort_by(|a, b| {
            for key in &self.sort {
                let ord = match key {
                    SortKey::Score(order) => apply(*order, a.score.total_cmp(&b.score)),
                    SortKey::Field(field, order) => {
                        match (a.document.get(field), b.document.get(field)) {
                            (Some(x), Some(y)) => {
                                apply(*order, x.compare(y).unwrap_or(Ordering::Equal))
                            }
                            (Some(_), None) => Ordering::Less,
                            (None, Some(_)) => Ordering::Greater,
                            (None, None) => Ordering::Equal,
                        }
                    }
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            a.id.cmp(&b.id)
        });
    }

    /// Distinct-value counts over every match, per facet field
    pub fn facets(&self, matches: &[Match]) -> Vec<FacetResult> {
        self.facets
            .iter()
            .map(|field| {
                let mut counts: HashMap<String, u64> = HashMap::new();
                for m in matches {
                    if let Some(value) = m.document.get(field) {
                        *counts.entry(value.to_string()).or_insert(0) += 1;
                    }
                }
                let mut counts: Vec<FacetCount> = counts
                    .into_iter()
                    .map(|(value, count)| FacetCount { value, count })
                    .collect();
                counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
                FacetResult {
                    field: field.clone(),
                    counts,
                }
            })
            .collect()
    }
}

fn apply(order: SortOrder, ord: Ordering) -> Ordering {
    match order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
    }
}

fn unknown_field(usage: &str, name: &str, schema: &Collection) -> Error {
    Error::InvalidRequest(format!(
        "unknown {} field {:?} in collection {}",
        usage, name, schema.name
    ))
}

fn resolve_query_fields(schema: &Collection, query_by: &[String]) -> Result<Vec<String>> {
    if query_by.is_empty() {
        return Ok(schema.search_fields().map(|f| f.name.clone()).collect());
    }
    let mut fields: Vec<String> = Vec::with_capacity(query_by.len());
    for name in query_by {
        let field = schema
            .get_field(name)
            .ok_or_else(|| unknown_field("query", name, schema))?;
        if !field.is_full_text() {
            return Err(Error::InvalidRequest(format!(
                "field {:?} is not a searchable text field",
                name
            )));
        }
        if !fields.contains(name) {
            fields.push(name.clone());
        }
    }
    Ok(fields)
}

fn resolve_condition(schema: &Collection, condition: &FilterCondition) -> Result<Condition> {
    let field = schema
        .get_field(&condition.field)
        .ok_or_else(|| unknown_field("filter", &condition.field, schema))?;
    if !field.filter {
        return Err(Error::InvalidRequest(format!(
            "field {:?} is not filterable",
            field.name
        )));
    }
    if field.field_type == FieldType::Geo {
        return Err(Error::InvalidRequest(format!(
            "geo field {:?} cannot be filtered",
            field.name
        )));
    }
    if condition.op.is_range() && !field.field_type.is_ordered() {
        return Err(Error::InvalidRequest(format!(
            "operator {:?} is not supported on {:?} field {:?}",
            condition.op, field.field_type, field.name
        )));
    }

    let raw: Vec<&FieldValue> = match (&condition.op, &condition.value) {
        (Op::In, FilterValue::List(values)) => values.iter().collect(),
        (Op::In, FilterValue::Scalar(_)) => {
            return Err(Error::InvalidRequest(format!(
                "IN on {:?} needs a list of values",
                field.name
            )))
        }
        (_, FilterValue::Scalar(value)) => vec![value],
        (op, FilterValue::List(_)) => {
            return Err(Error::InvalidRequest(format!(
                "operator {:?} on {:?} needs a single value",
                op, field.name
            )))
        }
    };

    let values = raw
        .into_iter()
        .map(|value| {
            coerce_filter_value(value, field.field_type).ok_or_else(|| {
                Error::InvalidRequest(format!(
                    "filter value {} does not match {:?} field {:?}",
                    value, field.field_type, field.name
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Condition {
        field: field.name.clone(),
        op: condition.op,
        values,
    })
}

/// Numeric fields compare across Int and Float; everything else must coerce
fn coerce_filter_value(value: &FieldValue, target: FieldType) -> Option<FieldValue> {
    match (value, target) {
        (FieldValue::Int(_) | FieldValue::Float(_), FieldType::Int | FieldType::Float) => {
            Some(value.clone())
        }
        _ => value.coerce(target),
    }
}

//! Query execution
//!
//! Steps, in order:
//! 1. Validate the request into a [`QueryPlan`] (no store access)
//! 2. Tokenize the query; with prefix search the last token expands to
//!    every dictionary term it prefixes
//! 3. Gather candidates from posting lists (or the live-id set for a
//!    blank query) and apply the `max_hits` cap. A non-blank query that
//!    yields no tokens has no candidates
//! 4. Resolve candidates to documents, dropping stale postings
//! 5. Filter, order, count, facet, paginate
//!
//! # Scoring
//!
//! For one query token and one field, the token's variants are unioned
//! keeping the highest posting score per document. Those per-field scores
//! are then summed across fields and tokens, so a document matching more
//! tokens ranks higher.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use typelite_core::{
    key, Collection, Context, Error, Hit, IndexStore, Result, SearchRequest, SearchResponse, Store,
};

use super::plan::{Match, QueryPlan};
use super::tokenizer::tokenize_unique;
use crate::config::EngineConfig;
use crate::registry::SchemaRegistry;

/// Runs search requests against indexed collections
pub struct QueryExecutor {
    config: EngineConfig,
    store: Arc<dyn Store>,
    registry: Arc<SchemaRegistry>,
}

impl QueryExecutor {
    /// Create an executor; `config` should already be normalized
    pub fn new(store: Arc<dyn Store>, registry: Arc<SchemaRegistry>, config: EngineConfig) -> Self {
        QueryExecutor {
            config,
            store,
            registry,
        }
    }

    /// Execute a search
    ///
    /// # Errors
    ///
    /// - `CollectionNotFound` if the collection is not registered
    /// - `InvalidRequest` for unknown or ineligible fields (no store access)
    /// - `StorageFailure` if a store call fails
    /// - `Cancelled` / `DeadlineExceeded` if `ctx` trips
    pub fn search(&self, ctx: &Context, request: &SearchRequest) -> Result<SearchResponse> {
        let started = Instant::now();
        let schema = self
            .registry
            .collection(&request.collection)
            .ok_or_else(|| Error::CollectionNotFound(request.collection.clone()))?;
        let plan = QueryPlan::build(&schema, request)?;

        let tokens = tokenize_unique(&request.query);
        if !tokens.is_empty() && plan.query_fields.is_empty() {
            return Err(Error::InvalidRequest(format!(
                "collection {} has no searchable fields",
                schema.name
            )));
        }

        let candidates = if tokens.is_empty() {
            // Punctuation-only queries match nothing; only a blank query browses
            if request.query.trim().is_empty() {
                self.browse(ctx, &schema)?
            } else {
                Vec::new()
            }
        } else {
            self.gather(ctx, &schema, &plan, &tokens, request.prefix_search)?
        };
        let candidates = cap_candidates(candidates, request.max_hits);
        let gathered = candidates.len();

        let mut matches = Vec::with_capacity(candidates.len());
        for (id, score) in candidates {
            let doc_key = key::document_key(&self.config.namespace, &schema.name, &id);
            match self.store.read_document(ctx, &doc_key)? {
                Some(document) => {
                    if plan.matches(&document) {
                        matches.push(Match {
                            id,
                            score,
                            document,
                        });
                    }
                }
                None => debug!(
                    target: "typelite::search",
                    collection = %schema.name,
                    id = %id,
                    "Skipping stale posting"
                ),
            }
        }

        plan.sort(&mut matches, !tokens.is_empty());
        let total = matches.len() as u64;
        let facets = plan.facets(&matches);

        let page = request.page.max(1);
        let per_page = self.config.page_size(request.per_page);
        let start = (page - 1).saturating_mul(per_page);
        let hits: Vec<Hit> = matches
            .into_iter()
            .skip(start)
            .take(per_page)
            .map(|m| Hit {
                id: m.id,
                score: m.score,
                document: m.document,
            })
            .collect();

        let took = started.elapsed();
        debug!(
            target: "typelite::search",
            collection = %schema.name,
            query = %request.query,
            tokens = tokens.len(),
            candidates = gathered,
            filtered = plan.has_filter(),
            total,
            returned = hits.len(),
            took_us = took.as_micros() as u64,
            "Search complete"
        );

        Ok(SearchResponse {
            hits,
            total,
            page,
            per_page,
            facets,
            took,
            query: request.query.clone(),
        })
    }

    /// Every live document, score 0
    fn browse(&self, ctx: &Context, schema: &Collection) -> Result<Vec<(String, f64)>> {
        let ids_key = key::document_ids_key(&self.config.namespace, &schema.name);
        Ok(self
            .store
            .document_ids(ctx, &ids_key)?
            .into_iter()
            .map(|id| (id, 0.0))
            .collect())
    }

    fn gather(
        &self,
        ctx: &Context,
        schema: &Collection,
        plan: &QueryPlan,
        tokens: &[String],
        prefix_search: bool,
    ) -> Result<Vec<(String, f64)>> {
        let ns = self.config.namespace.as_str();
        let collection = schema.name.as_str();
        let mut totals: HashMap<String, f64> = HashMap::new();

        for (i, token) in tokens.iter().enumerate() {
            let variants = if prefix_search && i + 1 == tokens.len() {
                self.store.scan_dictionary_prefix(
                    ctx,
                    &key::dictionary_key(ns, collection),
                    token,
                    self.config.expansion_limit(),
                )?
            } else {
                vec![token.clone()]
            };

            for field in &plan.query_fields {
                let mut best: HashMap<String, f64> = HashMap::new();
                for variant in &variants {
                    let posting = key::posting_key(ns, collection, field, variant);
                    for (id, score) in self.store.fetch_posting(ctx, &posting)? {
                        let entry = best.entry(id).or_insert(score);
                        if score > *entry {
                            *entry = score;
                        }
                    }
                }
                for (id, score) in best {
                    *totals.entry(id).or_insert(0.0) += score;
                }
            }
        }

        Ok(totals.into_iter().collect())
    }
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("config", &self.config)
            .finish()
    }
}

/// Keep the top `max_hits` by score (ties by id); 0 keeps everything
fn cap_candidates(mut candidates: Vec<(String, f64)>, max_hits: usize) -> Vec<(String, f64)> {
    if max_hits == 0 || candidates.len() <= max_hits {
        return candidates;
    }
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    candidates.truncate(max_hits);
    candidates
}

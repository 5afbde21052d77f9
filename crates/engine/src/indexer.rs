//! Document indexing
//!
//! Writes document records and maintains the inverted index around them:
//! per-(field, term) posting lists, the per-collection term dictionary, the
//! per-document set of posting keys, and the per-collection set of live ids.
//!
//! # Write order
//!
//! 1. Validate against the schema (no side effects on failure)
//! 2. Write the record (`InsertOnly`: conditional, `Upsert`: after purging
//!    the previous version's postings)
//! 3. Update dictionary, postings and bookkeeping sets
//!
//! The store has no multi-key transactions. A failure in step 3 leaves a
//! readable record with incomplete postings and surfaces as
//! `IndexingFailed`; re-indexing the document repairs it.

use std::sync::Arc;
use tracing::{debug, warn};
use typelite_core::{
    key, BulkError, BulkResult, Collection, Context, Document, Error, FieldValue, IndexMode,
    IndexStore, Result, Store,
};

use crate::registry::SchemaRegistry;
use crate::search::tokenizer::term_frequencies;

/// One item of a multi-collection batch
#[derive(Debug, Clone)]
pub struct IndexItem {
    /// Target collection
    pub collection: String,
    /// Document to index
    pub document: Document,
}

impl IndexItem {
    /// Create a batch item
    pub fn new(collection: impl Into<String>, document: Document) -> Self {
        IndexItem {
            collection: collection.into(),
            document,
        }
    }
}

/// Writes documents and their index entries
pub struct Indexer {
    namespace: String,
    store: Arc<dyn Store>,
    registry: Arc<SchemaRegistry>,
}

impl Indexer {
    /// Create an indexer sharing `registry`'s namespace
    pub fn new(store: Arc<dyn Store>, registry: Arc<SchemaRegistry>) -> Self {
        Indexer {
            namespace: registry.namespace().to_string(),
            store,
            registry,
        }
    }

    fn schema(&self, collection: &str) -> Result<Arc<Collection>> {
        self.registry
            .collection(collection)
            .ok_or_else(|| Error::CollectionNotFound(collection.to_string()))
    }

    // ========================================================================
    // Single-document operations
    // ========================================================================

    /// Index one document, returning its primary key
    ///
    /// # Errors
    ///
    /// - `CollectionNotFound`, `PrimaryKeyMissing`, `InvalidDocument`
    ///   before anything is written
    /// - `DuplicateKey` for `InsertOnly` when the key exists (nothing changed)
    /// - `StorageFailure` if the record write fails
    /// - `IndexingFailed` if the record was written but its postings were not
    /// - `Cancelled` / `DeadlineExceeded` if `ctx` trips
    pub fn index_document(
        &self,
        ctx: &Context,
        collection: &str,
        document: &Document,
        mode: IndexMode,
    ) -> Result<String> {
        let schema = self.schema(collection)?;
        if schema.primary_key_field().is_none() {
            return Err(Error::PrimaryKeyMissing(collection.to_string()));
        }
        let doc = document.conform(&schema)?;
        let id = doc.primary_key(&schema)?;
        let record = doc.to_record()?;

        let ns = self.namespace.as_str();
        let doc_key = key::document_key(ns, collection, &id);

        match mode {
            IndexMode::InsertOnly => {
                if !self.store.insert_document(ctx, &doc_key, &record)? {
                    return Err(Error::DuplicateKey {
                        collection: collection.to_string(),
                        id,
                    });
                }
                // Leftovers of an interrupted delete must not resurface
                self.purge_postings(ctx, collection, &id)
                    .map_err(|e| indexing_failed(collection, &id, e))?;
            }
            IndexMode::Upsert => {
                self.purge_postings(ctx, collection, &id)?;
                self.store.write_document(ctx, &doc_key, &record)?;
            }
        }

        self.write_postings(ctx, &schema, &doc, &id)
            .map_err(|e| indexing_failed(collection, &id, e))?;

        debug!(target: "typelite::indexer", collection, id = %id, ?mode, "Indexed document");
        Ok(id)
    }

    /// Delete one document, returning whether a record existed
    ///
    /// Dictionary terms are left in place; prefix expansion tolerates terms
    /// whose postings are gone.
    pub fn delete_document(&self, ctx: &Context, collection: &str, id: &str) -> Result<bool> {
        self.schema(collection)?;
        let ns = self.namespace.as_str();

        self.purge_postings(ctx, collection, id)?;
        self.store
            .remove_document_id(ctx, &key::document_ids_key(ns, collection), id)?;
        let existed = self
            .store
            .delete_document_record(ctx, &key::document_key(ns, collection, id))?;

        debug!(target: "typelite::indexer", collection, id, existed, "Deleted document");
        Ok(existed)
    }

    /// Read a document by primary key
    pub fn get_document(&self, ctx: &Context, collection: &str, id: &str) -> Result<Option<Document>> {
        self.schema(collection)?;
        self.store
            .read_document(ctx, &key::document_key(&self.namespace, collection, id))
    }

    // ========================================================================
    // Bulk operations
    // ========================================================================

    /// Index many documents into one collection
    ///
    /// Items are independent: a failed item is recorded and the rest
    /// continue. Only cancellation aborts the call.
    pub fn index_documents(
        &self,
        ctx: &Context,
        collection: &str,
        documents: &[Document],
        mode: IndexMode,
    ) -> Result<BulkResult> {
        let mut result = BulkResult::default();
        for (index, document) in documents.iter().enumerate() {
            match self.index_document(ctx, collection, document, mode) {
                Ok(_) => result.indexed += 1,
                Err(e) if e.is_cancellation() => return Err(e),
                Err(error) => result.errors.push(BulkError {
                    index,
                    id: self.describe_id(collection, document, &error),
                    error,
                }),
            }
        }
        log_bulk("index_documents", &result);
        Ok(result)
    }

    /// Index items that each name their own collection
    pub fn index_batch(&self, ctx: &Context, items: &[IndexItem], mode: IndexMode) -> Result<BulkResult> {
        let mut result = BulkResult::default();
        for (index, item) in items.iter().enumerate() {
            match self.index_document(ctx, &item.collection, &item.document, mode) {
                Ok(_) => result.indexed += 1,
                Err(e) if e.is_cancellation() => return Err(e),
                Err(error) => result.errors.push(BulkError {
                    index,
                    id: self.describe_id(&item.collection, &item.document, &error),
                    error,
                }),
            }
        }
        log_bulk("index_batch", &result);
        Ok(result)
    }

    /// Delete many documents from one collection
    ///
    /// `indexed` counts ids processed without error, whether or not a
    /// record existed.
    pub fn delete_documents<I: AsRef<str>>(
        &self,
        ctx: &Context,
        collection: &str,
        ids: &[I],
    ) -> Result<BulkResult> {
        let mut result = BulkResult::default();
        for (index, id) in ids.iter().enumerate() {
            let id = id.as_ref();
            match self.delete_document(ctx, collection, id) {
                Ok(_) => result.indexed += 1,
                Err(e) if e.is_cancellation() => return Err(e),
                Err(error) => result.errors.push(BulkError {
                    index,
                    id: id.to_string(),
                    error,
                }),
            }
        }
        log_bulk("delete_documents", &result);
        Ok(result)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Remove `id` from every posting list recorded for it
    fn purge_postings(&self, ctx: &Context, collection: &str, id: &str) -> Result<()> {
        let ix_key = key::document_index_key(&self.namespace, collection, id);
        let postings = self.store.index_keys(ctx, &ix_key)?;
        if postings.is_empty() {
            return Ok(());
        }
        for posting in &postings {
            self.store.remove_from_posting(ctx, posting, id)?;
        }
        self.store.clear_index_keys(ctx, &ix_key)?;
        debug!(
            target: "typelite::indexer",
            collection,
            id,
            count = postings.len(),
            "Purged previous postings"
        );
        Ok(())
    }

    fn write_postings(&self, ctx: &Context, schema: &Collection, doc: &Document, id: &str) -> Result<()> {
        let ns = self.namespace.as_str();
        let collection = schema.name.as_str();
        let dict_key = key::dictionary_key(ns, collection);
        let ix_key = key::document_index_key(ns, collection, id);

        for field in schema.search_fields() {
            let Some(FieldValue::Text(text)) = doc.get(&field.name) else {
                continue;
            };
            let weight = f64::from(field.effective_weight());
            for (term, count) in term_frequencies(text) {
                let posting = key::posting_key(ns, collection, &field.name, &term);
                self.store.add_dictionary_term(ctx, &dict_key, &term)?;
                self.store
                    .upsert_posting(ctx, &posting, id, weight * f64::from(count))?;
                self.store.track_index_key(ctx, &ix_key, &posting)?;
            }
        }

        self.store
            .add_document_id(ctx, &key::document_ids_key(ns, collection), id)
    }

    /// Best-effort primary key for a failed bulk item
    fn describe_id(&self, collection: &str, document: &Document, error: &Error) -> String {
        match error {
            Error::DuplicateKey { id, .. } | Error::IndexingFailed { id, .. } => id.clone(),
            _ => self
                .registry
                .collection(collection)
                .and_then(|schema| {
                    let pk = schema.primary_key_field()?;
                    document.get(&pk.name).map(|v| v.to_string())
                })
                .unwrap_or_default(),
        }
    }
}

impl std::fmt::Debug for Indexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Indexer")
            .field("namespace", &self.namespace)
            .finish()
    }
}

/// Wrap a post-write failure; cancellation passes through unchanged
fn indexing_failed(collection: &str, id: &str, source: Error) -> Error {
    if source.is_cancellation() {
        return source;
    }
    warn!(
        target: "typelite::indexer",
        collection,
        id,
        error = %source,
        "Record written but index update failed"
    );
    Error::IndexingFailed {
        collection: collection.to_string(),
        id: id.to_string(),
        source: Box::new(source),
    }
}

fn log_bulk(op: &'static str, result: &BulkResult) {
    if result.is_success() {
        debug!(target: "typelite::indexer", op, ok = result.indexed, "Bulk call finished");
    } else {
        warn!(
            target: "typelite::indexer",
            op,
            ok = result.indexed,
            failed = result.errors.len(),
            "Bulk call finished with failures"
        );
    }
}

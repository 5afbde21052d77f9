//! Store contract
//!
//! This module defines the [`Store`] trait, the only thing the engine needs
//! from a backing key-value store: hash records, sets and sorted sets, each
//! operation atomic for its single key. No cross-key transactions are
//! assumed.
//!
//! [`IndexStore`] layers the engine's logical operations (document writes,
//! posting updates, dictionary scans) on top of those primitives. It is
//! blanket-implemented for every `Store`, checks the caller's [`Context`]
//! before each call, and wraps backend errors with the failing operation
//! and key.

use crate::context::Context;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::key;
use crate::schema::Collection;
use std::collections::HashMap;
use thiserror::Error;

/// Result type for raw store calls
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by a backing store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend rejected or failed the command
    #[error("backend error: {0}")]
    Backend(String),

    /// Key holds a different structure than the command expects
    #[error("wrong type for key {key}: expected {expected}")]
    WrongType {
        /// Offending key
        key: String,
        /// Structure the command operates on
        expected: &'static str,
    },

    /// Backend could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value primitives required from a backing store
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads, and each call must be atomic for the key it touches.
pub trait Store: Send + Sync {
    /// Replace the hash record stored at `key`
    fn hash_put(&self, key: &str, fields: &[(String, String)]) -> StoreResult<()>;

    /// Write the hash record only if `key` does not exist
    ///
    /// Returns `true` if the record was written. The existence check and
    /// the write happen as one atomic step.
    fn hash_put_if_absent(&self, key: &str, fields: &[(String, String)]) -> StoreResult<bool>;

    /// Read a whole hash record, `None` if the key does not exist
    fn hash_get_all(&self, key: &str) -> StoreResult<Option<HashMap<String, String>>>;

    /// Check whether any structure is stored at `key`
    fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Remove `key`, returning whether it existed
    fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Add a member to a set, returning whether it was newly added
    fn set_add(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Remove a member from a set, returning whether it was present
    fn set_remove(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// All members of a set (empty if the key does not exist)
    fn set_members(&self, key: &str) -> StoreResult<Vec<String>>;

    /// Add or update a sorted-set member
    fn zset_add(&self, key: &str, member: &str, score: f64) -> StoreResult<()>;

    /// Remove a sorted-set member, returning whether it was present
    fn zset_remove(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Members with `min <= score <= max`, ascending by score then member
    fn zset_range_by_score(&self, key: &str, min: f64, max: f64) -> StoreResult<Vec<(String, f64)>>;

    /// Members starting with `prefix`, in lexical order
    fn zset_range_by_lex_prefix(
        &self,
        key: &str,
        prefix: &str,
        limit: Option<usize>,
    ) -> StoreResult<Vec<String>>;
}

/// Logical index operations expressed over [`Store`] primitives
pub trait IndexStore {
    /// Persist collection metadata (metadata hash, set, name index, field reverse index)
    ///
    /// The metadata hash is claimed with an atomic put-if-absent. If it
    /// already holds a different definition the call fails with
    /// `InvalidSchema` and writes nothing else; an identical definition
    /// proceeds, so a failed call can be retried as is.
    fn create_collection_metadata(&self, ctx: &Context, ns: &str, collection: &Collection) -> Result<()>;

    /// Read back every persisted collection definition
    fn load_collection_schemas(&self, ctx: &Context, ns: &str) -> Result<Vec<Collection>>;

    /// Replace a document record
    fn write_document(&self, ctx: &Context, doc_key: &str, record: &[(String, String)]) -> Result<()>;

    /// Write a document record only if absent; `false` means it already existed
    fn insert_document(&self, ctx: &Context, doc_key: &str, record: &[(String, String)]) -> Result<bool>;

    /// Check whether a document record exists
    fn document_exists(&self, ctx: &Context, doc_key: &str) -> Result<bool>;

    /// Read and decode a document record
    fn read_document(&self, ctx: &Context, doc_key: &str) -> Result<Option<Document>>;

    /// Delete a document record
    fn delete_document_record(&self, ctx: &Context, doc_key: &str) -> Result<bool>;

    /// Set `member`'s score in a posting list
    fn upsert_posting(&self, ctx: &Context, posting_key: &str, member: &str, score: f64) -> Result<()>;

    /// Remove `member` from a posting list
    fn remove_from_posting(&self, ctx: &Context, posting_key: &str, member: &str) -> Result<()>;

    /// All (primary key, score) pairs of a posting list
    fn fetch_posting(&self, ctx: &Context, posting_key: &str) -> Result<Vec<(String, f64)>>;

    /// Add a term to the dictionary
    fn add_dictionary_term(&self, ctx: &Context, dict_key: &str, term: &str) -> Result<()>;

    /// Dictionary terms sharing `prefix`, in lexical order
    fn scan_dictionary_prefix(
        &self,
        ctx: &Context,
        dict_key: &str,
        prefix: &str,
        limit: Option<usize>,
    ) -> Result<Vec<String>>;

    /// Record that a document participates in a posting list
    fn track_index_key(&self, ctx: &Context, doc_index_key: &str, posting_key: &str) -> Result<()>;

    /// Posting keys recorded for a document
    fn index_keys(&self, ctx: &Context, doc_index_key: &str) -> Result<Vec<String>>;

    /// Drop a document's index-key set
    fn clear_index_keys(&self, ctx: &Context, doc_index_key: &str) -> Result<()>;

    /// Add a primary key to a collection's live-id set
    fn add_document_id(&self, ctx: &Context, ids_key: &str, id: &str) -> Result<()>;

    /// Remove a primary key from a collection's live-id set
    fn remove_document_id(&self, ctx: &Context, ids_key: &str, id: &str) -> Result<()>;

    /// All primary keys in a collection's live-id set
    fn document_ids(&self, ctx: &Context, ids_key: &str) -> Result<Vec<String>>;
}

impl<S: Store + ?Sized> IndexStore for S {
    fn create_collection_metadata(&self, ctx: &Context, ns: &str, collection: &Collection) -> Result<()> {
        let name = collection.name.as_str();

        let meta = key::collection_meta_key(ns, name);
        let record = vec![
            ("name".to_string(), name.to_string()),
            (
                "fields".to_string(),
                serde_json::to_string(&collection.field_names())?,
            ),
            ("schema".to_string(), serde_json::to_string(collection)?),
        ];
        ctx.check()?;
        let claimed = self
            .hash_put_if_absent(&meta, &record)
            .map_err(|e| Error::storage("create_collection", meta.clone(), e))?;
        if !claimed {
            ctx.check()?;
            let existing = self
                .hash_get_all(&meta)
                .map_err(|e| Error::storage("create_collection", meta.clone(), e))?;
            let persisted: Option<Collection> = existing
                .as_ref()
                .and_then(|r| r.get("schema"))
                .map(|schema| serde_json::from_str(schema))
                .transpose()?;
            if persisted.as_ref() != Some(collection) {
                return Err(Error::InvalidSchema(format!(
                    "collection {} is already registered with a different definition",
                    name
                )));
            }
        }

        let collections = key::collections_key(ns);
        ctx.check()?;
        self.set_add(&collections, name)
            .map_err(|e| Error::storage("create_collection", collections, e))?;

        let by_name = key::collection_names_key(ns);
        ctx.check()?;
        self.zset_add(&by_name, name, 0.0)
            .map_err(|e| Error::storage("create_collection", by_name, e))?;

        for field in &collection.fields {
            let field_key = key::field_collections_key(ns, &field.name);
            ctx.check()?;
            self.set_add(&field_key, name)
                .map_err(|e| Error::storage("create_collection", field_key, e))?;
        }
        Ok(())
    }

    fn load_collection_schemas(&self, ctx: &Context, ns: &str) -> Result<Vec<Collection>> {
        let collections = key::collections_key(ns);
        ctx.check()?;
        let mut names = self
            .set_members(&collections)
            .map_err(|e| Error::storage("load_collections", collections, e))?;
        names.sort();

        let mut out = Vec::with_capacity(names.len());
        for name in names {
            let meta = key::collection_meta_key(ns, &name);
            ctx.check()?;
            let record = self
                .hash_get_all(&meta)
                .map_err(|e| Error::storage("load_collections", meta.clone(), e))?;
            let Some(schema) = record.as_ref().and_then(|r| r.get("schema")) else {
                continue;
            };
            out.push(serde_json::from_str(schema)?);
        }
        Ok(out)
    }

    fn write_document(&self, ctx: &Context, doc_key: &str, record: &[(String, String)]) -> Result<()> {
        ctx.check()?;
        self.hash_put(doc_key, record)
            .map_err(|e| Error::storage("write_document", doc_key, e))
    }

    fn insert_document(&self, ctx: &Context, doc_key: &str, record: &[(String, String)]) -> Result<bool> {
        ctx.check()?;
        self.hash_put_if_absent(doc_key, record)
            .map_err(|e| Error::storage("insert_document", doc_key, e))
    }

    fn document_exists(&self, ctx: &Context, doc_key: &str) -> Result<bool> {
        ctx.check()?;
        self.exists(doc_key)
            .map_err(|e| Error::storage("document_exists", doc_key, e))
    }

    fn read_document(&self, ctx: &Context, doc_key: &str) -> Result<Option<Document>> {
        ctx.check()?;
        let record = self
            .hash_get_all(doc_key)
            .map_err(|e| Error::storage("read_document", doc_key, e))?;
        record.map(Document::from_record).transpose()
    }

    fn delete_document_record(&self, ctx: &Context, doc_key: &str) -> Result<bool> {
        ctx.check()?;
        self.delete(doc_key)
            .map_err(|e| Error::storage("delete_document", doc_key, e))
    }

    fn upsert_posting(&self, ctx: &Context, posting_key: &str, member: &str, score: f64) -> Result<()> {
        ctx.check()?;
        self.zset_add(posting_key, member, score)
            .map_err(|e| Error::storage("upsert_posting", posting_key, e))
    }

    fn remove_from_posting(&self, ctx: &Context, posting_key: &str, member: &str) -> Result<()> {
        ctx.check()?;
        self.zset_remove(posting_key, member)
            .map(|_| ())
            .map_err(|e| Error::storage("remove_from_posting", posting_key, e))
    }

    fn fetch_posting(&self, ctx: &Context, posting_key: &str) -> Result<Vec<(String, f64)>> {
        ctx.check()?;
        self.zset_range_by_score(posting_key, f64::NEG_INFINITY, f64::INFINITY)
            .map_err(|e| Error::storage("fetch_posting", posting_key, e))
    }

    fn add_dictionary_term(&self, ctx: &Context, dict_key: &str, term: &str) -> Result<()> {
        ctx.check()?;
        self.zset_add(dict_key, term, 0.0)
            .map_err(|e| Error::storage("add_dictionary_term", dict_key, e))
    }

    fn scan_dictionary_prefix(
        &self,
        ctx: &Context,
        dict_key: &str,
        prefix: &str,
        limit: Option<usize>,
    ) -> Result<Vec<String>> {
        ctx.check()?;
        self.zset_range_by_lex_prefix(dict_key, prefix, limit)
            .map_err(|e| Error::storage("scan_dictionary_prefix", dict_key, e))
    }

    fn track_index_key(&self, ctx: &Context, doc_index_key: &str, posting_key: &str) -> Result<()> {
        ctx.check()?;
        self.set_add(doc_index_key, posting_key)
            .map(|_| ())
            .map_err(|e| Error::storage("track_index_key", doc_index_key, e))
    }

    fn index_keys(&self, ctx: &Context, doc_index_key: &str) -> Result<Vec<String>> {
        ctx.check()?;
        self.set_members(doc_index_key)
            .map_err(|e| Error::storage("index_keys", doc_index_key, e))
    }

    fn clear_index_keys(&self, ctx: &Context, doc_index_key: &str) -> Result<()> {
        ctx.check()?;
        self.delete(doc_index_key)
            .map(|_| ())
            .map_err(|e| Error::storage("clear_index_keys", doc_index_key, e))
    }

    fn add_document_id(&self, ctx: &Context, ids_key: &str, id: &str) -> Result<()> {
        ctx.check()?;
        self.set_add(ids_key, id)
            .map(|_| ())
            .map_err(|e| Error::storage("add_document_id", ids_key, e))
    }

    fn remove_document_id(&self, ctx: &Context, ids_key: &str, id: &str) -> Result<()> {
        ctx.check()?;
        self.set_remove(ids_key, id)
            .map(|_| ())
            .map_err(|e| Error::storage("remove_document_id", ids_key, e))
    }

    fn document_ids(&self, ctx: &Context, ids_key: &str) -> Result<Vec<String>> {
        ctx.check()?;
        self.set_members(ids_key)
            .map_err(|e| Error::storage("document_ids", ids_key, e))
    }
}

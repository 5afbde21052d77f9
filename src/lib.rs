//! Typelite - typed full-text search on key-value primitives
//!
//! Typelite stores documents and an inverted index in any backing store
//! that offers hashes, sets and sorted sets with per-key atomicity. Fields
//! are typed: text fields are tokenized for search, other fields support
//! typed filters, sorting and facets.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use typelite::{
//!     Collection, Context, Document, Engine, EngineConfig, Field, FieldValue, Filter,
//!     FilterCondition, IndexMode, MemoryStore, SearchRequest,
//! };
//!
//! let engine = Engine::new(Arc::new(MemoryStore::new()), EngineConfig::default());
//! let ctx = Context::background();
//!
//! engine.register_collection(
//!     &ctx,
//!     Collection::new("products")
//!         .field(Field::string("id").primary_key())
//!         .field(Field::text("name").searchable())
//!         .field(Field::string("status").filterable()),
//! )?;
//!
//! let doc = Document::new()
//!     .with("id", FieldValue::string("p1"))
//!     .with("name", FieldValue::text("Blue Widget"))
//!     .with("status", FieldValue::string("active"));
//! engine.index_document(&ctx, "products", &doc, IndexMode::Upsert)?;
//!
//! let request = SearchRequest::new("products", "widget").with_filter(
//!     Filter::new().and(FilterCondition::eq("status", FieldValue::string("active"))),
//! );
//! let resp = engine.search(&ctx, &request)?;
//! assert_eq!(resp.ids(), vec!["p1"]);
//! # Ok::<(), typelite::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `typelite-core`: types, errors and the [`Store`] contract
//! - `typelite-storage`: [`MemoryStore`] and fault-injection helpers
//! - `typelite-engine`: tokenizer, registry, indexer, query executor

pub use typelite_core::*;
pub use typelite_engine::{
    tokenize, tokenize_unique, Engine, EngineConfig, IndexItem, Indexer, QueryExecutor,
    SchemaRegistry,
};
pub use typelite_storage::{testing, MemoryStore};

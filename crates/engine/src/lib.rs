//! Search engine for typelite
//!
//! This crate builds full-text search on top of the store contract:
//! - EngineConfig: namespace and pagination settings (`typelite.toml`)
//! - SchemaRegistry: validated, persisted, cached collection definitions
//! - Indexer: document records, postings, term dictionary
//! - QueryExecutor: tokenized and prefix queries, filters, sorting, facets
//! - Engine: facade wiring the above to one store
//!
//! Nothing here spawns threads or holds locks across store calls; all
//! shared state is the registry cache.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod indexer;
pub mod registry;
pub mod search;

pub use config::EngineConfig;
pub use engine::Engine;
pub use indexer::{IndexItem, Indexer};
pub use registry::SchemaRegistry;
pub use search::{tokenize, tokenize_unique, QueryExecutor};

//! Shared test utilities for all integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::sync::{Arc, Once};
pub use typelite::{
    Collection, Context, Document, Engine, EngineConfig, Error, Field, FieldValue, Filter,
    FilterCondition, IndexItem, IndexMode, MemoryStore, Op, SearchRequest, SearchResponse,
    SortSpec, Store,
};

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route engine logs to the test writer (once per process)
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Engine over a fresh MemoryStore, default config
pub fn memory_engine() -> (Arc<MemoryStore>, Engine) {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let engine = Engine::new(store.clone(), EngineConfig::default());
    (store, engine)
}

// ============================================================================
// Fixtures
// ============================================================================

/// Product catalog used across suites
pub fn catalog_collection() -> Collection {
    Collection::new("catalog")
        .field(Field::string("sku").primary_key())
        .field(Field::text("title").searchable().with_weight(3))
        .field(Field::text("description").searchable().optional())
        .field(Field::string("brand").filterable().sortable())
        .field(Field::string("status").filterable())
        .field(Field::float("price").filterable().sortable())
        .field(Field::int("stock").filterable().sortable().optional())
        .field(Field::bool("featured").filterable().optional())
        .field(Field::time("listed_at").filterable().sortable().optional())
        .field(Field::geo("warehouse").optional())
}

/// One catalog row
pub fn catalog_item(sku: &str, title: &str, brand: &str, status: &str, price: f64) -> Document {
    Document::new()
        .with("sku", FieldValue::string(sku))
        .with("title", FieldValue::text(title))
        .with("brand", FieldValue::string(brand))
        .with("status", FieldValue::string(status))
        .with("price", price)
}

/// Index `docs` into `collection`, asserting every item succeeds
pub fn index_all(engine: &Engine, ctx: &Context, collection: &str, docs: &[Document]) {
    let result = engine
        .index_documents(ctx, collection, docs, IndexMode::Upsert)
        .unwrap();
    assert!(result.is_success(), "bulk errors: {:?}", result.errors);
    assert_eq!(result.indexed, docs.len());
}

/// Primary keys of a response, owned
pub fn ids(resp: &SearchResponse) -> Vec<String> {
    resp.hits.iter().map(|h| h.id.clone()).collect()
}

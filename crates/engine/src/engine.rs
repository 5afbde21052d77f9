//! Engine facade
//!
//! [`Engine`] wires one registry, indexer and query executor to a single
//! store and namespace. It owns no threads; every call runs on the
//! caller's thread and honors the caller's [`Context`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use typelite_core::{Collection, Context, Document, Field, FieldValue, IndexMode, SearchRequest};
//! use typelite_engine::{Engine, EngineConfig};
//! use typelite_storage::MemoryStore;
//!
//! let engine = Engine::new(Arc::new(MemoryStore::new()), EngineConfig::default());
//! let ctx = Context::background();
//!
//! engine
//!     .register_collection(
//!         &ctx,
//!         Collection::new("products")
//!             .field(Field::string("id").primary_key())
//!             .field(Field::text("name").searchable()),
//!     )
//!     .unwrap();
//!
//! let doc = Document::new()
//!     .with("id", FieldValue::string("p1"))
//!     .with("name", FieldValue::text("Widget"));
//! engine.index_document(&ctx, "products", &doc, IndexMode::Upsert).unwrap();
//!
//! let resp = engine.search(&ctx, &SearchRequest::new("products", "widget")).unwrap();
//! assert_eq!(resp.ids(), vec!["p1"]);
//! ```

use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::info;
use typelite_core::{
    BulkResult, Collection, Context, Document, Error, IndexMode, Result, SearchRequest,
    SearchResponse, Store,
};

use crate::config::EngineConfig;
use crate::indexer::{IndexItem, Indexer};
use crate::registry::SchemaRegistry;
use crate::search::QueryExecutor;

/// Search engine over a key-value store
pub struct Engine {
    config: EngineConfig,
    registry: Arc<SchemaRegistry>,
    indexer: Indexer,
    executor: QueryExecutor,
}

impl Engine {
    /// Create an engine; `config` is normalized first
    pub fn new(store: Arc<dyn Store>, config: EngineConfig) -> Self {
        let config = config.normalize();
        let registry = Arc::new(SchemaRegistry::new(Arc::clone(&store), config.namespace.clone()));
        let indexer = Indexer::new(Arc::clone(&store), Arc::clone(&registry));
        let executor = QueryExecutor::new(store, Arc::clone(&registry), config.clone());

        info!(
            target: "typelite::engine",
            namespace = %config.namespace,
            default_per_page = config.default_per_page,
            max_per_page = config.max_per_page,
            "Engine ready"
        );
        Engine {
            config,
            registry,
            indexer,
            executor,
        }
    }

    /// Create an engine and load persisted collection definitions
    pub fn open(ctx: &Context, store: Arc<dyn Store>, config: EngineConfig) -> Result<Self> {
        let engine = Self::new(store, config);
        engine.load_collections(ctx)?;
        Ok(engine)
    }

    /// Effective configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared collection registry
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    // ========================================================================
    // Collections
    // ========================================================================

    /// Register a collection (see [`SchemaRegistry::register`])
    pub fn register_collection(&self, ctx: &Context, collection: Collection) -> Result<Arc<Collection>> {
        self.registry.register(ctx, collection)
    }

    /// Cached collection definition
    pub fn collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.registry.collection(name)
    }

    /// Names of registered collections, sorted
    pub fn collections(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Reload collection definitions from the store
    pub fn load_collections(&self, ctx: &Context) -> Result<usize> {
        self.registry.load(ctx)
    }

    // ========================================================================
    // Documents
    // ========================================================================

    /// Index one document (see [`Indexer::index_document`])
    pub fn index_document(
        &self,
        ctx: &Context,
        collection: &str,
        document: &Document,
        mode: IndexMode,
    ) -> Result<String> {
        self.indexer.index_document(ctx, collection, document, mode)
    }

    /// Index one document given as a JSON object
    pub fn index_json(
        &self,
        ctx: &Context,
        collection: &str,
        value: &JsonValue,
        mode: IndexMode,
    ) -> Result<String> {
        let schema = self
            .registry
            .collection(collection)
            .ok_or_else(|| Error::CollectionNotFound(collection.to_string()))?;
        let document = Document::from_json(value, &schema)?;
        self.indexer.index_document(ctx, collection, &document, mode)
    }

    /// Index many documents into one collection
    pub fn index_documents(
        &self,
        ctx: &Context,
        collection: &str,
        documents: &[Document],
        mode: IndexMode,
    ) -> Result<BulkResult> {
        self.indexer.index_documents(ctx, collection, documents, mode)
    }

    /// Index items that each name their own collection
    pub fn index_batch(&self, ctx: &Context, items: &[IndexItem], mode: IndexMode) -> Result<BulkResult> {
        self.indexer.index_batch(ctx, items, mode)
    }

    /// Delete one document, returning whether it existed
    pub fn delete_document(&self, ctx: &Context, collection: &str, id: &str) -> Result<bool> {
        self.indexer.delete_document(ctx, collection, id)
    }

    /// Delete many documents from one collection
    pub fn delete_documents<I: AsRef<str>>(
        &self,
        ctx: &Context,
        collection: &str,
        ids: &[I],
    ) -> Result<BulkResult> {
        self.indexer.delete_documents(ctx, collection, ids)
    }

    /// Read a document by primary key
    pub fn get_document(&self, ctx: &Context, collection: &str, id: &str) -> Result<Option<Document>> {
        self.indexer.get_document(ctx, collection, id)
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Run a search request
    pub fn search(&self, ctx: &Context, request: &SearchRequest) -> Result<SearchResponse> {
        self.executor.search(ctx, request)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("collections", &self.registry.names())
            .finish()
    }
}

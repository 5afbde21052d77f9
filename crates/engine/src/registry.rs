//! Collection registry
//!
//! Validates collection definitions, persists their metadata through the
//! store, and keeps an in-memory cache for lookups on the hot path.
//!
//! # Locking
//!
//! Store writes happen before the cache lock is taken. The write lock is
//! held only for the map insert, so lookups never wait on store I/O.
//! A definition that failed to persist never reaches the cache.
//!
//! Definitions are immutable. The metadata hash is claimed atomically in
//! the store, so two registrations of one name with different
//! definitions cannot both succeed, even from separate registries.

use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use typelite_core::{Collection, Context, Error, IndexStore, Result, Store};

/// Registered collection definitions, persisted and cached
pub struct SchemaRegistry {
    namespace: String,
    store: Arc<dyn Store>,
    collections: RwLock<HashMap<String, Arc<Collection>>>,
}

impl SchemaRegistry {
    /// Create an empty registry over `store`
    pub fn new(store: Arc<dyn Store>, namespace: impl Into<String>) -> Self {
        SchemaRegistry {
            namespace: namespace.into(),
            store,
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Key namespace this registry writes under
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Validate, persist and cache a collection definition
    ///
    /// Definitions are immutable once registered. Registering an identical
    /// definition again succeeds without changing anything, so a failed
    /// registration can be retried as is.
    ///
    /// # Errors
    ///
    /// - `InvalidSchema` if the definition is malformed, or the name is
    ///   already registered with a different definition (nothing written)
    /// - `StorageFailure` if a metadata write fails (not cached, safe to retry)
    /// - `Cancelled` / `DeadlineExceeded` if `ctx` trips
    pub fn register(&self, ctx: &Context, collection: Collection) -> Result<Arc<Collection>> {
        collection.validate()?;

        if let Some(existing) = self.collection(&collection.name) {
            return reuse(existing, &collection);
        }

        if let Err(e) = self
            .store
            .create_collection_metadata(ctx, &self.namespace, &collection)
        {
            warn!(
                target: "typelite::registry",
                collection = %collection.name,
                error = %e,
                "Failed to register collection"
            );
            return Err(e);
        }

        let collection = Arc::new(collection);
        match self.collections.write().entry(collection.name.clone()) {
            Entry::Occupied(e) => return reuse(Arc::clone(e.get()), &collection),
            Entry::Vacant(e) => {
                e.insert(Arc::clone(&collection));
            }
        }

        info!(
            target: "typelite::registry",
            collection = %collection.name,
            fields = collection.fields.len(),
            "Registered collection"
        );
        Ok(collection)
    }

    /// Cached definition for `name`; never touches the store
    pub fn collection(&self, name: &str) -> Option<Arc<Collection>> {
        self.collections.read().get(name).cloned()
    }

    /// Check whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.collections.read().contains_key(name)
    }

    /// Names of every cached collection, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of cached collections
    pub fn len(&self) -> usize {
        self.collections.read().len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.collections.read().is_empty()
    }

    /// Rebuild the cache from persisted metadata
    ///
    /// Definitions that no longer validate are skipped with a warning.
    /// Returns the number of collections loaded.
    pub fn load(&self, ctx: &Context) -> Result<usize> {
        let persisted = self.store.load_collection_schemas(ctx, &self.namespace)?;

        let mut loaded = HashMap::with_capacity(persisted.len());
        for collection in persisted {
            if let Err(e) = collection.validate() {
                warn!(
                    target: "typelite::registry",
                    collection = %collection.name,
                    error = %e,
                    "Skipping invalid persisted collection"
                );
                continue;
            }
            loaded.insert(collection.name.clone(), Arc::new(collection));
        }

        let count = loaded.len();
        self.collections.write().extend(loaded);
        debug!(target: "typelite::registry", count, "Loaded collections from store");
        Ok(count)
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("namespace", &self.namespace)
            .field("collections", &self.names())
            .finish()
    }
}

/// Accept a repeat registration only if it matches the cached definition
fn reuse(existing: Arc<Collection>, requested: &Collection) -> Result<Arc<Collection>> {
    if *existing == *requested {
        return Ok(existing);
    }
    Err(Error::InvalidSchema(format!(
        "collection {} is already registered with a different definition",
        requested.name
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use typelite_core::{key, Error, Field};
    use typelite_storage::testing::{FaultRule, FaultyStore, StoreOp};
    use typelite_storage::MemoryStore;

    fn products() -> Collection {
        Collection::new("products")
            .field(Field::string("id").primary_key())
            .field(Field::text("name").searchable())
            .field(Field::string("status").filterable())
    }

    fn registry() -> (Arc<MemoryStore>, SchemaRegistry) {
        let store = Arc::new(MemoryStore::new());
        let registry = SchemaRegistry::new(store.clone(), "tl");
        (store, registry)
    }

    #[test]
    fn test_register_then_lookup() {
        let (_, registry) = registry();
        let ctx = Context::background();
        registry.register(&ctx, products()).unwrap();

        let got = registry.collection("products").unwrap();
        assert_eq!(got.field_names(), vec!["id", "name", "status"]);
        assert_eq!(got.fields.iter().filter(|f| f.primary_key).count(), 1);
        assert!(registry.collection("orders").is_none());
    }

    #[test]
    fn test_register_persists_metadata() {
        let (store, registry) = registry();
        registry.register(&Context::background(), products()).unwrap();

        assert_eq!(store.set_members(&key::collections_key("tl")).unwrap(), vec!["products"]);
        assert_eq!(
            store
                .zset_range_by_lex_prefix(&key::collection_names_key("tl"), "", None)
                .unwrap(),
            vec!["products"]
        );
        let meta = store
            .hash_get_all(&key::collection_meta_key("tl", "products"))
            .unwrap()
            .unwrap();
        assert_eq!(meta["name"], "products");
        assert_eq!(meta["fields"], r#"["id","name","status"]"#);
        assert!(store
            .set_members(&key::field_collections_key("tl", "status"))
            .unwrap()
            .contains(&"products".to_string()));
    }

    #[test]
    fn test_register_rejects_invalid_without_writes() {
        let (store, registry) = registry();
        let ctx = Context::background();

        let cases = vec![
            Collection::new("").field(Field::string("id").primary_key()),
            Collection::new("empty"),
            Collection::new("dupes")
                .field(Field::string("id").primary_key())
                .field(Field::text("id")),
            Collection::new("no_pk").field(Field::text("name")),
            Collection::new("two_pk")
                .field(Field::string("a").primary_key())
                .field(Field::string("b").primary_key()),
            Collection::new("bad:name").field(Field::string("id").primary_key()),
        ];
        for case in cases {
            let err = registry.register(&ctx, case).unwrap_err();
            assert!(matches!(err, Error::InvalidSchema(_)), "got {:?}", err);
        }
        assert!(store.is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_failed_persist_is_not_cached() {
        let store = Arc::new(FaultyStore::new(Arc::new(MemoryStore::new())));
        let registry = SchemaRegistry::new(store.clone(), "tl");
        store.inject(FaultRule::on(StoreOp::HashPutIfAbsent).times(1));

        let err = registry
            .register(&Context::background(), products())
            .unwrap_err();
        assert!(matches!(err, Error::StorageFailure { .. }));
        assert!(registry.collection("products").is_none());

        // Retry succeeds once the store recovers
        registry.register(&Context::background(), products()).unwrap();
        assert!(registry.collection("products").is_some());
    }

    #[test]
    fn test_cancelled_register() {
        let (store, registry) = registry();
        let ctx = Context::background();
        ctx.token().cancel();

        let err = registry.register(&ctx, products()).unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert!(store.is_empty());
        assert!(!registry.contains("products"));
    }

    #[test]
    fn test_reregister_identical_is_idempotent() {
        let (store, registry) = registry();
        let ctx = Context::background();
        let first = registry.register(&ctx, products()).unwrap();
        let second = registry.register(&ctx, products()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
        assert_eq!(store.set_members(&key::collections_key("tl")).unwrap(), vec!["products"]);
    }

    #[test]
    fn test_reregister_different_definition_rejected() {
        let (store, registry) = registry();
        let ctx = Context::background();
        registry.register(&ctx, products()).unwrap();

        let altered = Collection::new("products")
            .field(Field::string("sku").primary_key())
            .field(Field::text("title").searchable());
        let err = registry.register(&ctx, altered).unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(_)), "got {:?}", err);

        assert_eq!(*registry.collection("products").unwrap(), products());
        let meta = store
            .hash_get_all(&key::collection_meta_key("tl", "products"))
            .unwrap()
            .unwrap();
        assert_eq!(meta["fields"], r#"["id","name","status"]"#);
        assert!(store
            .set_members(&key::field_collections_key("tl", "sku"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_conflict_detected_through_store() {
        let store = Arc::new(MemoryStore::new());
        let ctx = Context::background();
        SchemaRegistry::new(store.clone(), "tl")
            .register(&ctx, products())
            .unwrap();

        // A second registry has an empty cache; the persisted definition still wins
        let other = SchemaRegistry::new(store, "tl");
        let altered = products().field(Field::int("stock").optional());
        let err = other.register(&ctx, altered).unwrap_err();
        assert!(matches!(err, Error::InvalidSchema(_)));
        assert!(other.collection("products").is_none());

        other.register(&ctx, products()).unwrap();
        assert_eq!(*other.collection("products").unwrap(), products());
    }

    #[test]
    fn test_racing_different_definitions_one_wins() {
        let store = Arc::new(MemoryStore::new());
        let ctx = Context::background();
        let registries: Vec<SchemaRegistry> = (0..4)
            .map(|_| SchemaRegistry::new(store.clone(), "tl"))
            .collect();
        let barrier = std::sync::Barrier::new(registries.len());

        let outcomes: Vec<Result<Arc<Collection>>> = std::thread::scope(|s| {
            let handles: Vec<_> = registries
                .iter()
                .enumerate()
                .map(|(i, registry)| {
                    let barrier = &barrier;
                    let ctx = &ctx;
                    s.spawn(move || {
                        let def = Collection::new("shared")
                            .field(Field::string("id").primary_key())
                            .field(Field::text(format!("field{}", i)));
                        barrier.wait();
                        registry.register(ctx, def)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let winners = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(outcomes
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, Error::InvalidSchema(_))));
    }

    #[test]
    fn test_load_rebuilds_cache() {
        let store = Arc::new(MemoryStore::new());
        let ctx = Context::background();
        SchemaRegistry::new(store.clone(), "tl")
            .register(&ctx, products())
            .unwrap();

        let fresh = SchemaRegistry::new(store.clone(), "tl");
        assert!(fresh.is_empty());
        assert_eq!(fresh.load(&ctx).unwrap(), 1);
        assert_eq!(*fresh.collection("products").unwrap(), products());

        // Other namespaces see nothing
        let other = SchemaRegistry::new(store, "other");
        assert_eq!(other.load(&ctx).unwrap(), 0);
    }

    #[test]
    fn test_names_sorted() {
        let (_, registry) = registry();
        let ctx = Context::background();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .register(&ctx, Collection::new(name).field(Field::int("id").primary_key()))
                .unwrap();
        }
        assert_eq!(registry.names(), vec!["alpha", "mid", "zeta"]);
    }
}

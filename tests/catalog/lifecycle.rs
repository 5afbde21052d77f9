//! Restart, configuration and deletion lifecycle

use crate::common::*;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_restart_sees_persisted_collections_and_documents() {
    let (store, engine) = memory_engine();
    let ctx = Context::background();
    engine.register_collection(&ctx, catalog_collection()).unwrap();
    index_all(
        &engine,
        &ctx,
        "catalog",
        &[catalog_item("k1", "Kettle", "acme", "active", 30.0)],
    );
    drop(engine);

    let reopened = Engine::open(&ctx, store, EngineConfig::default()).unwrap();
    assert_eq!(*reopened.collection("catalog").unwrap(), catalog_collection());
    let resp = reopened
        .search(&ctx, &SearchRequest::new("catalog", "kettle"))
        .unwrap();
    assert_eq!(ids(&resp), vec!["k1"]);
}

#[test]
fn test_engine_from_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("typelite.toml");
    std::fs::write(
        &path,
        "namespace = \"shop\"\ndefault_per_page = 2\nmax_per_page = 3\n",
    )
    .unwrap();

    let config = EngineConfig::from_file(&path).unwrap();
    let store = Arc::new(MemoryStore::new());
    let engine = Engine::new(store.clone(), config);
    let ctx = Context::background();
    engine.register_collection(&ctx, catalog_collection()).unwrap();

    let docs: Vec<Document> = (0..5)
        .map(|i| catalog_item(&format!("k{}", i), "Kettle", "acme", "active", 30.0))
        .collect();
    index_all(&engine, &ctx, "catalog", &docs);

    let resp = engine
        .search(&ctx, &SearchRequest::new("catalog", "kettle"))
        .unwrap();
    assert_eq!(resp.per_page, 2);
    assert_eq!(resp.len(), 2);

    let resp = engine
        .search(&ctx, &SearchRequest::new("catalog", "kettle").with_page(1, 50))
        .unwrap();
    assert_eq!(resp.per_page, 3);

    assert!(store.keys_with_prefix("tl:").is_empty());
    assert!(!store.keys_with_prefix("shop:").is_empty());
}

#[test]
fn test_delete_then_reindex() {
    let (_, engine) = memory_engine();
    let ctx = Context::background();
    engine.register_collection(&ctx, catalog_collection()).unwrap();
    let item = catalog_item("k1", "Copper Kettle", "acme", "active", 30.0);
    index_all(&engine, &ctx, "catalog", &[item.clone()]);

    assert!(engine.delete_document(&ctx, "catalog", "k1").unwrap());
    assert!(engine
        .search(&ctx, &SearchRequest::new("catalog", "copper"))
        .unwrap()
        .is_empty());
    assert!(engine
        .search(&ctx, &SearchRequest::new("catalog", ""))
        .unwrap()
        .is_empty());

    engine
        .index_document(&ctx, "catalog", &item, IndexMode::InsertOnly)
        .unwrap();
    let resp = engine
        .search(&ctx, &SearchRequest::new("catalog", "copper"))
        .unwrap();
    assert_eq!(ids(&resp), vec!["k1"]);
}

#[test]
fn test_cancellation_token_shared_across_calls() {
    let (_, engine) = memory_engine();
    let ctx = Context::background();
    engine.register_collection(&ctx, catalog_collection()).unwrap();

    let token = typelite::CancellationToken::new();
    let scoped = Context::background().with_token(token.clone());
    index_all(
        &engine,
        &scoped,
        "catalog",
        &[catalog_item("k1", "Kettle", "acme", "active", 30.0)],
    );

    token.cancel();
    let err = engine
        .index_document(
            &scoped,
            "catalog",
            &catalog_item("k2", "Kettle", "acme", "active", 30.0),
            IndexMode::Upsert,
        )
        .unwrap_err();
    assert!(err.is_cancellation());
    assert!(engine.get_document(&ctx, "catalog", "k2").unwrap().is_none());
}

#[test]
fn test_collection_definition_is_immutable() {
    let (_, engine) = memory_engine();
    let ctx = Context::background();
    engine.register_collection(&ctx, catalog_collection()).unwrap();
    index_all(
        &engine,
        &ctx,
        "catalog",
        &[catalog_item("k1", "Copper Kettle", "acme", "active", 30.0)],
    );

    let altered = Collection::new("catalog")
        .field(Field::string("code").primary_key())
        .field(Field::text("label").searchable());
    let err = engine.register_collection(&ctx, altered).unwrap_err();
    assert!(matches!(err, Error::InvalidSchema(_)));

    // Same definition again is a no-op
    engine.register_collection(&ctx, catalog_collection()).unwrap();
    assert_eq!(*engine.collection("catalog").unwrap(), catalog_collection());

    let resp = engine
        .search(&ctx, &SearchRequest::new("catalog", "kettle"))
        .unwrap();
    assert_eq!(ids(&resp), vec!["k1"]);
}

#[test]
fn test_non_finite_price_rejected_and_catalog_stays_searchable() {
    let (store, engine) = memory_engine();
    let ctx = Context::background();
    engine.register_collection(&ctx, catalog_collection()).unwrap();
    index_all(
        &engine,
        &ctx,
        "catalog",
        &[catalog_item("k1", "Copper Kettle", "acme", "active", 30.0)],
    );

    let err = engine
        .index_document(
            &ctx,
            "catalog",
            &catalog_item("k2", "Steel Kettle", "acme", "active", f64::INFINITY),
            IndexMode::Upsert,
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidDocument(_)));
    assert!(!store
        .exists(&typelite::key::document_key("tl", "catalog", "k2"))
        .unwrap());

    let docs = vec![
        catalog_item("k3", "Iron Kettle", "acme", "active", f64::NAN),
        catalog_item("k4", "Glass Kettle", "acme", "active", 12.0),
    ];
    let result = engine
        .index_documents(&ctx, "catalog", &docs, IndexMode::Upsert)
        .unwrap();
    assert_eq!(result.indexed, 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].index, 0);

    let resp = engine
        .search(&ctx, &SearchRequest::new("catalog", "kettle"))
        .unwrap();
    assert_eq!(ids(&resp), vec!["k1", "k4"]);
    let resp = engine
        .search(&ctx, &SearchRequest::new("catalog", ""))
        .unwrap();
    assert_eq!(ids(&resp), vec!["k1", "k4"]);
    assert!(engine.get_document(&ctx, "catalog", "k2").unwrap().is_none());
}

//! Search behavior over a realistic catalog

use crate::common::*;
use chrono::{TimeZone, Utc};

fn seeded() -> (Engine, Context) {
    let (_, engine) = memory_engine();
    let ctx = Context::background();
    engine.register_collection(&ctx, catalog_collection()).unwrap();

    let docs = vec![
        catalog_item("s1", "Trail Running Shoes", "acme", "active", 89.0)
            .with("stock", 12i64)
            .with("featured", true),
        catalog_item("s2", "Road Running Shoes", "zoom", "active", 120.0).with("stock", 0i64),
        catalog_item("s3", "Hiking Boots", "acme", "discontinued", 150.0),
        catalog_item("s4", "Running Socks", "zoom", "active", 12.5)
            .with("description", FieldValue::text("breathable socks for running")),
        catalog_item("s5", "Runner's Water Bottle", "hydro", "active", 18.0)
            .with("listed_at", Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()),
    ];
    index_all(&engine, &ctx, "catalog", &docs);
    (engine, ctx)
}

#[test]
fn test_relevance_prefers_weighted_title() {
    let (engine, ctx) = seeded();
    let resp = engine
        .search(&ctx, &SearchRequest::new("catalog", "running"))
        .unwrap();
    // s4 matches in both title and description
    assert_eq!(ids(&resp), vec!["s4", "s1", "s2"]);
    assert_eq!(resp.hits[0].score, 4.0);
}

#[test]
fn test_prefix_expansion_on_last_token() {
    let (engine, ctx) = seeded();
    let resp = engine
        .search(
            &ctx,
            &SearchRequest::new("catalog", "run").with_prefix_search(true),
        )
        .unwrap();
    // run -> runners, running
    assert_eq!(resp.total, 4);
    assert!(ids(&resp).contains(&"s5".to_string()));
}

#[test]
fn test_filter_sort_and_facets_together() {
    let (engine, ctx) = seeded();
    let request = SearchRequest::new("catalog", "")
        .with_filter(
            Filter::new()
                .and(FilterCondition::eq("status", FieldValue::string("active")))
                .and(FilterCondition::new("price", Op::Lte, 100.0)),
        )
        .with_sort(SortSpec::desc("price"))
        .with_facet("brand");

    let resp = engine.search(&ctx, &request).unwrap();
    assert_eq!(ids(&resp), vec!["s1", "s5", "s4"]);
    assert_eq!(resp.total, 3);

    let brands = resp.facet("brand").unwrap();
    let counts: Vec<(String, u64)> = brands
        .counts
        .iter()
        .map(|c| (c.value.clone(), c.count))
        .collect();
    assert_eq!(
        counts,
        vec![
            ("acme".to_string(), 1),
            ("hydro".to_string(), 1),
            ("zoom".to_string(), 1)
        ]
    );
}

#[test]
fn test_sort_with_missing_values() {
    let (engine, ctx) = seeded();
    let resp = engine
        .search(
            &ctx,
            &SearchRequest::new("catalog", "").with_sort(SortSpec::asc("stock")),
        )
        .unwrap();
    // Documents without stock come after, ordered by sku
    assert_eq!(ids(&resp), vec!["s2", "s1", "s3", "s4", "s5"]);
}

#[test]
fn test_time_filter() {
    let (engine, ctx) = seeded();
    let cutoff = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let resp = engine
        .search(
            &ctx,
            &SearchRequest::new("catalog", "").with_filter(
                Filter::new().and(FilterCondition::new("listed_at", Op::Gt, FieldValue::Time(cutoff))),
            ),
        )
        .unwrap();
    assert_eq!(ids(&resp), vec!["s5"]);

    // RFC 3339 strings are accepted for time filters
    let resp = engine
        .search(
            &ctx,
            &SearchRequest::new("catalog", "").with_filter(Filter::new().and(
                FilterCondition::new("listed_at", Op::Lt, FieldValue::string("2024-01-01T00:00:00Z")),
            )),
        )
        .unwrap();
    assert!(resp.is_empty());
}

#[test]
fn test_featured_bool_and_or() {
    let (engine, ctx) = seeded();
    let resp = engine
        .search(
            &ctx,
            &SearchRequest::new("catalog", "shoes").with_filter(
                Filter::new()
                    .or(FilterCondition::eq("featured", true))
                    .or(FilterCondition::eq("brand", FieldValue::string("zoom"))),
            ),
        )
        .unwrap();
    assert_eq!(ids(&resp), vec!["s1", "s2"]);
}

#[test]
fn test_geo_field_cannot_be_filtered_or_faceted() {
    let (engine, ctx) = seeded();
    let err = engine
        .search(&ctx, &SearchRequest::new("catalog", "").with_facet("warehouse"))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
}

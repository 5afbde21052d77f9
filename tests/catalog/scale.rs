//! Larger collections across many pages

use crate::common::*;

#[test]
fn test_paging_through_thousands() {
    let (_, engine) = memory_engine();
    let ctx = Context::background();
    engine.register_collection(&ctx, catalog_collection()).unwrap();

    let brands = ["acme", "zoom", "hydro"];
    let docs: Vec<Document> = (0..3000)
        .map(|i| {
            catalog_item(
                &format!("sku{:05}", i),
                "Universal Adapter",
                brands[i % brands.len()],
                "active",
                (i % 100) as f64,
            )
        })
        .collect();
    index_all(&engine, &ctx, "catalog", &docs);

    let mut seen = Vec::new();
    let mut page = 1;
    loop {
        let resp = engine
            .search(
                &ctx,
                &SearchRequest::new("catalog", "adapter").with_page(page, 250),
            )
            .unwrap();
        assert_eq!(resp.total, 3000);
        if resp.is_empty() {
            break;
        }
        seen.extend(ids(&resp));
        page += 1;
    }
    assert_eq!(seen.len(), 3000);
    let mut sorted = seen.clone();
    sorted.sort();
    assert_eq!(seen, sorted);

    let resp = engine
        .search(
            &ctx,
            &SearchRequest::new("catalog", "adapter")
                .with_facet("brand")
                .with_max_hits(300),
        )
        .unwrap();
    assert_eq!(resp.total, 300);
    let brand_total: u64 = resp.facet("brand").unwrap().counts.iter().map(|c| c.count).sum();
    assert_eq!(brand_total, 300);
}

//! Catalog Test Suite
//!
//! End-to-end tests through the `typelite` facade crate:
//! - Search: matching, prefix expansion, filters, ordering, facets
//! - Lifecycle: restart from persisted metadata, config files, deletes
//! - Scale: a few thousand documents across pages
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test catalog
//! ```

#[path = "../common/mod.rs"]
mod common;

mod lifecycle;
mod scale;
mod search;

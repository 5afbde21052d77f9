//! Search module: tokenization, request planning and query execution
//!
//! This module contains:
//! - `tokenizer`: text → terms, shared by indexing and queries
//! - `plan`: request validation, filter/sort/facet evaluation
//! - `executor`: candidate gathering, resolution and pagination

mod executor;
mod plan;
pub mod tokenizer;

pub use executor::QueryExecutor;
pub use plan::{Match, QueryPlan};
pub use tokenizer::{term_frequencies, tokenize, tokenize_unique};

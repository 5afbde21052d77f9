//! Core types and traits for typelite
//!
//! This crate defines the foundational types used throughout the system:
//! - Error: Error taxonomy shared by every layer
//! - FieldValue: Tagged value variant keyed by field type
//! - Collection / Field / FieldType: Schema definitions
//! - Document: Field map plus its stored record encoding
//! - Key builders: Namespace-scoped store key naming
//! - Context: Cancellation and deadline signal
//! - Store / IndexStore: The backing-store contract
//! - Search types: SearchRequest, SearchResponse, Filter, SortSpec, BulkResult

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod document;
pub mod error;
pub mod key;
pub mod schema;
pub mod search_types;
pub mod traits;
pub mod value;

pub use context::{CancellationToken, Context};
pub use document::Document;
pub use error::{Error, Result};
pub use schema::{must_collection, Collection, Field, FieldType};
pub use search_types::{
    BulkError, BulkResult, FacetCount, FacetResult, Filter, FilterCondition, FilterValue, Hit,
    IndexMode, Op, SearchRequest, SearchResponse, SortOrder, SortSpec, SCORE_FIELD,
};
pub use traits::{IndexStore, Store, StoreError, StoreResult};
pub use value::{FieldValue, GeoPoint};

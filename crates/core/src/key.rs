//! Store key naming
//!
//! Every key is namespace-scoped and reconstructible from its logical parts
//! alone, without consulting stored state. These are pure functions of
//! their arguments.
//!
//! ## Layout
//!
//! | Key | Structure |
//! |---|---|
//! | `{ns}:collections` | set of collection names |
//! | `{ns}:collections:by_name` | sorted set, name index |
//! | `{ns}:collection:{name}` | hash, collection metadata |
//! | `{ns}:collections:field:{field}` | set, collections owning a field name |
//! | `{ns}:{collection}:terms` | sorted set, term dictionary |
//! | `{ns}:{collection}:ix:{field}:t:{term}` | sorted set, posting list |
//! | `{ns}:{collection}:docx:{pk}` | hash, document record |
//! | `{ns}:{collection}:docix:{pk}` | set, posting keys of one document |
//! | `{ns}:{collection}:ids` | set, live primary keys |

/// Set of registered collection names
pub fn collections_key(ns: &str) -> String {
    format!("{}:collections", ns)
}

/// Sorted name index of registered collections
pub fn collection_names_key(ns: &str) -> String {
    format!("{}:collections:by_name", ns)
}

/// Metadata hash for one collection
pub fn collection_meta_key(ns: &str, collection: &str) -> String {
    format!("{}:collection:{}", ns, collection)
}

/// Reverse index: collections that declare a field name
pub fn field_collections_key(ns: &str, field: &str) -> String {
    format!("{}:collections:field:{}", ns, field)
}

/// Term dictionary of a collection
pub fn dictionary_key(ns: &str, collection: &str) -> String {
    format!("{}:{}:terms", ns, collection)
}

/// Posting list for a (collection, field, term) triple
pub fn posting_key(ns: &str, collection: &str, field: &str, term: &str) -> String {
    format!("{}:{}:ix:{}:t:{}", ns, collection, field, term)
}

/// Document record
pub fn document_key(ns: &str, collection: &str, primary_key: &str) -> String {
    format!("{}:{}:docx:{}", ns, collection, primary_key)
}

/// Posting keys a document participates in
pub fn document_index_key(ns: &str, collection: &str, primary_key: &str) -> String {
    format!("{}:{}:docix:{}", ns, collection, primary_key)
}

/// Primary keys of live documents in a collection
pub fn document_ids_key(ns: &str, collection: &str) -> String {
    format!("{}:{}:ids", ns, collection)
}

//! Text tokenizer for indexing and queries
//!
//! Pipeline: UAX#29 word boundaries → remove non-alphanumeric → lowercase
//!           → drop empty tokens
//!
//! The same function runs on both sides, so a term indexed from a document
//! is always reachable by typing the same word in a query.

use std::collections::{HashMap, HashSet};
use unicode_segmentation::UnicodeSegmentation;

/// Tokenize text into searchable terms
///
/// # Example
///
/// ```
/// use typelite_engine::search::tokenizer::tokenize;
///
/// let tokens = tokenize("Hello, World! It's 2024.");
/// assert_eq!(tokens, vec!["hello", "world", "its", "2024"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
        })
        .map(|w| w.to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Tokenize and deduplicate, keeping first occurrences in order
///
/// # Example
///
/// ```
/// use typelite_engine::search::tokenizer::tokenize_unique;
///
/// let tokens = tokenize_unique("red Red shoes RED");
/// assert_eq!(tokens, vec!["red", "shoes"]);
/// ```
pub fn tokenize_unique(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Count occurrences of each term, in first-occurrence order
pub fn term_frequencies(text: &str) -> Vec<(String, u32)> {
    let mut order: Vec<(String, u32)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for token in tokenize(text) {
        match positions.get(&token) {
            Some(&i) => order[i].1 += 1,
            None => {
                positions.insert(token.clone(), order.len());
                order.push((token, 1));
            }
        }
    }
    order
}

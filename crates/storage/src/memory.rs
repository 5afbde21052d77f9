//! In-process implementation of the store contract
//!
//! # Design
//!
//! - DashMap: sharded by key, each command takes only its key's shard lock
//! - One [`Entry`] per key: hash record, set, or sorted set
//! - Empty sets and sorted sets are removed, so `exists` reflects content
//!
//! Because every command runs inside a single DashMap entry guard, each
//! command is atomic for its key. `hash_put_if_absent` uses the entry API,
//! so two racing inserts of the same key see exactly one winner.

use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::{BTreeSet, HashMap};
use std::ops::Bound;
use typelite_core::{Store, StoreError, StoreResult};

/// A sorted set: member → score, with a lexical member index
#[derive(Debug, Clone, Default)]
pub struct SortedSet {
    scores: FxHashMap<String, f64>,
    members: BTreeSet<String>,
}

impl SortedSet {
    /// Insert or update a member
    pub fn insert(&mut self, member: &str, score: f64) {
        if self.scores.insert(member.to_string(), score).is_none() {
            self.members.insert(member.to_string());
        }
    }

    /// Remove a member, returning whether it was present
    pub fn remove(&mut self, member: &str) -> bool {
        if self.scores.remove(member).is_some() {
            self.members.remove(member);
            true
        } else {
            false
        }
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Members within `[min, max]`, ascending by score then member
    pub fn range_by_score(&self, min: f64, max: f64) -> Vec<(String, f64)> {
        let mut out: Vec<(String, f64)> = self
            .scores
            .iter()
            .filter(|(_, s)| **s >= min && **s <= max)
            .map(|(m, s)| (m.clone(), *s))
            .collect();
        out.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        out
    }

    /// Members starting with `prefix`, lexical order
    pub fn range_by_prefix(&self, prefix: &str, limit: Option<usize>) -> Vec<String> {
        let iter = self
            .members
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|m| m.starts_with(prefix))
            .cloned();
        match limit {
            Some(n) => iter.take(n).collect(),
            None => iter.collect(),
        }
    }
}

/// Structure stored under one key
#[derive(Debug, Clone)]
pub enum Entry {
    /// Field → value record
    Hash(FxHashMap<String, String>),
    /// Unordered unique members
    Set(FxHashSet<String>),
    /// Scored members
    SortedSet(SortedSet),
}

impl Entry {
    fn kind(&self) -> &'static str {
        match self {
            Entry::Hash(_) => "hash",
            Entry::Set(_) => "set",
            Entry::SortedSet(_) => "sorted set",
        }
    }
}

fn wrong_type(key: &str, expected: &'static str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
        expected,
    }
}

fn to_hash(fields: &[(String, String)]) -> FxHashMap<String, String> {
    fields.iter().cloned().collect()
}

/// Thread-safe in-memory store
///
/// # Example
///
/// ```
/// use typelite_core::Store;
/// use typelite_storage::MemoryStore;
///
/// let store = MemoryStore::new();
/// store.zset_add("tl:products:terms", "widget", 0.0).unwrap();
/// let terms = store.zset_range_by_lex_prefix("tl:products:terms", "wid", None).unwrap();
/// assert_eq!(terms, vec!["widget".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: DashMap<String, Entry>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// All keys starting with `prefix`, sorted
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .data
            .iter()
            .filter(|e| e.key().starts_with(prefix))
            .map(|e| e.key().clone())
            .collect();
        keys.sort();
        keys
    }

    /// Remove every key
    pub fn clear(&self) {
        self.data.clear();
    }
}

impl Store for MemoryStore {
    fn hash_put(&self, key: &str, fields: &[(String, String)]) -> StoreResult<()> {
        match self.data.entry(key.to_string()) {
            MapEntry::Occupied(mut e) => {
                if !matches!(e.get(), Entry::Hash(_)) {
                    return Err(wrong_type(key, "hash"));
                }
                e.insert(Entry::Hash(to_hash(fields)));
            }
            MapEntry::Vacant(e) => {
                e.insert(Entry::Hash(to_hash(fields)));
            }
        }
        Ok(())
    }

    fn hash_put_if_absent(&self, key: &str, fields: &[(String, String)]) -> StoreResult<bool> {
        match self.data.entry(key.to_string()) {
            MapEntry::Occupied(_) => Ok(false),
            MapEntry::Vacant(e) => {
                e.insert(Entry::Hash(to_hash(fields)));
                Ok(true)
            }
        }
    }

    fn hash_get_all(&self, key: &str) -> StoreResult<Option<HashMap<String, String>>> {
        match self.data.get(key) {
            None => Ok(None),
            Some(entry) => match entry.value() {
                Entry::Hash(h) => Ok(Some(
                    h.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                )),
                _ => Err(wrong_type(key, "hash")),
            },
        }
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        Ok(self.data.contains_key(key))
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        Ok(self.data.remove(key).is_some())
    }

    fn set_add(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut entry = self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Entry::Set(FxHashSet::default()));
        match entry.value_mut() {
            Entry::Set(s) => Ok(s.insert(member.to_string())),
            other => {
                tracing::debug!(target: "typelite::storage", key, found = other.kind(), "type mismatch");
                Err(wrong_type(key, "set"))
            }
        }
    }

    fn set_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        let removed = match self.data.get_mut(key) {
            None => return Ok(false),
            Some(mut entry) => match entry.value_mut() {
                Entry::Set(s) => s.remove(member),
                _ => return Err(wrong_type(key, "set")),
            },
        };
        self.data
            .remove_if(key, |_, e| matches!(e, Entry::Set(s) if s.is_empty()));
        Ok(removed)
    }

    fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        match self.data.get(key) {
            None => Ok(Vec::new()),
            Some(entry) => match entry.value() {
                Entry::Set(s) => Ok(s.iter().cloned().collect()),
                _ => Err(wrong_type(key, "set")),
            },
        }
    }

    fn zset_add(&self, key: &str, member: &str, score: f64) -> StoreResult<()> {
        let mut entry = self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Entry::SortedSet(SortedSet::default()));
        match entry.value_mut() {
            Entry::SortedSet(z) => {
                z.insert(member, score);
                Ok(())
            }
            _ => Err(wrong_type(key, "sorted set")),
        }
    }

    fn zset_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        let removed = match self.data.get_mut(key) {
            None => return Ok(false),
            Some(mut entry) => match entry.value_mut() {
                Entry::SortedSet(z) => z.remove(member),
                _ => return Err(wrong_type(key, "sorted set")),
            },
        };
        self.data
            .remove_if(key, |_, e| matches!(e, Entry::SortedSet(z) if z.is_empty()));
        Ok(removed)
    }

    fn zset_range_by_score(&self, key: &str, min: f64, max: f64) -> StoreResult<Vec<(String, f64)>> {
        match self.data.get(key) {
            None => Ok(Vec::new()),
            Some(entry) => match entry.value() {
                Entry::SortedSet(z) => Ok(z.range_by_score(min, max)),
                _ => Err(wrong_type(key, "sorted set")),
            },
        }
    }

    fn zset_range_by_lex_prefix(
        &self,
        key: &str,
        prefix: &str,
        limit: Option<usize>,
    ) -> StoreResult<Vec<String>> {
        match self.data.get(key) {
            None => Ok(Vec::new()),
            Some(entry) => match entry.value() {
                Entry::SortedSet(z) => Ok(z.range_by_prefix(prefix, limit)),
                _ => Err(wrong_type(key, "sorted set")),
            },
        }
    }
}

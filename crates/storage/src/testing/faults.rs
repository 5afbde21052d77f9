//! Fault injection for store-backed tests
//!
//! [`FaultyStore`] wraps any [`Store`] and fails selected commands with
//! [`StoreError::Backend`]. Rules match on the command kind and a key
//! substring, and can be limited to a number of firings, which makes it
//! possible to fail "the third posting write" or "every metadata write".
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use typelite_core::Store;
//! use typelite_storage::testing::{FaultRule, FaultyStore, StoreOp};
//! use typelite_storage::MemoryStore;
//!
//! let store = FaultyStore::new(Arc::new(MemoryStore::new()));
//! store.inject(FaultRule::on(StoreOp::ZsetAdd).matching(":terms").times(1));
//!
//! assert!(store.zset_add("tl:products:terms", "widget", 0.0).is_err());
//! assert!(store.zset_add("tl:products:terms", "widget", 0.0).is_ok());
//! ```

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use typelite_core::{Store, StoreError, StoreResult};

/// Store command kinds a fault can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// `hash_put`
    HashPut,
    /// `hash_put_if_absent`
    HashPutIfAbsent,
    /// `hash_get_all`
    HashGetAll,
    /// `exists`
    Exists,
    /// `delete`
    Delete,
    /// `set_add`
    SetAdd,
    /// `set_remove`
    SetRemove,
    /// `set_members`
    SetMembers,
    /// `zset_add`
    ZsetAdd,
    /// `zset_remove`
    ZsetRemove,
    /// `zset_range_by_score`
    ZsetRangeByScore,
    /// `zset_range_by_lex_prefix`
    ZsetRangeByLex,
}

impl StoreOp {
    /// Whether the command mutates the store
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            StoreOp::HashPut
                | StoreOp::HashPutIfAbsent
                | StoreOp::Delete
                | StoreOp::SetAdd
                | StoreOp::SetRemove
                | StoreOp::ZsetAdd
                | StoreOp::ZsetRemove
        )
    }
}

/// A single injected fault
#[derive(Debug, Clone, Default)]
pub struct FaultRule {
    /// Command to fail; `None` matches every command
    pub op: Option<StoreOp>,
    /// Only keys containing this substring match
    pub key_substring: Option<String>,
    /// Remaining firings; `None` fires forever
    pub times: Option<usize>,
    /// Matching calls to let through before the first failure
    pub skip: usize,
}

impl FaultRule {
    /// Fail every call to `op`
    pub fn on(op: StoreOp) -> Self {
        FaultRule {
            op: Some(op),
            ..Default::default()
        }
    }

    /// Fail every command
    pub fn any() -> Self {
        FaultRule::default()
    }

    /// Restrict to keys containing `substring`
    pub fn matching(mut self, substring: impl Into<String>) -> Self {
        self.key_substring = Some(substring.into());
        self
    }

    /// Fire at most `n` times
    pub fn times(mut self, n: usize) -> Self {
        self.times = Some(n);
        self
    }

    /// Let the first `n` matching calls succeed
    pub fn after(mut self, n: usize) -> Self {
        self.skip = n;
        self
    }

    fn matches(&self, op: StoreOp, key: &str) -> bool {
        if self.op.is_some_and(|o| o != op) {
            return false;
        }
        match &self.key_substring {
            Some(s) => key.contains(s.as_str()),
            None => true,
        }
    }
}

/// Store wrapper that fails commands according to injected rules
pub struct FaultyStore {
    inner: Arc<dyn Store>,
    rules: Mutex<Vec<FaultRule>>,
    calls: Mutex<HashMap<StoreOp, u64>>,
    failures: AtomicU64,
}

impl FaultyStore {
    /// Wrap `inner` with no faults armed
    pub fn new(inner: Arc<dyn Store>) -> Self {
        FaultyStore {
            inner,
            rules: Mutex::new(Vec::new()),
            calls: Mutex::new(HashMap::new()),
            failures: AtomicU64::new(0),
        }
    }

    /// Arm a fault
    pub fn inject(&self, rule: FaultRule) {
        self.rules.lock().push(rule);
    }

    /// Disarm every fault
    pub fn clear_faults(&self) {
        self.rules.lock().clear();
    }

    /// Number of commands failed so far
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Number of calls seen for `op`, failed or not
    pub fn calls(&self, op: StoreOp) -> u64 {
        self.calls.lock().get(&op).copied().unwrap_or(0)
    }

    /// The wrapped store
    pub fn inner(&self) -> &Arc<dyn Store> {
        &self.inner
    }

    fn check(&self, op: StoreOp, key: &str) -> StoreResult<()> {
        *self.calls.lock().entry(op).or_insert(0) += 1;

        let mut rules = self.rules.lock();
        let Some(pos) = rules.iter().position(|r| r.matches(op, key)) else {
            return Ok(());
        };
        let rule = &mut rules[pos];
        if rule.skip > 0 {
            rule.skip -= 1;
            return Ok(());
        }
        if let Some(n) = rule.times.as_mut() {
            *n = n.saturating_sub(1);
            if *n == 0 {
                rules.remove(pos);
            }
        }
        self.failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(target: "typelite::storage", ?op, key, "injected fault");
        Err(StoreError::Backend(format!("injected fault on {:?} {}", op, key)))
    }
}

impl std::fmt::Debug for FaultyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultyStore")
            .field("rules", &self.rules.lock().len())
            .field("failures", &self.failures())
            .finish()
    }
}

impl Store for FaultyStore {
    fn hash_put(&self, key: &str, fields: &[(String, String)]) -> StoreResult<()> {
        self.check(StoreOp::HashPut, key)?;
        self.inner.hash_put(key, fields)
    }

    fn hash_put_if_absent(&self, key: &str, fields: &[(String, String)]) -> StoreResult<bool> {
        self.check(StoreOp::HashPutIfAbsent, key)?;
        self.inner.hash_put_if_absent(key, fields)
    }

    fn hash_get_all(&self, key: &str) -> StoreResult<Option<HashMap<String, String>>> {
        self.check(StoreOp::HashGetAll, key)?;
        self.inner.hash_get_all(key)
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        self.check(StoreOp::Exists, key)?;
        self.inner.exists(key)
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        self.check(StoreOp::Delete, key)?;
        self.inner.delete(key)
    }

    fn set_add(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.check(StoreOp::SetAdd, key)?;
        self.inner.set_add(key, member)
    }

    fn set_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.check(StoreOp::SetRemove, key)?;
        self.inner.set_remove(key, member)
    }

    fn set_members(&self, key: &str) -> StoreResult<Vec<String>> {
        self.check(StoreOp::SetMembers, key)?;
        self.inner.set_members(key)
    }

    fn zset_add(&self, key: &str, member: &str, score: f64) -> StoreResult<()> {
        self.check(StoreOp::ZsetAdd, key)?;
        self.inner.zset_add(key, member, score)
    }

    fn zset_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.check(StoreOp::ZsetRemove, key)?;
        self.inner.zset_remove(key, member)
    }

    fn zset_range_by_score(&self, key: &str, min: f64, max: f64) -> StoreResult<Vec<(String, f64)>> {
        self.check(StoreOp::ZsetRangeByScore, key)?;
        self.inner.zset_range_by_score(key, min, max)
    }

    fn zset_range_by_lex_prefix(
        &self,
        key: &str,
        prefix: &str,
        limit: Option<usize>,
    ) -> StoreResult<Vec<String>> {
        self.check(StoreOp::ZsetRangeByLex, key)?;
        self.inner.zset_range_by_lex_prefix(key, prefix, limit)
    }
}

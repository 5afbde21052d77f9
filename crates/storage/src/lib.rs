//! Storage backends for typelite
//!
//! This crate implements the [`Store`](typelite_core::Store) contract:
//! - MemoryStore: DashMap-sharded hashes, sets and sorted sets
//! - testing::FaultyStore: fault-injecting wrapper for failure-path tests
//!
//! # Concurrency
//!
//! `MemoryStore` locks one DashMap shard per command, so each command is
//! atomic for its key and unrelated keys never contend on a global lock.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;
pub mod testing;

pub use memory::{Entry, MemoryStore, SortedSet};

//! Testing utilities for code built on the store contract
//!
//! - **Faults**: [`FaultyStore`] wraps a store and fails chosen commands,
//!   for exercising storage-failure and partial-write paths
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use typelite_storage::testing::{FaultRule, FaultyStore, StoreOp};
//! use typelite_storage::MemoryStore;
//!
//! let store = FaultyStore::new(Arc::new(MemoryStore::new()));
//! store.inject(FaultRule::on(StoreOp::HashPutIfAbsent).matching(":collection:"));
//! ```

mod faults;

pub use faults::{FaultRule, FaultyStore, StoreOp};

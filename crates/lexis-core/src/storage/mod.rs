//! # Persistent Storage
//!
//! Disk-backed `ConceptStore` implementations.

mod redb_store;

pub use redb_store::RedbStore;

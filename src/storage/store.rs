//! Stores.
//!
//! A store is a storage backend that holds a hierarchy of groups and chunked datasets.

mod memory_store;
mod null_store;

pub use memory_store::MemoryStore;
pub use null_store::NullStore;

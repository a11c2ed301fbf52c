//! In-memory store backend for single-node and test use.

mod store;

pub use store::MemoryStore;

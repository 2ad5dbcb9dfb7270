//! Durable key-value collaborator shared by the rate limiter and the
//! delivery queue.
//!
//! The two consumers write under disjoint key prefixes (`rate_limit:` and
//! `msg_`), so no cross-component collisions are possible by construction.

pub mod error;
pub mod memory;
pub mod r#trait;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use r#trait::{KeyValueStore, PutOptions, Record};

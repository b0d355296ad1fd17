//! Storage backends for [`soma_core::StateStore`].
//!
//! - [`JsonFileStore`]: one pretty-printed JSON file per record key, written atomically
//! - [`InMemoryStore`]: a map, for tests and throwaway personas

mod file_store;
mod locks;
mod memory_store;

pub use file_store::JsonFileStore;
pub use locks::KeyedLocks;
pub use memory_store::InMemoryStore;

// Adapters layer: concrete implementations of the catalog and reading-list store ports.

pub mod json_store;
pub mod memory;

pub use json_store::JsonFileStore;
pub use memory::{InMemoryStore, StoreSnapshot};

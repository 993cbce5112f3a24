#![forbid(unsafe_code)]

mod store;

pub use store::{KeyValueStore, MemoryStore, NoopStore, SqliteStore};

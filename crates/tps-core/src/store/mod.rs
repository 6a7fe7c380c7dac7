//! Storage: registro durable append-only de steps y estado del modelo.

mod memory;
mod storage;

pub use memory::InMemoryStorage;
pub use storage::{expected_next, validate_payload, Storage};

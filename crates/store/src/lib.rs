mod backend;
mod errors;
mod file_backend;
mod in_memory;
mod store;

pub use backend::{validate_key, StorageBackend};
pub use errors::StoreError;
pub use file_backend::FileBackend;
pub use in_memory::InMemoryBackend;
pub use store::{AppendReceipt, JsonObject, LocalStore};

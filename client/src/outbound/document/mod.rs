//! Document-store binding and the process-local store.

mod binding;
mod memory_store;

pub use binding::DocumentStoreBinding;
pub use memory_store::InMemoryDocumentStore;

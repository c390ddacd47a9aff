//! Session storage adapters.

mod file_storage;

pub use file_storage::FileSessionStorage;

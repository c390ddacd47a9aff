//! Firestore outbound adapter.
//!
//! Implements the `DocumentStore` port over the Firestore REST v1 API. The
//! typed value codec lives in [`codec`] so it can be exercised on its own.

pub mod codec;
mod dto;
mod http_store;

pub use http_store::{DEFAULT_DATABASE_ID, FirestoreHttpStore, FirestoreSettings};

//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! Each adapter translates between domain types and one backend's wire
//! representation:
//!
//! - **rest**: reqwest-backed [`crate::domain::ports::ResourceBinding`] for
//!   the console's REST controllers
//! - **document**: resource binding over any document store, plus an
//!   in-memory store
//! - **firestore**: Firestore REST v1 document store
//! - **identity**: Identity Toolkit authenticator
//! - **storage**: file-backed session storage
//!
//! Adapters are thin translators. They contain no business logic and never
//! classify failures; that is the error normaliser's job.

pub mod document;
pub mod firestore;
pub mod identity;
pub mod rest;
pub mod storage;

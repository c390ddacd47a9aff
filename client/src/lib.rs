//! Ledger client library modules.
//!
//! The crate is laid out hexagonally: [`domain`] owns the access layer, the
//! error normaliser and the session store; [`outbound`] binds them to REST,
//! Firestore, the Identity Toolkit and local files; [`inbound`] drives them
//! from the `ledgerctl` command line. [`app`] wires the pieces together.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

pub mod app;
pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;

pub use app::{AppBuildError, ClientApp};
pub use config::ClientSettings;

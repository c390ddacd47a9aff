//! Inbound adapters that drive the domain services.
//!
//! The console's pages are the real driving side; [`cli`] stands in for them
//! so the access boundary can be exercised from a terminal.

pub mod cli;

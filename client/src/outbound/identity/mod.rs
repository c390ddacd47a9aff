//! Identity-provider authenticator.

mod identity_toolkit;

pub use identity_toolkit::{IdentityToolkitAuthenticator, IdentityToolkitSettings};

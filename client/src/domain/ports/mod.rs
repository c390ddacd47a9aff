//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod authenticator;
mod document_store;
mod navigator;
mod resource_binding;
mod session_storage;

#[cfg(test)]
pub use authenticator::MockAuthenticator;
pub use authenticator::{Authenticator, SignedIn};
#[cfg(test)]
pub use document_store::MockDocumentStore;
pub use document_store::{Document, DocumentStore, DocumentStoreError};
#[cfg(test)]
pub use navigator::MockNavigator;
pub use navigator::{LOGIN_ROUTE, Navigator, RecordingNavigator};
#[cfg(test)]
pub use resource_binding::MockResourceBinding;
pub use resource_binding::{FixtureResourceBinding, ResourceBinding};
#[cfg(test)]
pub use session_storage::MockSessionStorage;
pub use session_storage::{InMemorySessionStorage, SessionStorage, SessionStorageError};

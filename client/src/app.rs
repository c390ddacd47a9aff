//! Composition root: wires settings, adapters and domain services together.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use crate::config::{BindingKind, ClientSettings, ConfigError};
use crate::domain::ports::{
    Authenticator, Navigator, ResourceBinding, SessionStorage, SessionStorageError,
};
use crate::domain::{
    AccessLayer, ApiError, ApiResult, ApiService, AuthService, ErrorNormalizer, ResourceName,
    RestAuthenticator, SessionContext, SessionError,
};
use crate::outbound::document::{DocumentStoreBinding, InMemoryDocumentStore};
use crate::outbound::firestore::FirestoreHttpStore;
use crate::outbound::identity::IdentityToolkitAuthenticator;
use crate::outbound::rest::RestBinding;
use crate::outbound::storage::FileSessionStorage;

/// Errors raised while assembling a [`ClientApp`].
#[derive(Debug, thiserror::Error)]
pub enum AppBuildError {
    /// A setting was invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Session storage could not be opened.
    #[error(transparent)]
    Storage(#[from] SessionStorageError),
    /// The persisted session could not be restored.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// An HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
    /// A service could not be created.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Everything a console front end needs: the session, the access layer and
/// the authentication flows, all sharing one credential slot.
#[derive(Debug, Clone)]
pub struct ClientApp {
    session: SessionContext,
    access: AccessLayer,
    auth: AuthService,
}

impl ClientApp {
    /// Build from settings with file-backed session storage and the system
    /// clock.
    ///
    /// # Errors
    ///
    /// Returns [`AppBuildError`] when a setting is invalid or an adapter
    /// cannot be constructed.
    pub fn build(
        settings: &ClientSettings,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, AppBuildError> {
        let storage = Arc::new(FileSessionStorage::open(&settings.session_file())?);
        Self::assemble(settings, storage, navigator, Arc::new(DefaultClock))
    }

    /// Build around caller-supplied storage and clock.
    ///
    /// A token already in storage is attached straight away, the way the
    /// console restores a session on page load.
    ///
    /// # Errors
    ///
    /// Returns [`AppBuildError`] when a setting is invalid or an adapter
    /// cannot be constructed.
    pub fn assemble(
        settings: &ClientSettings,
        storage: Arc<dyn SessionStorage>,
        navigator: Arc<dyn Navigator>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AppBuildError> {
        let session = SessionContext::new(storage, clock);
        session.set_authorization_token()?;
        let binding = build_binding(settings, &session)?;
        let access = AccessLayer::new(binding, ErrorNormalizer::new(session.clone(), navigator));
        let authenticator: Arc<dyn Authenticator> = match settings.identity_settings()? {
            Some(identity) => Arc::new(IdentityToolkitAuthenticator::new(
                identity,
                settings.request_timeout(),
            )?),
            None => Arc::new(RestAuthenticator::new(&access)?),
        };
        let auth = AuthService::new(authenticator, session.clone());
        Ok(Self {
            session,
            access,
            auth,
        })
    }

    /// Shared session context.
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Shared access layer.
    pub fn access(&self) -> &AccessLayer {
        &self.access
    }

    /// Login, signup and logout flows.
    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Access service for a named resource.
    ///
    /// # Errors
    ///
    /// Returns a client error when `resource` is not a valid resource name.
    pub fn service(&self, resource: &str) -> ApiResult<ApiService> {
        let name = ResourceName::new(resource).map_err(|error| ApiError::client(error.to_string()))?;
        Ok(self.access.service(name))
    }
}

fn build_binding(
    settings: &ClientSettings,
    session: &SessionContext,
) -> Result<Arc<dyn ResourceBinding>, AppBuildError> {
    let timeout = settings.request_timeout();
    let credentials = session.credentials().clone();
    Ok(match settings.binding()? {
        BindingKind::Rest => Arc::new(RestBinding::with_timeout(
            settings.base_url()?,
            credentials,
            timeout,
        )?),
        BindingKind::Firestore => {
            let store =
                FirestoreHttpStore::new(settings.firestore_settings()?, credentials, timeout)?;
            Arc::new(DocumentStoreBinding::new(Arc::new(store)))
        }
        BindingKind::Memory => Arc::new(DocumentStoreBinding::new(Arc::new(
            InMemoryDocumentStore::new(),
        ))),
    })
}

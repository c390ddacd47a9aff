//! Client configuration loaded via OrthoConfig.
//!
//! Values come from `LEDGER_CLIENT_*` environment variables and the
//! configuration file OrthoConfig discovers. Every field is optional; the
//! accessors below supply defaults and validate what was given.

use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::outbound::firestore::{DEFAULT_DATABASE_ID, FirestoreSettings};
use crate::outbound::identity::IdentityToolkitSettings;

/// REST backend used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://localhost:7258/api";
/// Firestore API root used when none is configured.
pub const DEFAULT_FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com/";
/// Identity Toolkit API root used when none is configured.
pub const DEFAULT_IDENTITY_ENDPOINT: &str = "https://identitytoolkit.googleapis.com/";
const DEFAULT_SESSION_FILE: &str = ".ledger/session.json";

/// Backend binding behind the access layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// REST controllers over HTTP.
    Rest,
    /// Firestore collections.
    Firestore,
    /// Process-local collections; nothing leaves the machine.
    Memory,
}

impl BindingKind {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(Self::Rest),
            "firestore" => Ok(Self::Firestore),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::UnknownBinding {
                value: raw.to_owned(),
            }),
        }
    }
}

/// Errors raised while interpreting configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A URL setting did not parse.
    #[error("{field} is not a valid URL: {message}")]
    InvalidUrl {
        /// Setting name.
        field: &'static str,
        /// Parser diagnostic.
        message: String,
    },
    /// The binding name is not recognised.
    #[error("unknown binding `{value}`; expected rest, firestore or memory")]
    UnknownBinding {
        /// Configured value.
        value: String,
    },
    /// A setting required by the selected binding is absent.
    #[error("{field} must be set for the selected binding")]
    Missing {
        /// Setting name.
        field: &'static str,
    },
}

/// Configuration values for the console client.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LEDGER_CLIENT")]
pub struct ClientSettings {
    /// REST backend base URL.
    pub base_url: Option<String>,
    /// Backend binding: `rest`, `firestore` or `memory`.
    pub binding: Option<String>,
    /// Whole-request timeout in seconds. Unset means no client timeout.
    pub request_timeout_secs: Option<u64>,
    /// Session storage file.
    pub session_file: Option<PathBuf>,
    /// Firestore API root override.
    pub firestore_endpoint: Option<String>,
    /// Firestore project id.
    pub firestore_project: Option<String>,
    /// Firestore database id.
    pub firestore_database: Option<String>,
    /// Identity Toolkit API root override.
    pub identity_endpoint: Option<String>,
    /// Identity Toolkit web API key. Enables the identity-provider login.
    pub identity_api_key: Option<String>,
    /// Identity Platform tenant.
    pub identity_tenant: Option<String>,
}

impl ClientSettings {
    /// Configured binding, defaulting to REST.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownBinding`] for unrecognised names.
    pub fn binding(&self) -> Result<BindingKind, ConfigError> {
        self.binding
            .as_deref()
            .map_or(Ok(BindingKind::Rest), BindingKind::parse)
    }

    /// REST base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] when the value does not parse.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        parse_url(
            "base_url",
            self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
        )
    }

    /// Client timeout, if one is configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Session storage file, defaulting to `.ledger/session.json`.
    pub fn session_file(&self) -> PathBuf {
        self.session_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE))
    }

    /// Firestore location.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] without a project id and
    /// [`ConfigError::InvalidUrl`] for a malformed endpoint.
    pub fn firestore_settings(&self) -> Result<FirestoreSettings, ConfigError> {
        let project_id = non_blank(self.firestore_project.as_deref()).ok_or(
            ConfigError::Missing {
                field: "firestore_project",
            },
        )?;
        Ok(FirestoreSettings {
            endpoint: parse_url(
                "firestore_endpoint",
                self.firestore_endpoint
                    .as_deref()
                    .unwrap_or(DEFAULT_FIRESTORE_ENDPOINT),
            )?,
            project_id: project_id.to_owned(),
            database_id: non_blank(self.firestore_database.as_deref())
                .unwrap_or(DEFAULT_DATABASE_ID)
                .to_owned(),
        })
    }

    /// Identity provider settings, or `None` when no API key is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] for a malformed endpoint.
    pub fn identity_settings(&self) -> Result<Option<IdentityToolkitSettings>, ConfigError> {
        let Some(api_key) = non_blank(self.identity_api_key.as_deref()) else {
            return Ok(None);
        };
        Ok(Some(IdentityToolkitSettings {
            endpoint: parse_url(
                "identity_endpoint",
                self.identity_endpoint
                    .as_deref()
                    .unwrap_or(DEFAULT_IDENTITY_ENDPOINT),
            )?,
            api_key: api_key.to_owned(),
            tenant_id: non_blank(self.identity_tenant.as_deref()).map(str::to_owned),
        }))
    }
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|error| ConfigError::InvalidUrl {
        field,
        message: error.to_string(),
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

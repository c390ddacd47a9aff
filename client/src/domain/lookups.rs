//! Reference lists that every document form loads before it renders.

use futures_util::future::join3;
use serde_json::Value;
use tracing::warn;

use crate::domain::{AccessLayer, ApiError, ApiResult, ResourceName};

/// Collection holding customers and suppliers.
pub const CONTACTS_RESOURCE: &str = "contacts";
/// Collection holding currency settings.
pub const CURRENCIES_RESOURCE: &str = "CurrencySettings";
/// Collection holding stock and service items.
pub const ITEMS_RESOURCE: &str = "items";

/// Reference data for invoice, bill and quote forms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentLookups {
    /// Contacts available as customer or supplier.
    pub contacts: Vec<Value>,
    /// Currencies available on the document.
    pub currencies: Vec<Value>,
    /// Items available on line items.
    pub items: Vec<Value>,
}

/// Fetch contacts, currencies and items concurrently.
///
/// A list that fails to load becomes empty so the form still renders; the
/// failure has already been normalised (and logged) by the access layer.
pub async fn load_document_lookups(access: &AccessLayer) -> DocumentLookups {
    let (contacts, currencies, items) = join3(
        load_list(access, CONTACTS_RESOURCE),
        load_list(access, CURRENCIES_RESOURCE),
        load_list(access, ITEMS_RESOURCE),
    )
    .await;

    DocumentLookups {
        contacts,
        currencies,
        items,
    }
}

async fn load_list(access: &AccessLayer, name: &'static str) -> Vec<Value> {
    let result: ApiResult<Vec<Value>> = match ResourceName::new(name) {
        Ok(resource) => access.service(resource).list().await,
        Err(error) => Err(ApiError::client(error.to_string())),
    };
    result.unwrap_or_else(|error| {
        warn!(resource = name, %error, "lookup list unavailable; using an empty list");
        Vec::new()
    })
}

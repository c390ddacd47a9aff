//! Command-line driving adapter.
//!
//! Each subcommand maps onto one page action: sign in, read or write a
//! resource, load a form's lookups. Commands resolve to the JSON a page
//! would render, or to the normalised [`ApiError`] it would toast.

mod navigator;

pub use navigator::TracingNavigator;

use clap::{Args, Subcommand};
use serde_json::{Map, Value, json};
use zeroize::Zeroizing;

use crate::app::ClientApp;
use crate::domain::{
    ApiError, ApiResult, DocumentTotals, LineAmountType, LineItem, Registration, SessionClaims,
    SessionRecord, format_amount, load_document_lookups,
};

/// Record keys that hold line items on invoices, bills and quotes.
pub const LINE_ITEM_KEYS: [&str; 3] = ["invoiceItems", "billItems", "quotationItems"];

/// `ledgerctl` subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Sign in and persist the session.
    Login {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Account password.
        #[arg(long)]
        password: String,
    },
    /// Create an account.
    Signup(SignupArgs),
    /// Sign out and clear the session.
    Logout,
    /// Show the signed-in identity.
    Whoami,
    /// Read a collection, or one record when a sub-path is given.
    Get {
        /// Resource name, for example `Invoice`.
        resource: String,
        /// Record id or sub-path.
        sub_path: Option<String>,
    },
    /// Create a record.
    Post(WriteArgs),
    /// Replace a record.
    Put(WriteArgs),
    /// Delete a record by id.
    Delete {
        /// Resource name.
        resource: String,
        /// Record id.
        id: String,
        /// Sub-path placed before the id.
        #[arg(long)]
        path: Option<String>,
    },
    /// Load contacts, currencies and items for a document form.
    Lookups,
    /// Recompute `subTotal`, `totalTax` and `total` for a document record.
    Totals {
        /// Document record as JSON.
        record: String,
    },
}

/// Arguments shared by `post` and `put`.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct WriteArgs {
    /// Resource name.
    pub resource: String,
    /// Record body as JSON.
    pub body: String,
    /// Sub-path or action name.
    #[arg(long)]
    pub path: Option<String>,
}

/// Arguments for `signup`.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct SignupArgs {
    /// Given name.
    #[arg(long)]
    pub first_name: String,
    /// Family name.
    #[arg(long)]
    pub last_name: String,
    /// Email address.
    #[arg(long)]
    pub email: String,
    /// Country.
    #[arg(long)]
    pub location: String,
    /// Phone number.
    #[arg(long)]
    pub phone_number: String,
    /// Password.
    #[arg(long)]
    pub password: String,
    /// Password confirmation.
    #[arg(long)]
    pub re_password: String,
    /// Accept the terms and conditions.
    #[arg(long)]
    pub accept_terms: bool,
}

impl From<SignupArgs> for Registration {
    fn from(args: SignupArgs) -> Self {
        Self {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            location: args.location,
            phone_number: args.phone_number,
            password: Zeroizing::new(args.password),
            re_password: Zeroizing::new(args.re_password),
            terms_accepted: args.accept_terms,
        }
    }
}

/// Run one command against `app`.
pub async fn execute(app: &ClientApp, command: Command) -> ApiResult<Value> {
    match command {
        Command::Login { email, password } => {
            let claims = app.auth().login(&email, &password).await?;
            Ok(claims_json(&claims))
        }
        Command::Signup(args) => app.auth().register(&Registration::from(args)).await,
        Command::Logout => {
            app.auth().logout().await?;
            Ok(json!({"signedOut": true}))
        }
        Command::Whoami => whoami(app),
        Command::Get { resource, sub_path } => {
            app.service(&resource)?.get(sub_path.as_deref()).await
        }
        Command::Post(args) => {
            let body = parse_json(&args.body)?;
            app.service(&args.resource)?
                .post(body, args.path.as_deref())
                .await
        }
        Command::Put(args) => {
            let body = parse_json(&args.body)?;
            app.service(&args.resource)?
                .put(body, args.path.as_deref())
                .await
        }
        Command::Delete { resource, id, path } => {
            app.service(&resource)?.delete(id, path.as_deref()).await
        }
        Command::Lookups => {
            let lookups = load_document_lookups(app.access()).await;
            Ok(json!({
                "contacts": lookups.contacts,
                "currencies": lookups.currencies,
                "items": lookups.items,
            }))
        }
        Command::Totals { record } => recompute_totals(parse_json(&record)?),
    }
}

fn whoami(app: &ClientApp) -> ApiResult<Value> {
    let session = app.session();
    let Some(record) = session.snapshot()? else {
        return Ok(json!({"signedIn": false}));
    };
    Ok(record_json(&record, session.is_expired()?))
}

fn parse_json(raw: &str) -> ApiResult<Value> {
    serde_json::from_str(raw).map_err(|error| ApiError::client(format!("invalid JSON: {error}")))
}

fn claims_json(claims: &SessionClaims) -> Value {
    json!({
        "userId": claims.user_id,
        "tenantId": claims.tenant_id,
        "role": claims.role,
        "firstName": claims.first_name,
        "lastName": claims.last_name,
        "email": claims.email,
        "expiresAt": claims.expires_at.map(|at| at.to_rfc3339()),
    })
}

fn record_json(record: &SessionRecord, expired: bool) -> Value {
    json!({
        "signedIn": true,
        "expired": expired,
        "userId": record.user_id,
        "tenantId": record.tenant_id,
        "role": record.role,
        "displayName": record.display_name(),
        "email": record.email,
        "profilePicture": record.profile_picture,
    })
}

/// Apply [`DocumentTotals`] to a document record and add display strings.
fn recompute_totals(mut record: Value) -> ApiResult<Value> {
    let Value::Object(fields) = &record else {
        return Err(ApiError::client("document record must be a JSON object"));
    };
    let lines = LINE_ITEM_KEYS
        .iter()
        .find_map(|key| fields.get(*key))
        .cloned()
        .unwrap_or_else(|| Value::Array(Vec::new()));
    let items: Vec<LineItem> = serde_json::from_value(lines)
        .map_err(|error| ApiError::client(format!("invalid line items: {error}")))?;
    let totals = DocumentTotals::compute(&items, LineAmountType::from_record(&record));
    totals.apply_to(&mut record);

    let mut display = Map::new();
    display.insert("subTotal".to_owned(), json!(format_amount(totals.sub_total)));
    display.insert("totalTax".to_owned(), json!(format_amount(totals.total_tax)));
    display.insert("total".to_owned(), json!(format_amount(totals.total)));
    Ok(json!({"record": record, "display": display}))
}

#[cfg(test)]
mod tests {
    //! Command dispatch over the in-memory binding.

    use std::sync::Arc;

    use clap::Parser;
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::config::ClientSettings;
    use crate::domain::FailureKind;
    use crate::domain::ports::{InMemorySessionStorage, RecordingNavigator};

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(subcommand)]
        command: Command,
    }

    fn parse(args: &[&str]) -> Command {
        Harness::try_parse_from(std::iter::once("ledgerctl").chain(args.iter().copied()))
            .expect("arguments parse")
            .command
    }

    #[fixture]
    fn app() -> ClientApp {
        let settings = ClientSettings {
            binding: Some("memory".to_owned()),
            ..ClientSettings::default()
        };
        ClientApp::assemble(
            &settings,
            Arc::new(InMemorySessionStorage::new()),
            Arc::new(RecordingNavigator::new()),
            Arc::new(DefaultClock),
        )
        .expect("app assembles")
    }

    #[rstest]
    #[tokio::test]
    async fn writes_then_reads_records(app: ClientApp) {
        execute(&app, parse(&["post", "items", r#"{"id":"I-1","name":"Widget"}"#]))
            .await
            .expect("post");
        let record = execute(&app, parse(&["get", "items", "I-1"]))
            .await
            .expect("get");
        assert_eq!(record, json!({"id": "I-1", "name": "Widget"}));

        let removed = execute(&app, parse(&["delete", "items", "I-1"]))
            .await
            .expect("delete");
        assert_eq!(removed, json!({"id": "I-1", "deleted": true}));
    }

    #[rstest]
    #[tokio::test]
    async fn malformed_bodies_are_client_errors(app: ClientApp) {
        let error = execute(&app, parse(&["post", "items", "{nope"]))
            .await
            .expect_err("invalid JSON");
        assert_eq!(error.kind(), FailureKind::Client);
    }

    #[rstest]
    #[tokio::test]
    async fn anonymous_sessions_report_signed_out(app: ClientApp) {
        let whoami = execute(&app, Command::Whoami).await.expect("whoami");
        assert_eq!(whoami, json!({"signedIn": false}));
    }

    #[rstest]
    #[tokio::test]
    async fn lookups_list_every_collection(app: ClientApp) {
        execute(&app, parse(&["post", "contacts", r#"{"id":"C-1"}"#]))
            .await
            .expect("post");
        let lookups = execute(&app, Command::Lookups).await.expect("lookups");
        assert_eq!(lookups["contacts"], json!([{"id": "C-1"}]));
        assert_eq!(lookups["items"], json!([]));
    }

    #[test]
    fn totals_use_the_form_line_items() {
        let record = json!({
            "lineAmountType": 2,
            "billItems": [{"qty": 4, "price": 250, "taxRate": 15}],
        });
        let result = recompute_totals(record).expect("totals");
        assert_eq!(result["record"]["total"], json!(1150.0));
        assert_eq!(result["display"]["total"], "1,150.00");
        assert_eq!(result["display"]["totalTax"], "150.00");
    }

    #[test]
    fn signup_arguments_build_registrations() {
        let Command::Signup(args) = parse(&[
            "signup",
            "--first-name",
            "Ada",
            "--last-name",
            "Lovelace",
            "--email",
            "ada@example.com",
            "--location",
            "Ireland",
            "--phone-number",
            "555",
            "--password",
            "engine",
            "--re-password",
            "engine",
            "--accept-terms",
        ]) else {
            panic!("expected signup");
        };
        let registration = Registration::from(args);
        assert_eq!(registration.validate(), Ok(()));
    }
}

//! Whole-file coverage for the layering lint.

use std::path::PathBuf;

use rstest::rstest;

use super::*;

fn source(file: &str, contents: &str) -> LintSource {
    LintSource {
        file: PathBuf::from(file),
        contents: contents.to_owned(),
    }
}

fn violations_of(file: &str, contents: &str) -> Vec<Violation> {
    match lint_sources(&[source(file, contents)]) {
        Ok(()) => Vec::new(),
        Err(ArchitectureLintError::Violations(found)) => found,
        Err(other) => panic!("expected violations, got: {other:?}"),
    }
}

#[rstest]
#[case::cli_navigator(
    "inbound/cli/navigator.rs",
    "use tracing::warn;\nuse crate::domain::ports::Navigator;\npub struct Log;\n"
)]
#[case::cli_reaches_app("inbound/cli/mod.rs", "use clap::Subcommand;\nuse crate::app::ClientApp;\n")]
#[case::firestore_siblings(
    "outbound/firestore/http_store.rs",
    "use reqwest::Client;\nuse super::codec::encode_fields;\nuse crate::domain::ports::DocumentStore;\n"
)]
#[case::storage_owns_cap_std("outbound/storage/file_storage.rs", "use cap_std::fs::Dir;\n")]
#[case::ports_use_domain_types(
    "domain/ports/resource_binding.rs",
    "use crate::domain::{ApiRequest, Method, RequestFailure};\n"
)]
#[case::test_modules_are_exempt(
    "inbound/cli/mod.rs",
    "#[cfg(test)]\nmod tests {\n    use crate::config::ClientSettings;\n}\n"
)]
#[case::tests_files_are_exempt(
    "domain/access/tests.rs",
    "use crate::outbound::rest::RestBinding;\n"
)]
#[case::composition_root_is_exempt(
    "app.rs",
    "use crate::outbound::rest::RestBinding;\nuse reqwest::Error;\n"
)]
fn layered_sources_pass(#[case] file: &str, #[case] contents: &str) {
    assert_eq!(violations_of(file, contents), Vec::new());
}

#[rstest]
#[case::domain_reaches_adapter(
    "domain/access.rs",
    "use serde_json::Value;\nuse crate::outbound::rest::RestBinding;\n",
    2,
    "domain must not depend on crate::outbound"
)]
#[case::domain_reaches_settings(
    "domain/session_context.rs",
    "fn timeout() { let _ = crate::config::ClientSettings::default(); }\n",
    1,
    "domain must not depend on crate::config"
)]
#[case::ports_reach_services(
    "domain/ports/authenticator.rs",
    "use crate::domain::auth_service::AuthService;\n",
    1,
    "domain::ports must not depend on crate::domain::auth_service"
)]
#[case::cli_reaches_settings(
    "inbound/cli/mod.rs",
    "use crate::app::ClientApp;\nuse crate::config::ClientSettings;\n",
    2,
    "inbound::cli may only depend on itself and crate::domain, crate::app"
)]
#[case::cli_reaches_outbound_by_crate_name(
    "inbound/cli/mod.rs",
    "use ledger_client::outbound::rest::RestBinding;\n",
    1,
    "not crate::outbound::rest::RestBinding"
)]
#[case::adapters_reach_each_other(
    "outbound/firestore/http_store.rs",
    "use super::super::document::DocumentStoreBinding;\n",
    1,
    "outbound::firestore may only depend on itself and crate::domain"
)]
#[case::document_binding_uses_http(
    "outbound/document/binding.rs",
    "fn send() { let _ = reqwest::Client::new(); }\n",
    1,
    "external crate `reqwest` is confined to outbound::rest, outbound::firestore, outbound::identity"
)]
#[case::cli_uses_http("inbound/cli/navigator.rs", "use reqwest::Url;\n", 1, "`reqwest` is confined")]
#[case::domain_uses_filesystem(
    "domain/session_context.rs",
    "use cap_std::fs::Dir;\n",
    1,
    "`cap_std` is confined to outbound::storage"
)]
#[case::adapter_installs_subscriber(
    "outbound/rest/http_binding.rs",
    "\n\nfn init() { tracing_subscriber::fmt::init(); }\n",
    3,
    "`tracing_subscriber` belongs to the composition root"
)]
fn broken_rules_are_reported_with_lines(
    #[case] file: &str,
    #[case] contents: &str,
    #[case] line: usize,
    #[case] expected: &str,
) {
    let found = violations_of(file, contents);
    assert!(
        found.iter().any(|violation| violation.file == PathBuf::from(file)
            && violation.line == line
            && violation.message.contains(expected)),
        "expected `{expected}` at line {line}, got: {found:?}"
    );
}

#[test]
fn repeated_paths_are_reported_once_at_their_first_line() {
    let found = violations_of(
        "domain/access.rs",
        "use crate::outbound::rest::RestBinding;\nuse crate::outbound::storage::FileSessionStorage;\n",
    );
    assert_eq!(found.len(), 1, "{found:?}");
    assert_eq!(found.first().map(|violation| violation.line), Some(1));
}

#[test]
fn files_outside_every_layer_are_refused() {
    let result = lint_sources(&[source("util/strings.rs", "fn helper() {}")]);
    assert!(
        matches!(result, Err(ArchitectureLintError::Unclassified { .. })),
        "{result:?}"
    );
}

#[test]
fn unparsable_files_name_the_file() {
    let result = lint_sources(&[source("domain/totals.rs", "fn broken( {")]);
    let Err(ArchitectureLintError::Parse { file, .. }) = &result else {
        panic!("expected a parse failure, got: {result:?}");
    };
    assert_eq!(file, &PathBuf::from("domain/totals.rs"));
}

#[test]
fn reports_group_violations_by_file() {
    let err = lint_sources(&[
        source("domain/access.rs", "use reqwest::Client;\n"),
        source("inbound/cli/mod.rs", "\nuse crate::outbound::rest::RestBinding;\n"),
    ])
    .expect_err("two files break rules");
    let report = err.to_string();
    assert!(report.starts_with("2 layering violation(s) in 2 file(s):"), "{report}");
    assert!(report.contains("\n  domain/access.rs\n    line 1: external crate `reqwest`"), "{report}");
    assert!(report.contains("\n  inbound/cli/mod.rs\n    line 2: inbound::cli may only"), "{report}");
}

//! Runs the layering lint over the client crate.
//!
//! Usage: `architecture-lint [CLIENT_DIR]`. Without an argument the `client/`
//! directory next to this tool's workspace is linted.

use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    let client_dir = env::args_os()
        .nth(1)
        .map_or_else(default_client_dir, PathBuf::from);
    let outcome = architecture_lint::lint_client_sources(&client_dir);

    let mut stderr = io::stderr().lock();
    match outcome {
        Ok(()) => {
            let _ = writeln!(stderr, "{}: layering ok", client_dir.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            let _ = writeln!(stderr, "{}: {err}", client_dir.display());
            ExitCode::FAILURE
        }
    }
}

/// `<workspace>/client`, found from this package's manifest directory.
fn default_client_dir() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .map(|dir| dir.join("client"))
        .find(|candidate| candidate.join("Cargo.toml").is_file())
        .unwrap_or_else(|| manifest_dir.join("../../client"))
}

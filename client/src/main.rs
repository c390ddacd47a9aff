//! `ledgerctl`: drive the ledger access layer from a terminal.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use ledger_client::ClientApp;
use ledger_client::config::ClientSettings;
use ledger_client::inbound::cli::{self, Command, TracingNavigator};
use ortho_config::OrthoConfig;
use serde_json::Value;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// `ledgerctl` arguments. Flags override `LEDGER_CLIENT_*` settings.
#[derive(Debug, Parser)]
#[command(name = "ledgerctl", about = "Ledger console access layer", version)]
struct Cli {
    /// REST backend base URL.
    #[arg(long, global = true, value_name = "url")]
    base_url: Option<String>,
    /// Backend binding: rest, firestore or memory.
    #[arg(long, global = true, value_name = "name")]
    binding: Option<String>,
    /// Session storage file.
    #[arg(long, global = true, value_name = "path")]
    session_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn apply_to(&self, settings: &mut ClientSettings) {
        if let Some(base_url) = &self.base_url {
            settings.base_url = Some(base_url.clone());
        }
        if let Some(binding) = &self.binding {
            settings.binding = Some(binding.clone());
        }
        if let Some(path) = &self.session_file {
            settings.session_file = Some(path.clone());
        }
    }
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(std::io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let cli = Cli::parse();
    let mut settings = ClientSettings::load_from_iter([OsString::from("ledgerctl")])
        .wrap_err("failed to load ledger client settings")?;
    cli.apply_to(&mut settings);

    let app = ClientApp::build(&settings, Arc::new(TracingNavigator))
        .wrap_err("failed to assemble ledger client")?;
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;

    match runtime.block_on(cli::execute(&app, cli.command)) {
        Ok(value) => {
            print_json(&value)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            print_json(&serde_json::to_value(&error)?)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

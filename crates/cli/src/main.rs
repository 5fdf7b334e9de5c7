//! CertLedger operator command line interface
//!
//! Runs one ledger operation per invocation against a JSON state file.

mod commands;
mod config;
mod state;

use anyhow::Result;
use certledger_entitlements::{CredentialLedger, LedgerEnv, PauseSwitch};
use certledger_types::Principal;
use clap::Parser;
use crate::commands::{execute, Commands};
use crate::config::AppConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "certledger")]
#[command(about = "CertLedger credential and entitlement ledger", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Principal the operation is performed as
    #[arg(long = "as", value_name = "PRINCIPAL", global = true)]
    caller: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    init_logging(&config);

    // Held until exit so load, execute and save form one critical section
    let _lock = state::StateLock::acquire(&config.state_path)?;
    let snapshot = state::load_snapshot(&config.state_path, &config.ledger)?;
    let env = LedgerEnv::new(
        Arc::new(config.role_table()),
        Arc::new(PauseSwitch::new(config.paused)),
    );
    let ledger = CredentialLedger::from_snapshot(config.ledger.clone(), env, snapshot)?;

    let caller = cli.caller.map(Principal::new);
    debug!(caller = ?caller, command = ?cli.command, "Executing command");
    let outcome = execute(&ledger, caller.as_ref(), cli.command)?;

    if outcome.mutated {
        state::save_snapshot(&config.state_path, &ledger.snapshot())?;
        info!(path = %config.state_path.display(), "Ledger state updated");
    }
    println!("{}", serde_json::to_string_pretty(&outcome.output)?);
    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    }
}

//! CLI entry point for keychaineditor.
//!
//! Without a command the whole keychain is printed as JSON. Subcommands
//! search, add, edit, and delete individual items.

mod cli;
mod commands;
mod config;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use keychaineditor_core::{ItemStore, platform_store};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::Outcome;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let app_config = config::load(cli.config.as_deref())?;
    let level = cli
        .log_level
        .as_deref()
        .or(app_config.log_level.as_deref())
        .unwrap_or(config::DEFAULT_LOG_LEVEL);
    init_tracing(level);
    debug!(config = ?app_config.store, "configuration loaded");

    let store_config = &app_config.store;
    let outcome = match cli.command {
        Some(Commands::Version) => {
            println!("{}", commands::version());
            return Ok(ExitCode::SUCCESS);
        }
        None => {
            let store = open_store()?;
            println!("{}", commands::dump(store.as_ref(), store_config)?);
            return Ok(ExitCode::SUCCESS);
        }
        Some(Commands::Search { query }) => {
            let store = open_store()?;
            println!("{}", commands::find(store.as_ref(), store_config, &query)?);
            return Ok(ExitCode::SUCCESS);
        }
        Some(Commands::Edit { target, data }) => {
            commands::edit(open_store()?.as_ref(), store_config, &target, &data)?
        }
        Some(Commands::Delete { target }) => {
            commands::delete(open_store()?.as_ref(), store_config, &target)?
        }
        Some(Commands::Add {
            target,
            data,
            protection,
        }) => commands::add(
            open_store()?.as_ref(),
            store_config,
            &target,
            &data,
            &protection,
        )?,
    };

    Ok(report(outcome))
}

fn open_store() -> Result<Box<dyn ItemStore>> {
    platform_store().context("cannot open the keychain")
}

fn report(outcome: Outcome) -> ExitCode {
    println!("{}", outcome.message);
    if outcome.success {
        ExitCode::SUCCESS
    } else {
        warn!(message = %outcome.message, "keychain rejected the operation");
        ExitCode::FAILURE
    }
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Install a stderr subscriber so that stdout carries only command output.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

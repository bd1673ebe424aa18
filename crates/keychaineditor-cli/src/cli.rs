//! CLI argument definitions for keychaineditor.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands. Each subcommand also answers to a single-letter
//! flag (`-f`, `-e`, `-d`, `-a`, `-v`) so the classic invocations keep
//! working.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// keychaineditor -- dump and edit keychain items.
#[derive(Parser, Debug)]
#[command(
    name = "keychaineditor",
    about = "Dump, search, add, edit, and delete keychain items",
    long_about = "Dumps keychain items as JSON when run without a command.\n\n\
                  Account and Service names identify an item; an optional access \
                  group narrows the match. If an item has no account name, pass an \
                  empty string. Search is case-insensitive over Account, Service, \
                  Access Group, and Protection.",
    after_help = "EXAMPLES:\n  \
                  Dump the entire keychain:  keychaineditor\n  \
                  Limit dump by searching:   keychaineditor -f 'test'\n  \
                  Edit a keychain item:      keychaineditor -e --account 'TestAccount' --service 'TestService' --data 'TestData'\n  \
                  Delete a keychain item:    keychaineditor -d --account 'TestAccount' --service 'TestService'",
    disable_version_flag = true
)]
pub struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log level filter (overridden by RUST_LOG).
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the program version.
    #[command(short_flag = 'v')]
    Version,

    /// Dump only the items matching a query.
    #[command(short_flag = 'f')]
    Search {
        /// Case-insensitive substring to look for.
        query: String,
    },

    /// Replace the data of an existing item.
    #[command(short_flag = 'e')]
    Edit {
        #[command(flatten)]
        target: Target,

        /// New item data. Base64 input is decoded when it yields text.
        #[arg(long)]
        data: String,
    },

    /// Delete an item.
    #[command(short_flag = 'd')]
    Delete {
        #[command(flatten)]
        target: Target,
    },

    /// Add a new item.
    #[command(short_flag = 'a')]
    Add {
        #[command(flatten)]
        target: Target,

        /// Item data. Base64 input is decoded when it yields text.
        #[arg(long)]
        data: String,

        /// Accessibility class, as a short code (`ak`) or constant name.
        #[arg(long, default_value = "ak")]
        protection: String,
    },
}

/// Identifies the item a mutation applies to.
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// Account name (may be empty).
    #[arg(long)]
    pub account: String,

    /// Service name.
    #[arg(long)]
    pub service: String,

    /// Access group.
    #[arg(long)]
    pub agroup: Option<String>,
}

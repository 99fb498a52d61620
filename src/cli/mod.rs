//! Command-line interface.

mod commands;

use clap::{Parser, Subcommand};

/// Household tracker for who is watching which streaming show.
#[derive(Parser)]
#[command(name = "showtracker")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server (default)
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Print an Argon2id hash for `auth.password_hash`
    HashPassword {
        /// The shared household password
        password: String,
    },

    /// Print the dashboard
    #[command(alias = "ls")]
    List,
}

pub use commands::*;

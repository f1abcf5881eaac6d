use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Casefile - domain package import and type registry
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub(crate) struct Cli {
    /// Configuration file (default: ./casefile.toml when present)
    #[arg(long, short, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Import a domain package archive
    ///
    /// The archive's top-level folder names the domain. Flat archives need `--name`.
    Import {
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,

        /// Domain folder name for archives without a top-level folder
        #[arg(long, short)]
        name: Option<String>,
    },

    /// List registered domains
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Append a domain to the activation order
    Activate { key: String },

    /// Remove a domain from the activation order
    Deactivate { key: String },

    /// Delete a domain and its cached data
    Delete { key: String },

    /// Print the active configuration, or one resolved type
    Show {
        /// Bare or domain-qualified type name
        #[arg(value_name = "TYPE")]
        name: Option<String>,
    },

    /// Refresh domains from a manifest directory
    Sync {
        #[arg(value_name = "DIRECTORY")]
        directory: PathBuf,

        /// Invalidate the cache and re-fetch every listed domain
        #[arg(long, short)]
        force: bool,
    },
}

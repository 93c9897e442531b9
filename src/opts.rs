use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about = "Manage the SQHeaven PostgreSQL container")]
pub struct Opts {
    /// Configuration file (defaults to `config/default` when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check the engine, the container and its image
    Status,
    /// Build the image with compose
    Build,
    /// Start the container and wait for PostgreSQL
    Start,
    /// Stop the container
    Stop,
    /// Run a command inside the container
    Exec {
        /// Command and arguments, passed to the container as given
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Report whether the configured image exists locally
    ImageBuilt,
    /// Start the container, print the PostgreSQL version and check status
    Version,
}

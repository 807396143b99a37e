//! CLI command definitions
//!
//! Defines the clap commands for the probe CLI.

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Target server overrides, shared by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Server host (default: configured value, usually 127.0.0.1)
    #[arg(long)]
    pub host: Option<String>,

    /// Server port (default: configured value, usually 4120)
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Per-exchange timeout in seconds (0 disables the timeout)
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a liveness check
    Ping {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Submit source text for compilation
    Compile {
        /// File whose contents become the `code` field
        file: Option<PathBuf>,

        /// Inline source text instead of a file
        #[arg(long, conflicts_with = "file")]
        code: Option<String>,

        /// Pad the command with N numbered `code N` fields (stress payload)
        #[arg(long)]
        stress_fields: Option<usize>,

        /// Send the command over N concurrent connections
        #[arg(long, short = 'c', default_value = "1")]
        connections: usize,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Ask the server to terminate
    Shutdown {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Send an arbitrary command verb with free-form fields
    Send {
        /// The command verb (e.g. "ping")
        command: String,

        /// Extra fields as KEY=VALUE, repeatable
        #[arg(long = "field", short = 'f')]
        fields: Vec<String>,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Run a named built-in scenario or a YAML scenario file
    Scenario {
        /// Built-in scenario name or path to a YAML file
        name: Option<String>,

        /// List the built-in scenarios
        #[arg(long)]
        list: bool,

        /// Verbose step output
        #[arg(long, short)]
        verbose: bool,

        #[command(flatten)]
        target: TargetArgs,
    },
}

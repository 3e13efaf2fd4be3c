//! testflux command line interface.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// testflux - builds rule knowledge bases for test suites.
#[derive(Parser, Debug)]
#[command(name = "testflux")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file.
    #[arg(short, long, default_value = "testflux.toml")]
    pub config: PathBuf,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Writes a default configuration and an example suite manifest.
    Init {
        /// Target directory (default: current directory).
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Lists the rule files each declared test class resolves to.
    Resolve {
        /// Suite manifest.
        manifest: PathBuf,

        /// Only this test class.
        #[arg(long)]
        class: Option<String>,

        /// Print a JSON report.
        #[arg(long)]
        json: bool,
    },

    /// Builds the knowledge base of each declared test class.
    Build {
        /// Suite manifest.
        manifest: PathBuf,

        /// Only this test class.
        #[arg(long)]
        class: Option<String>,

        /// Print a JSON report.
        #[arg(long)]
        json: bool,
    },

    /// Shows the version.
    Version,
}

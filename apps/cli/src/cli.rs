//! Command line definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::ConnectionArgs;

#[derive(Debug, Parser)]
#[command(name = "mdanki")]
#[command(version, about = "Sync Markdown files to Anki via AnkiConnect.")]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check connection to Anki via AnkiConnect
    Status,

    /// Parse markdown files into cards
    Parse {
        /// Path to directory with markdown files
        path: PathBuf,

        /// Print the cards as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sync markdown files to Anki
    Sync {
        /// Path to directory with markdown files
        path: PathBuf,

        /// Preview changes without making them
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show detailed output
        #[arg(short, long)]
        verbose: bool,

        /// Delete notes in Anki that are no longer in markdown
        #[arg(long)]
        delete: bool,
    },
}

impl Cli {
    pub fn verbose(&self) -> bool {
        matches!(self.command, Commands::Sync { verbose: true, .. })
    }
}

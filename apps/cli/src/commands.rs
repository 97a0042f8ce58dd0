//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};

use mdanki_core::{scan_directory, sync, SyncOptions, SyncStats};

use crate::anki::AnkiConnect;
use crate::cli::{Cli, Commands};
use crate::config::Config;

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from(&cli.connection);
    match cli.command {
        Commands::Status => cmd_status(&config).await,
        Commands::Parse { path, json } => cmd_parse(&path, json),
        Commands::Sync {
            path,
            dry_run,
            delete,
            verbose: _,
        } => cmd_sync(&config, &path, SyncOptions { dry_run, delete }).await,
    }
}

async fn cmd_status(config: &Config) -> anyhow::Result<()> {
    let anki = AnkiConnect::new(config)?;
    let version = anki
        .version()
        .await
        .context("Cannot connect to Anki. Is it running with AnkiConnect?")?;
    println!("Connected to Anki (version {version})");
    Ok(())
}

fn cmd_parse(path: &Path, json: bool) -> anyhow::Result<()> {
    let path = resolve_dir(path)?;
    let cards = scan_directory(&path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cards)?);
        return Ok(());
    }

    println!("Parsed {} cards from {}", cards.len(), path.display());
    for card in &cards {
        println!(
            "{},{},{},{},{}",
            card.front_raw,
            card.back_raw,
            card.source_hash,
            card.source_file,
            card.deck()
        );
        println!("{}", "-".repeat(80));
    }
    Ok(())
}

async fn cmd_sync(config: &Config, path: &Path, options: SyncOptions) -> anyhow::Result<()> {
    let path = resolve_dir(path)?;
    let anki = AnkiConnect::new(config)?;

    if options.dry_run {
        println!("Dry run - no changes will be made\n");
    }

    let stats = sync(&path, &anki, options).await?;
    print_summary(&stats);
    Ok(())
}

fn print_summary(stats: &SyncStats) {
    println!("\nTotal: {}", stats.total);
    println!("Created: {}", stats.created);
    println!("Updated: {}", stats.updated);
    println!("Moved: {}", stats.moved);
    println!("Deleted: {}", stats.deleted);
    if !stats.errors.is_empty() {
        println!("Errors: {}", stats.errors.len());
        for err in &stats.errors {
            println!("  - {err}");
        }
    }
}

/// Absolute form of `path`; the directory name becomes the root deck.
fn resolve_dir(path: &Path) -> anyhow::Result<PathBuf> {
    match path.canonicalize() {
        Ok(resolved) if resolved.is_dir() => Ok(resolved),
        _ => bail!("Path is not a directory: {}", path.display()),
    }
}

//! One reconciliation pass: scan, snapshot, plan, apply, prune.

use std::path::Path;

use crate::apply::{apply, prune_empty_decks};
use crate::error::Result;
use crate::parser::{scan_root, SourceRoot};
use crate::reconcile::plan;
use crate::snapshot::fetch_existing;
use crate::store::NoteStore;
use crate::types::SyncStats;

/// Switches for a sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Count what would change without writing to Anki.
    pub dry_run: bool,
    /// Delete notes whose card disappeared from the markdown.
    pub delete: bool,
}

/// Bring Anki in line with the markdown tree at `root`.
///
/// The tree is scanned before Anki is contacted, so a bad path fails without
/// any remote call.
pub async fn sync<S>(root: &Path, store: &S, options: SyncOptions) -> Result<SyncStats>
where
    S: NoteStore + ?Sized,
{
    let root = SourceRoot::resolve(root)?;
    let cards = scan_root(&root)?;
    tracing::info!("Found {} cards in {}", cards.len(), root.path.display());

    if !options.dry_run {
        store.ensure_note_type().await?;
    }

    let existing = fetch_existing(store).await?;
    tracing::info!("Found {} existing notes in Anki", existing.len());

    let plan = plan(&cards, &existing, &root.name, options.delete);
    tracing::debug!(
        creates = plan.creates.len(),
        updates = plan.updates.len(),
        moves = plan.moves.len(),
        orphans = plan.orphans.len(),
        unchanged = plan.unchanged,
        "planned sync"
    );

    let stats = apply(store, &plan, options.dry_run).await?;

    if !options.dry_run && stats.touched_decks() {
        prune_empty_decks(store, &root.name).await?;
    }

    Ok(stats)
}

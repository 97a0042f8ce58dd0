//! Carry out a [`SyncPlan`] against a note store.

use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::reconcile::{PlannedCreate, SyncPlan};
use crate::store::{NoteQuery, NoteStore};
use crate::types::{preview, CardId, NoteId, SyncStats, DECK_SEPARATOR};

/// Result of creating one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(NoteId),
    /// Skipped because this is a dry run.
    Planned,
    Failed(String),
}

/// Execute `plan`, or only count it when `dry_run` is set.
///
/// A dry run issues no store calls at all. A create rejected by Anki is
/// recorded in `errors` and the pass continues; a connectivity failure
/// aborts it.
pub async fn apply<S>(store: &S, plan: &SyncPlan, dry_run: bool) -> Result<SyncStats, StoreError>
where
    S: NoteStore + ?Sized,
{
    let mut stats = SyncStats::default();

    if !dry_run {
        for deck in &plan.decks {
            store.create_deck(deck).await?;
        }
    }

    for planned in &plan.updates {
        tracing::info!("Updating: {}", planned.preview);
        if !dry_run {
            store.update_note(&planned.update).await?;
        }
        stats.updated += 1;
    }

    let mut moves: BTreeMap<&str, Vec<CardId>> = BTreeMap::new();
    for planned in &plan.moves {
        tracing::info!(
            note_id = planned.note_id,
            "Moving {} -> {}: {}",
            planned.from,
            planned.to,
            planned.preview
        );
        moves
            .entry(planned.to.as_str())
            .or_default()
            .extend(&planned.card_ids);
        stats.moved += 1;
    }
    if !dry_run {
        for (deck, card_ids) in moves {
            if card_ids.is_empty() {
                continue;
            }
            tracing::debug!(cards = card_ids.len(), "changing deck to {deck}");
            store.change_deck(&card_ids, deck).await?;
        }
    }

    for planned in &plan.creates {
        tracing::info!("Creating: {}", planned.preview);
        match create(store, planned, dry_run).await? {
            CreateOutcome::Created(note_id) => {
                tracing::debug!(note_id, "created note");
                stats.created += 1;
            }
            CreateOutcome::Planned => stats.created += 1,
            CreateOutcome::Failed(message) => stats.errors.push(message),
        }
    }

    if !plan.orphans.is_empty() {
        for note in &plan.orphans {
            tracing::info!("Deleting: {}", preview(&note.front));
        }
        if !dry_run {
            let note_ids: Vec<NoteId> = plan.orphans.iter().map(|n| n.note_id).collect();
            store.delete_notes(&note_ids).await?;
        }
        stats.deleted = plan.orphans.len();
    }

    stats.total = (plan.existing + stats.created).saturating_sub(stats.deleted);
    Ok(stats)
}

async fn create<S>(
    store: &S,
    planned: &PlannedCreate,
    dry_run: bool,
) -> Result<CreateOutcome, StoreError>
where
    S: NoteStore + ?Sized,
{
    if dry_run {
        return Ok(CreateOutcome::Planned);
    }
    match store.add_note(&planned.note).await {
        Ok(note_id) => Ok(CreateOutcome::Created(note_id)),
        Err(e) if e.is_connectivity() => Err(e),
        Err(e) => {
            tracing::warn!("create failed for '{}': {e}", planned.preview);
            Ok(CreateOutcome::Failed(format!(
                "Failed to create '{}': {e}",
                planned.preview
            )))
        }
    }
}

/// Delete decks under `root` that no longer hold any note.
///
/// Subdecks are visited deepest first so that removing a child can leave its
/// parent empty in the same pass; the root deck itself is checked last.
/// Returns the names of the removed decks.
pub async fn prune_empty_decks<S>(store: &S, root: &str) -> Result<Vec<String>, StoreError>
where
    S: NoteStore + ?Sized,
{
    let prefix = format!("{root}{DECK_SEPARATOR}");
    let mut subdecks: Vec<String> = store
        .deck_names()
        .await?
        .into_iter()
        .filter(|name| name.starts_with(&prefix))
        .collect();
    subdecks.sort_by(|a, b| depth(b).cmp(&depth(a)).then_with(|| a.cmp(b)));

    let mut removed = Vec::new();
    for deck in subdecks {
        if remove_if_empty(store, deck.clone()).await? {
            removed.push(deck);
        }
    }

    if store.deck_names().await?.iter().any(|name| name == root)
        && remove_if_empty(store, root.to_string()).await?
    {
        removed.push(root.to_string());
    }

    for deck in &removed {
        tracing::info!("Removed empty deck: {deck}");
    }
    Ok(removed)
}

async fn remove_if_empty<S>(store: &S, deck: String) -> Result<bool, StoreError>
where
    S: NoteStore + ?Sized,
{
    if !store.find_notes(&NoteQuery::deck(deck.as_str())).await?.is_empty() {
        return Ok(false);
    }
    store.delete_decks(&[deck]).await?;
    Ok(true)
}

fn depth(deck: &str) -> usize {
    deck.matches(DECK_SEPARATOR).count()
}

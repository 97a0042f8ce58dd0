//! Diff parsed cards against the Anki snapshot.
//!
//! Planning is pure: it renders fields and decides what to do, but never
//! touches the store. [`crate::apply`] carries the plan out.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::render::render_markdown;
use crate::snapshot::Snapshot;
use crate::store::{NewNote, NoteUpdate};
use crate::types::{preview, CardId, NoteId, RemoteNote, SourceCard};

/// A note that does not exist in Anki yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCreate {
    pub note: NewNote,
    pub preview: String,
}

/// A note whose rendered front or back changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpdate {
    pub update: NoteUpdate,
    pub preview: String,
}

/// A note whose cards belong in a different deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub note_id: NoteId,
    pub card_ids: Vec<CardId>,
    pub from: String,
    pub to: String,
    pub preview: String,
}

/// Everything one sync pass intends to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Notes in Anki before the pass.
    pub existing: usize,
    /// Decks the parsed cards live in.
    pub decks: BTreeSet<String>,
    pub creates: Vec<PlannedCreate>,
    pub updates: Vec<PlannedUpdate>,
    pub moves: Vec<PlannedMove>,
    /// Notes to delete; only filled when deletion was requested.
    pub orphans: Vec<RemoteNote>,
    pub unchanged: usize,
}

/// Classify every card as create, update, move or unchanged.
///
/// Update and move are independent: one card can need both. Orphans are
/// notes whose source file lies under `root_name` and whose hash no longer
/// appears in `cards`.
pub fn plan(
    cards: &[SourceCard],
    existing: &Snapshot,
    root_name: &str,
    delete: bool,
) -> SyncPlan {
    let mut plan = SyncPlan {
        existing: existing.len(),
        ..SyncPlan::default()
    };

    for card in collapse_duplicates(cards) {
        let deck = card.deck();
        plan.decks.insert(deck.clone());

        let front = render_markdown(&card.front_raw);
        let back = render_markdown(&card.back_raw);

        let Some(note) = existing.get(&card.source_hash) else {
            plan.creates.push(PlannedCreate {
                note: NewNote {
                    deck,
                    front,
                    back,
                    source_hash: card.source_hash.clone(),
                    source_file: card.source_file.clone(),
                },
                preview: card.preview(),
            });
            continue;
        };

        let content_changed = note.front != front || note.back != back;
        let deck_changed = note.deck != deck;

        if content_changed {
            plan.updates.push(PlannedUpdate {
                update: NoteUpdate {
                    note_id: note.note_id,
                    front,
                    back,
                    source_file: card.source_file.clone(),
                },
                preview: card.preview(),
            });
        }
        if deck_changed {
            plan.moves.push(PlannedMove {
                note_id: note.note_id,
                card_ids: note.card_ids.clone(),
                from: note.deck.clone(),
                to: deck,
                preview: card.preview(),
            });
        }
        if !content_changed && !deck_changed {
            plan.unchanged += 1;
        }
    }

    if delete {
        plan.orphans = find_orphans(cards, existing, root_name);
    }
    plan
}

/// Notes owned by this scan root whose card disappeared from the markdown.
pub fn find_orphans(
    cards: &[SourceCard],
    existing: &Snapshot,
    root_name: &str,
) -> Vec<RemoteNote> {
    let prefix = format!("{root_name}/");
    let hashes: HashSet<&str> = cards.iter().map(|c| c.source_hash.as_str()).collect();

    let mut orphans: Vec<RemoteNote> = existing
        .values()
        .filter(|note| note.source_file.starts_with(&prefix))
        .filter(|note| !hashes.contains(note.source_hash.as_str()))
        .cloned()
        .collect();
    orphans.sort_by_key(|note| note.note_id);
    orphans
}

/// One card per source hash, in first-seen order, carrying the content of the
/// last card seen with that hash.
///
/// Stats count one decision per hash. Two edited copies of an existing note
/// give one update here, not one per copy.
fn collapse_duplicates(cards: &[SourceCard]) -> Vec<&SourceCard> {
    let mut kept: Vec<&SourceCard> = Vec::with_capacity(cards.len());
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(cards.len());

    for card in cards {
        match index.get(card.source_hash.as_str()) {
            Some(&slot) => {
                tracing::warn!(
                    "duplicate heading '{}' in {} replaces the one in {}",
                    preview(&card.front_raw),
                    card.source_file,
                    kept[slot].source_file
                );
                kept[slot] = card;
            }
            None => {
                index.insert(card.source_hash.as_str(), kept.len());
                kept.push(card);
            }
        }
    }
    kept
}

//! Snapshot of the notes already in Anki.

use std::collections::HashMap;

use crate::error::StoreError;
use crate::store::{
    NoteInfo, NoteQuery, NoteStore, FIELD_BACK, FIELD_FRONT, FIELD_SOURCE_FILE,
    FIELD_SOURCE_HASH, NOTE_TYPE_NAME,
};
use crate::types::{CardId, RemoteNote, DEFAULT_DECK};

/// Existing mdanki notes keyed by source hash.
pub type Snapshot = HashMap<String, RemoteNote>;

/// Read every mdanki note together with the deck of its first card.
///
/// Three round trips regardless of note count. If two notes carry the same
/// source hash the one listed last wins.
pub async fn fetch_existing<S>(store: &S) -> Result<Snapshot, StoreError>
where
    S: NoteStore + ?Sized,
{
    let note_ids = store
        .find_notes(&NoteQuery::note_type(NOTE_TYPE_NAME))
        .await?;
    if note_ids.is_empty() {
        return Ok(Snapshot::new());
    }

    let notes = store.notes_info(&note_ids).await?;
    let card_ids: Vec<CardId> = notes.iter().flat_map(|n| n.cards.iter().copied()).collect();
    let card_decks: HashMap<CardId, String> = store
        .cards_info(&card_ids)
        .await?
        .into_iter()
        .map(|card| (card.card_id, card.deck_name))
        .collect();

    let mut existing = Snapshot::with_capacity(notes.len());
    for info in notes {
        let note = to_remote_note(info, &card_decks);
        if let Some(previous) = existing.insert(note.source_hash.clone(), note) {
            tracing::warn!(
                note_id = previous.note_id,
                "duplicate source hash {} in Anki, keeping the later note",
                previous.source_hash
            );
        }
    }
    Ok(existing)
}

fn to_remote_note(info: NoteInfo, card_decks: &HashMap<CardId, String>) -> RemoteNote {
    let deck = info
        .cards
        .first()
        .and_then(|card_id| card_decks.get(card_id))
        .cloned()
        .unwrap_or_else(|| DEFAULT_DECK.to_string());

    RemoteNote {
        note_id: info.note_id,
        source_hash: info.field(FIELD_SOURCE_HASH).to_string(),
        source_file: info.field(FIELD_SOURCE_FILE).to_string(),
        front: info.field(FIELD_FRONT).to_string(),
        back: info.field(FIELD_BACK).to_string(),
        card_ids: info.cards,
        deck,
    }
}

//! Core types shared by the scanner, reconciler and note stores.

use serde::Serialize;

/// Separator between deck hierarchy segments.
pub const DECK_SEPARATOR: &str = "::";

/// Deck reported for a note that has no cards.
pub const DEFAULT_DECK: &str = "Default";

/// Remote note identifier.
pub type NoteId = i64;

/// Remote card identifier.
pub type CardId = i64;

/// A card parsed from a markdown section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCard {
    pub front_raw: String,
    pub back_raw: String,
    /// Fingerprint of `front_raw`, see [`crate::identity::compute_hash`].
    pub source_hash: String,
    /// Deck hierarchy, scan root first.
    pub deck_path: Vec<String>,
    /// `<root name>/<relative path>` of the file the card came from.
    pub source_file: String,
}

impl SourceCard {
    /// Full deck name, segments joined with [`DECK_SEPARATOR`].
    pub fn deck(&self) -> String {
        self.deck_path.join(DECK_SEPARATOR)
    }

    /// Short front text used in log lines and error messages.
    pub fn preview(&self) -> String {
        preview(&self.front_raw)
    }
}

/// A note of the mdanki note type as currently stored in Anki.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteNote {
    pub note_id: NoteId,
    pub card_ids: Vec<CardId>,
    pub source_hash: String,
    pub source_file: String,
    /// Deck holding the note's first card.
    pub deck: String,
    /// Rendered HTML of the front field.
    pub front: String,
    /// Rendered HTML of the back field.
    pub back: String,
}

/// Outcome counters for one sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    /// Approximate note count after the pass: existing + created - deleted.
    pub total: usize,
    pub created: usize,
    pub updated: usize,
    pub moved: usize,
    pub deleted: usize,
    pub errors: Vec<String>,
}

impl SyncStats {
    /// Whether any move or delete happened, which may leave decks empty.
    pub fn touched_decks(&self) -> bool {
        self.moved > 0 || self.deleted > 0
    }
}

const PREVIEW_CHARS: usize = 50;

/// First 50 characters of `text`.
pub fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

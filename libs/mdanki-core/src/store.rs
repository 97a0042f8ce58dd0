//! The note store seam.
//!
//! The reconciler only talks to Anki through [`NoteStore`]. The CLI plugs in
//! an AnkiConnect client; tests plug in an in-memory store.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{CardId, NoteId};

/// Name of the note type owned by this tool.
pub const NOTE_TYPE_NAME: &str = "mdanki";

pub const FIELD_FRONT: &str = "Front";
pub const FIELD_BACK: &str = "Back";
pub const FIELD_SOURCE_HASH: &str = "SourceHash";
pub const FIELD_SOURCE_FILE: &str = "SourceFile";

/// Note type fields, in order.
pub const NOTE_FIELDS: [&str; 4] = [FIELD_FRONT, FIELD_BACK, FIELD_SOURCE_HASH, FIELD_SOURCE_FILE];

/// Card template name and sides for the note type.
pub const CARD_TEMPLATE_NAME: &str = "Card";
pub const CARD_TEMPLATE_FRONT: &str = "{{Front}}";
pub const CARD_TEMPLATE_BACK: &str = "{{FrontSide}}\n<hr id=answer>\n{{Back}}";

/// Search predicates understood by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteQuery {
    /// Every note of a note type.
    NoteType(String),
    /// Every note with a card in a deck or any of its subdecks.
    Deck(String),
}

impl NoteQuery {
    pub fn note_type(name: impl Into<String>) -> Self {
        Self::NoteType(name.into())
    }

    pub fn deck(name: impl Into<String>) -> Self {
        Self::Deck(name.into())
    }
}

/// Renders the query in Anki search syntax.
impl fmt::Display for NoteQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoteType(name) => write!(f, "note:{name}"),
            Self::Deck(name) => write!(f, "deck:\"{}\"", escape_search(name)),
        }
    }
}

/// Escape a value for a quoted Anki search term. `_` and `*` are wildcards
/// there and must match literally.
fn escape_search(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '_' | '*') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Field data of one stored note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteInfo {
    pub note_id: NoteId,
    pub cards: Vec<CardId>,
    pub fields: HashMap<String, String>,
}

impl NoteInfo {
    /// Value of a field, or an empty string when the note lacks it.
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map_or("", String::as_str)
    }
}

/// Deck assignment of one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardInfo {
    pub card_id: CardId,
    pub deck_name: String,
}

/// A note to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub deck: String,
    pub front: String,
    pub back: String,
    pub source_hash: String,
    pub source_file: String,
}

/// Replacement content for an existing note. The source hash never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteUpdate {
    pub note_id: NoteId,
    pub front: String,
    pub back: String,
    pub source_file: String,
}

/// Capabilities the reconciler needs from Anki.
///
/// Batch methods must accept empty input and do nothing in that case.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Register the mdanki note type if it does not exist yet.
    async fn ensure_note_type(&self) -> Result<(), StoreError>;

    async fn deck_names(&self) -> Result<Vec<String>, StoreError>;

    /// Create a deck; creating an existing deck is a no-op.
    async fn create_deck(&self, name: &str) -> Result<(), StoreError>;

    async fn find_notes(&self, query: &NoteQuery) -> Result<Vec<NoteId>, StoreError>;

    async fn notes_info(&self, note_ids: &[NoteId]) -> Result<Vec<NoteInfo>, StoreError>;

    async fn cards_info(&self, card_ids: &[CardId]) -> Result<Vec<CardInfo>, StoreError>;

    async fn add_note(&self, note: &NewNote) -> Result<NoteId, StoreError>;

    async fn update_note(&self, update: &NoteUpdate) -> Result<(), StoreError>;

    /// Move cards to `deck`.
    async fn change_deck(&self, card_ids: &[CardId], deck: &str) -> Result<(), StoreError>;

    async fn delete_notes(&self, note_ids: &[NoteId]) -> Result<(), StoreError>;

    /// Delete decks together with the cards they hold.
    async fn delete_decks(&self, names: &[String]) -> Result<(), StoreError>;
}

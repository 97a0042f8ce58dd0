//! Shared test utilities for sync integration tests.
//!
//! [`MemoryStore`] stands in for Anki. It follows the AnkiConnect behavior the
//! reconciler depends on:
//! - `deck:"X"` matches cards in `X` and in every subdeck of `X`
//! - creating or moving into `A::B` creates `A` as well
//! - deleting a deck deletes its subdecks and the cards inside
//!
//! Every mutating call is appended to a log so tests can assert that a dry
//! run wrote nothing.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use mdanki_core::store::{
    FIELD_BACK, FIELD_FRONT, FIELD_SOURCE_FILE, FIELD_SOURCE_HASH, NOTE_TYPE_NAME,
};
use mdanki_core::{
    CardId, CardInfo, NewNote, NoteId, NoteInfo, NoteQuery, NoteStore, NoteUpdate, StoreError,
    DECK_SEPARATOR, DEFAULT_DECK,
};

/// Back field of seeded notes; the rendering of the markdown body `seeded`.
pub const SEEDED_BACK: &str = "<p>seeded</p>\n";

#[derive(Debug, Clone)]
struct StoredNote {
    fields: HashMap<String, String>,
    cards: Vec<CardId>,
}

#[derive(Debug)]
struct State {
    has_note_type: bool,
    decks: BTreeSet<String>,
    notes: BTreeMap<NoteId, StoredNote>,
    card_decks: BTreeMap<CardId, String>,
    next_id: i64,
    mutations: Vec<String>,
    rejected_fronts: HashSet<String>,
    offline: bool,
    adds_offline: bool,
}

pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                has_note_type: false,
                decks: BTreeSet::from([DEFAULT_DECK.to_string()]),
                notes: BTreeMap::new(),
                card_decks: BTreeMap::new(),
                next_id: 1_000,
                mutations: Vec::new(),
                rejected_fronts: HashSet::new(),
                offline: false,
                adds_offline: false,
            }),
        }
    }

    /// Make `add_note` fail for notes whose rendered front contains `needle`.
    pub fn reject_front(&self, needle: &str) {
        self.lock().rejected_fronts.insert(needle.to_string());
    }

    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Make only `add_note` fail as if the connection dropped.
    pub fn set_adds_offline(&self, offline: bool) {
        self.lock().adds_offline = offline;
    }

    pub fn mutations(&self) -> Vec<String> {
        self.lock().mutations.clone()
    }

    pub fn decks(&self) -> Vec<String> {
        self.lock().decks.iter().cloned().collect()
    }

    pub fn has_deck(&self, name: &str) -> bool {
        self.lock().decks.contains(name)
    }

    pub fn note_count(&self) -> usize {
        self.lock().notes.len()
    }

    /// Source hashes of notes whose first card sits exactly in `deck`.
    pub fn hashes_in_deck(&self, deck: &str) -> Vec<String> {
        let state = self.lock();
        state
            .notes
            .values()
            .filter(|note| {
                note.cards
                    .first()
                    .and_then(|card| state.card_decks.get(card))
                    .is_some_and(|d| d == deck)
            })
            .map(|note| note.fields[FIELD_SOURCE_HASH].clone())
            .collect()
    }

    /// Insert a note directly, bypassing the sync code.
    pub fn seed_note(
        &self,
        deck: &str,
        front: &str,
        source_hash: &str,
        source_file: &str,
    ) -> NoteId {
        let mut state = self.lock();
        add_deck(&mut state.decks, deck);
        let note_id = state.bump();
        let card_id = state.bump();
        state.card_decks.insert(card_id, deck.to_string());
        state.notes.insert(
            note_id,
            StoredNote {
                fields: fields(front, SEEDED_BACK, source_hash, source_file),
                cards: vec![card_id],
            },
        );
        note_id
    }

    /// Insert a note that has no cards, so it sits in no deck.
    pub fn seed_cardless_note(&self, front: &str, source_hash: &str, source_file: &str) -> NoteId {
        let mut state = self.lock();
        let note_id = state.bump();
        state.notes.insert(
            note_id,
            StoredNote {
                fields: fields(front, SEEDED_BACK, source_hash, source_file),
                cards: Vec::new(),
            },
        );
        note_id
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn connected(&self) -> Result<std::sync::MutexGuard<'_, State>, StoreError> {
        let state = self.lock();
        if state.offline {
            return Err(StoreError::Network("connection refused".into()));
        }
        Ok(state)
    }
}

impl State {
    fn bump(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn remove_note(&mut self, note_id: NoteId) {
        if let Some(note) = self.notes.remove(&note_id) {
            for card in note.cards {
                self.card_decks.remove(&card);
            }
        }
    }
}

fn in_deck(card_deck: &str, deck: &str) -> bool {
    card_deck == deck || card_deck.starts_with(&format!("{deck}{DECK_SEPARATOR}"))
}

fn add_deck(decks: &mut BTreeSet<String>, name: &str) {
    let segments: Vec<&str> = name.split(DECK_SEPARATOR).collect();
    for end in 1..=segments.len() {
        decks.insert(segments[..end].join(DECK_SEPARATOR));
    }
}

fn fields(
    front: &str,
    back: &str,
    source_hash: &str,
    source_file: &str,
) -> HashMap<String, String> {
    HashMap::from([
        (FIELD_FRONT.to_string(), front.to_string()),
        (FIELD_BACK.to_string(), back.to_string()),
        (FIELD_SOURCE_HASH.to_string(), source_hash.to_string()),
        (FIELD_SOURCE_FILE.to_string(), source_file.to_string()),
    ])
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn ensure_note_type(&self) -> Result<(), StoreError> {
        let mut state = self.connected()?;
        state.mutations.push("ensureNoteType".into());
        state.has_note_type = true;
        Ok(())
    }

    async fn deck_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.connected()?.decks.iter().cloned().collect())
    }

    async fn create_deck(&self, name: &str) -> Result<(), StoreError> {
        let mut state = self.connected()?;
        state.mutations.push(format!("createDeck {name}"));
        add_deck(&mut state.decks, name);
        Ok(())
    }

    async fn find_notes(&self, query: &NoteQuery) -> Result<Vec<NoteId>, StoreError> {
        let state = self.connected()?;
        let ids = match query {
            NoteQuery::NoteType(name) if name == NOTE_TYPE_NAME => {
                state.notes.keys().copied().collect()
            }
            NoteQuery::NoteType(_) => Vec::new(),
            NoteQuery::Deck(deck) => state
                .notes
                .iter()
                .filter(|(_, note)| {
                    note.cards.iter().any(|card| {
                        state
                            .card_decks
                            .get(card)
                            .is_some_and(|card_deck| in_deck(card_deck, deck))
                    })
                })
                .map(|(id, _)| *id)
                .collect(),
        };
        Ok(ids)
    }

    async fn notes_info(&self, note_ids: &[NoteId]) -> Result<Vec<NoteInfo>, StoreError> {
        let state = self.connected()?;
        Ok(note_ids
            .iter()
            .filter_map(|id| {
                state.notes.get(id).map(|note| NoteInfo {
                    note_id: *id,
                    cards: note.cards.clone(),
                    fields: note.fields.clone(),
                })
            })
            .collect())
    }

    async fn cards_info(&self, card_ids: &[CardId]) -> Result<Vec<CardInfo>, StoreError> {
        let state = self.connected()?;
        Ok(card_ids
            .iter()
            .filter_map(|id| {
                state.card_decks.get(id).map(|deck| CardInfo {
                    card_id: *id,
                    deck_name: deck.clone(),
                })
            })
            .collect())
    }

    async fn add_note(&self, note: &NewNote) -> Result<NoteId, StoreError> {
        let mut state = self.connected()?;
        if state.adds_offline {
            return Err(StoreError::Network("connection reset".into()));
        }
        state.mutations.push(format!("addNote {}", note.source_hash));

        if !state.has_note_type {
            return Err(StoreError::Remote(format!("model was not found: {NOTE_TYPE_NAME}")));
        }
        if !state.decks.contains(&note.deck) {
            return Err(StoreError::Remote(format!("deck was not found: {}", note.deck)));
        }
        if state.rejected_fronts.iter().any(|needle| note.front.contains(needle.as_str())) {
            return Err(StoreError::Remote("cannot create note because it is empty".into()));
        }
        if state.notes.values().any(|n| n.fields[FIELD_FRONT] == note.front) {
            return Err(StoreError::Remote(
                "cannot create note because it is a duplicate".into(),
            ));
        }

        let note_id = state.bump();
        let card_id = state.bump();
        state.card_decks.insert(card_id, note.deck.clone());
        state.notes.insert(
            note_id,
            StoredNote {
                fields: fields(&note.front, &note.back, &note.source_hash, &note.source_file),
                cards: vec![card_id],
            },
        );
        Ok(note_id)
    }

    async fn update_note(&self, update: &NoteUpdate) -> Result<(), StoreError> {
        let mut state = self.connected()?;
        state.mutations.push(format!("updateNoteFields {}", update.note_id));
        let note = state
            .notes
            .get_mut(&update.note_id)
            .ok_or_else(|| StoreError::Remote(format!("note was not found: {}", update.note_id)))?;
        note.fields.insert(FIELD_FRONT.into(), update.front.clone());
        note.fields.insert(FIELD_BACK.into(), update.back.clone());
        note.fields.insert(FIELD_SOURCE_FILE.into(), update.source_file.clone());
        Ok(())
    }

    async fn change_deck(&self, card_ids: &[CardId], deck: &str) -> Result<(), StoreError> {
        let mut state = self.connected()?;
        state.mutations.push(format!("changeDeck {deck} {card_ids:?}"));
        add_deck(&mut state.decks, deck);
        for card in card_ids {
            if let Some(card_deck) = state.card_decks.get_mut(card) {
                *card_deck = deck.to_string();
            }
        }
        Ok(())
    }

    async fn delete_notes(&self, note_ids: &[NoteId]) -> Result<(), StoreError> {
        let mut state = self.connected()?;
        state.mutations.push(format!("deleteNotes {note_ids:?}"));
        for id in note_ids {
            state.remove_note(*id);
        }
        Ok(())
    }

    async fn delete_decks(&self, names: &[String]) -> Result<(), StoreError> {
        let mut state = self.connected()?;
        state.mutations.push(format!("deleteDecks {names:?}"));
        for name in names {
            state.decks.retain(|deck| !in_deck(deck, name));
            let doomed: Vec<NoteId> = state
                .notes
                .iter()
                .filter(|(_, note)| {
                    note.cards.iter().any(|card| {
                        state
                            .card_decks
                            .get(card)
                            .is_some_and(|card_deck| in_deck(card_deck, name))
                    })
                })
                .map(|(id, _)| *id)
                .collect();
            for id in doomed {
                state.remove_note(id);
            }
        }
        Ok(())
    }
}

/// A markdown tree rooted at `<tempdir>/notes`.
pub struct NotesDir {
    _tmp: tempfile::TempDir,
    pub root: PathBuf,
}

impl NotesDir {
    pub fn new() -> Self {
        let tmp = tempfile::TempDir::new().unwrap();
        let root = tmp.path().join("notes");
        fs::create_dir_all(&root).unwrap();
        Self { _tmp: tmp, root }
    }

    pub fn write(&self, relative: &str, content: &str) -> &Self {
        let path = self.root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
        self
    }

    pub fn remove(&self, relative: &str) -> &Self {
        fs::remove_file(self.root.join(relative)).unwrap();
        self
    }

    pub fn rename(&self, from: &str, to: &str) -> &Self {
        let target = self.root.join(to);
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::rename(self.root.join(from), target).unwrap();
        self
    }

    pub fn path(&self) -> &Path {
        &self.root
    }
}

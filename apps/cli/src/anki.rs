//! AnkiConnect client.
//!
//! Every action is a JSON POST of `{"action", "version", "params"}` answered
//! by `{"result", "error"}`. Transport and HTTP failures map to
//! [`StoreError::Network`], a non-null `error` to [`StoreError::Remote`].

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use mdanki_core::store::{
    CARD_TEMPLATE_BACK, CARD_TEMPLATE_FRONT, CARD_TEMPLATE_NAME, FIELD_BACK, FIELD_FRONT,
    FIELD_SOURCE_FILE, FIELD_SOURCE_HASH, NOTE_FIELDS, NOTE_TYPE_NAME,
};
use mdanki_core::{
    CardId, CardInfo, NewNote, NoteId, NoteInfo, NoteQuery, NoteStore, NoteUpdate, StoreError,
};

use crate::config::Config;

/// AnkiConnect API version we speak.
pub const ANKI_CONNECT_VERSION: u32 = 6;

#[derive(Debug, Serialize)]
struct Request<'a> {
    action: &'a str,
    version: u32,
    #[serde(skip_serializing_if = "Value::is_null")]
    params: Value,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

impl Envelope {
    fn into_result<T: DeserializeOwned>(self) -> Result<T, StoreError> {
        if let Some(error) = self.error {
            return Err(StoreError::Remote(error));
        }
        serde_json::from_value(self.result).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiNoteInfo {
    /// Missing when the note no longer exists.
    note_id: Option<NoteId>,
    #[serde(default)]
    cards: Vec<CardId>,
    #[serde(default)]
    fields: HashMap<String, ApiField>,
}

#[derive(Debug, Deserialize)]
struct ApiField {
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCardInfo {
    card_id: Option<CardId>,
    #[serde(default)]
    deck_name: String,
}

impl ApiNoteInfo {
    fn into_note_info(self) -> Option<NoteInfo> {
        Some(NoteInfo {
            note_id: self.note_id?,
            cards: self.cards,
            fields: self
                .fields
                .into_iter()
                .map(|(name, field)| (name, field.value))
                .collect(),
        })
    }
}

/// Client for a running Anki with the AnkiConnect add-on.
pub struct AnkiConnect {
    client: Client,
    url: String,
}

impl AnkiConnect {
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;
        Ok(Self {
            client,
            url: config.anki_url.clone(),
        })
    }

    /// AnkiConnect API version reported by Anki.
    pub async fn version(&self) -> Result<u32, StoreError> {
        self.request("version", Value::Null).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        action: &str,
        params: Value,
    ) -> Result<T, StoreError> {
        let request = Request {
            action,
            version: ANKI_CONNECT_VERSION,
            params,
        };
        tracing::debug!(action, "AnkiConnect request");

        let resp = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(StoreError::Network(format!("HTTP {status}: {message}")));
        }

        let envelope: Envelope = resp
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        envelope.into_result()
    }
}

#[async_trait]
impl NoteStore for AnkiConnect {
    async fn ensure_note_type(&self) -> Result<(), StoreError> {
        let models: Vec<String> = self.request("modelNames", Value::Null).await?;
        if models.iter().any(|m| m == NOTE_TYPE_NAME) {
            return Ok(());
        }
        tracing::info!("Creating note type {NOTE_TYPE_NAME}");
        let _: Value = self
            .request(
                "createModel",
                json!({
                    "modelName": NOTE_TYPE_NAME,
                    "inOrderFields": NOTE_FIELDS,
                    "cardTemplates": [{
                        "Name": CARD_TEMPLATE_NAME,
                        "Front": CARD_TEMPLATE_FRONT,
                        "Back": CARD_TEMPLATE_BACK,
                    }],
                }),
            )
            .await?;
        Ok(())
    }

    async fn deck_names(&self) -> Result<Vec<String>, StoreError> {
        self.request("deckNames", Value::Null).await
    }

    async fn create_deck(&self, name: &str) -> Result<(), StoreError> {
        let _: Value = self.request("createDeck", json!({ "deck": name })).await?;
        Ok(())
    }

    async fn find_notes(&self, query: &NoteQuery) -> Result<Vec<NoteId>, StoreError> {
        self.request("findNotes", json!({ "query": query.to_string() }))
            .await
    }

    async fn notes_info(&self, note_ids: &[NoteId]) -> Result<Vec<NoteInfo>, StoreError> {
        if note_ids.is_empty() {
            return Ok(vec![]);
        }
        let notes: Vec<ApiNoteInfo> = self
            .request("notesInfo", json!({ "notes": note_ids }))
            .await?;
        Ok(notes.into_iter().filter_map(ApiNoteInfo::into_note_info).collect())
    }

    async fn cards_info(&self, card_ids: &[CardId]) -> Result<Vec<CardInfo>, StoreError> {
        if card_ids.is_empty() {
            return Ok(vec![]);
        }
        let cards: Vec<ApiCardInfo> = self
            .request("cardsInfo", json!({ "cards": card_ids }))
            .await?;
        Ok(cards
            .into_iter()
            .filter_map(|card| {
                Some(CardInfo {
                    card_id: card.card_id?,
                    deck_name: card.deck_name,
                })
            })
            .collect())
    }

    async fn add_note(&self, note: &NewNote) -> Result<NoteId, StoreError> {
        self.request(
            "addNote",
            json!({
                "note": {
                    "deckName": note.deck,
                    "modelName": NOTE_TYPE_NAME,
                    "fields": {
                        FIELD_FRONT: note.front,
                        FIELD_BACK: note.back,
                        FIELD_SOURCE_HASH: note.source_hash,
                        FIELD_SOURCE_FILE: note.source_file,
                    },
                }
            }),
        )
        .await
    }

    async fn update_note(&self, update: &NoteUpdate) -> Result<(), StoreError> {
        self.request(
            "updateNoteFields",
            json!({
                "note": {
                    "id": update.note_id,
                    "fields": {
                        FIELD_FRONT: update.front,
                        FIELD_BACK: update.back,
                        FIELD_SOURCE_FILE: update.source_file,
                    },
                }
            }),
        )
        .await
    }

    async fn change_deck(&self, card_ids: &[CardId], deck: &str) -> Result<(), StoreError> {
        if card_ids.is_empty() {
            return Ok(());
        }
        self.request("changeDeck", json!({ "cards": card_ids, "deck": deck }))
            .await
    }

    async fn delete_notes(&self, note_ids: &[NoteId]) -> Result<(), StoreError> {
        if note_ids.is_empty() {
            return Ok(());
        }
        self.request("deleteNotes", json!({ "notes": note_ids })).await
    }

    async fn delete_decks(&self, names: &[String]) -> Result<(), StoreError> {
        if names.is_empty() {
            return Ok(());
        }
        self.request("deleteDecks", json!({ "decks": names, "cardsToo": true }))
            .await
    }
}

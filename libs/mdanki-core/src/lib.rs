//! Markdown to Anki synchronization core.
//!
//! Provides:
//! - Markdown parser that turns level-2 headings into cards
//! - Content-addressed card identity
//! - Markdown to HTML rendering with MathJax delimiters
//! - The [`NoteStore`] seam to Anki and a snapshot reader over it
//! - The reconciler (plan) and the apply layer that executes a plan

pub mod apply;
pub mod error;
pub mod identity;
pub mod parser;
pub mod reconcile;
pub mod render;
pub mod snapshot;
pub mod store;
pub mod sync;
pub mod types;

pub use apply::{apply, prune_empty_decks, CreateOutcome};
pub use error::{Result, ScanError, StoreError, SyncError};
pub use identity::compute_hash;
pub use parser::{parse, parse_file, scan_directory, scan_root, RawCard, SourceRoot};
pub use reconcile::{plan, PlannedCreate, PlannedMove, PlannedUpdate, SyncPlan};
pub use render::render_markdown;
pub use snapshot::{fetch_existing, Snapshot};
pub use store::{CardInfo, NewNote, NoteInfo, NoteQuery, NoteStore, NoteUpdate};
pub use sync::{sync, SyncOptions};
pub use types::{CardId, NoteId, RemoteNote, SourceCard, SyncStats, DECK_SEPARATOR, DEFAULT_DECK};

//! Worker-local quiz state.
//!
//! Uses `thread_local!` + `RefCell` like the rest of the in-process server:
//! the worker keeps the module alive, so the loaded table, catalog and
//! session persist across `handle_request` calls.

use std::cell::RefCell;

use tracing::info;

use crate::catalog::DeckCatalog;
use crate::error::Result;
use crate::lookup::LookupTable;
use crate::quiz::questions::{question_catalog, Question};
use crate::quiz::session::QuizSession;

/// The lookup table currently answering quiz queries.
#[derive(Debug, Clone)]
pub struct ActiveTable {
    /// Where it came from, for display (`lookup_table_12.json`, `posted`).
    pub source: String,
    pub table: LookupTable,
}

#[derive(Debug, Clone)]
pub struct QuizState {
    pub table: Option<ActiveTable>,
    pub catalog: Option<DeckCatalog>,
    pub questions: Vec<Question>,
    pub session: QuizSession,
}

impl Default for QuizState {
    fn default() -> Self {
        Self {
            table: None,
            catalog: None,
            questions: question_catalog(&DeckCatalog::default()),
            session: QuizSession::default(),
        }
    }
}

thread_local! {
    static STATE: RefCell<QuizState> = RefCell::new(QuizState::default());
}

/// Execute a closure with read access to the quiz state.
pub fn with_state<F, R>(f: F) -> R
where
    F: FnOnce(&QuizState) -> R,
{
    STATE.with(|s| f(&s.borrow()))
}

/// Execute a closure with mutable access to the quiz state.
pub fn with_state_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut QuizState) -> R,
{
    STATE.with(|s| f(&mut s.borrow_mut()))
}

/// Replace the entire state (tests and full resets).
pub fn replace_state(new_state: QuizState) {
    STATE.with(|s| {
        *s.borrow_mut() = new_state;
    });
}

/// Swap in a new lookup table. The session restarts, since its answers were
/// checked against the old table. Returns the key count.
pub fn load_table_json(json: &str, source: &str) -> Result<usize> {
    let table = LookupTable::from_json(json)?;
    let keys = table.len();
    with_state_mut(|s| {
        s.table = Some(ActiveTable {
            source: source.to_string(),
            table,
        });
        s.session.reset();
    });
    info!(source, keys, "loaded lookup table");
    Ok(keys)
}

/// Load the deck catalog used for results and tag questions. Returns the
/// deck count.
pub fn load_catalog_json(json: &str) -> Result<usize> {
    let catalog = DeckCatalog::from_json(json)?;
    let decks = catalog.decks.len();
    with_state_mut(|s| {
        s.questions = question_catalog(&catalog);
        s.catalog = Some(catalog);
        s.session.reset();
    });
    info!(decks, "loaded deck catalog");
    Ok(decks)
}

/// Export the session as JSON.
pub fn export_session_json() -> String {
    with_state(|s| serde_json::to_string(&s.session).unwrap_or_else(|_| "{}".to_string()))
}

/// Import a session from JSON.
pub fn import_session_json(json: &str) -> Result<()> {
    let session: QuizSession = serde_json::from_str(json)?;
    with_state_mut(|s| s.session = session);
    Ok(())
}

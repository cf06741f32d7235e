//! Error types for catalog loading, table construction and artifact I/O.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building or persisting lookup tables.
///
/// A key missing from a table is not an error; see `LookupTable::resolve`.
#[derive(Debug, Error)]
pub enum LookupError {
    /// A deck record lacks one of the four singleton attributes.
    #[error("deck {deck_id} is missing required attribute `{attribute}`")]
    MissingAttribute {
        deck_id: u32,
        attribute: &'static str,
    },

    /// A singleton or summoning-method code is outside its known range.
    #[error("deck {deck_id} has invalid {attribute} code {code}")]
    InvalidAttribute {
        deck_id: u32,
        attribute: &'static str,
        code: u8,
    },

    /// Subset enumeration is 2^n per deck, so the token count is capped.
    #[error("deck {deck_id} has {count} attribute tokens (limit {limit})")]
    TooManyTokens {
        deck_id: u32,
        count: usize,
        limit: usize,
    },

    #[error("unknown user {0}")]
    UnknownUser(u32),

    #[error("unknown deck {0}")]
    UnknownDeck(u32),

    /// Filesystem error, with the path that was being read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LookupError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LookupError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for lookup-table operations.
pub type Result<T> = std::result::Result<T, LookupError>;

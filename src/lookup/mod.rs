//! Deck-recommendation lookup tables.
//!
//! A table maps every partial answer combination that some deck can produce
//! to whether it already pins down a single deck. The quiz keeps asking
//! while the current answers resolve to [`Status::Multiple`].
//!
//! - `token` turns a deck record into its sorted attribute tokens.
//! - `table` builds and serializes the table.
//! - `answers` canonicalizes quiz answers into lookup keys.
//! - `universe` scopes a build to the whole catalog or to one user.

pub mod answers;
pub mod table;
pub mod token;
pub mod universe;

pub use answers::AnswerSet;
pub use table::{build_table, BuildLimits, LookupTable, Status};
pub use token::{DeckAttributeProfile, LookupKey, TokenKind, EMPTY_KEY, END_MARKER};
pub use universe::{build_for_universe, Universe};

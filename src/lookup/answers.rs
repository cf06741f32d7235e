//! Quiz answers as lookup keys.

use std::collections::BTreeSet;

use crate::lookup::table::{LookupTable, Status};
use crate::lookup::token::{LookupKey, TokenKind};

/// An unordered set of answer tokens, canonicalized the same way as the
/// table keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSet {
    tokens: BTreeSet<String>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw tokens in any order (`["s=0", "d=1"]`).
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for token in tokens {
            set.insert_token(token.as_ref());
        }
        set
    }

    pub fn insert(&mut self, kind: TokenKind, value: impl std::fmt::Display) {
        self.tokens.insert(kind.token(value));
    }

    pub fn insert_token(&mut self, token: &str) {
        let token = token.trim();
        if !token.is_empty() {
            self.tokens.insert(token.to_string());
        }
    }

    /// A copy with one more token.
    pub fn with(&self, token: &str) -> Self {
        let mut next = self.clone();
        next.insert_token(token);
        next
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Canonical key; `empty` when no answers were given.
    pub fn key(&self) -> LookupKey {
        LookupKey::from_tokens(&self.tokens)
    }

    /// Resolve against a table. Unknown combinations come back as
    /// [`Status::Multiple`].
    pub fn resolve(&self, table: &LookupTable) -> Status {
        table.resolve(&self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::plain_deck;
    use crate::lookup::table::{build_table, BuildLimits};
    use crate::lookup::token::DeckAttributeProfile;

    #[test]
    fn answer_order_does_not_matter() {
        let forward = AnswerSet::from_tokens(["s=0", "d=1", "sm=3"]);
        let mut backward = AnswerSet::new();
        backward.insert(TokenKind::SummoningMethod, 3);
        backward.insert(TokenKind::Difficulty, 1);
        backward.insert(TokenKind::Strength, 0);
        assert_eq!(forward.key(), backward.key());
        assert_eq!(forward.key().as_str(), "d=1|s=0|sm=3");
    }

    #[test]
    fn no_answers_is_empty_key() {
        assert_eq!(AnswerSet::new().key().as_str(), "empty");
    }

    #[test]
    fn resolves_against_table() {
        let profiles = vec![
            DeckAttributeProfile::from_record(&plain_deck(1, 0, 0, 0, 0)).unwrap(),
            DeckAttributeProfile::from_record(&plain_deck(2, 1, 0, 0, 0)).unwrap(),
        ];
        let table = build_table(&profiles, &BuildLimits::default()).unwrap();

        assert_eq!(AnswerSet::new().resolve(&table), Status::Multiple);
        let d0 = AnswerSet::from_tokens(["d=0"]);
        assert_eq!(d0.resolve(&table), Status::Multiple);
        assert_eq!(d0.with("s=1").resolve(&table), Status::Unique);
        assert_eq!(d0.with("s=3").resolve(&table), Status::Multiple);
    }
}

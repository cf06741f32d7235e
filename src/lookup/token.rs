//! Attribute tokens and canonical lookup keys.
//!
//! A token is one categorical fact about a deck, written `prefix=value`
//! (`s=0`, `sm=3`, `atag=12`). The prefixes are what the quiz UI sends, so
//! they are part of the table's wire format.

use std::collections::BTreeSet;
use std::fmt;

use crate::catalog::{ArtStyle, DeckRecord, DeckType, Difficulty, Strength, SummonType};
use crate::error::{LookupError, Result};

/// Separator between tokens in a key.
pub const KEY_SEPARATOR: &str = "|";

/// Reserved key for "no answers given yet".
pub const EMPTY_KEY: &str = "empty";

/// Marker appended to a deck's full key once every question is answered.
pub const END_MARKER: &str = "end";

/// The seven attribute categories a token can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Strength,
    Difficulty,
    DeckType,
    ArtStyle,
    SummoningMethod,
    AestheticTag,
    PerformanceTag,
}

impl TokenKind {
    pub const ALL: [TokenKind; 7] = [
        TokenKind::Strength,
        TokenKind::Difficulty,
        TokenKind::DeckType,
        TokenKind::ArtStyle,
        TokenKind::SummoningMethod,
        TokenKind::AestheticTag,
        TokenKind::PerformanceTag,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            TokenKind::Strength => "s",
            TokenKind::Difficulty => "d",
            TokenKind::DeckType => "t",
            TokenKind::ArtStyle => "a",
            TokenKind::SummoningMethod => "sm",
            TokenKind::AestheticTag => "atag",
            TokenKind::PerformanceTag => "ptag",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.prefix() == prefix)
    }

    /// Singleton categories contribute exactly one token per deck.
    pub fn is_singleton(self) -> bool {
        matches!(
            self,
            TokenKind::Strength | TokenKind::Difficulty | TokenKind::DeckType | TokenKind::ArtStyle
        )
    }

    /// Format a token of this kind.
    pub fn token(self, value: impl fmt::Display) -> String {
        format!("{}={}", self.prefix(), value)
    }
}

/// Split a token into its kind and raw value. Returns `None` for reserved
/// keys and for unknown prefixes.
pub fn parse_token(token: &str) -> Option<(TokenKind, &str)> {
    let (prefix, value) = token.split_once('=')?;
    Some((TokenKind::from_prefix(prefix)?, value))
}

// ── Canonical keys ─────────────────────────────────────────────────

/// A canonical key: the set of tokens sorted and joined with `|`.
/// Token order in the input never matters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LookupKey(String);

impl LookupKey {
    /// Canonicalize an arbitrary collection of tokens. Duplicates collapse;
    /// no tokens at all gives the reserved `empty` key.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = tokens
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if set.is_empty() {
            return Self::empty();
        }
        LookupKey(set.into_iter().collect::<Vec<_>>().join(KEY_SEPARATOR))
    }

    /// Re-canonicalize a raw key string such as `d=0|s=1`.
    pub fn parse(raw: &str) -> Self {
        if raw.trim() == EMPTY_KEY {
            return Self::empty();
        }
        Self::from_tokens(raw.split(KEY_SEPARATOR))
    }

    pub fn empty() -> Self {
        LookupKey(EMPTY_KEY.to_string())
    }

    /// The end key for a base key: the two strings `[base, "end"]` sorted and
    /// joined. Every base key starts with an `a=` token, so in practice this
    /// appends `|end`.
    pub fn end_key(base_key: &str) -> Self {
        let mut pair = [base_key, END_MARKER];
        pair.sort_unstable();
        LookupKey(pair.join(KEY_SEPARATOR))
    }

    pub fn is_empty_key(&self) -> bool {
        self.0 == EMPTY_KEY
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Tokens of this key, excluding the reserved `empty` key.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        let raw = if self.is_empty_key() { "" } else { self.0.as_str() };
        raw.split(KEY_SEPARATOR).filter(|t| !t.is_empty())
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for LookupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LookupKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ── Deck profiles ──────────────────────────────────────────────────

/// Every categorical fact about one deck, as a sorted token set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckAttributeProfile {
    pub deck_id: u32,
    tokens: BTreeSet<String>,
}

impl DeckAttributeProfile {
    /// Extract a deck's profile.
    ///
    /// A missing or out-of-range singleton fails the extraction rather than
    /// yielding a profile with fewer than four singleton tokens.
    pub fn from_record(deck: &DeckRecord) -> Result<Self> {
        let strength = singleton(deck, "strength", deck.strength, Strength::from_code)?;
        let difficulty = singleton(deck, "difficulty", deck.difficulty, Difficulty::from_code)?;
        let deck_type = singleton(deck, "deck_type", deck.deck_type, DeckType::from_code)?;
        let art_style = singleton(deck, "art_style", deck.art_style, ArtStyle::from_code)?;

        let mut tokens = BTreeSet::new();
        tokens.insert(TokenKind::Strength.token(strength.code()));
        tokens.insert(TokenKind::Difficulty.token(difficulty.code()));
        tokens.insert(TokenKind::DeckType.token(deck_type.code()));
        tokens.insert(TokenKind::ArtStyle.token(art_style.code()));

        for &code in &deck.summoning_methods {
            let method = SummonType::from_code(code).ok_or(LookupError::InvalidAttribute {
                deck_id: deck.id,
                attribute: "summoning_method",
                code,
            })?;
            tokens.insert(TokenKind::SummoningMethod.token(method.code()));
        }
        for id in &deck.aesthetic_tags {
            tokens.insert(TokenKind::AestheticTag.token(id));
        }
        for id in &deck.performance_tags {
            tokens.insert(TokenKind::PerformanceTag.token(id));
        }

        Ok(Self {
            deck_id: deck.id,
            tokens,
        })
    }

    /// Tokens in canonical (sorted) order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// Canonical key of the full token set.
    pub fn base_key(&self) -> LookupKey {
        LookupKey::from_tokens(self.tokens())
    }
}

fn singleton<T>(
    deck: &DeckRecord,
    attribute: &'static str,
    code: Option<u8>,
    parse: fn(u8) -> Option<T>,
) -> Result<T> {
    let code = code.ok_or(LookupError::MissingAttribute {
        deck_id: deck.id,
        attribute,
    })?;
    parse(code).ok_or(LookupError::InvalidAttribute {
        deck_id: deck.id,
        attribute,
        code,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::plain_deck;

    #[test]
    fn key_is_order_independent() {
        let a = LookupKey::from_tokens(["s=0", "d=1", "a=2"]);
        let b = LookupKey::from_tokens(vec!["a=2".to_string(), "s=0".into(), "d=1".into()]);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "a=2|d=1|s=0");
    }

    #[test]
    fn no_tokens_is_empty_key() {
        let key = LookupKey::from_tokens(Vec::<String>::new());
        assert_eq!(key.as_str(), "empty");
        assert!(key.is_empty_key());
        assert_eq!(key.tokens().count(), 0);
    }

    #[test]
    fn parse_recanonicalizes() {
        assert_eq!(LookupKey::parse("s=1|d=0").as_str(), "d=0|s=1");
        assert_eq!(LookupKey::parse("empty"), LookupKey::empty());
        assert_eq!(LookupKey::parse(""), LookupKey::empty());
    }

    #[test]
    fn end_key_appends_marker() {
        let key = LookupKey::end_key("a=0|d=0|s=0|t=0");
        assert_eq!(key.as_str(), "a=0|d=0|s=0|t=0|end");
    }

    #[test]
    fn parse_token_known_prefixes() {
        assert_eq!(parse_token("sm=99"), Some((TokenKind::SummoningMethod, "99")));
        assert_eq!(parse_token("atag=4"), Some((TokenKind::AestheticTag, "4")));
        assert_eq!(parse_token("empty"), None);
        assert_eq!(parse_token("zz=1"), None);
    }

    #[test]
    fn profile_has_four_singletons_without_tags() {
        let profile = DeckAttributeProfile::from_record(&plain_deck(1, 0, 1, 2, 3)).unwrap();
        assert_eq!(profile.len(), 4);
        assert_eq!(profile.base_key().as_str(), "a=3|d=1|s=0|t=2");
    }

    #[test]
    fn profile_collects_variable_tags() {
        let mut deck = plain_deck(1, 0, 0, 0, 0);
        deck.summoning_methods = vec![3, 1];
        deck.aesthetic_tags = vec![12];
        deck.performance_tags = vec![5, 5];
        let profile = DeckAttributeProfile::from_record(&deck).unwrap();
        assert_eq!(profile.len(), 8);
        assert!(profile.contains("sm=1"));
        assert!(profile.contains("atag=12"));
        assert_eq!(
            profile.base_key().as_str(),
            "a=0|atag=12|d=0|ptag=5|s=0|sm=1|sm=3|t=0"
        );
    }

    #[test]
    fn tag_order_does_not_change_profile() {
        let mut first = plain_deck(1, 0, 0, 0, 0);
        first.performance_tags = vec![2, 1];
        let mut second = plain_deck(2, 0, 0, 0, 0);
        second.performance_tags = vec![1, 2];
        let a = DeckAttributeProfile::from_record(&first).unwrap();
        let b = DeckAttributeProfile::from_record(&second).unwrap();
        assert_eq!(a.base_key(), b.base_key());
    }

    #[test]
    fn missing_singleton_fails() {
        let mut deck = plain_deck(9, 0, 0, 0, 0);
        deck.difficulty = None;
        let err = DeckAttributeProfile::from_record(&deck).unwrap_err();
        assert!(matches!(
            err,
            LookupError::MissingAttribute {
                deck_id: 9,
                attribute: "difficulty"
            }
        ));
    }

    #[test]
    fn out_of_range_codes_fail() {
        let deck = plain_deck(3, 0, 0, 0, 7);
        let err = DeckAttributeProfile::from_record(&deck).unwrap_err();
        assert!(matches!(
            err,
            LookupError::InvalidAttribute {
                attribute: "art_style",
                code: 7,
                ..
            }
        ));

        let mut deck = plain_deck(3, 0, 0, 0, 0);
        deck.summoning_methods = vec![42];
        assert!(DeckAttributeProfile::from_record(&deck).is_err());
    }
}

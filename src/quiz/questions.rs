//! The recommendation questions.
//!
//! Three required questions are asked in order (aesthetic preference,
//! strength, difficulty). The remaining four are optional and the player
//! picks which one to answer next.

use serde::Serialize;

use crate::catalog::{ArtStyle, DeckCatalog, DeckType, Difficulty, Strength, SummonType, Tag};
use crate::lookup::TokenKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizOption {
    /// `None` is "no preference": the question counts as answered but adds
    /// no token to the key.
    pub value: Option<u32>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    #[serde(serialize_with = "serialize_kind")]
    pub kind: TokenKind,
    pub prompt: String,
    pub options: Vec<QuizOption>,
    pub required: bool,
}

fn serialize_kind<S: serde::Serializer>(kind: &TokenKind, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(kind.prefix())
}

impl Question {
    /// Query-string key for this question (`s`, `sm`, `atag`, ...).
    pub fn key(&self) -> &'static str {
        self.kind.prefix()
    }

    /// Token an answer to this question contributes, if any.
    pub fn token_for(&self, value: Option<u32>) -> Option<String> {
        value.map(|v| self.kind.token(v))
    }
}

fn option(value: u32, label: &str) -> QuizOption {
    QuizOption {
        value: Some(value),
        label: label.to_string(),
    }
}

fn no_preference(label: &str) -> QuizOption {
    QuizOption {
        value: None,
        label: label.to_string(),
    }
}

fn tag_options<'a>(tags: impl IntoIterator<Item = &'a Tag>) -> impl Iterator<Item = QuizOption> {
    tags.into_iter().map(|t| {
        let label = if t.description.is_empty() {
            t.name.as_str()
        } else {
            t.description.as_str()
        };
        option(t.id, label)
    })
}

/// Build the question list for a catalog. Tag questions take their options
/// from the catalog's tag tables; the rest are fixed.
pub fn question_catalog(catalog: &DeckCatalog) -> Vec<Question> {
    const ANY: &str = "Doesn't matter";

    let mut aesthetic = vec![no_preference("Show me every deck (recommended)")];
    // The catalog's own "nothing in particular" tag duplicates the option above.
    aesthetic.extend(tag_options(
        catalog.aesthetic_tags.iter().filter(|t| !t.is_placeholder()),
    ));

    let mut performance: Vec<QuizOption> = tag_options(&catalog.performance_tags).collect();
    performance.push(no_preference(ANY));

    let mut strength: Vec<QuizOption> = Strength::ALL
        .iter()
        .map(|s| option(s.code().into(), s.label()))
        .collect();
    strength.push(no_preference(ANY));

    let mut difficulty: Vec<QuizOption> = Difficulty::ALL
        .iter()
        .map(|d| option(d.code().into(), d.label()))
        .collect();
    difficulty.push(no_preference(ANY));

    let mut deck_type: Vec<QuizOption> = DeckType::ALL
        .iter()
        .map(|t| option(t.code().into(), t.label()))
        .collect();
    deck_type.push(no_preference(ANY));

    let mut art_style: Vec<QuizOption> = ArtStyle::ALL
        .iter()
        .map(|a| option(a.code().into(), a.label()))
        .collect();
    art_style.push(no_preference(ANY));

    let mut summoning: Vec<QuizOption> = SummonType::ALL
        .iter()
        .map(|m| option(m.code().into(), m.label()))
        .collect();
    summoning.push(no_preference(ANY));

    vec![
        Question {
            kind: TokenKind::AestheticTag,
            prompt: "Is there anything you especially want in a deck?".to_string(),
            options: aesthetic,
            required: true,
        },
        Question {
            kind: TokenKind::Strength,
            prompt: "How strong should the deck be?".to_string(),
            options: strength,
            required: true,
        },
        Question {
            kind: TokenKind::Difficulty,
            prompt: "How hard should the deck be to play?".to_string(),
            options: difficulty,
            required: true,
        },
        Question {
            kind: TokenKind::DeckType,
            prompt: "Which kind of deck do you prefer?".to_string(),
            options: deck_type,
            required: false,
        },
        Question {
            kind: TokenKind::ArtStyle,
            prompt: "Which artwork do you prefer?".to_string(),
            options: art_style,
            required: false,
        },
        Question {
            kind: TokenKind::SummoningMethod,
            prompt: "Which summoning method do you prefer?".to_string(),
            options: summoning,
            required: false,
        },
        Question {
            kind: TokenKind::PerformanceTag,
            prompt: "Which deck gimmick do you prefer?".to_string(),
            options: performance,
            required: false,
        },
    ]
}

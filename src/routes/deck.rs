//! `GET /api/deck/result?key=…`: turn a finished quiz key into a deck.

use std::collections::BTreeSet;

use crate::catalog::{
    ArtStyle, DeckCatalog, DeckRecord, DeckType, Difficulty, Strength, SummonType,
};
use crate::lookup::token::parse_token;
use crate::lookup::{LookupKey, TokenKind, END_MARKER};
use crate::quiz::state;
use crate::routes::util::{error_fragment, escape_html, get_param, parse_params};

/// Filter built from a lookup key. Singleton categories must match
/// exactly; a variable category matches when the deck has any of the ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckCriteria {
    pub strength: BTreeSet<u8>,
    pub difficulty: BTreeSet<u8>,
    pub deck_type: BTreeSet<u8>,
    pub art_style: BTreeSet<u8>,
    pub summoning_methods: BTreeSet<u8>,
    pub aesthetic_tags: BTreeSet<u32>,
    pub performance_tags: BTreeSet<u32>,
}

impl DeckCriteria {
    /// Parse every token of `key`. The `end` marker is skipped; any other
    /// token that is not `prefix=number` is rejected.
    pub fn from_key(key: &LookupKey) -> Result<Self, String> {
        let mut criteria = Self::default();
        for token in key.tokens().filter(|t| *t != END_MARKER) {
            let (kind, raw) =
                parse_token(token).ok_or_else(|| format!("unrecognised token `{}`", token))?;
            let value: u32 = raw
                .parse()
                .map_err(|_| format!("invalid value in token `{}`", token))?;
            let small = || u8::try_from(value).map_err(|_| format!("value out of range in `{}`", token));
            match kind {
                TokenKind::Strength => criteria.strength.insert(small()?),
                TokenKind::Difficulty => criteria.difficulty.insert(small()?),
                TokenKind::DeckType => criteria.deck_type.insert(small()?),
                TokenKind::ArtStyle => criteria.art_style.insert(small()?),
                TokenKind::SummoningMethod => criteria.summoning_methods.insert(small()?),
                TokenKind::AestheticTag => criteria.aesthetic_tags.insert(value),
                TokenKind::PerformanceTag => criteria.performance_tags.insert(value),
            };
        }
        Ok(criteria)
    }

    pub fn matches(&self, deck: &DeckRecord) -> bool {
        fn exact(wanted: &BTreeSet<u8>, actual: Option<u8>) -> bool {
            wanted.iter().all(|w| actual == Some(*w))
        }
        fn any_of<T: Ord>(wanted: &BTreeSet<T>, actual: &[T]) -> bool {
            wanted.is_empty() || actual.iter().any(|a| wanted.contains(a))
        }

        exact(&self.strength, deck.strength)
            && exact(&self.difficulty, deck.difficulty)
            && exact(&self.deck_type, deck.deck_type)
            && exact(&self.art_style, deck.art_style)
            && any_of(&self.summoning_methods, &deck.summoning_methods)
            && any_of(&self.aesthetic_tags, &deck.aesthetic_tags)
            && any_of(&self.performance_tags, &deck.performance_tags)
    }
}

/// Pick the recommendation: the least-viewed matching deck, lowest id on a tie.
/// Together with the view count bumped on every served result this spreads
/// repeated answers across all matching decks.
pub fn pick_deck<'a>(catalog: &'a DeckCatalog, criteria: &DeckCriteria) -> Option<&'a DeckRecord> {
    catalog
        .decks
        .iter()
        .filter(|d| criteria.matches(d))
        .min_by_key(|d| (d.num_views, d.id))
}

fn render_deck(catalog: &DeckCatalog, deck: &DeckRecord) -> String {
    let mut facts: Vec<&str> = Vec::new();
    facts.extend(deck.strength.and_then(Strength::from_code).map(Strength::label));
    facts.extend(deck.difficulty.and_then(Difficulty::from_code).map(Difficulty::label));
    facts.extend(deck.deck_type.and_then(DeckType::from_code).map(DeckType::label));
    facts.extend(deck.art_style.and_then(ArtStyle::from_code).map(ArtStyle::label));
    facts.extend(
        deck.summoning_methods
            .iter()
            .filter_map(|c| SummonType::from_code(*c))
            .map(SummonType::label),
    );

    let tags: Vec<&str> = deck
        .aesthetic_tags
        .iter()
        .filter_map(|id| catalog.aesthetic_tag(*id))
        .chain(
            deck.performance_tags
                .iter()
                .filter_map(|id| catalog.performance_tag(*id)),
        )
        .map(|t| t.name.as_str())
        .collect();

    let mut html = format!(
        r#"<div class="deck-result" data-deck-id="{}"><h2 class="text-xl font-bold">{}</h2>"#,
        deck.id,
        escape_html(&deck.name)
    );
    if let Some(desc) = deck.description.as_deref().filter(|d| !d.is_empty()) {
        html.push_str(&format!(r#"<p class="my-2">{}</p>"#, escape_html(desc)));
    }
    html.push_str(r#"<ul class="list-disc ml-5">"#);
    for fact in facts {
        html.push_str(&format!("<li>{}</li>", escape_html(fact)));
    }
    html.push_str("</ul>");
    if !tags.is_empty() {
        html.push_str(r#"<div class="flex flex-wrap gap-1 mt-2">"#);
        for tag in tags {
            html.push_str(&format!(
                r#"<span class="px-2 rounded bg-gray-200 text-sm">#{}</span>"#,
                escape_html(tag)
            ));
        }
        html.push_str("</div>");
    }
    html.push_str("</div>");
    html
}

// ── GET /api/deck/result ───────────────────────────────────────────

/// Handle GET /api/deck/result?key={lookup key}
pub fn handle_result_get(query: &str) -> String {
    let params = parse_params(query);
    let key = match get_param(&params, "key") {
        Some(k) if !k.trim().is_empty() => LookupKey::parse(k),
        _ => return error_fragment("Missing key parameter"),
    };
    let criteria = match DeckCriteria::from_key(&key) {
        Ok(c) => c,
        Err(e) => return error_fragment(&e),
    };

    state::with_state_mut(|s| {
        let Some(catalog) = s.catalog.as_mut() else {
            return error_fragment("No deck catalog loaded");
        };
        let Some(id) = pick_deck(catalog, &criteria).map(|d| d.id) else {
            return r#"<span class="text-gray-500">No matching decks</span>"#.to_string();
        };
        // Served decks gain a view, so the next player with the same answers
        // is steered to a less-seen deck.
        catalog.record_view(id);
        match catalog.deck(id) {
            Some(deck) => render_deck(catalog, deck),
            None => error_fragment("Deck disappeared from catalog"),
        }
    })
}

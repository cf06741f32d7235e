//! Deck catalog: the records the lookup tables are built from.
//!
//! The catalog is exported from the deck database as JSON. Singleton
//! attributes are optional here because the upstream columns can be NULL;
//! token extraction decides what to do about a missing one.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{LookupError, Result};
use crate::store;

// ── Categorical attributes ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Strength {
    Tier,
    SemiTier,
    OffMeta,
    Weak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Difficulty {
    Easy,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DeckType {
    Combo,
    Midrange,
    Control,
    Rogue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ArtStyle {
    Cool,
    Dark,
    Bright,
    Dreamy,
    Grand,
}

/// The summoning method a deck is known for. `All` means the deck uses
/// almost every method without a signature one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SummonType {
    None,
    Fusion,
    Ritual,
    Synchro,
    Xyz,
    Pendulum,
    Link,
    All,
}

impl Strength {
    pub const ALL: [Strength; 4] = [
        Strength::Tier,
        Strength::SemiTier,
        Strength::OffMeta,
        Strength::Weak,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Strength::Tier => "A powerful top-tier deck",
            Strength::SemiTier => "A solid semi-tier deck",
            Strength::OffMeta => "An off-meta deck with its own strengths",
            Strength::Weak => "A very weak deck for the adventurous",
        }
    }
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Easy,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "An intuitive deck that is easy to pick up",
            Difficulty::Intermediate => "A deck that takes some practice",
            Difficulty::Advanced => "A deck that demands deep game knowledge",
        }
    }
}

impl DeckType {
    pub const ALL: [DeckType; 4] = [
        DeckType::Combo,
        DeckType::Midrange,
        DeckType::Control,
        DeckType::Rogue,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            DeckType::Combo => "Builds a sturdy board through raw combo power",
            DeckType::Midrange => "Balances combo and grind",
            DeckType::Control => "Drags the game long and wins on resources",
            DeckType::Rogue => "Plays an unusual plan such as lock or going-second OTK",
        }
    }
}

impl ArtStyle {
    pub const ALL: [ArtStyle; 5] = [
        ArtStyle::Cool,
        ArtStyle::Dark,
        ArtStyle::Bright,
        ArtStyle::Dreamy,
        ArtStyle::Grand,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            ArtStyle::Cool => "Cool artwork",
            ArtStyle::Dark => "Dark artwork",
            ArtStyle::Bright => "Cheerful artwork",
            ArtStyle::Dreamy => "Dreamy artwork",
            ArtStyle::Grand => "Grand artwork",
        }
    }
}

impl SummonType {
    /// Question order: the named methods first, then "none" and "all".
    pub const ALL: [SummonType; 8] = [
        SummonType::Fusion,
        SummonType::Ritual,
        SummonType::Synchro,
        SummonType::Xyz,
        SummonType::Pendulum,
        SummonType::Link,
        SummonType::None,
        SummonType::All,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(SummonType::None),
            1 => Some(SummonType::Fusion),
            2 => Some(SummonType::Ritual),
            3 => Some(SummonType::Synchro),
            4 => Some(SummonType::Xyz),
            5 => Some(SummonType::Pendulum),
            6 => Some(SummonType::Link),
            99 => Some(SummonType::All),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            SummonType::None => 0,
            SummonType::Fusion => 1,
            SummonType::Ritual => 2,
            SummonType::Synchro => 3,
            SummonType::Xyz => 4,
            SummonType::Pendulum => 5,
            SummonType::Link => 6,
            SummonType::All => 99,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SummonType::None => "Doesn't summon from the Extra Deck",
            SummonType::Fusion => "Fusion",
            SummonType::Ritual => "Ritual",
            SummonType::Synchro => "Synchro",
            SummonType::Xyz => "Xyz",
            SummonType::Pendulum => "Pendulum",
            SummonType::Link => "Link",
            SummonType::All => "Uses almost every summoning method",
        }
    }
}

// ── Records ────────────────────────────────────────────────────────

/// Description the database gives its "no particular preference" aesthetic
/// tag. The quiz already offers that choice, so the tag itself is not shown.
pub const PLACEHOLDER_TAG_DESCRIPTION: &str = "해당 없음";

/// A performance or aesthetic tag row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Tag {
    pub fn is_placeholder(&self) -> bool {
        self.description.trim() == PLACEHOLDER_TAG_DESCRIPTION
    }
}

/// One deck as returned by the catalog query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeckRecord {
    pub id: u32,
    pub name: String,
    pub strength: Option<u8>,
    pub difficulty: Option<u8>,
    pub deck_type: Option<u8>,
    pub art_style: Option<u8>,
    /// Summoning method codes (see [`SummonType`]).
    #[serde(default)]
    pub summoning_methods: Vec<u8>,
    #[serde(default)]
    pub performance_tags: Vec<u32>,
    #[serde(default)]
    pub aesthetic_tags: Vec<u32>,
    #[serde(default)]
    pub num_views: u32,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub id: u32,
    #[serde(default)]
    pub owned_decks: Vec<u32>,
    /// Whether the quiz should use this user's own table (owned decks
    /// excluded) instead of the global one.
    #[serde(default = "default_use_custom_lookup")]
    pub use_custom_lookup: bool,
}

fn default_use_custom_lookup() -> bool {
    true
}

impl UserRecord {
    pub fn new(id: u32, owned_decks: Vec<u32>) -> Self {
        Self {
            id,
            owned_decks,
            use_custom_lookup: true,
        }
    }
}

/// Everything the table builder and the result route need from the database.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeckCatalog {
    #[serde(default)]
    pub decks: Vec<DeckRecord>,
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub performance_tags: Vec<Tag>,
    #[serde(default)]
    pub aesthetic_tags: Vec<Tag>,
}

impl DeckCatalog {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a catalog export from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| LookupError::io(path, e))?;
        let catalog = Self::from_json(&text)?;
        info!(
            path = %path.display(),
            decks = catalog.decks.len(),
            users = catalog.users.len(),
            "loaded deck catalog"
        );
        Ok(catalog)
    }

    /// Write the catalog with the same temp-file-then-rename swap used for tables.
    pub fn save_atomic(&self, path: &Path) -> Result<()> {
        store::write_atomic(path, self.to_json()?.as_bytes())
    }

    pub fn deck(&self, id: u32) -> Option<&DeckRecord> {
        self.decks.iter().find(|d| d.id == id)
    }

    pub fn user(&self, id: u32) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Decks not in `excluded`, in catalog order.
    pub fn universe<'a>(&'a self, excluded: &BTreeSet<u32>) -> Vec<&'a DeckRecord> {
        self.decks
            .iter()
            .filter(|d| !excluded.contains(&d.id))
            .collect()
    }

    /// Replace a user's owned-deck list. Creates the user record if absent.
    pub fn set_owned_decks(&mut self, user_id: u32, deck_ids: &[u32]) -> Result<()> {
        if let Some(missing) = deck_ids.iter().find(|id| self.deck(**id).is_none()) {
            return Err(LookupError::UnknownDeck(*missing));
        }
        let owned: Vec<u32> = deck_ids
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        match self.users.iter_mut().find(|u| u.id == user_id) {
            Some(user) => user.owned_decks = owned,
            None => self.users.push(UserRecord::new(user_id, owned)),
        }
        Ok(())
    }

    /// Turn a user's custom table on or off.
    pub fn set_use_custom_lookup(&mut self, user_id: u32, enabled: bool) -> Result<()> {
        let user = self
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(LookupError::UnknownUser(user_id))?;
        user.use_custom_lookup = enabled;
        Ok(())
    }

    /// Whether the quiz for `user_id` should read the user's own table.
    /// Users the catalog does not know get the global table.
    pub fn uses_custom_lookup(&self, user_id: u32) -> bool {
        self.user(user_id).is_some_and(|u| u.use_custom_lookup)
    }

    /// Count one served recommendation. Returns false for an unknown deck.
    pub fn record_view(&mut self, deck_id: u32) -> bool {
        match self.decks.iter_mut().find(|d| d.id == deck_id) {
            Some(deck) => {
                deck.num_views = deck.num_views.saturating_add(1);
                true
            }
            None => false,
        }
    }

    pub fn performance_tag(&self, id: u32) -> Option<&Tag> {
        self.performance_tags.iter().find(|t| t.id == id)
    }

    pub fn aesthetic_tag(&self, id: u32) -> Option<&Tag> {
        self.aesthetic_tags.iter().find(|t| t.id == id)
    }
}

//! Deck universes: which decks a table is built from.

use std::collections::BTreeSet;
use std::fmt;

use tracing::info;

use crate::catalog::DeckCatalog;
use crate::error::{LookupError, Result};
use crate::lookup::table::{build_table, BuildLimits, LookupTable};
use crate::lookup::token::DeckAttributeProfile;

/// The whole catalog, or the catalog minus the decks one user already owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Universe {
    Global,
    User(u32),
}

impl Universe {
    /// Artifact file name for this universe.
    pub fn file_name(self) -> String {
        match self {
            Universe::Global => "lookup_table.json".to_string(),
            Universe::User(id) => format!("lookup_table_{}.json", id),
        }
    }

    /// Deck ids left out of this universe.
    pub fn exclusions(self, catalog: &DeckCatalog) -> Result<BTreeSet<u32>> {
        match self {
            Universe::Global => Ok(BTreeSet::new()),
            Universe::User(id) => catalog
                .user(id)
                .map(|u| u.owned_decks.iter().copied().collect())
                .ok_or(LookupError::UnknownUser(id)),
        }
    }
}

impl fmt::Display for Universe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Universe::Global => write!(f, "global"),
            Universe::User(id) => write!(f, "user {}", id),
        }
    }
}

/// Extract profiles for the universe and build its table.
///
/// Any deck that fails extraction fails the whole build; a table is never
/// published with decks silently dropped.
pub fn build_for_universe(
    catalog: &DeckCatalog,
    universe: Universe,
    limits: &BuildLimits,
) -> Result<LookupTable> {
    let excluded = universe.exclusions(catalog)?;
    let profiles = catalog
        .universe(&excluded)
        .into_iter()
        .map(DeckAttributeProfile::from_record)
        .collect::<Result<Vec<_>>>()?;

    info!(
        %universe,
        decks = profiles.len(),
        excluded = excluded.len(),
        "building lookup table"
    );
    build_table(&profiles, limits)
}

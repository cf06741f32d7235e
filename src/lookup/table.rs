//! Lookup-table construction and serialization.
//!
//! The table is built per deck universe in one pass over the deck profiles:
//!
//! 1. each deck's full token set (its base key) is seeded as unique, or
//!    multiple if another deck already produced that key;
//! 2. every non-empty proper subset of the deck's tokens is visited in
//!    increasing size. A new subset is unique. A subset that was unique
//!    becomes multiple, together with every subset of it already in the
//!    table;
//! 3. each base key gets an `end` variant mirroring its final status;
//! 4. `empty` is always multiple.
//!
//! Step 2 enumerates `2^n - 2` subsets per deck, so `n` is capped by
//! [`BuildLimits`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{LookupError, Result};
use crate::lookup::token::{DeckAttributeProfile, LookupKey, EMPTY_KEY, KEY_SEPARATOR};

/// Whether a set of answers identifies one deck.
///
/// Serialized as `1` (unique) / `0` (multiple); the quiz UI reads those
/// literal integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Status {
    /// Zero or several decks match; keep asking.
    Multiple,
    /// Exactly one deck matches; show it.
    Unique,
}

impl From<Status> for u8 {
    fn from(status: Status) -> u8 {
        match status {
            Status::Multiple => 0,
            Status::Unique => 1,
        }
    }
}

impl TryFrom<u8> for Status {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Status::Multiple),
            1 => Ok(Status::Unique),
            other => Err(format!("invalid lookup status {}, expected 0 or 1", other)),
        }
    }
}

/// Bounds on a single build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildLimits {
    /// Largest token count a single deck may have.
    pub max_tokens_per_deck: usize,
}

impl BuildLimits {
    /// Subset masks are `u64`; anything past this would also never finish.
    pub const HARD_MAX_TOKENS: usize = 32;

    pub fn new(max_tokens_per_deck: usize) -> Self {
        Self {
            max_tokens_per_deck: max_tokens_per_deck.min(Self::HARD_MAX_TOKENS),
        }
    }
}

impl Default for BuildLimits {
    fn default() -> Self {
        Self {
            max_tokens_per_deck: 16,
        }
    }
}

/// Key → status mapping for one deck universe. Keys iterate in sorted order,
/// so serialization is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupTable {
    entries: BTreeMap<String, Status>,
}

impl LookupTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Status)> {
        self.entries.iter().map(|(k, s)| (k.as_str(), *s))
    }

    pub fn contains(&self, key: &LookupKey) -> bool {
        self.entries.contains_key(key.as_str())
    }

    /// Exact lookup. `None` means no deck in the universe produced this key.
    pub fn status_of(&self, key: &LookupKey) -> Option<Status> {
        self.entries.get(key.as_str()).copied()
    }

    /// Status for a key, treating absent keys as [`Status::Multiple`] so the
    /// quiz keeps asking instead of failing.
    pub fn resolve(&self, key: &LookupKey) -> Status {
        self.resolve_or(key, Status::Multiple)
    }

    /// Status for a key, with a caller-chosen fallback for absent keys.
    pub fn resolve_or(&self, key: &LookupKey, fallback: Status) -> Status {
        self.status_of(key).unwrap_or(fallback)
    }

    /// True if any key starts with `prefix` as a plain string.
    pub fn has_key_with_prefix(&self, prefix: &str) -> bool {
        self.entries
            .range::<str, _>((std::ops::Bound::Included(prefix), std::ops::Bound::Unbounded))
            .next()
            .is_some_and(|(k, _)| k.starts_with(prefix))
    }

    pub fn count(&self, status: Status) -> usize {
        self.entries.values().filter(|s| **s == status).count()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Pretty JSON with 4-space indentation and sorted keys.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.entries.len() * 32);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut ser)?;
        Ok(out)
    }
}

// ── Construction ───────────────────────────────────────────────────

/// Build the lookup table for a set of deck profiles.
///
/// Pure and deterministic: the same profiles in the same order always give
/// the same table. Fails if a deck exceeds `limits.max_tokens_per_deck`.
pub fn build_table(profiles: &[DeckAttributeProfile], limits: &BuildLimits) -> Result<LookupTable> {
    let limit = limits.max_tokens_per_deck.min(BuildLimits::HARD_MAX_TOKENS);
    let mut entries: BTreeMap<String, Status> = BTreeMap::new();
    let mut base_keys: Vec<String> = Vec::with_capacity(profiles.len());

    for profile in profiles {
        if profile.len() > limit {
            return Err(LookupError::TooManyTokens {
                deck_id: profile.deck_id,
                count: profile.len(),
                limit,
            });
        }
        let tokens: Vec<&str> = profile.tokens().collect();
        let base_key = tokens.join(KEY_SEPARATOR);

        // A repeated full signature is ambiguous; its subsets are handled
        // by the subset pass below.
        entries
            .entry(base_key.clone())
            .and_modify(|s| *s = Status::Multiple)
            .or_insert(Status::Unique);
        base_keys.push(base_key);

        let n = tokens.len();
        for size in 1..n {
            for mask in masks_of_size(n, size) {
                let key = key_for_mask(&tokens, mask);
                match entries.get(&key).copied() {
                    None => {
                        entries.insert(key, Status::Unique);
                    }
                    Some(Status::Unique) => {
                        entries.insert(key, Status::Multiple);
                        mark_subsets_multiple(&mut entries, &tokens, mask);
                    }
                    Some(Status::Multiple) => {}
                }
            }
        }
        debug!(deck_id = profile.deck_id, tokens = n, "processed deck profile");
    }

    for base_key in &base_keys {
        let end_key = LookupKey::end_key(base_key).into_string();
        if !entries.contains_key(&end_key) {
            let status = entries.get(base_key).copied().unwrap_or(Status::Multiple);
            entries.insert(end_key, status);
        }
    }

    entries.insert(EMPTY_KEY.to_string(), Status::Multiple);

    let table = LookupTable { entries };
    info!(
        decks = profiles.len(),
        keys = table.len(),
        unique = table.count(Status::Unique),
        "built lookup table"
    );
    Ok(table)
}

/// Mark every non-empty proper subset of `mask` that is already in the table
/// as multiple. Walks the submasks of `mask` in place, no recursion.
fn mark_subsets_multiple(entries: &mut BTreeMap<String, Status>, tokens: &[&str], mask: u64) {
    let mut sub = mask.wrapping_sub(1) & mask;
    while sub != 0 {
        if let Some(status) = entries.get_mut(&key_for_mask(tokens, sub)) {
            *status = Status::Multiple;
        }
        sub = (sub - 1) & mask;
    }
}

/// Join the tokens selected by `mask`. `tokens` is sorted, so the result is
/// already canonical.
fn key_for_mask(tokens: &[&str], mask: u64) -> String {
    let mut key = String::new();
    for (i, token) in tokens.iter().enumerate() {
        if mask & (1 << i) != 0 {
            if !key.is_empty() {
                key.push_str(KEY_SEPARATOR);
            }
            key.push_str(token);
        }
    }
    key
}

/// All `n`-bit masks with exactly `size` bits set, ascending (Gosper's hack).
fn masks_of_size(n: usize, size: usize) -> impl Iterator<Item = u64> {
    let limit = 1u64 << n;
    let mut next = (size > 0 && size <= n).then(|| (1u64 << size) - 1);
    std::iter::from_fn(move || {
        let mask = next.filter(|m| *m < limit)?;
        let low = mask & mask.wrapping_neg();
        let ripple = mask + low;
        next = Some((((ripple ^ mask) >> 2) / low) | ripple);
        Some(mask)
    })
}

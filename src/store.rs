//! Published lookup-table artifacts.
//!
//! One JSON file per universe under a table directory:
//! `lookup_table.json` for the whole catalog and `lookup_table_<user>.json`
//! for each user's catalog-minus-owned-decks. A rebuild writes a fresh
//! temporary file next to the target and renames it into place, so readers
//! see either the old table or the new one, never a partial write. Each
//! writer gets its own temporary file; with concurrent rebuilds the last
//! rename wins.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::{info, warn};

use crate::catalog::DeckCatalog;
use crate::error::{LookupError, Result};
use crate::lookup::{build_for_universe, BuildLimits, LookupTable, Universe};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write `bytes` to `path` through a uniquely named temporary file in the
/// same directory, then rename over the target. On failure the temporary
/// file is removed and the target is left as it was.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| LookupError::io(dir, e))?;

    let tmp = temp_path(dir, path);
    if let Err(e) = write_then_rename(&tmp, path, bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(LookupError::io(path, e));
    }
    Ok(())
}

fn write_then_rename(tmp: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(tmp, target)
}

fn temp_path(dir: &Path, target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    dir.join(format!(".{}.{}.{}.tmp", name, std::process::id(), seq))
}

// ── Table store ────────────────────────────────────────────────────

/// Directory of published lookup tables.
#[derive(Debug, Clone)]
pub struct TableStore {
    dir: PathBuf,
}

impl TableStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, universe: Universe) -> PathBuf {
        self.dir.join(universe.file_name())
    }

    pub fn exists(&self, universe: Universe) -> bool {
        self.path_for(universe).is_file()
    }

    /// Serialize the whole table in memory, then swap it into place.
    pub fn publish(&self, universe: Universe, table: &LookupTable) -> Result<PathBuf> {
        let path = self.path_for(universe);
        let bytes = table.to_json_bytes()?;
        write_atomic(&path, &bytes)?;
        info!(
            %universe,
            path = %path.display(),
            keys = table.len(),
            bytes = bytes.len(),
            "published lookup table"
        );
        Ok(path)
    }

    pub fn load(&self, universe: Universe) -> Result<LookupTable> {
        let path = self.path_for(universe);
        let text = fs::read_to_string(&path).map_err(|e| LookupError::io(&path, e))?;
        LookupTable::from_json(&text)
    }

    /// The table a quiz should use: the user's own table when one has been
    /// published, the global table otherwise.
    pub fn load_for_user(&self, user_id: Option<u32>) -> Result<(Universe, LookupTable)> {
        if let Some(id) = user_id {
            let universe = Universe::User(id);
            if self.exists(universe) {
                return Ok((universe, self.load(universe)?));
            }
            warn!(user_id = id, "no per-user lookup table, falling back to global");
        }
        Ok((Universe::Global, self.load(Universe::Global)?))
    }

    /// Like [`TableStore::load_for_user`], but a user who turned their
    /// custom table off in the catalog gets the global table.
    pub fn load_preferred(
        &self,
        catalog: &DeckCatalog,
        user_id: Option<u32>,
    ) -> Result<(Universe, LookupTable)> {
        let user_id = user_id.filter(|id| catalog.uses_custom_lookup(*id));
        self.load_for_user(user_id)
    }

    /// Build and publish one universe's table.
    pub fn rebuild(
        &self,
        catalog: &DeckCatalog,
        universe: Universe,
        limits: &BuildLimits,
    ) -> Result<PathBuf> {
        let start = Instant::now();
        let table = build_for_universe(catalog, universe, limits)?;
        let path = self.publish(universe, &table)?;
        info!(
            %universe,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "rebuild complete"
        );
        Ok(path)
    }

    /// Rebuild every user's table. Stops at the first failure; tables
    /// already published by this run stay published.
    pub fn rebuild_all_users(
        &self,
        catalog: &DeckCatalog,
        limits: &BuildLimits,
    ) -> Result<Vec<PathBuf>> {
        catalog
            .users
            .iter()
            .map(|user| self.rebuild(catalog, Universe::User(user.id), limits))
            .collect()
    }
}

/// Record a user's new owned-deck list and rebuild their table.
///
/// The catalog file is replaced atomically before the rebuild, so a failed
/// rebuild leaves the new ownership recorded and the previous table
/// published; running the user rebuild again converges.
pub fn update_owned_decks(
    catalog_path: &Path,
    store: &TableStore,
    user_id: u32,
    deck_ids: &[u32],
    limits: &BuildLimits,
) -> Result<PathBuf> {
    let mut catalog = DeckCatalog::load(catalog_path)?;
    catalog.set_owned_decks(user_id, deck_ids)?;
    catalog.save_atomic(catalog_path)?;
    info!(user_id, owned = deck_ids.len(), "updated owned decks");
    store.rebuild(&catalog, Universe::User(user_id), limits)
}

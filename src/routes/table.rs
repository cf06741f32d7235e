//! `/api/table/*` and `/api/catalog/load`: feed the worker the artifacts the
//! admin tool publishes.

use crate::lookup::Status;
use crate::quiz::state;
use crate::routes::util::{error_fragment, escape_html, get_param, parse_params};

// ── POST /api/table/load ───────────────────────────────────────────

/// Handle POST /api/table/load
/// Body is the published lookup-table JSON. An optional `?source=` names
/// the file it came from (defaults to `posted`).
pub fn handle_load_post(query: &str, body: &str) -> String {
    let params = parse_params(query);
    let source = get_param(&params, "source")
        .filter(|s| !s.is_empty())
        .unwrap_or("posted");

    if body.trim().is_empty() {
        return error_fragment("Missing lookup table body");
    }
    match state::load_table_json(body, source) {
        Ok(keys) => format!(
            r#"<span class="text-emerald-600">Loaded {} keys from {}</span>"#,
            keys,
            escape_html(source)
        ),
        Err(e) => error_fragment(&format!("Table load failed: {}", e)),
    }
}

// ── GET /api/table/status ──────────────────────────────────────────

/// Handle GET /api/table/status
pub fn handle_status_get(_query: &str) -> String {
    state::with_state(|s| match &s.table {
        Some(active) => format!(
            r#"<div id="table-status" class="text-sm">{} · {} keys ({} unique)</div>"#,
            escape_html(&active.source),
            active.table.len(),
            active.table.count(Status::Unique)
        ),
        None => r#"<div id="table-status" class="text-sm text-gray-500">No lookup table loaded</div>"#
            .to_string(),
    })
}

// ── POST /api/catalog/load ─────────────────────────────────────────

/// Handle POST /api/catalog/load
/// Body is the deck catalog JSON. Tag questions are rebuilt from it.
pub fn handle_catalog_load_post(body: &str) -> String {
    if body.trim().is_empty() {
        return error_fragment("Missing catalog body");
    }
    match state::load_catalog_json(body) {
        Ok(decks) => format!(
            r#"<span class="text-emerald-600">Loaded {} decks</span>"#,
            decks
        ),
        Err(e) => error_fragment(&format!("Catalog load failed: {}", e)),
    }
}

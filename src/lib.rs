//! Deckfinder: deck-recommendation lookup tables and the in-browser quiz server.
//!
//! The admin binary (`deckfinder-build`) builds one lookup table per universe
//! from the deck catalog and publishes it as JSON. The WASM side exports
//! `handle_request(method, path, query, body)` for the Service Worker bridge:
//! it loads a published table and catalog, walks the player through the quiz,
//! and resolves the final key to a deck. Routing uses `matchit`.

use wasm_bindgen::prelude::*;

pub mod catalog;
pub mod error;
pub mod lookup;
pub mod quiz;
pub mod routes;
pub mod store;

pub use error::{LookupError, Result};

/// Process an HTTP-like request and return an HTML fragment (or JSON for
/// `/api/lookup` and `/api/quiz/state`).
///
/// # Arguments
/// * `method` - HTTP method (`GET`, `POST`)
/// * `path`   - URL path (e.g. `/api/quiz/step`)
/// * `query`  - Query string (e.g. `?key=d%3D0%7Cs%3D1`)
/// * `body`   - Request body; empty for GET requests.
#[wasm_bindgen]
pub fn handle_request(method: &str, path: &str, query: &str, body: &str) -> String {
    let mut router = matchit::Router::new();

    router.insert("/api/table/load", "table_load").ok();
    router.insert("/api/table/status", "table_status").ok();
    router.insert("/api/catalog/load", "catalog_load").ok();
    router.insert("/api/lookup", "lookup").ok();

    router.insert("/api/quiz/step", "quiz_step").ok();
    router.insert("/api/quiz/answer", "quiz_answer").ok();
    router.insert("/api/quiz/select", "quiz_select").ok();
    router.insert("/api/quiz/back", "quiz_back").ok();
    router.insert("/api/quiz/reset", "quiz_reset").ok();
    router.insert("/api/quiz/state", "quiz_state").ok();
    router.insert("/api/quiz/import", "quiz_import").ok();

    router.insert("/api/deck/result", "deck_result").ok();

    match router.at(path) {
        Ok(matched) => match (*matched.value, method) {
            ("table_load", "POST") => routes::table::handle_load_post(query, body),
            ("table_status", "GET") => routes::table::handle_status_get(query),
            ("catalog_load", "POST") => routes::table::handle_catalog_load_post(body),
            ("lookup", "GET") => routes::lookup::handle_get(query),

            ("quiz_step", "GET") => routes::quiz::handle_step_get(query),
            ("quiz_answer", "POST") => routes::quiz::handle_answer_post(body),
            ("quiz_select", "POST") => routes::quiz::handle_select_post(body),
            ("quiz_back", "POST") => routes::quiz::handle_back_post(body),
            ("quiz_reset", "POST") => routes::quiz::handle_reset_post(body),
            ("quiz_state", "GET") => routes::quiz::handle_state_get(query),
            ("quiz_import", "POST") => routes::quiz::handle_import_post(body),

            ("deck_result", "GET") => routes::deck::handle_result_get(query),

            _ => method_not_allowed(),
        },
        Err(_) => not_found(),
    }
}

fn not_found() -> String {
    r#"<span class="text-red-600">404: route not found</span>"#.to_string()
}

fn method_not_allowed() -> String {
    r#"<span class="text-red-600">405: method not allowed</span>"#.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::state::{replace_state, QuizState};

    const TABLE: &str = r#"{"a=0|d=0|s=0|t=0": 1, "empty": 0, "s=0": 1}"#;

    #[test]
    fn returns_404_for_unknown_route() {
        let html = handle_request("GET", "/api/nonexistent", "", "");
        assert!(html.contains("404"));
    }

    #[test]
    fn returns_405_for_wrong_method() {
        assert!(handle_request("POST", "/api/lookup", "", "").contains("405"));
        assert!(handle_request("GET", "/api/table/load", "", "").contains("405"));
        assert!(handle_request("GET", "/api/quiz/answer", "", "").contains("405"));
    }

    #[test]
    fn routes_table_load_and_lookup() {
        replace_state(QuizState::default());
        let html = handle_request("POST", "/api/table/load", "?source=lookup_table.json", TABLE);
        assert!(html.contains("Loaded 3 keys"));
        assert!(handle_request("GET", "/api/table/status", "", "").contains("lookup_table.json"));

        let json = handle_request("GET", "/api/lookup", "?key=s%3D0", "");
        assert_eq!(json, r#"{"key":"s=0","status":1}"#);
        replace_state(QuizState::default());
    }

    #[test]
    fn routes_quiz_step_and_state() {
        replace_state(QuizState::default());
        handle_request("POST", "/api/table/load", "", TABLE);
        let html = handle_request("GET", "/api/quiz/step", "", "");
        assert!(html.contains(r#"<div id="quiz">"#));

        let html = handle_request("POST", "/api/quiz/answer", "", "question=atag&value=");
        assert!(html.contains(r#"value="s""#));

        let state = handle_request("GET", "/api/quiz/state", "", "");
        assert!(state.contains("atag"));
        handle_request("POST", "/api/quiz/reset", "", "");
        assert!(handle_request("POST", "/api/quiz/import", "", &state).contains("restored"));
        replace_state(QuizState::default());
    }

    #[test]
    fn routes_catalog_and_result() {
        replace_state(QuizState::default());
        let catalog = r#"{"decks": [
            {"id": 9, "name": "Branded", "strength": 0, "difficulty": 0, "deck_type": 0, "art_style": 0}
        ]}"#;
        assert!(handle_request("POST", "/api/catalog/load", "", catalog).contains("Loaded 1 decks"));
        let html = handle_request("GET", "/api/deck/result", "?key=a%3D0%7Cd%3D0%7Cs%3D0%7Ct%3D0%7Cend", "");
        assert!(html.contains("Branded"));
        replace_state(QuizState::default());
    }
}

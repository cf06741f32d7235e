//! `GET /api/lookup`: resolve a key against the loaded table.
//!
//! Accepts either a ready-made key (`?key=d%3D0%7Cs%3D1`) or individual
//! answers (`?answer=s%3D1&answer=d%3D0`) in any order. Responds with JSON
//! `{"key": "...", "status": 0|1}`; keys the table never produced come back
//! as 0.

use serde_json::json;

use crate::lookup::{AnswerSet, LookupKey};
use crate::quiz::state;
use crate::routes::util::{get_param, get_params, parse_params};

pub fn handle_get(query: &str) -> String {
    let params = parse_params(query);
    let key = match get_param(&params, "key") {
        Some(raw) if !raw.trim().is_empty() => LookupKey::parse(raw),
        _ => AnswerSet::from_tokens(get_params(&params, "answer")).key(),
    };

    state::with_state(|s| match &s.table {
        Some(active) => {
            let status = active.table.resolve(&key);
            json!({ "key": key.as_str(), "status": u8::from(status) }).to_string()
        }
        None => json!({ "key": key.as_str(), "error": "no lookup table loaded" }).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::state::{load_table_json, replace_state, QuizState};

    fn parse(out: &str) -> serde_json::Value {
        serde_json::from_str(out).unwrap()
    }

    #[test]
    fn resolves_key_and_answers_alike() {
        replace_state(QuizState::default());
        load_table_json(r#"{"empty": 0, "d=0|s=1": 1, "s=1": 0}"#, "test").unwrap();

        let by_key = parse(&handle_get("?key=s%3D1%7Cd%3D0"));
        assert_eq!(by_key["key"], "d=0|s=1");
        assert_eq!(by_key["status"], 1);

        let by_answers = parse(&handle_get("?answer=s%3D1&answer[]=d%3D0"));
        assert_eq!(by_answers, by_key);
        replace_state(QuizState::default());
    }

    #[test]
    fn unknown_and_empty_keys_are_multiple() {
        replace_state(QuizState::default());
        load_table_json(r#"{"empty": 0, "s=1": 1}"#, "test").unwrap();
        let unknown = parse(&handle_get("?key=s%3D3"));
        assert_eq!(unknown["status"], 0);
        let empty = parse(&handle_get(""));
        assert_eq!(empty["key"], "empty");
        assert_eq!(empty["status"], 0);
        replace_state(QuizState::default());
    }

    #[test]
    fn reports_missing_table() {
        replace_state(QuizState::default());
        let out = parse(&handle_get("?key=s%3D1"));
        assert_eq!(out["error"], "no lookup table loaded");
    }
}

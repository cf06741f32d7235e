//! `/api/quiz/*` routes: the question flow rendered as HTMX fragments.
//!
//! Every mutating route answers with the re-rendered `#quiz` panel, so the
//! page swaps one element per click.

use crate::lookup::LookupTable;
use crate::quiz::questions::{Question, QuizOption};
use crate::quiz::session::{QuizSession, QuizStep};
use crate::quiz::state::{self, QuizState};
use crate::routes::util::{
    error_fragment, escape_html, get_param, parse_params, percent_encode,
};

// ── Rendering ──────────────────────────────────────────────────────

fn render(s: &QuizState) -> String {
    let Some(active) = &s.table else {
        return error_fragment("No lookup table loaded");
    };
    let step = s.session.next_step(&active.table, &s.questions);
    render_step(&step, &s.session, &active.table, &s.questions)
}

fn render_step(
    step: &QuizStep,
    session: &QuizSession,
    table: &LookupTable,
    questions: &[Question],
) -> String {
    let body = match step {
        QuizStep::Ask { question, options } => render_question(question, options),
        QuizStep::ChooseOptional(valid) => render_optional_choice(valid, session),
        QuizStep::Finish(key) => format!(
            r##"<div hx-get="/api/deck/result?key={}" hx-trigger="load" hx-target="#quiz-result" hx-swap="innerHTML"></div>
<div id="quiz-result"><span class="text-gray-500">Finding your deck…</span></div>"##,
            percent_encode(key.as_str())
        ),
    };

    let answered = session.answers.len() + session.hidden_question_count(table, questions);
    let progress = format!(
        r#"<div class="text-xs text-gray-500 mb-2">{} of {} answered</div>"#,
        answered.min(questions.len()),
        questions.len()
    );

    let back = if session.answers.is_empty() && session.selected_optional.is_none() {
        String::new()
    } else {
        r##"<div class="flex gap-2 mt-3">
  <button class="px-2 py-1 border rounded" hx-post="/api/quiz/back" hx-target="#quiz" hx-swap="outerHTML">Back</button>
  <button class="px-2 py-1 border rounded" hx-post="/api/quiz/reset" hx-target="#quiz" hx-swap="outerHTML">Start over</button>
</div>"##
            .to_string()
    };

    format!(r#"<div id="quiz">{}{}{}</div>"#, progress, body, back)
}

fn render_question(question: &Question, options: &[QuizOption]) -> String {
    let mut html = format!(
        r##"<h3 class="font-bold mb-2">{}</h3><form hx-post="/api/quiz/answer" hx-target="#quiz" hx-swap="outerHTML">
<input type="hidden" name="question" value="{}">"##,
        escape_html(&question.prompt),
        question.key()
    );
    if options.is_empty() {
        html.push_str(r#"<span class="text-gray-500">No decks left for this question.</span>"#);
    }
    for opt in options {
        let value = opt.value.map(|v| v.to_string()).unwrap_or_default();
        html.push_str(&format!(
            r#"<button class="block w-full text-left px-3 py-2 my-1 border rounded" name="value" value="{}">{}</button>"#,
            value,
            escape_html(&opt.label)
        ));
    }
    html.push_str("</form>");
    html
}

fn render_optional_choice(valid: &[Question], session: &QuizSession) -> String {
    let mut html = String::from(
        r##"<h3 class="font-bold mb-2">What should we ask about next?</h3><form hx-post="/api/quiz/select" hx-target="#quiz" hx-swap="outerHTML">"##,
    );
    for q in valid {
        let disabled = if session.is_answered(q.key()) {
            " disabled"
        } else {
            ""
        };
        html.push_str(&format!(
            r#"<button class="block w-full text-left px-3 py-2 my-1 border rounded" name="question" value="{}"{}>{}</button>"#,
            q.key(),
            disabled,
            escape_html(&q.prompt)
        ));
    }
    html.push_str("</form>");
    html
}

// ── GET /api/quiz/step ─────────────────────────────────────────────

/// Handle GET /api/quiz/step
pub fn handle_step_get(_query: &str) -> String {
    state::with_state(render)
}

// ── POST /api/quiz/answer ──────────────────────────────────────────

/// Handle POST /api/quiz/answer
/// Body: `question={key}&value={n}`; an empty `value` is "no preference".
pub fn handle_answer_post(body: &str) -> String {
    let params = parse_params(body);
    let question = match get_param(&params, "question") {
        Some(q) if !q.is_empty() => q,
        _ => return error_fragment("Missing question parameter"),
    };
    let value = match get_param(&params, "value").unwrap_or("") {
        "" => None,
        raw => match raw.parse::<u32>() {
            Ok(v) => Some(v),
            Err(_) => return error_fragment("Invalid value parameter"),
        },
    };

    state::with_state_mut(|s| {
        let Some(active) = &s.table else {
            return error_fragment("No lookup table loaded");
        };
        match s
            .session
            .answer(&active.table, &s.questions, question, value)
        {
            Ok(()) => render(s),
            Err(e) => error_fragment(&e.to_string()),
        }
    })
}

// ── POST /api/quiz/select ──────────────────────────────────────────

/// Handle POST /api/quiz/select
/// Body: `question={key}`, one of the optional questions.
pub fn handle_select_post(body: &str) -> String {
    let params = parse_params(body);
    let question = get_param(&params, "question").unwrap_or("");

    state::with_state_mut(|s| {
        let Some(active) = &s.table else {
            return error_fragment("No lookup table loaded");
        };
        match s
            .session
            .select_optional(&active.table, &s.questions, question)
        {
            Ok(()) => render(s),
            Err(e) => error_fragment(&e.to_string()),
        }
    })
}

// ── POST /api/quiz/back ────────────────────────────────────────────

/// Handle POST /api/quiz/back
pub fn handle_back_post(_body: &str) -> String {
    state::with_state_mut(|s| {
        s.session.go_back(&s.questions);
        render(s)
    })
}

// ── POST /api/quiz/reset ───────────────────────────────────────────

/// Handle POST /api/quiz/reset
pub fn handle_reset_post(_body: &str) -> String {
    state::with_state_mut(|s| {
        s.session.reset();
        render(s)
    })
}

// ── GET /api/quiz/state ────────────────────────────────────────────

/// Handle GET /api/quiz/state
/// Session JSON for the page to keep in localStorage.
pub fn handle_state_get(_query: &str) -> String {
    state::export_session_json()
}

// ── POST /api/quiz/import ──────────────────────────────────────────

/// Handle POST /api/quiz/import
/// Body is a session previously returned by GET /api/quiz/state.
pub fn handle_import_post(body: &str) -> String {
    match state::import_session_json(body.trim()) {
        Ok(()) => r#"<span class="text-emerald-600">Quiz progress restored</span>"#.to_string(),
        Err(e) => error_fragment(&format!("Import failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::plain_deck;
    use crate::catalog::DeckCatalog;
    use crate::lookup::{build_for_universe, BuildLimits, Universe};
    use crate::quiz::state::{load_table_json, replace_state, with_state};

    /// Two decks that differ only in strength.
    fn load_fixture() {
        replace_state(QuizState::default());
        let catalog = DeckCatalog {
            decks: vec![plain_deck(1, 0, 0, 0, 0), plain_deck(2, 1, 0, 0, 0)],
            ..Default::default()
        };
        let table =
            build_for_universe(&catalog, Universe::Global, &BuildLimits::default()).unwrap();
        let json = String::from_utf8(table.to_json_bytes().unwrap()).unwrap();
        load_table_json(&json, "test").unwrap();
    }

    #[test]
    fn step_without_table() {
        replace_state(QuizState::default());
        assert!(handle_step_get("").contains("No lookup table loaded"));
        assert!(handle_answer_post("question=s&value=0").contains("No lookup table loaded"));
    }

    #[test]
    fn first_step_asks_aesthetic_question() {
        load_fixture();
        let html = handle_step_get("");
        assert!(html.contains(r#"name="question" value="atag""#));
        assert!(html.contains("Show me every deck"));
        assert!(!html.contains("/api/quiz/back"));
        replace_state(QuizState::default());
    }

    #[test]
    fn strength_answer_finishes_with_result_link() {
        load_fixture();
        handle_answer_post("question=atag&value=");
        let strength = handle_step_get("");
        assert!(strength.contains(r#"value="s""#));
        assert!(strength.contains("A solid semi-tier deck"));

        let html = handle_answer_post("question=s&value=1");
        assert!(html.contains("/api/deck/result?key=s%3D1"));
        assert!(html.contains("/api/quiz/back"));
        replace_state(QuizState::default());
    }

    #[test]
    fn rejects_bad_answers() {
        load_fixture();
        assert!(handle_answer_post("value=0").contains("Missing question"));
        assert!(handle_answer_post("question=s&value=x").contains("Invalid value"));
        assert!(handle_answer_post("question=zz&value=0").contains("unknown question"));
        assert!(handle_answer_post("question=t&value=0").contains("not the one being asked"));
        handle_answer_post("question=atag&value=");
        assert!(handle_answer_post("question=s&value=3").contains("not available"));
        replace_state(QuizState::default());
    }

    #[test]
    fn back_and_reset() {
        load_fixture();
        handle_answer_post("question=atag&value=");
        with_state(|s| assert_eq!(s.session.answers.len(), 1));
        let html = handle_back_post("");
        assert!(html.contains(r#"value="atag""#));
        with_state(|s| assert!(s.session.answers.is_empty()));

        handle_answer_post("question=atag&value=");
        handle_reset_post("");
        with_state(|s| assert!(s.session.answers.is_empty()));
        replace_state(QuizState::default());
    }

    #[test]
    fn select_rejects_required_question() {
        load_fixture();
        assert!(handle_select_post("question=s").contains("cannot be selected"));
        replace_state(QuizState::default());
    }

    #[test]
    fn state_export_and_import() {
        load_fixture();
        handle_answer_post("question=atag&value=");
        let json = handle_state_get("");
        handle_reset_post("");
        assert!(handle_import_post(&json).contains("restored"));
        with_state(|s| assert_eq!(s.session.answers.len(), 1));
        assert!(handle_import_post("nope").contains("Import failed"));
        replace_state(QuizState::default());
    }
}

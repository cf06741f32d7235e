//! Quiz progress and the decision of what to show next.
//!
//! After every answer the session checks the lookup table. The quiz stops
//! as soon as the answers resolve to a unique deck, or once every question
//! is answered (or has nothing left to choose between) and some deck still
//! matches.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lookup::{LookupKey, LookupTable, Status};
use crate::quiz::questions::{Question, QuizOption};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuizError {
    #[error("unknown question `{0}`")]
    UnknownQuestion(String),

    #[error("question `{0}` was already answered")]
    AlreadyAnswered(String),

    #[error("option {value:?} is not available for question `{question}`")]
    UnavailableOption { question: String, value: Option<u32> },

    #[error("question `{0}` cannot be selected now")]
    NotSelectable(String),

    #[error("question `{0}` is not the one being asked")]
    OutOfTurn(String),
}

/// One answered question. `value: None` is "no preference".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub value: Option<u32>,
}

/// What the quiz UI should show next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizStep {
    /// Ask this question, offering only the options that keep some deck
    /// reachable.
    Ask {
        question: Question,
        options: Vec<QuizOption>,
    },
    /// Let the player pick the next optional question.
    ChooseOptional(Vec<Question>),
    /// Stop and show the recommendation for this key.
    Finish(LookupKey),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSession {
    pub answers: Vec<Answer>,
    /// Optional question the player chose but has not answered yet.
    pub selected_optional: Option<String>,
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_answered(&self, question: &str) -> bool {
        self.answers.iter().any(|a| a.question == question)
    }

    fn tokens<'a>(&'a self, questions: &'a [Question]) -> impl Iterator<Item = String> + 'a {
        self.answers.iter().filter_map(move |a| {
            find(questions, &a.question).and_then(|q| q.token_for(a.value))
        })
    }

    /// Canonical key of the answers so far.
    pub fn answer_key(&self, questions: &[Question]) -> LookupKey {
        LookupKey::from_tokens(self.tokens(questions))
    }

    /// Options of `question` that lead to a key some deck produces.
    /// "No preference" stays available while the current key is reachable.
    pub fn available_options(
        &self,
        table: &LookupTable,
        questions: &[Question],
        question: &Question,
    ) -> Vec<QuizOption> {
        let current: Vec<String> = self.tokens(questions).collect();
        let current_reachable = table.contains(&LookupKey::from_tokens(&current));
        question
            .options
            .iter()
            .filter(|opt| match question.token_for(opt.value) {
                Some(token) => {
                    let key = LookupKey::from_tokens(current.iter().cloned().chain([token]));
                    table.contains(&key)
                }
                None => current_reachable,
            })
            .cloned()
            .collect()
    }

    fn concrete_choices(
        &self,
        table: &LookupTable,
        questions: &[Question],
        question: &Question,
    ) -> usize {
        self.available_options(table, questions, question)
            .iter()
            .filter(|o| o.value.is_some())
            .count()
    }

    /// Unanswered optional questions with at most one real choice left.
    /// They are skipped, and count as answered when deciding whether the
    /// quiz is over.
    pub fn hidden_question_count(&self, table: &LookupTable, questions: &[Question]) -> usize {
        questions
            .iter()
            .filter(|q| !q.required && !self.is_answered(q.key()))
            .filter(|q| self.concrete_choices(table, questions, q) <= 1)
            .count()
    }

    /// Optional questions worth offering: more than one real choice left, or
    /// already answered (shown disabled by the UI).
    pub fn valid_optional_questions(
        &self,
        table: &LookupTable,
        questions: &[Question],
    ) -> Vec<Question> {
        questions
            .iter()
            .filter(|q| !q.required)
            .filter(|q| {
                self.is_answered(q.key()) || self.concrete_choices(table, questions, q) > 1
            })
            .cloned()
            .collect()
    }

    /// Decide what to show next.
    pub fn next_step(&self, table: &LookupTable, questions: &[Question]) -> QuizStep {
        let key = self.answer_key(questions);

        if !self.answers.is_empty() && table.resolve(&key) == Status::Unique {
            return QuizStep::Finish(key);
        }

        let total = questions.len();
        if total > 0
            && self.answers.len() + self.hidden_question_count(table, questions) >= total
            && table.has_key_with_prefix(key.as_str())
        {
            return QuizStep::Finish(key);
        }

        if let Some(question) = questions
            .iter()
            .find(|q| q.required && !self.is_answered(q.key()))
        {
            return self.ask(table, questions, question);
        }

        if let Some(selected) = self
            .selected_optional
            .as_deref()
            .and_then(|k| find(questions, k))
        {
            return self.ask(table, questions, selected);
        }

        QuizStep::ChooseOptional(self.valid_optional_questions(table, questions))
    }

    fn ask(&self, table: &LookupTable, questions: &[Question], question: &Question) -> QuizStep {
        QuizStep::Ask {
            question: question.clone(),
            options: self.available_options(table, questions, question),
        }
    }

    /// Record an answer. The option must be one the table still allows.
    pub fn answer(
        &mut self,
        table: &LookupTable,
        questions: &[Question],
        question_key: &str,
        value: Option<u32>,
    ) -> Result<(), QuizError> {
        let question = find(questions, question_key)
            .ok_or_else(|| QuizError::UnknownQuestion(question_key.to_string()))?;
        if self.is_answered(question_key) {
            return Err(QuizError::AlreadyAnswered(question_key.to_string()));
        }
        // Required questions go in order; an optional one only once every
        // required question is done and the player picked it.
        let next_required = questions
            .iter()
            .find(|q| q.required && !self.is_answered(q.key()));
        let in_turn = match next_required {
            Some(next) => next.kind == question.kind,
            None => self.selected_optional.as_deref() == Some(question_key),
        };
        if !in_turn {
            return Err(QuizError::OutOfTurn(question_key.to_string()));
        }
        let available = self.available_options(table, questions, question);
        if !available.iter().any(|o| o.value == value) {
            return Err(QuizError::UnavailableOption {
                question: question_key.to_string(),
                value,
            });
        }

        self.answers.push(Answer {
            question: question_key.to_string(),
            value,
        });
        self.selected_optional = None;
        Ok(())
    }

    /// Pick the next optional question to answer.
    pub fn select_optional(
        &mut self,
        table: &LookupTable,
        questions: &[Question],
        question_key: &str,
    ) -> Result<(), QuizError> {
        let question = find(questions, question_key)
            .ok_or_else(|| QuizError::UnknownQuestion(question_key.to_string()))?;
        let selectable = !question.required
            && !self.is_answered(question_key)
            && self
                .valid_optional_questions(table, questions)
                .iter()
                .any(|q| q.kind == question.kind);
        if !selectable {
            return Err(QuizError::NotSelectable(question_key.to_string()));
        }
        self.selected_optional = Some(question_key.to_string());
        Ok(())
    }

    /// Step back once:
    /// - from a selected optional question, return to the selection list;
    /// - otherwise drop the last answer, reopening it if it was optional.
    ///
    /// Returns false when there is nothing to undo.
    pub fn go_back(&mut self, questions: &[Question]) -> bool {
        if self.selected_optional.take().is_some() {
            return true;
        }
        let Some(last) = self.answers.pop() else {
            return false;
        };
        if find(questions, &last.question).is_some_and(|q| !q.required) {
            self.selected_optional = Some(last.question);
        }
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn find<'a>(questions: &'a [Question], key: &str) -> Option<&'a Question> {
    questions.iter().find(|q| q.key() == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::plain_deck;
    use crate::catalog::{DeckCatalog, Tag};
    use crate::lookup::{build_for_universe, BuildLimits, Universe};
    use crate::quiz::questions::question_catalog;

    /// Three decks; deck 1 and 2 differ only in strength and art style.
    fn fixture() -> (LookupTable, Vec<Question>) {
        let mut decks = vec![
            plain_deck(1, 0, 0, 0, 0),
            plain_deck(2, 1, 0, 0, 1),
            plain_deck(3, 1, 1, 2, 2),
        ];
        decks[0].aesthetic_tags = vec![5];
        decks[1].aesthetic_tags = vec![5];
        decks[2].summoning_methods = vec![3];
        let catalog = DeckCatalog {
            decks,
            aesthetic_tags: vec![Tag {
                id: 5,
                name: "dragons".to_string(),
                description: "Dragons".to_string(),
            }],
            ..Default::default()
        };
        let table = build_for_universe(&catalog, Universe::Global, &BuildLimits::default())
            .unwrap();
        (table, question_catalog(&catalog))
    }

    fn ask_key(step: &QuizStep) -> &'static str {
        match step {
            QuizStep::Ask { question, .. } => question.key(),
            other => panic!("expected a question, got {:?}", other),
        }
    }

    #[test]
    fn starts_with_first_required_question() {
        let (table, questions) = fixture();
        let session = QuizSession::new();
        assert_eq!(session.answer_key(&questions).as_str(), "empty");
        let step = session.next_step(&table, &questions);
        assert_eq!(ask_key(&step), "atag");
        if let QuizStep::Ask { options, .. } = step {
            // "no preference" plus the one tag some deck carries
            assert_eq!(options.len(), 2);
        }
    }

    #[test]
    fn unique_answer_finishes_early() {
        let (table, questions) = fixture();
        let mut session = QuizSession::new();
        session.answer(&table, &questions, "atag", Some(5)).unwrap();
        assert_eq!(ask_key(&session.next_step(&table, &questions)), "s");

        session.answer(&table, &questions, "s", Some(0)).unwrap();
        assert_eq!(
            session.next_step(&table, &questions),
            QuizStep::Finish(LookupKey::parse("atag=5|s=0"))
        );
    }

    #[test]
    fn unavailable_options_are_filtered_and_rejected() {
        let (table, questions) = fixture();
        let mut session = QuizSession::new();
        session.answer(&table, &questions, "atag", Some(5)).unwrap();

        let strength = &questions[1];
        let values: Vec<Option<u32>> = session
            .available_options(&table, &questions, strength)
            .iter()
            .map(|o| o.value)
            .collect();
        assert_eq!(values, vec![Some(0), Some(1), None]);

        let err = session.answer(&table, &questions, "s", Some(3)).unwrap_err();
        assert!(matches!(err, QuizError::UnavailableOption { .. }));
        assert_eq!(
            session.answer(&table, &questions, "atag", None),
            Err(QuizError::AlreadyAnswered("atag".to_string()))
        );
        assert_eq!(
            session.answer(&table, &questions, "zz", None),
            Err(QuizError::UnknownQuestion("zz".to_string()))
        );
    }

    #[test]
    fn answers_must_follow_the_question_order() {
        let (table, questions) = fixture();
        let mut session = QuizSession::new();
        assert_eq!(
            session.answer(&table, &questions, "t", Some(0)),
            Err(QuizError::OutOfTurn("t".to_string()))
        );
        assert_eq!(
            session.answer(&table, &questions, "s", Some(0)),
            Err(QuizError::OutOfTurn("s".to_string()))
        );
        assert!(session.answers.is_empty());

        session.answer(&table, &questions, "atag", Some(5)).unwrap();
        session.answer(&table, &questions, "s", None).unwrap();
        session.answer(&table, &questions, "d", Some(0)).unwrap();
        // Optional questions wait until the player selects them.
        assert_eq!(
            session.answer(&table, &questions, "a", Some(1)),
            Err(QuizError::OutOfTurn("a".to_string()))
        );
        session.select_optional(&table, &questions, "a").unwrap();
        session.answer(&table, &questions, "a", Some(1)).unwrap();
    }

    #[test]
    fn no_preference_adds_no_token() {
        let (table, questions) = fixture();
        let mut session = QuizSession::new();
        session.answer(&table, &questions, "atag", None).unwrap();
        session.answer(&table, &questions, "s", Some(1)).unwrap();
        assert_eq!(session.answer_key(&questions).as_str(), "s=1");
        assert_eq!(ask_key(&session.next_step(&table, &questions)), "d");
    }

    #[test]
    fn optional_questions_after_required() {
        let (table, questions) = fixture();
        let mut session = QuizSession::new();
        session.answer(&table, &questions, "atag", Some(5)).unwrap();
        session.answer(&table, &questions, "s", None).unwrap();
        session.answer(&table, &questions, "d", Some(0)).unwrap();

        // atag=5|d=0 still matches decks 1 and 2. Type, summoning and gimmick
        // have at most one choice left; only art style splits them.
        let offered = match session.next_step(&table, &questions) {
            QuizStep::ChooseOptional(offered) => offered,
            other => panic!("expected optional selection, got {:?}", other),
        };
        let keys: Vec<&str> = offered.iter().map(|q| q.key()).collect();
        assert_eq!(keys, vec!["a"]);

        session.select_optional(&table, &questions, "a").unwrap();
        assert_eq!(ask_key(&session.next_step(&table, &questions)), "a");
        session.answer(&table, &questions, "a", Some(1)).unwrap();
        assert_eq!(
            session.next_step(&table, &questions),
            QuizStep::Finish(LookupKey::parse("a=1|atag=5|d=0"))
        );
    }

    #[test]
    fn cannot_select_exhausted_optional_question() {
        let (table, questions) = fixture();
        let mut session = QuizSession::new();
        session.answer(&table, &questions, "atag", Some(5)).unwrap();
        session.answer(&table, &questions, "s", None).unwrap();
        session.answer(&table, &questions, "d", Some(0)).unwrap();
        assert_eq!(
            session.select_optional(&table, &questions, "t"),
            Err(QuizError::NotSelectable("t".to_string()))
        );
        assert_eq!(
            session.select_optional(&table, &questions, "s"),
            Err(QuizError::NotSelectable("s".to_string()))
        );
    }

    #[test]
    fn go_back_reopens_optional_question() {
        let (table, questions) = fixture();
        let mut session = QuizSession::new();
        assert!(!session.go_back(&questions));

        session.answer(&table, &questions, "atag", Some(5)).unwrap();
        session.answer(&table, &questions, "s", None).unwrap();
        session.answer(&table, &questions, "d", Some(0)).unwrap();
        session.select_optional(&table, &questions, "a").unwrap();

        // leave the selected question
        assert!(session.go_back(&questions));
        assert!(session.selected_optional.is_none());
        assert_eq!(session.answers.len(), 3);

        session.select_optional(&table, &questions, "a").unwrap();
        session.answer(&table, &questions, "a", Some(0)).unwrap();
        // undo an optional answer: it is reopened
        assert!(session.go_back(&questions));
        assert_eq!(session.selected_optional.as_deref(), Some("a"));
        assert_eq!(session.answers.len(), 3);

        // undo a required answer
        session.go_back(&questions);
        assert!(session.go_back(&questions));
        assert_eq!(session.answers.len(), 2);
        assert!(session.selected_optional.is_none());
        assert_eq!(ask_key(&session.next_step(&table, &questions)), "d");
    }

    #[test]
    fn all_answered_finishes_on_ambiguous_key() {
        let (table, questions) = fixture();
        let mut session = QuizSession::new();
        for q in &questions {
            session.answers.push(Answer {
                question: q.key().to_string(),
                value: None,
            });
        }
        assert_eq!(
            session.next_step(&table, &questions),
            QuizStep::Finish(LookupKey::empty())
        );
    }

    #[test]
    fn session_json_roundtrip() {
        let mut session = QuizSession::new();
        session.answers.push(Answer {
            question: "s".to_string(),
            value: Some(2),
        });
        session.selected_optional = Some("sm".to_string());
        let json = serde_json::to_string(&session).unwrap();
        let restored: QuizSession = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, session);
    }
}

// src/session.rs

use std::{collections::HashSet, fmt};

use chrono::{DateTime, Utc};

use crate::{
    config::OPTIONS_PER_QUESTION,
    models::quiz::{AnswerFeedback, Progress, QuizQuestion, Score},
    parser::ANSWER_UNAVAILABLE,
    utils::normalize::{answers_match, normalize},
};

/// Reasons a session operation can fail.
///
/// Every variant is recoverable: the session is left in a consistent state
/// and the operation may be retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The completion produced no questions at all.
    EmptyQuiz,

    /// Two questions carried the same number, so answers cannot be told apart.
    DuplicateOrdinal { ordinal: u32 },

    /// A question did not carry exactly four options.
    IncompleteOptions { ordinal: u32, found: usize },

    /// A question had a blank body.
    EmptyQuestion { ordinal: u32 },

    /// The correct answer matched `matches` options instead of exactly one.
    AnswerMismatch { ordinal: u32, matches: usize },

    /// There is no quiz to answer or score.
    NoActiveQuiz,

    /// An answer was recorded for a question that does not exist.
    AnswerOutOfRange { index: usize, len: usize },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::EmptyQuiz => write!(f, "Could not generate a quiz, please retry"),
            SessionError::DuplicateOrdinal { ordinal } => write!(
                f,
                "Question {} appears more than once. Please regenerate the quiz.",
                ordinal
            ),
            SessionError::IncompleteOptions { ordinal, found } => write!(
                f,
                "Question {} is incomplete ({} of {} options). Please regenerate the quiz.",
                ordinal, found, OPTIONS_PER_QUESTION
            ),
            SessionError::EmptyQuestion { ordinal } => write!(
                f,
                "Question {} has no text. Please regenerate the quiz.",
                ordinal
            ),
            SessionError::AnswerMismatch { ordinal, matches } => write!(
                f,
                "Question {} has an answer matching {} options instead of one. Please regenerate the quiz.",
                ordinal, matches
            ),
            SessionError::NoActiveQuiz => write!(f, "No active quiz"),
            SessionError::AnswerOutOfRange { index, len } => write!(
                f,
                "Question index {} is out of range for a quiz of {} questions",
                index, len
            ),
        }
    }
}

impl std::error::Error for SessionError {}

/// Quiz state owned by a single interactive user.
///
/// The quiz is only ever replaced as a whole, and replacing it clears every
/// recorded answer and the final score. `last_context` and
/// `generation_attempt` survive [`QuizSession::reset`] so that a fresh
/// generation for the same context can still ask for different questions.
#[derive(Debug, Clone, Default)]
pub struct QuizSession {
    quiz: Option<Vec<QuizQuestion>>,
    user_answers: Vec<Option<String>>,
    answered: Vec<bool>,
    final_score: Option<Score>,
    last_context: Option<String>,
    generation_attempt: u32,
    generated_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a freshly parsed quiz and makes it current.
    ///
    /// The whole batch is rejected if any question is malformed; the previous
    /// quiz, answers and score are then left untouched.
    pub fn accept_generated_quiz(&mut self, candidate: Vec<QuizQuestion>) -> Result<(), SessionError> {
        if candidate.is_empty() {
            return Err(SessionError::EmptyQuiz);
        }

        let mut seen = HashSet::new();
        if let Some(repeated) = candidate.iter().find(|q| !seen.insert(q.ordinal)) {
            return Err(SessionError::DuplicateOrdinal {
                ordinal: repeated.ordinal,
            });
        }

        for question in &candidate {
            validate_question(question)?;
        }

        let len = candidate.len();
        self.quiz = Some(candidate);
        self.user_answers = vec![None; len];
        self.answered = vec![false; len];
        self.final_score = None;
        self.generated_at = Some(Utc::now());

        tracing::info!(questions = len, "Accepted generated quiz");
        Ok(())
    }

    /// Records the user's choice for a question, overwriting any earlier one.
    pub fn record_answer(&mut self, index: usize, choice: &str) -> Result<(), SessionError> {
        let len = match &self.quiz {
            Some(quiz) => quiz.len(),
            None => {
                tracing::error!(index, "Answer recorded without an active quiz");
                return Err(SessionError::NoActiveQuiz);
            }
        };

        if index >= len {
            tracing::error!(index, len, "Answer index out of range");
            return Err(SessionError::AnswerOutOfRange { index, len });
        }

        self.user_answers[index] = Some(choice.to_string());
        self.answered[index] = true;
        Ok(())
    }

    /// Scores every question by normalized equality and stores the result.
    /// Can be called any number of times; unanswered questions count as wrong.
    pub fn compute_score(&mut self) -> Result<Score, SessionError> {
        let quiz = self.quiz.as_ref().ok_or(SessionError::NoActiveQuiz)?;

        let correct = quiz
            .iter()
            .zip(&self.user_answers)
            .filter(|(question, answer)| answers_match(answer.as_deref(), &question.correct_answer))
            .count();

        let score = Score {
            correct,
            total: quiz.len(),
        };
        self.final_score = Some(score);
        Ok(score)
    }

    /// Drops the quiz and everything recorded against it.
    pub fn reset(&mut self) {
        self.quiz = None;
        self.user_answers.clear();
        self.answered.clear();
        self.final_score = None;
        self.generated_at = None;
    }

    /// Returns the attempt number to pass to the prompt builder.
    ///
    /// Repeated generations for the same context count up from 0; a new
    /// context starts over. This only feeds a prompt hint and does not
    /// guarantee the model produces different questions.
    pub fn next_generation_hint(&mut self, context: &str) -> u32 {
        if self.last_context.as_deref() == Some(context) {
            self.generation_attempt += 1;
        } else {
            self.generation_attempt = 0;
            self.last_context = Some(context.to_string());
        }
        self.generation_attempt
    }

    pub fn quiz(&self) -> Option<&[QuizQuestion]> {
        self.quiz.as_deref()
    }

    pub fn question(&self, index: usize) -> Option<&QuizQuestion> {
        self.quiz.as_ref()?.get(index)
    }

    pub fn user_answer(&self, index: usize) -> Option<&str> {
        self.user_answers.get(index)?.as_deref()
    }

    pub fn is_answered(&self, index: usize) -> bool {
        self.answered.get(index).copied().unwrap_or(false)
    }

    /// Outcome for an answered question; `None` while it is unanswered.
    pub fn question_feedback(&self, index: usize) -> Option<AnswerFeedback> {
        if !self.is_answered(index) {
            return None;
        }
        let question = self.question(index)?;
        let selected = self.user_answer(index)?;

        Some(AnswerFeedback {
            selected: selected.to_string(),
            correct_answer: question.correct_answer.clone(),
            is_correct: answers_match(Some(selected), &question.correct_answer),
        })
    }

    pub fn progress(&self) -> Progress {
        Progress {
            answered: self.answered.iter().filter(|a| **a).count(),
            total: self.answered.len(),
        }
    }

    pub fn final_score(&self) -> Option<Score> {
        self.final_score
    }

    pub fn last_context(&self) -> Option<&str> {
        self.last_context.as_deref()
    }

    pub fn generation_attempt(&self) -> u32 {
        self.generation_attempt
    }

    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        self.generated_at
    }
}

fn validate_question(question: &QuizQuestion) -> Result<(), SessionError> {
    let ordinal = question.ordinal;

    if question.options.len() != OPTIONS_PER_QUESTION {
        return Err(SessionError::IncompleteOptions {
            ordinal,
            found: question.options.len(),
        });
    }

    if question.text.trim().is_empty() {
        return Err(SessionError::EmptyQuestion { ordinal });
    }

    // The placeholder for a missing answer must not pass as an option named "N/A".
    if question.correct_answer == ANSWER_UNAVAILABLE {
        return Err(SessionError::AnswerMismatch {
            ordinal,
            matches: 0,
        });
    }

    let answer = normalize(question.correct_answer.as_str());
    let matches = question
        .options
        .iter()
        .filter(|option| !answer.is_empty() && normalize(option.as_str()) == answer)
        .count();
    if matches != 1 {
        return Err(SessionError::AnswerMismatch { ordinal, matches });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(ordinal: u32, options: &[&str], answer: &str) -> QuizQuestion {
        QuizQuestion::new(
            ordinal,
            format!("Question {}", ordinal),
            options.iter().map(|o| o.to_string()).collect(),
            answer,
        )
    }

    fn arithmetic_quiz() -> Vec<QuizQuestion> {
        vec![
            question(1, &["3", "4", "5", "6"], "4"),
            question(2, &["Berlin", "Madrid", "Paris", "Rome"], "Paris"),
        ]
    }

    #[test]
    fn test_accept_resets_answer_state() {
        let mut session = QuizSession::new();
        session.accept_generated_quiz(arithmetic_quiz()).unwrap();
        session.record_answer(0, "4").unwrap();
        session.compute_score().unwrap();

        session.accept_generated_quiz(arithmetic_quiz()).unwrap();
        assert!(!session.is_answered(0));
        assert_eq!(session.user_answer(0), None);
        assert_eq!(session.final_score(), None);
        assert_eq!(session.progress(), Progress { answered: 0, total: 2 });
    }

    #[test]
    fn test_accept_rejects_empty_quiz() {
        let mut session = QuizSession::new();
        assert_eq!(session.accept_generated_quiz(vec![]), Err(SessionError::EmptyQuiz));
        assert!(session.quiz().is_none());
    }

    #[test]
    fn test_accept_rejects_whole_batch_and_keeps_previous_quiz() {
        let mut session = QuizSession::new();
        session.accept_generated_quiz(arithmetic_quiz()).unwrap();
        session.record_answer(1, "Paris").unwrap();

        let broken = vec![
            question(1, &["a", "b", "c", "d"], "a"),
            question(2, &["a", "b", "c"], "a"),
            question(3, &["a", "b"], "a"),
        ];
        assert_eq!(
            session.accept_generated_quiz(broken),
            Err(SessionError::IncompleteOptions { ordinal: 2, found: 3 })
        );

        assert_eq!(session.quiz().unwrap()[1].correct_answer, "Paris");
        assert_eq!(session.user_answer(1), Some("Paris"));
    }

    #[test]
    fn test_accept_rejects_blank_question() {
        let mut session = QuizSession::new();
        let mut blank = question(4, &["a", "b", "c", "d"], "a");
        blank.text = "  ".to_string();
        assert_eq!(
            session.accept_generated_quiz(vec![blank]),
            Err(SessionError::EmptyQuestion { ordinal: 4 })
        );
    }

    #[test]
    fn test_accept_rejects_answer_not_among_options() {
        let mut session = QuizSession::new();
        let missing = question(1, &["a", "b", "c", "d"], "N/A");
        assert_eq!(
            session.accept_generated_quiz(vec![missing]),
            Err(SessionError::AnswerMismatch { ordinal: 1, matches: 0 })
        );

        let ambiguous = question(1, &["Paris", "paris!", "Rome", "Oslo"], "PARIS");
        assert_eq!(
            session.accept_generated_quiz(vec![ambiguous]),
            Err(SessionError::AnswerMismatch { ordinal: 1, matches: 2 })
        );
    }

    #[test]
    fn test_accept_rejects_placeholder_answer_even_if_an_option_says_so() {
        let mut session = QuizSession::new();
        let placeholder = question(1, &["N/A", "2", "3", "4"], ANSWER_UNAVAILABLE);
        assert_eq!(
            session.accept_generated_quiz(vec![placeholder]),
            Err(SessionError::AnswerMismatch { ordinal: 1, matches: 0 })
        );

        let lowercase = question(1, &["n/a", "2", "3", "4"], ANSWER_UNAVAILABLE);
        assert!(session.accept_generated_quiz(vec![lowercase]).is_err());
        assert!(session.quiz().is_none());
    }

    #[test]
    fn test_accept_rejects_repeated_question_numbers() {
        let text = "<Question-1>What is 2+2?</Question-1>\n\
                    <option-1>3</option-1><option-2>4</option-2>\
                    <option-3>5</option-3><option-4>6</option-4>\n\
                    <Question-1>What is 1+0?</Question-1>\n\
                    <option-1>1</option-1><option-2>2</option-2>\
                    <option-3>3</option-3><option-4>4</option-4>\n\
                    <Answers:>\n<answer-1>4</answer-1>";
        let candidate = crate::parser::parse(text);
        assert_eq!(candidate.len(), 2);

        let mut session = QuizSession::new();
        session.accept_generated_quiz(arithmetic_quiz()).unwrap();
        assert_eq!(
            session.accept_generated_quiz(candidate),
            Err(SessionError::DuplicateOrdinal { ordinal: 1 })
        );
        assert_eq!(session.quiz().unwrap().len(), 2);
        assert_eq!(session.quiz().unwrap()[1].correct_answer, "Paris");
    }

    #[test]
    fn test_record_answer_overwrites() {
        let mut session = QuizSession::new();
        session.accept_generated_quiz(arithmetic_quiz()).unwrap();
        session.record_answer(0, "5").unwrap();
        session.record_answer(0, "4").unwrap();
        assert_eq!(session.user_answer(0), Some("4"));
        assert_eq!(session.progress(), Progress { answered: 1, total: 2 });
    }

    #[test]
    fn test_record_answer_out_of_range() {
        let mut session = QuizSession::new();
        session.accept_generated_quiz(arithmetic_quiz()).unwrap();
        assert_eq!(
            session.record_answer(2, "4"),
            Err(SessionError::AnswerOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn test_compute_score_normalizes_and_is_idempotent() {
        let mut session = QuizSession::new();
        session.accept_generated_quiz(arithmetic_quiz()).unwrap();
        session.record_answer(1, "paris!").unwrap();

        let first = session.compute_score().unwrap();
        let second = session.compute_score().unwrap();
        assert_eq!(first, Score { correct: 1, total: 2 });
        assert_eq!(first, second);
        assert_eq!(session.final_score(), Some(first));
    }

    #[test]
    fn test_single_question_scoring() {
        let mut session = QuizSession::new();
        session
            .accept_generated_quiz(vec![question(1, &["3", "4", "5", "6"], "4")])
            .unwrap();

        session.record_answer(0, "4").unwrap();
        assert_eq!(session.compute_score().unwrap(), Score { correct: 1, total: 1 });

        session.record_answer(0, "5").unwrap();
        assert_eq!(session.compute_score().unwrap(), Score { correct: 0, total: 1 });
    }

    #[test]
    fn test_reset_clears_quiz_but_keeps_generation_state() {
        let mut session = QuizSession::new();
        assert_eq!(session.next_generation_hint("cells"), 0);
        session.accept_generated_quiz(arithmetic_quiz()).unwrap();
        session.record_answer(0, "4").unwrap();

        session.reset();
        assert!(session.quiz().is_none());
        assert_eq!(session.compute_score(), Err(SessionError::NoActiveQuiz));
        assert_eq!(session.record_answer(0, "4"), Err(SessionError::NoActiveQuiz));
        assert_eq!(session.progress(), Progress { answered: 0, total: 0 });
        assert_eq!(session.last_context(), Some("cells"));
        assert_eq!(session.next_generation_hint("cells"), 1);
    }

    #[test]
    fn test_next_generation_hint_counts_per_context() {
        let mut session = QuizSession::new();
        assert_eq!(session.next_generation_hint("rust"), 0);
        assert_eq!(session.next_generation_hint("rust"), 1);
        assert_eq!(session.next_generation_hint("rust"), 2);
        assert_eq!(session.next_generation_hint("go"), 0);
        assert_eq!(session.generation_attempt(), 0);
        assert_eq!(session.last_context(), Some("go"));
    }

    #[test]
    fn test_question_feedback() {
        let mut session = QuizSession::new();
        session.accept_generated_quiz(arithmetic_quiz()).unwrap();
        assert_eq!(session.question_feedback(0), None);

        session.record_answer(0, "5").unwrap();
        assert_eq!(
            session.question_feedback(0),
            Some(AnswerFeedback {
                selected: "5".to_string(),
                correct_answer: "4".to_string(),
                is_correct: false,
            })
        );
    }
}

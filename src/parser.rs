// src/parser.rs

//! Turns the tagged text block returned by the completion provider into
//! [`QuizQuestion`] records.
//!
//! The expected layout is:
//!
//! ```text
//! <Question-1>What is 2+2?
//!     <option-1>3</option-1>
//!     <option-2>4</option-2>
//!     <option-3>5</option-3>
//!     <option-4>6</option-4>
//! <Answers:>
//!     <answer-1>4</answer-1>
//! ```
//!
//! Parsing never fails: text without question markers yields an empty list,
//! and incomplete questions are passed through for the session to reject.

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::OPTIONS_PER_QUESTION;
use crate::models::quiz::QuizQuestion;

/// Placeholder answer for a question with no matching answer block.
pub const ANSWER_UNAVAILABLE: &str = "N/A";

static QUESTION_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<Question-(\d+)>").expect("valid question regex"));

/// Closes a question body: an explicit end marker, the first option block, or
/// the start of the answer section.
static QUESTION_BODY_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"</Question-\d+>|<option-1>|<Answers:>|<answer-\d+>").expect("valid body-end regex")
});

static ANSWER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<answer-(\d+)>(.*?)</answer-\d+>").expect("valid answer regex")
});

static ANSWER_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<answer-\d+>").expect("valid answer-start regex"));

/// One regex per option index; index `j - 1` matches `<option-j>...</option-j>`.
static OPTIONS: Lazy<Vec<Regex>> = Lazy::new(|| {
    (1..=OPTIONS_PER_QUESTION)
        .map(|j| {
            Regex::new(&format!(r"(?s)<option-{j}>(.*?)</option-{j}>"))
                .expect("valid option regex")
        })
        .collect()
});

/// How option blocks are attached to questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    /// The k-th `<option-j>` anywhere in the text belongs to the k-th question.
    #[default]
    Positional,
    /// Options must lie between their own question marker and the next one.
    Scoped,
}

impl ParseStrategy {
    pub fn parse(&self, raw: &str) -> Vec<QuizQuestion> {
        match self {
            ParseStrategy::Positional => parse_positional(raw),
            ParseStrategy::Scoped => parse_scoped(raw),
        }
    }
}

impl FromStr for ParseStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "positional" => Ok(ParseStrategy::Positional),
            "scoped" => Ok(ParseStrategy::Scoped),
            other => Err(format!("unknown parse strategy '{}'", other)),
        }
    }
}

/// A question start marker located in the source text.
struct QuestionBlock<'a> {
    ordinal: u32,
    /// Byte offset where the marker begins.
    start: usize,
    /// Byte offset just past the marker.
    body_start: usize,
    body: &'a str,
}

/// Parses with positional option alignment.
pub fn parse(raw: &str) -> Vec<QuizQuestion> {
    parse_positional(raw)
}

/// Parses assuming options appear in the same order as their questions.
///
/// For each option index independently, every occurrence in the whole text is
/// collected and the k-th occurrence is handed to the k-th question. A model
/// that skips one option block therefore shifts the remaining options of that
/// index onto the wrong questions; use [`parse_scoped`] to avoid this.
pub fn parse_positional(raw: &str) -> Vec<QuizQuestion> {
    let text = raw.trim();
    let blocks = question_blocks(text);
    if blocks.is_empty() {
        tracing::warn!("Completion contained no question markers");
        return Vec::new();
    }

    let options_by_index: Vec<Vec<&str>> = OPTIONS
        .iter()
        .map(|re| re.captures_iter(text).map(|c| capture(&c, 1)).collect())
        .collect();
    let answers = answer_blocks(text);

    let quiz: Vec<QuizQuestion> = blocks
        .iter()
        .enumerate()
        .map(|(k, block)| {
            let options = options_by_index
                .iter()
                .filter_map(|occurrences| occurrences.get(k))
                .map(|o| o.to_string())
                .collect();
            QuizQuestion::new(
                block.ordinal,
                block.body,
                options,
                resolve_answer(&answers, block.ordinal),
            )
        })
        .collect();

    tracing::debug!(
        questions = quiz.len(),
        answers = answers.len(),
        "Parsed completion with positional alignment"
    );
    quiz
}

/// Parses with each question's options confined to its own section.
///
/// A section runs from the question marker to the next question marker, or to
/// the first answer block when that comes earlier. Within a section the first
/// occurrence of each option index is used.
pub fn parse_scoped(raw: &str) -> Vec<QuizQuestion> {
    let text = raw.trim();
    let blocks = question_blocks(text);
    if blocks.is_empty() {
        tracing::warn!("Completion contained no question markers");
        return Vec::new();
    }

    let answers = answer_blocks(text);

    let quiz: Vec<QuizQuestion> = blocks
        .iter()
        .enumerate()
        .map(|(k, block)| {
            let next_question = blocks.get(k + 1).map_or(text.len(), |b| b.start);
            let section_end = ANSWER_START
                .find_at(text, block.body_start)
                .map_or(next_question, |m| m.start().min(next_question));
            let section = &text[block.body_start..section_end];

            let options = OPTIONS
                .iter()
                .filter_map(|re| re.captures(section).map(|c| capture(&c, 1).to_string()))
                .collect();
            QuizQuestion::new(
                block.ordinal,
                block.body,
                options,
                resolve_answer(&answers, block.ordinal),
            )
        })
        .collect();

    tracing::debug!(
        questions = quiz.len(),
        answers = answers.len(),
        "Parsed completion with scoped alignment"
    );
    quiz
}

/// Locates every question marker and cuts out its body.
///
/// A body ends at the first of: an explicit `</Question-N>`, the first
/// `<option-1>`, the answer section, or the next question marker. Without any
/// of those it runs to the end of the text.
fn question_blocks(text: &str) -> Vec<QuestionBlock<'_>> {
    let markers: Vec<(u32, usize, usize)> = QUESTION_START
        .captures_iter(text)
        .filter_map(|c| {
            let whole = c.get(0)?;
            let ordinal = c.get(1)?.as_str().parse::<u32>().ok()?;
            Some((ordinal, whole.start(), whole.end()))
        })
        .collect();

    markers
        .iter()
        .enumerate()
        .map(|(i, &(ordinal, start, body_start))| {
            let limit = markers.get(i + 1).map_or(text.len(), |m| m.1);
            let body_end = QUESTION_BODY_END
                .find(&text[body_start..limit])
                .map_or(limit, |m| body_start + m.start());
            QuestionBlock {
                ordinal,
                start,
                body_start,
                body: text[body_start..body_end].trim(),
            }
        })
        .collect()
}

/// Collects `(ordinal, text)` for every answer block in document order.
fn answer_blocks(text: &str) -> Vec<(u32, &str)> {
    ANSWER
        .captures_iter(text)
        .filter_map(|c| {
            let ordinal = c.get(1)?.as_str().parse::<u32>().ok()?;
            Some((ordinal, capture(&c, 2)))
        })
        .collect()
}

fn resolve_answer(answers: &[(u32, &str)], ordinal: u32) -> String {
    answers
        .iter()
        .find(|(n, _)| *n == ordinal)
        .map_or(ANSWER_UNAVAILABLE, |&(_, answer)| answer)
        .to_string()
}

fn capture<'a>(caps: &regex::Captures<'a>, group: usize) -> &'a str {
    caps.get(group).map_or("", |m| m.as_str().trim())
}

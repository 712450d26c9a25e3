// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::{MAX_CONTEXT_CHARS, MAX_QUESTIONS, MIN_QUESTIONS};

/// A single multiple-choice question recovered from a completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    /// Question number as emitted by the completion provider (not its position).
    pub ordinal: u32,

    /// The question body.
    pub text: String,

    /// Option texts in option-index order. A well-formed question has exactly 4.
    pub options: Vec<String>,

    /// Literal text of the correct option, or `ANSWER_UNAVAILABLE`.
    pub correct_answer: String,
}

impl QuizQuestion {
    pub fn new(
        ordinal: u32,
        text: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            ordinal,
            text: text.into(),
            options,
            correct_answer: correct_answer.into(),
        }
    }
}

/// Difficulty requested from the completion provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Level {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Easy => "Easy",
            Level::Medium => "Medium",
            Level::Hard => "Hard",
        }
    }
}

/// Result of scoring a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
}

impl Score {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.correct as f64 / self.total as f64) * 100.0
    }

    pub fn grade(&self) -> Grade {
        let percentage = self.percentage();
        if percentage >= 80.0 {
            Grade::Excellent
        } else if percentage >= 60.0 {
            Grade::Good
        } else {
            Grade::KeepStudying
        }
    }
}

/// Verdict band shown next to a final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Excellent,
    Good,
    KeepStudying,
}

impl Grade {
    pub fn message(&self) -> &'static str {
        match self {
            Grade::Excellent => "Excellent!",
            Grade::Good => "Good job!",
            Grade::KeepStudying => "Keep studying!",
        }
    }
}

/// Per-question outcome once the user has picked an option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerFeedback {
    pub selected: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// Answered / total counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
}

/// DTO for sending a question to the client (excludes the correct answer).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub index: usize,
    pub ordinal: u32,
    pub text: String,
    pub options: Vec<String>,
    /// Present once the question has been answered.
    pub feedback: Option<AnswerFeedback>,
}

/// DTO returned for the current quiz.
#[derive(Debug, Serialize)]
pub struct QuizResponse {
    pub questions: Vec<PublicQuestion>,
    pub progress: Progress,
    /// 1-based generation number for the current context.
    pub generation: u32,
    pub final_score: Option<Score>,
    pub generated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for requesting a new quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateQuizRequest {
    #[validate(
        length(min = 1, max = MAX_CONTEXT_CHARS, message = "Context must be between 1 and 10000 characters."),
        custom(function = validate_context)
    )]
    pub context: String,
    #[serde(default)]
    pub level: Level,
    #[validate(range(min = MIN_QUESTIONS, max = MAX_QUESTIONS, message = "Number of questions must be between 1 and 5."))]
    pub num_questions: u32,
}

fn validate_context(context: &str) -> Result<(), validator::ValidationError> {
    if context.trim().is_empty() {
        return Err(validator::ValidationError::new("context_cannot_be_blank"));
    }
    Ok(())
}

/// DTO for selecting an option.
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    /// Zero-based question position in the current quiz.
    pub question_index: usize,
    /// Zero-based option position within that question.
    pub option_index: usize,
}

/// DTO returned after submission.
#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub correct: usize,
    pub total: usize,
    pub percentage: f64,
    pub grade: Grade,
    pub message: String,
}

impl From<Score> for ScoreResponse {
    fn from(score: Score) -> Self {
        let grade = score.grade();
        Self {
            correct: score.correct,
            total: score.total,
            percentage: score.percentage(),
            grade,
            message: format!(
                "{} Final Score: {} out of {} ({:.1}%)",
                grade.message(),
                score.correct,
                score.total,
                score.percentage()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_bands() {
        assert_eq!(Score { correct: 4, total: 5 }.grade(), Grade::Excellent);
        assert_eq!(Score { correct: 3, total: 5 }.grade(), Grade::Good);
        assert_eq!(Score { correct: 2, total: 5 }.grade(), Grade::KeepStudying);
    }

    #[test]
    fn test_percentage_of_empty_score() {
        assert_eq!(Score { correct: 0, total: 0 }.percentage(), 0.0);
    }

    #[test]
    fn test_generate_request_validation() {
        let ok = GenerateQuizRequest {
            context: "Photosynthesis".to_string(),
            level: Level::Medium,
            num_questions: 3,
        };
        assert!(ok.validate().is_ok());

        let blank = GenerateQuizRequest {
            context: "   ".to_string(),
            level: Level::Easy,
            num_questions: 3,
        };
        assert!(blank.validate().is_err());

        let too_many = GenerateQuizRequest {
            context: "Rust".to_string(),
            level: Level::Hard,
            num_questions: 6,
        };
        assert!(too_many.validate().is_err());
    }
}

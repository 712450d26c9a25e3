// src/prompt.rs

use crate::models::quiz::Level;

/// Everything the completion provider needs to produce one quiz.
#[derive(Debug, Clone)]
pub struct QuizRequest {
    pub context: String,
    pub level: Level,
    pub question_count: u32,
    /// Generation attempt for this context, from `QuizSession::next_generation_hint`.
    pub attempt: u32,
}

/// Hint asking the model to vary its questions on repeated generations.
/// Best-effort only: nothing checks that the model complies.
pub fn uniqueness_instruction(attempt: u32) -> String {
    if attempt == 0 {
        "This is the first quiz generation for this topic.".to_string()
    } else {
        format!(
            "This is attempt #{}. Generate completely different questions from previous attempts. \
             Focus on different aspects, subtopics, or angles of the concept.",
            attempt + 1
        )
    }
}

/// Renders the prompt. The tag layout here is what `parser` expects back.
pub fn build_prompt(request: &QuizRequest) -> String {
    format!(
        r#"You are an expert quiz maker for technical fields.
Create a quiz with {count} multiple-choice questions about the following concept/context: {context}
The questions should be at {level} level.

{uniqueness}

Rules:
- Each question must be unique and cover a different aspect of the topic.
- Avoid common textbook questions.
- Every question has exactly four options.
- The correct answer must be one of the four options, copied exactly.
- Follow the format below precisely.

<Questions:>
    <Question-1>Your first question here?
        <option-1>Option A text</option-1>
        <option-2>Option B text</option-2>
        <option-3>Option C text</option-3>
        <option-4>Option D text</option-4>

    <Question-2>Your second question here?
        <option-1>Option A text</option-1>
        <option-2>Option B text</option-2>
        <option-3>Option C text</option-3>
        <option-4>Option D text</option-4>

<Answers:>
    <answer-1>Exact text of the correct option for question 1</answer-1>
    <answer-2>Exact text of the correct option for question 2</answer-2>
"#,
        count = request.question_count,
        context = request.context.trim(),
        level = request.level.as_str(),
        uniqueness = uniqueness_instruction(request.attempt),
    )
}

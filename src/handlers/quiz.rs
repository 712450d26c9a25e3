// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tokio::sync::Mutex;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::quiz::{
        AnswerFeedback, AnswerRequest, GenerateQuizRequest, PublicQuestion, QuizResponse,
        ScoreResponse,
    },
    prompt::{QuizRequest, build_prompt},
    provider::CompletionProvider,
    session::QuizSession,
    state::SessionStore,
    utils::{html::clean_html, jwt::Claims},
};

/// Looks up the session bound to the caller's token.
async fn session_for(
    sessions: &SessionStore,
    claims: &Claims,
) -> Result<Arc<Mutex<QuizSession>>, AppError> {
    let id = claims.session_id()?;
    sessions
        .get(&id)
        .await
        .ok_or(AppError::AuthError("Session expired".to_string()))
}

/// Sanitised copy of a question's feedback for rendering.
fn public_feedback(feedback: AnswerFeedback) -> AnswerFeedback {
    AnswerFeedback {
        selected: clean_html(&feedback.selected),
        correct_answer: clean_html(&feedback.correct_answer),
        is_correct: feedback.is_correct,
    }
}

/// Builds the client view of the current quiz (answers withheld until chosen).
fn quiz_response(session: &QuizSession) -> Result<QuizResponse, AppError> {
    let quiz = session
        .quiz()
        .ok_or(AppError::NotFound("No active quiz".to_string()))?;

    let questions = quiz
        .iter()
        .enumerate()
        .map(|(index, q)| PublicQuestion {
            index,
            ordinal: q.ordinal,
            text: clean_html(&q.text),
            options: q.options.iter().map(|o| clean_html(o)).collect(),
            feedback: session.question_feedback(index).map(public_feedback),
        })
        .collect();

    Ok(QuizResponse {
        questions,
        progress: session.progress(),
        generation: session.generation_attempt() + 1,
        final_score: session.final_score(),
        generated_at: session.generated_at(),
    })
}

/// Generates a new quiz for the caller's session.
///
/// * Bumps the generation counter for the context (drives the uniqueness hint).
/// * Calls the completion provider without holding the session lock.
/// * Parses the completion and replaces the quiz only if every question is valid.
pub async fn generate_quiz(
    State(config): State<Config>,
    State(sessions): State<SessionStore>,
    State(provider): State<Arc<dyn CompletionProvider>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<GenerateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let session = session_for(&sessions, &claims).await?;

    let attempt = session.lock().await.next_generation_hint(&payload.context);
    let request = QuizRequest {
        context: payload.context,
        level: payload.level,
        question_count: payload.num_questions,
        attempt,
    };

    tracing::info!(
        level = request.level.as_str(),
        questions = request.question_count,
        attempt,
        "Generating quiz"
    );

    let raw = provider.complete(&build_prompt(&request)).await?;
    let candidate = config.parse_strategy.parse(&raw);

    let mut session = session.lock().await;
    if let Err(e) = session.accept_generated_quiz(candidate) {
        tracing::warn!("Rejected generated quiz: {}", e);
        return Err(e.into());
    }

    Ok((StatusCode::CREATED, Json(quiz_response(&session)?)))
}

/// Returns the current quiz with feedback for answered questions.
pub async fn get_quiz(
    State(sessions): State<SessionStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let session = session_for(&sessions, &claims).await?;
    let session = session.lock().await;

    Ok(Json(quiz_response(&session)?))
}

/// Records the option the user picked and returns immediate feedback.
pub async fn answer_question(
    State(sessions): State<SessionStore>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = session_for(&sessions, &claims).await?;
    let mut session = session.lock().await;

    let choice = match session.question(req.question_index) {
        Some(question) => question
            .options
            .get(req.option_index)
            .cloned()
            .ok_or(AppError::BadRequest(format!(
                "Option index {} is out of range",
                req.option_index
            )))?,
        None => String::new(),
    };

    // Unknown question indexes are reported by the session itself.
    session.record_answer(req.question_index, &choice)?;

    let feedback = session
        .question_feedback(req.question_index)
        .map(public_feedback)
        .ok_or(AppError::InternalServerError(
            "Recorded answer has no feedback".to_string(),
        ))?;

    Ok(Json(json!({
        "feedback": feedback,
        "progress": session.progress(),
    })))
}

/// Scores the quiz. Unanswered questions count as wrong; may be called repeatedly.
pub async fn submit_quiz(
    State(sessions): State<SessionStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let session = session_for(&sessions, &claims).await?;
    let score = session.lock().await.compute_score()?;

    tracing::info!(correct = score.correct, total = score.total, "Quiz submitted");

    Ok(Json(ScoreResponse::from(score)))
}

/// Discards the current quiz. The generation counter is kept.
pub async fn reset_quiz(
    State(sessions): State<SessionStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let session = session_for(&sessions, &claims).await?;
    session.lock().await.reset();

    Ok(StatusCode::NO_CONTENT)
}

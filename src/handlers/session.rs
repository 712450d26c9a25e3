// src/handlers/session.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::{
    config::Config, error::AppError, state::SessionStore, utils::jwt::sign_session_token,
};

/// Opens a new quiz session and returns a bearer token bound to it.
///
/// Each caller gets an independent session; expired ones are dropped here.
pub async fn create_session(
    State(config): State<Config>,
    State(sessions): State<SessionStore>,
) -> Result<impl IntoResponse, AppError> {
    sessions.purge_expired(config.session_ttl).await;

    let id = sessions.create().await.ok_or(AppError::TooManyRequests(
        "Too many active sessions, please try again later".to_string(),
    ))?;
    let (token, expires_at) = sign_session_token(id, &config.session_secret, config.session_ttl)?;

    tracing::info!(session = %id, "Created quiz session");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "token": token,
            "type": "Bearer",
            "expires_at": expires_at
        })),
    ))
}

use axum::extract::State;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Json;
use rusqlite::params;
use serde::Deserialize;

use crate::auth::session;
use crate::error::{AppError, AppResult};
use crate::extractors::extract_session_token;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

// -- Cookie helpers --

fn session_cookie(cookie_name: &str, token: &str, max_age_hours: u64) -> String {
    let max_age_secs = max_age_hours * 3600;
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        cookie_name, token, max_age_secs
    )
}

fn clear_session_cookie(cookie_name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0", cookie_name)
}

fn validate_username(raw: &str) -> AppResult<String> {
    let username = raw.trim().to_string();
    if username.is_empty() {
        return Err(AppError::Validation("Username cannot be empty".into()));
    }
    if username.len() > 150 {
        return Err(AppError::Validation(
            "Username must be 150 characters or less".into(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(AppError::Validation(
            "Username may only contain letters, digits, '_', '-' and '.'".into(),
        ));
    }
    Ok(username)
}

// -- Handlers --

/// POST /auth/signup — create a user and log them in.
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> AppResult<Response> {
    let username = validate_username(&req.username)?;
    if req.password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }

    let user_id = uuid::Uuid::now_v7().to_string();
    let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))?;

    {
        let conn = state.db.get()?;
        let taken: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM users WHERE username = ?1",
            params![username],
            |row| row.get(0),
        )?;
        if taken {
            return Err(AppError::Validation("Username already taken".into()));
        }

        conn.execute(
            "INSERT INTO users (id, username, password_hash) VALUES (?1, ?2, ?3)",
            params![user_id, username, password_hash],
        )?;
    }

    tracing::info!("New user signed up: {}", username);

    let token = session::create_session(&state.db, &user_id, state.config.auth.session_hours)?;
    let cookie = session_cookie(
        &state.config.auth.cookie_name,
        &token,
        state.config.auth.session_hours,
    );

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(axum::http::header::SET_COOKIE, cookie)]),
        Json(serde_json::json!({ "id": user_id, "username": username })),
    )
        .into_response())
}

/// POST /auth/login — verify credentials and open a session.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> AppResult<Response> {
    let username = req.username.trim();

    let row: Option<(String, Option<String>)> = {
        let conn = state.db.get()?;
        conn.query_row(
            "SELECT id, password_hash FROM users WHERE username = ?1",
            params![username],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .ok()
    };

    let (user_id, password_hash) = row.ok_or(AppError::Unauthorized)?;
    let hash = password_hash.ok_or(AppError::Unauthorized)?;

    let valid = bcrypt::verify(&req.password, &hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {e}")))?;
    if !valid {
        return Err(AppError::Unauthorized);
    }

    let token = session::create_session(&state.db, &user_id, state.config.auth.session_hours)?;
    let cookie = session_cookie(
        &state.config.auth.cookie_name,
        &token,
        state.config.auth.session_hours,
    );

    Ok((
        StatusCode::OK,
        AppendHeaders([(axum::http::header::SET_COOKIE, cookie)]),
        Json(serde_json::json!({ "id": user_id, "username": username })),
    )
        .into_response())
}

/// POST /auth/logout — drop the session and clear the cookie.
pub async fn logout(State(state): State<AppState>, parts: Parts) -> AppResult<Response> {
    if let Some(token) = extract_session_token(&parts, &state.config.auth.cookie_name) {
        session::delete_session(&state.db, token)?;
    }

    let cookie = clear_session_cookie(&state.config.auth.cookie_name);
    Ok((
        StatusCode::OK,
        AppendHeaders([(axum::http::header::SET_COOKIE, cookie)]),
        Json(serde_json::json!({ "ok": true })),
    )
        .into_response())
}

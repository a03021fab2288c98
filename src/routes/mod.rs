pub mod auth;
pub mod feed;
pub mod groups;
pub mod posts;
pub mod profiles;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use rusqlite::params;

use crate::error::AppResult;
use crate::state::AppState;

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    let mut app = Router::new()
        .merge(posts::router())
        .merge(groups::router())
        .merge(profiles::router())
        .merge(feed::router())
        .merge(auth::router());

    // Test-only seed endpoint: creates a user + session + group, returns
    // the session cookie. Only mounted when VERANDA_TEST_SEED is set.
    if std::env::var("VERANDA_TEST_SEED").is_ok() {
        app = app.route("/test/seed", get(test_seed));
    }

    app.with_state(state)
}

async fn test_seed(State(state): State<AppState>) -> AppResult<Response> {
    let uid = {
        let conn = state.db.get()?;
        conn.execute(
            "INSERT OR IGNORE INTO users (id, username) VALUES (?1, 'testuser')",
            params![uuid::Uuid::now_v7().to_string()],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO groups (id, slug, title, description)
             VALUES (?1, 'test-slug', 'Test group', 'Seeded for tests')",
            params![uuid::Uuid::now_v7().to_string()],
        )?;

        // Get the actual user id (may already exist from a previous seed call)
        conn.query_row(
            "SELECT id FROM users WHERE username = 'testuser'",
            [],
            |r| r.get::<_, String>(0),
        )?
    };

    let token =
        crate::auth::session::create_session(&state.db, &uid, state.config.auth.session_hours)?;

    let cookie = format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age=3600",
        state.config.auth.cookie_name, token
    );

    Ok((
        StatusCode::OK,
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(serde_json::json!({ "user_id": uid, "username": "testuser" })),
    )
        .into_response())
}

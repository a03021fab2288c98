use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::feed::{self, FeedPost, FeedScope};
use crate::pagination;
use crate::state::AppState;

// --- View structs ---

#[derive(Debug, Serialize)]
pub struct CommentView {
    pub id: String,
    pub author: String,
    pub body: String,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct PostDetail {
    pub post: FeedPost,
    pub comments: Vec<CommentView>,
}

// --- Request types ---

#[derive(Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub body: String,
    pub group: Option<String>,
    pub image_path: Option<String>,
}

#[derive(Deserialize)]
pub struct EditPostRequest {
    pub body: String,
    pub group: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub body: String,
}

// --- Router ---

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/posts", post(create_post))
        .route(
            "/posts/{id}",
            get(post_detail).put(edit_post).delete(delete_post),
        )
        .route(
            "/posts/{id}/comments",
            get(list_comments).post(create_comment),
        )
}

// --- Handlers ---

/// Home feed: every post, newest first, paginated.
///
/// The canonical request (no explicit `?page=`) is served through the
/// listing cache; the stored body is returned as-is until it expires or
/// is cleared, even if posts changed underneath.
async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let cacheable = query.page.is_none();

    if cacheable {
        if let Some(body) = state.listing_cache.get().await {
            return Ok(json_body(body));
        }
    }

    let requested = pagination::parse_page_param(query.page.as_deref());
    let body = {
        let conn = state.db.get()?;
        let posts = feed::resolve(&conn, FeedScope::All)?;
        let page = pagination::paginate(posts, state.config.listing.page_size, requested);
        serde_json::to_string(&page)?
    };

    if cacheable {
        state.listing_cache.put(body.clone()).await;
    }

    Ok(json_body(body))
}

async fn post_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<PostDetail>> {
    let conn = state.db.get()?;
    let post = feed::fetch_post(&conn, &id)?;
    let comments = query_comments(&conn, &id)?;
    Ok(Json(PostDetail { post, comments }))
}

async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreatePostRequest>,
) -> AppResult<Response> {
    let body = validate_post_body(&req.body)?;

    let post_id = uuid::Uuid::now_v7().to_string();
    let post = {
        let conn = state.db.get()?;
        let group_id = match req.group.as_deref() {
            Some(slug) => Some(feed::lookup_group_id(&conn, slug)?),
            None => None,
        };

        conn.execute(
            "INSERT INTO posts (id, user_id, group_id, body, image_path) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![post_id, user.id, group_id, body, req.image_path],
        )?;

        feed::fetch_post(&conn, &post_id)?
    };

    Ok((StatusCode::CREATED, Json(post)).into_response())
}

/// Edit a post. Author only; `created_at` is immutable.
async fn edit_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<EditPostRequest>,
) -> AppResult<Json<FeedPost>> {
    let body = validate_post_body(&req.body)?;

    let conn = state.db.get()?;
    require_author(&conn, &id, &user.id)?;

    let group_id = match req.group.as_deref() {
        Some(slug) => Some(feed::lookup_group_id(&conn, slug)?),
        None => None,
    };

    conn.execute(
        "UPDATE posts SET body = ?1, group_id = ?2, updated_at = datetime('now') WHERE id = ?3",
        params![body, group_id, id],
    )?;

    Ok(Json(feed::fetch_post(&conn, &id)?))
}

async fn delete_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    require_author(&conn, &id, &user.id)?;

    conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
    Ok((StatusCode::OK, "").into_response())
}

async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<Json<Vec<CommentView>>> {
    let conn = state.db.get()?;

    // Verify post exists
    feed::fetch_post(&conn, &post_id)?;

    Ok(Json(query_comments(&conn, &post_id)?))
}

async fn create_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<Response> {
    let body = req.body.trim().to_string();
    if body.is_empty() {
        return Err(AppError::Validation("Comment cannot be empty".into()));
    }
    if body.len() > 500 {
        return Err(AppError::Validation(
            "Comment must be 500 characters or less".into(),
        ));
    }

    let comment_id = uuid::Uuid::now_v7().to_string();
    let comment = {
        let conn = state.db.get()?;

        // Verify post exists
        feed::fetch_post(&conn, &post_id)?;

        conn.execute(
            "INSERT INTO comments (id, post_id, user_id, body) VALUES (?1, ?2, ?3, ?4)",
            params![comment_id, post_id, user.id, body],
        )?;

        let created_at: String = conn.query_row(
            "SELECT created_at FROM comments WHERE id = ?1",
            params![comment_id],
            |row| row.get(0),
        )?;

        CommentView {
            id: comment_id,
            author: user.username,
            body,
            created_at,
        }
    };

    Ok((StatusCode::CREATED, Json(comment)).into_response())
}

// --- Helpers ---

fn json_body(body: String) -> Response {
    (
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        body,
    )
        .into_response()
}

fn validate_post_body(raw: &str) -> AppResult<String> {
    let body = raw.trim().to_string();
    if body.is_empty() {
        return Err(AppError::Validation("Post text cannot be empty".into()));
    }
    if body.len() > 2000 {
        return Err(AppError::Validation(
            "Post text must be 2000 characters or less".into(),
        ));
    }
    Ok(body)
}

/// NotFound if the post does not exist, Unauthorized if `user_id` is not
/// its author.
fn require_author(conn: &rusqlite::Connection, post_id: &str, user_id: &str) -> AppResult<()> {
    let owner_id: String = conn
        .query_row(
            "SELECT user_id FROM posts WHERE id = ?1",
            params![post_id],
            |r| r.get(0),
        )
        .map_err(|_| AppError::NotFound)?;

    if owner_id != user_id {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

fn query_comments(
    conn: &rusqlite::Connection,
    post_id: &str,
) -> Result<Vec<CommentView>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT c.id, u.username, c.body, c.created_at
         FROM comments c
         JOIN users u ON u.id = c.user_id
         WHERE c.post_id = ?1
         ORDER BY c.created_at ASC, c.rowid ASC",
    )?;

    let comments = stmt
        .query_map(params![post_id], |row| {
            Ok(CommentView {
                id: row.get(0)?,
                author: row.get(1)?,
                body: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(comments)
}

// --- Tests ---

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_post_body_rejected() {
        assert!(matches!(
            validate_post_body("   ").unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[test]
    fn overlong_post_body_rejected() {
        let body = "x".repeat(2001);
        assert!(validate_post_body(&body).is_err());
    }

    #[test]
    fn post_body_is_trimmed() {
        assert_eq!(validate_post_body("  hello  ").unwrap(), "hello");
    }

    #[test]
    fn require_author_distinguishes_missing_from_foreign() {
        let pool = crate::db::create_test_pool().unwrap();
        crate::db::run_migrations(&pool).unwrap();
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO users (id, username) VALUES ('u1', 'alice'), ('u2', 'bob')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO posts (id, user_id, body) VALUES ('p1', 'u1', 'hello')",
            [],
        )
        .unwrap();

        assert!(require_author(&conn, "p1", "u1").is_ok());
        assert!(matches!(
            require_author(&conn, "p1", "u2").unwrap_err(),
            AppError::Unauthorized
        ));
        assert!(matches!(
            require_author(&conn, "missing", "u1").unwrap_err(),
            AppError::NotFound
        ));
    }
}

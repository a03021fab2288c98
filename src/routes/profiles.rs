use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::error::AppResult;
use crate::extractors::{CurrentUser, MaybeUser};
use crate::feed::{self, FeedPost, FeedScope};
use crate::follow;
use crate::pagination::{self, Page};
use crate::routes::posts::PageQuery;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub username: String,
    pub posts_count: usize,
    pub followers_count: i64,
    pub following_count: i64,
    /// Whether the current viewer follows this author. Always false for
    /// anonymous viewers.
    pub is_following: bool,
}

#[derive(Serialize)]
pub struct ProfileListing {
    pub profile: ProfileView,
    pub page: Page<FeedPost>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile/{username}", get(profile_page))
        .route("/profile/{username}/follow", post(follow_author))
        .route("/profile/{username}/unfollow", post(unfollow_author))
}

/// Author feed plus follow stats for the profile header.
async fn profile_page(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ProfileListing>> {
    let conn = state.db.get()?;
    let author_id = feed::lookup_user_id(&conn, &username)?;

    let posts = feed::resolve(&conn, FeedScope::Author(&username))?;

    let is_following = match viewer {
        Some(ref viewer) => follow::is_following(&conn, &viewer.id, &author_id)?,
        None => false,
    };

    let profile = ProfileView {
        username,
        posts_count: posts.len(),
        followers_count: follow::follower_count(&conn, &author_id)?,
        following_count: follow::following_count(&conn, &author_id)?,
        is_following,
    };

    let requested = pagination::parse_page_param(query.page.as_deref());
    let page = pagination::paginate(posts, state.config.listing.page_size, requested);

    Ok(Json(ProfileListing { profile, page }))
}

async fn follow_author(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let author_id = feed::lookup_user_id(&conn, &username)?;
    follow::follow(&conn, &user.id, &author_id)?;

    tracing::debug!("{} now follows {}", user.username, username);
    Ok(Json(serde_json::json!({ "following": true })))
}

async fn unfollow_author(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let author_id = feed::lookup_user_id(&conn, &username)?;
    follow::unfollow(&conn, &user.id, &author_id)?;

    Ok(Json(serde_json::json!({ "following": false })))
}

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use rusqlite::params;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::feed::{self, FeedPost, FeedScope};
use crate::pagination::{self, Page};
use crate::routes::posts::PageQuery;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct GroupView {
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub post_count: i64,
}

#[derive(Serialize)]
pub struct GroupListing {
    pub group: GroupView,
    pub page: Page<FeedPost>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/groups", get(list_groups))
        .route("/group/{slug}", get(group_page))
}

async fn list_groups(State(state): State<AppState>) -> AppResult<Json<Vec<GroupView>>> {
    let conn = state.db.get()?;
    let mut stmt = conn.prepare(
        "SELECT g.slug, g.title, g.description,
                (SELECT COUNT(*) FROM posts p WHERE p.group_id = g.id) AS post_count
         FROM groups g
         ORDER BY g.title ASC",
    )?;

    let groups = stmt
        .query_map([], |row| {
            Ok(GroupView {
                slug: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                post_count: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(groups))
}

/// Group feed: the group's posts, newest first, paginated.
async fn group_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<GroupListing>> {
    let conn = state.db.get()?;

    let group = conn
        .query_row(
            "SELECT g.slug, g.title, g.description,
                    (SELECT COUNT(*) FROM posts p WHERE p.group_id = g.id) AS post_count
             FROM groups g WHERE g.slug = ?1",
            params![slug],
            |row| {
                Ok(GroupView {
                    slug: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                    post_count: row.get(3)?,
                })
            },
        )
        .map_err(|_| AppError::NotFound)?;

    let posts = feed::resolve(&conn, FeedScope::Group(&slug))?;
    let requested = pagination::parse_page_param(query.page.as_deref());
    let page = pagination::paginate(posts, state.config.listing.page_size, requested);

    Ok(Json(GroupListing { group, page }))
}

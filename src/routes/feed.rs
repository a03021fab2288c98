use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::feed::{self, FeedPost, FeedScope};
use crate::pagination::{self, Page};
use crate::routes::posts::PageQuery;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/follow", get(follow_index))
}

/// Posts by authors the viewer follows, newest first, paginated.
/// Anonymous requests are rejected by the `CurrentUser` extractor.
async fn follow_index(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<FeedPost>>> {
    let conn = state.db.get()?;
    let posts = feed::resolve(&conn, FeedScope::Following(&user.id))?;

    let requested = pagination::parse_page_param(query.page.as_deref());
    let page = pagination::paginate(posts, state.config.listing.page_size, requested);

    Ok(Json(page))
}

use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::error::{AppError, AppResult};

/// A listing context: which posts are visible and for whom.
#[derive(Debug, Clone)]
pub enum FeedScope<'a> {
    /// Every post.
    All,
    /// Posts in the group with this slug.
    Group(&'a str),
    /// Posts by the user with this username.
    Author(&'a str),
    /// Posts by authors the viewer (user id) follows.
    Following(&'a str),
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedPost {
    pub id: String,
    pub author: String,
    pub group: Option<String>,
    pub body: String,
    pub image_path: Option<String>,
    pub created_at: String,
    /// Human-friendly age of the post ("just now", "5m ago", ...).
    pub published: String,
    pub comment_count: i64,
}

const FEED_SELECT: &str = "SELECT p.id, u.username, g.slug, p.body, p.image_path, p.created_at,
        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
 FROM posts p
 JOIN users u ON u.id = p.user_id
 LEFT JOIN groups g ON g.id = p.group_id";

// Newest first; rowid breaks ties between posts sharing a timestamp so
// repeated calls never reorder.
const FEED_ORDER: &str = " ORDER BY p.created_at DESC, p.rowid DESC";

/// Resolve the ordered post sequence for a listing context.
///
/// Unknown group slugs and usernames are `NotFound`. A viewer who
/// follows nobody gets an empty feed, not an error.
pub fn resolve(conn: &Connection, scope: FeedScope) -> AppResult<Vec<FeedPost>> {
    match scope {
        FeedScope::All => {
            let sql = format!("{FEED_SELECT}{FEED_ORDER}");
            let mut stmt = conn.prepare(&sql)?;
            collect(&mut stmt, params![])
        }
        FeedScope::Group(slug) => {
            let group_id = lookup_group_id(conn, slug)?;
            let sql = format!("{FEED_SELECT} WHERE p.group_id = ?1{FEED_ORDER}");
            let mut stmt = conn.prepare(&sql)?;
            collect(&mut stmt, params![group_id])
        }
        FeedScope::Author(username) => {
            let author_id = lookup_user_id(conn, username)?;
            let sql = format!("{FEED_SELECT} WHERE p.user_id = ?1{FEED_ORDER}");
            let mut stmt = conn.prepare(&sql)?;
            collect(&mut stmt, params![author_id])
        }
        FeedScope::Following(viewer_id) => {
            let sql = format!(
                "{FEED_SELECT} WHERE p.user_id IN \
                 (SELECT author_id FROM follows WHERE user_id = ?1){FEED_ORDER}"
            );
            let mut stmt = conn.prepare(&sql)?;
            collect(&mut stmt, params![viewer_id])
        }
    }
}

/// Fetch a single post by id, `NotFound` if absent.
pub fn fetch_post(conn: &Connection, post_id: &str) -> AppResult<FeedPost> {
    let sql = format!("{FEED_SELECT} WHERE p.id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut posts = collect(&mut stmt, params![post_id])?;
    posts.pop().ok_or(AppError::NotFound)
}

pub fn lookup_group_id(conn: &Connection, slug: &str) -> AppResult<String> {
    conn.query_row(
        "SELECT id FROM groups WHERE slug = ?1",
        [slug],
        |row| row.get(0),
    )
    .map_err(|_| AppError::NotFound)
}

pub fn lookup_user_id(conn: &Connection, username: &str) -> AppResult<String> {
    conn.query_row(
        "SELECT id FROM users WHERE username = ?1",
        [username],
        |row| row.get(0),
    )
    .map_err(|_| AppError::NotFound)
}

fn collect<P: rusqlite::Params>(
    stmt: &mut rusqlite::Statement<'_>,
    params: P,
) -> AppResult<Vec<FeedPost>> {
    let rows = stmt.query_map(params, |row| {
        let created_at: String = row.get(5)?;
        Ok(FeedPost {
            id: row.get(0)?,
            author: row.get(1)?,
            group: row.get(2)?,
            body: row.get(3)?,
            image_path: row.get(4)?,
            published: parse_and_format_time(&created_at),
            created_at,
            comment_count: row.get(6)?,
        })
    })?;

    let posts = rows.collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

// --- Time formatting ---

fn parse_and_format_time(db_time: &str) -> String {
    NaiveDateTime::parse_from_str(db_time, "%Y-%m-%d %H:%M:%S")
        .map(|dt| format_relative_time(&dt))
        .unwrap_or_else(|_| db_time.to_string())
}

pub fn format_relative_time(dt: &NaiveDateTime) -> String {
    let now = Utc::now().naive_utc();
    let diff = now.signed_duration_since(*dt);

    let seconds = diff.num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let minutes = diff.num_minutes();
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }

    let hours = diff.num_hours();
    if hours < 24 {
        return format!("{}h ago", hours);
    }

    let days = diff.num_days();
    if days < 7 {
        return format!("{}d ago", days);
    }

    dt.format("%b %-d, %Y").to_string()
}

use rusqlite::{params, Connection};

use crate::error::{AppError, AppResult};

/// Create the follow relation `user_id` -> `author_id`.
///
/// Idempotent: repeated calls leave a single record. The UNIQUE
/// constraint on the pair is also what makes concurrent identical
/// calls safe.
pub fn follow(conn: &Connection, user_id: &str, author_id: &str) -> AppResult<()> {
    if user_id == author_id {
        return Err(AppError::SelfFollow);
    }

    let id = uuid::Uuid::now_v7().to_string();
    conn.execute(
        "INSERT OR IGNORE INTO follows (id, user_id, author_id) VALUES (?1, ?2, ?3)",
        params![id, user_id, author_id],
    )?;
    Ok(())
}

/// Remove the follow relation if present. Removing an absent relation
/// is a no-op, not an error.
pub fn unfollow(conn: &Connection, user_id: &str, author_id: &str) -> AppResult<()> {
    conn.execute(
        "DELETE FROM follows WHERE user_id = ?1 AND author_id = ?2",
        params![user_id, author_id],
    )?;
    Ok(())
}

pub fn is_following(conn: &Connection, user_id: &str, author_id: &str) -> AppResult<bool> {
    let found: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM follows WHERE user_id = ?1 AND author_id = ?2",
        params![user_id, author_id],
        |row| row.get(0),
    )?;
    Ok(found)
}

/// How many users follow `author_id`.
pub fn follower_count(conn: &Connection, author_id: &str) -> AppResult<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM follows WHERE author_id = ?1",
        params![author_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// How many authors `user_id` follows.
pub fn following_count(conn: &Connection, user_id: &str) -> AppResult<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM follows WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::state::DbPool;
    use rusqlite::params;

    fn seeded_pool() -> DbPool {
        let pool = db::create_test_pool().unwrap();
        db::run_migrations(&pool).unwrap();
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO users (id, username) VALUES ('u1', 'alice'), ('u2', 'bob'), ('u3', 'carol')",
            params![],
        )
        .unwrap();
        pool
    }

    fn follow_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM follows", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn follow_twice_creates_single_record() {
        let pool = seeded_pool();
        let conn = pool.get().unwrap();

        follow(&conn, "u1", "u2").unwrap();
        follow(&conn, "u1", "u2").unwrap();

        assert_eq!(follow_count(&conn), 1);
        assert!(is_following(&conn, "u1", "u2").unwrap());
    }

    #[test]
    fn follow_is_directed() {
        let pool = seeded_pool();
        let conn = pool.get().unwrap();

        follow(&conn, "u1", "u2").unwrap();
        assert!(is_following(&conn, "u1", "u2").unwrap());
        assert!(!is_following(&conn, "u2", "u1").unwrap());
    }

    #[test]
    fn self_follow_rejected_and_graph_unchanged() {
        let pool = seeded_pool();
        let conn = pool.get().unwrap();

        let err = follow(&conn, "u1", "u1").unwrap_err();
        assert!(matches!(err, AppError::SelfFollow));
        assert_eq!(follow_count(&conn), 0);
    }

    #[test]
    fn unfollow_removes_relation() {
        let pool = seeded_pool();
        let conn = pool.get().unwrap();

        follow(&conn, "u1", "u2").unwrap();
        unfollow(&conn, "u1", "u2").unwrap();

        assert!(!is_following(&conn, "u1", "u2").unwrap());
        assert_eq!(follow_count(&conn), 0);
    }

    #[test]
    fn unfollow_absent_relation_is_noop() {
        let pool = seeded_pool();
        let conn = pool.get().unwrap();

        unfollow(&conn, "u1", "u2").unwrap();
        assert_eq!(follow_count(&conn), 0);
    }

    #[test]
    fn counts_reflect_the_graph() {
        let pool = seeded_pool();
        let conn = pool.get().unwrap();

        follow(&conn, "u1", "u3").unwrap();
        follow(&conn, "u2", "u3").unwrap();
        follow(&conn, "u3", "u1").unwrap();

        assert_eq!(follower_count(&conn, "u3").unwrap(), 2);
        assert_eq!(following_count(&conn, "u3").unwrap(), 1);
        assert_eq!(follower_count(&conn, "u2").unwrap(), 0);
    }
}

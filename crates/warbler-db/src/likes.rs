//! Like repository. At most one like per (user, message) pair, enforced by a
//! UNIQUE constraint; the insert is idempotent on top of that.

use rusqlite::{Connection, params};

use crate::Result;
use crate::models::LikeRow;

/// Record that `user_id` likes `message_id`. Returns true if a new like was
/// inserted, false if the pair was already present.
pub fn like(conn: &Connection, user_id: i64, message_id: i64) -> Result<bool> {
    let n = conn.execute(
        "INSERT OR IGNORE INTO likes (user_id, message_id) VALUES (?1, ?2)",
        params![user_id, message_id],
    )?;
    Ok(n > 0)
}

/// Remove the like. Returns true if a like was removed.
pub fn unlike(conn: &Connection, user_id: i64, message_id: i64) -> Result<bool> {
    let n = conn.execute(
        "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
        params![user_id, message_id],
    )?;
    Ok(n > 0)
}

pub fn is_liked(conn: &Connection, user_id: i64, message_id: i64) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM likes WHERE user_id = ?1 AND message_id = ?2)",
        params![user_id, message_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub fn count_for_message(conn: &Connection, message_id: i64) -> Result<i64> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM likes WHERE message_id = ?1",
        [message_id],
        |row| row.get(0),
    )?;
    Ok(n)
}

/// All likes given by one user.
pub fn for_user(conn: &Connection, user_id: i64) -> Result<Vec<LikeRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, message_id FROM likes WHERE user_id = ?1 ORDER BY id",
    )?;

    let rows = stmt
        .query_map([user_id], |row| {
            Ok(LikeRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                message_id: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn count_for_user(conn: &Connection, user_id: i64) -> Result<i64> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM likes WHERE user_id = ?1",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(n)
}

/// Batch-fetch like counts for a set of message IDs.
pub fn counts_for_messages(conn: &Connection, message_ids: &[i64]) -> Result<Vec<(i64, i64)>> {
    if message_ids.is_empty() {
        return Ok(vec![]);
    }

    let placeholders: Vec<String> = (1..=message_ids.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "SELECT message_id, COUNT(*) FROM likes WHERE message_id IN ({}) GROUP BY message_id",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::types::ToSql> = message_ids
        .iter()
        .map(|id| id as &dyn rusqlite::types::ToSql)
        .collect();

    let rows = stmt
        .query_map(params.as_slice(), |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbError, messages};
    use crate::models::NewMessage;

    fn seed_user(conn: &Connection, id: i64, username: &str, email: &str) -> i64 {
        conn.execute(
            "INSERT INTO users (id, username, email, password) VALUES (?1, ?2, ?3, ?4)",
            params![id, username, email, "HASHED_PASSWORD"],
        )
        .unwrap();
        id
    }

    #[test]
    fn user_likes_a_message() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let author = seed_user(conn, 94566, "testing", "testing@test.com");
            let m1 = messages::insert(conn, &NewMessage {
                text: "a warble".into(),
                user_id: author,
            })?;
            messages::insert(conn, &NewMessage {
                text: "a very interesting warble".into(),
                user_id: author,
            })?;

            let liker = seed_user(conn, 888, "yetanothertest", "t@email.com");
            like(conn, liker, m1)?;

            let l = for_user(conn, liker)?;
            assert_eq!(l.len(), 1);
            assert_eq!(l[0].message_id, m1);

            assert!(is_liked(conn, liker, m1)?);
            assert_eq!(count_for_message(conn, m1)?, 1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn duplicate_like_is_ignored() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let author = seed_user(conn, 1, "testuser", "test@test.com");
            let m = messages::insert(conn, &NewMessage {
                text: "a warble".into(),
                user_id: author,
            })?;
            let liker = seed_user(conn, 2, "other", "other@test.com");

            assert!(like(conn, liker, m)?);
            assert!(!like(conn, liker, m)?);
            assert_eq!(count_for_message(conn, m)?, 1);

            // The storage layer itself refuses a duplicate row
            let err = conn
                .execute(
                    "INSERT INTO likes (user_id, message_id) VALUES (?1, ?2)",
                    params![liker, m],
                )
                .map_err(DbError::from)
                .unwrap_err();
            assert!(matches!(err, DbError::Constraint(_)));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn unlike_removes_the_like() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let author = seed_user(conn, 1, "testuser", "test@test.com");
            let m = messages::insert(conn, &NewMessage {
                text: "a warble".into(),
                user_id: author,
            })?;
            let liker = seed_user(conn, 2, "other", "other@test.com");

            like(conn, liker, m)?;
            assert!(unlike(conn, liker, m)?);
            assert!(!is_liked(conn, liker, m)?);
            assert_eq!(count_for_user(conn, liker)?, 0);

            assert!(!unlike(conn, liker, m)?);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn deleting_a_message_drops_its_likes() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let author = seed_user(conn, 1, "testuser", "test@test.com");
            let m = messages::insert(conn, &NewMessage {
                text: "a warble".into(),
                user_id: author,
            })?;
            let liker = seed_user(conn, 2, "other", "other@test.com");
            like(conn, liker, m)?;

            messages::delete(conn, m)?;
            assert_eq!(for_user(conn, liker)?.len(), 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn batch_counts_group_by_message() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let author = seed_user(conn, 1, "testuser", "test@test.com");
            let m1 = messages::insert(conn, &NewMessage {
                text: "first".into(),
                user_id: author,
            })?;
            let m2 = messages::insert(conn, &NewMessage {
                text: "second".into(),
                user_id: author,
            })?;
            let a = seed_user(conn, 2, "a", "a@test.com");
            let b = seed_user(conn, 3, "b", "b@test.com");

            like(conn, a, m1)?;
            like(conn, b, m1)?;

            let mut counts = counts_for_messages(conn, &[m1, m2])?;
            counts.sort();
            assert_eq!(counts, [(m1, 2)]);

            assert!(counts_for_messages(conn, &[])?.is_empty());
            Ok(())
        })
        .unwrap();
    }
}

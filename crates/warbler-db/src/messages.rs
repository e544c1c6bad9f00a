//! Message ("warble") repository.

use rusqlite::{Connection, OptionalExtension, params};

use crate::Result;
use crate::models::{MessageRow, NewMessage};

pub fn insert(conn: &Connection, message: &NewMessage) -> Result<i64> {
    conn.execute(
        "INSERT INTO messages (text, user_id) VALUES (?1, ?2)",
        params![message.text, message.user_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.text, m.timestamp, m.user_id, u.username
         FROM messages m
         JOIN users u ON m.user_id = u.id
         WHERE m.id = ?1",
    )?;

    let row = stmt.query_row([id], row_to_message).optional()?;
    Ok(row)
}

/// All messages authored by one user, newest first.
pub fn for_user(conn: &Connection, user_id: i64) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.text, m.timestamp, m.user_id, u.username
         FROM messages m
         JOIN users u ON m.user_id = u.id
         WHERE m.user_id = ?1
         ORDER BY m.timestamp DESC, m.id DESC",
    )?;

    let rows = stmt
        .query_map([user_id], row_to_message)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

/// Messages from the user and everyone they follow, newest first.
pub fn timeline(conn: &Connection, user_id: i64, limit: u32) -> Result<Vec<MessageRow>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.text, m.timestamp, m.user_id, u.username
         FROM messages m
         JOIN users u ON m.user_id = u.id
         WHERE m.user_id = ?1
            OR m.user_id IN (
                SELECT user_being_followed_id FROM follows WHERE user_following_id = ?1
            )
         ORDER BY m.timestamp DESC, m.id DESC
         LIMIT ?2",
    )?;

    let rows = stmt
        .query_map(params![user_id, limit], row_to_message)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
    let n = conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
    Ok(n > 0)
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        text: row.get(1)?,
        timestamp: row.get(2)?,
        user_id: row.get(3)?,
        author_username: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbError, follows};

    fn seed_user(conn: &Connection, id: i64, username: &str, email: &str) -> i64 {
        conn.execute(
            "INSERT INTO users (id, username, email, password) VALUES (?1, ?2, ?3, ?4)",
            params![id, username, email, "HASHED_PASSWORD"],
        )
        .unwrap();
        id
    }

    #[test]
    fn message_belongs_to_its_author() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let uid = seed_user(conn, 94566, "testing", "testing@test.com");

            insert(conn, &NewMessage {
                text: "a warble".into(),
                user_id: uid,
            })?;

            let msgs = for_user(conn, uid)?;
            assert_eq!(msgs.len(), 1);
            assert_eq!(msgs[0].text, "a warble");
            assert_eq!(msgs[0].user_id, uid);
            assert_eq!(msgs[0].author_username, "testing");
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn insert_requires_an_existing_user() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let err = insert(conn, &NewMessage {
                text: "orphan warble".into(),
                user_id: 404,
            })
            .unwrap_err();
            assert!(matches!(err, DbError::Constraint(_)));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn text_over_140_chars_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let uid = seed_user(conn, 1, "testuser", "test@test.com");

            let err = insert(conn, &NewMessage {
                text: "x".repeat(141),
                user_id: uid,
            })
            .unwrap_err();
            assert!(matches!(err, DbError::Constraint(_)));

            // Exactly 140 is fine
            insert(conn, &NewMessage {
                text: "x".repeat(140),
                user_id: uid,
            })?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn timeline_covers_self_and_followed_users() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let u1 = seed_user(conn, 1111, "test1", "email1@email.com");
            let u2 = seed_user(conn, 2222, "test2", "email2@email.com");
            let u3 = seed_user(conn, 3333, "test3", "email3@email.com");

            follows::follow(conn, u1, u2)?;

            insert(conn, &NewMessage { text: "from u1".into(), user_id: u1 })?;
            insert(conn, &NewMessage { text: "from u2".into(), user_id: u2 })?;
            insert(conn, &NewMessage { text: "from u3".into(), user_id: u3 })?;

            let texts: Vec<String> = timeline(conn, u1, 100)?
                .into_iter()
                .map(|m| m.text)
                .collect();
            assert!(texts.contains(&"from u1".to_string()));
            assert!(texts.contains(&"from u2".to_string()));
            assert!(!texts.contains(&"from u3".to_string()));

            // u2 follows nobody, so only their own message shows
            let texts: Vec<String> = timeline(conn, u2, 100)?
                .into_iter()
                .map(|m| m.text)
                .collect();
            assert_eq!(texts, ["from u2"]);
            Ok(())
        })
        .unwrap();
    }
}

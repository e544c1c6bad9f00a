//! Follow-edge repository. An edge (followed, follower) either exists or it
//! does not; creation and deletion are idempotent. Self-follows are rejected
//! at the handler layer, not here.

use rusqlite::{Connection, params};

use crate::Result;
use crate::models::UserRow;

/// Create the edge follower -> followed. Returns true if a new edge was
/// inserted, false if it already existed.
pub fn follow(conn: &Connection, follower_id: i64, followed_id: i64) -> Result<bool> {
    let n = conn.execute(
        "INSERT OR IGNORE INTO follows (user_being_followed_id, user_following_id)
         VALUES (?1, ?2)",
        params![followed_id, follower_id],
    )?;
    Ok(n > 0)
}

/// Remove the edge follower -> followed. Returns true if an edge was removed.
pub fn unfollow(conn: &Connection, follower_id: i64, followed_id: i64) -> Result<bool> {
    let n = conn.execute(
        "DELETE FROM follows WHERE user_being_followed_id = ?1 AND user_following_id = ?2",
        params![followed_id, follower_id],
    )?;
    Ok(n > 0)
}

pub fn is_following(conn: &Connection, follower_id: i64, followed_id: i64) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM follows
            WHERE user_being_followed_id = ?1 AND user_following_id = ?2
        )",
        params![followed_id, follower_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

pub fn is_followed_by(conn: &Connection, user_id: i64, other_id: i64) -> Result<bool> {
    is_following(conn, other_id, user_id)
}

/// Users that `user_id` follows.
pub fn following(conn: &Connection, user_id: i64) -> Result<Vec<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.username, u.email, u.password, u.image_url, u.header_image_url,
                u.bio, u.location, u.created_at
         FROM follows f
         JOIN users u ON u.id = f.user_being_followed_id
         WHERE f.user_following_id = ?1
         ORDER BY u.id",
    )?;

    let rows = stmt
        .query_map([user_id], row_to_user)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

/// Users that follow `user_id`.
pub fn followers(conn: &Connection, user_id: i64) -> Result<Vec<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.username, u.email, u.password, u.image_url, u.header_image_url,
                u.bio, u.location, u.created_at
         FROM follows f
         JOIN users u ON u.id = f.user_following_id
         WHERE f.user_being_followed_id = ?1
         ORDER BY u.id",
    )?;

    let rows = stmt
        .query_map([user_id], row_to_user)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn following_count(conn: &Connection, user_id: i64) -> Result<i64> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM follows WHERE user_following_id = ?1",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(n)
}

pub fn followers_count(conn: &Connection, user_id: i64) -> Result<i64> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM follows WHERE user_being_followed_id = ?1",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(n)
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        image_url: row.get(4)?,
        header_image_url: row.get(5)?,
        bio: row.get(6)?,
        location: row.get(7)?,
        created_at: row.get(8)?,
    })
}

//! User repository. Every function takes the connection for the current
//! unit of work explicitly; nothing here touches shared state.

use rusqlite::{Connection, OptionalExtension, params};

use crate::Result;
use crate::models::{NewUser, UserRow};

pub fn insert(conn: &Connection, user: &NewUser) -> Result<i64> {
    conn.execute(
        "INSERT INTO users (username, email, password, image_url) VALUES (?1, ?2, ?3, ?4)",
        params![user.username, user.email, user.password, user.image_url],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, email, password, image_url, header_image_url, bio, location, created_at
         FROM users WHERE id = ?1",
    )?;

    let row = stmt.query_row([id], row_to_user).optional()?;
    Ok(row)
}

pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, email, password, image_url, header_image_url, bio, location, created_at
         FROM users WHERE username = ?1",
    )?;

    let row = stmt.query_row([username], row_to_user).optional()?;
    Ok(row)
}

pub fn list(conn: &Connection) -> Result<Vec<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, email, password, image_url, header_image_url, bio, location, created_at
         FROM users ORDER BY id",
    )?;

    let rows = stmt
        .query_map([], row_to_user)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

/// Username substring search, as used by `GET /users?q=`.
pub fn search(conn: &Connection, q: &str) -> Result<Vec<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, email, password, image_url, header_image_url, bio, location, created_at
         FROM users WHERE username LIKE '%' || ?1 || '%' ORDER BY id",
    )?;

    let rows = stmt
        .query_map([q], row_to_user)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

/// Delete a user. Messages, likes, and follow edges go with it via
/// ON DELETE CASCADE. Returns false if no such user existed.
pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
    let n = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
    Ok(n > 0)
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

/// Database row types — these map directly to SQLite rows.
/// Distinct from the warbler-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub image_url: Option<String>,
    pub header_image_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub created_at: String,
}

/// A user record as produced by signup, before it has been inserted.
/// `password` is always an Argon2 hash, never plaintext.
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub image_url: Option<String>,
}

pub struct MessageRow {
    pub id: i64,
    pub text: String,
    pub timestamp: String,
    pub user_id: i64,
    pub author_username: String,
}

pub struct NewMessage {
    pub text: String,
    pub user_id: i64,
}

pub struct LikeRow {
    pub id: i64,
    pub user_id: i64,
    pub message_id: i64,
}

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use thiserror::Error;
use tracing::warn;

use warbler_db::{Database, DbError, users};
use warbler_db::models::{NewUser, UserRow};
use warbler_types::api::{AuthResponse, Claims, LoginRequest, SignupRequest};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

/// Signup input rejected before any database interaction.
#[derive(Debug, Error)]
pub enum SignupError {
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("email must not be empty")]
    EmptyEmail,
    #[error("password must not be empty")]
    EmptyPassword,
    #[error("password hashing failed")]
    Hash,
}

/// Validate credentials and hash the password with Argon2id. Returns an
/// unsaved record: the caller inserts it, and a duplicate username or email
/// surfaces there as a constraint error.
pub fn signup(
    username: &str,
    email: &str,
    password: &str,
    image_url: Option<String>,
) -> Result<NewUser, SignupError> {
    if username.trim().is_empty() {
        return Err(SignupError::EmptyUsername);
    }
    if email.trim().is_empty() {
        return Err(SignupError::EmptyEmail);
    }
    if password.is_empty() {
        return Err(SignupError::EmptyPassword);
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| SignupError::Hash)?
        .to_string();

    Ok(NewUser {
        username: username.to_string(),
        email: email.to_string(),
        password: password_hash,
        image_url,
    })
}

/// Look up by username and verify the password hash. Unknown user and wrong
/// password are indistinguishable: both yield `None`.
pub fn authenticate(
    db: &Database,
    username: &str,
    password: &str,
) -> Result<Option<UserRow>, DbError> {
    let Some(user) = db.with_conn(|conn| users::find_by_username(conn, username))? else {
        return Ok(None);
    };

    let Ok(parsed_hash) = PasswordHash::new(&user.password) else {
        warn!("Stored password hash for '{}' is not parseable", username);
        return Ok(None);
    };

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(Some(user)),
        Err(_) => Ok(None),
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let new_user = signup(&req.username, &req.email, &req.password, req.image_url)
        .map_err(|e| {
            warn!("Rejected signup for '{}': {}", req.username, e);
            StatusCode::BAD_REQUEST
        })?;

    let user_id = state
        .db
        .with_conn(|conn| users::insert(conn, &new_user))
        .map_err(|e| match e {
            DbError::Constraint(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        })?;

    let token = create_token(&state.jwt_secret, user_id, &req.username)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user_id,
            username: req.username,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let user = authenticate(&state.db, &req.username, &req.password)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = create_token(&state.jwt_secret, user.id, &user.username)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(AuthResponse {
        user_id: user.id,
        username: user.username,
        token,
    }))
}

pub fn create_token(secret: &str, user_id: i64, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_never_stores_the_plaintext_password() {
        let user = signup("testuser", "test@test.com", "password", None).unwrap();
        assert_ne!(user.password, "password");
        assert!(user.password.starts_with("$argon2"));
    }

    #[test]
    fn signup_rejects_empty_fields() {
        assert!(matches!(
            signup("", "e@test.com", "password", None),
            Err(SignupError::EmptyUsername)
        ));
        assert!(matches!(
            signup("testuser", "", "password", None),
            Err(SignupError::EmptyEmail)
        ));
        assert!(matches!(
            signup("testuser", "e@test.com", "", None),
            Err(SignupError::EmptyPassword)
        ));
    }

    #[test]
    fn authenticate_returns_the_matching_user() {
        let db = Database::open_in_memory().unwrap();
        let new_user = signup("testuser", "test@test.com", "password", None).unwrap();
        let id = db.with_conn(|conn| users::insert(conn, &new_user)).unwrap();

        let user = authenticate(&db, "testuser", "password").unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.username, "testuser");
    }

    #[test]
    fn authenticate_rejects_an_unknown_username() {
        let db = Database::open_in_memory().unwrap();
        assert!(authenticate(&db, "nobody", "password").unwrap().is_none());
    }

    #[test]
    fn authenticate_rejects_a_wrong_password() {
        let db = Database::open_in_memory().unwrap();
        let new_user = signup("testuser", "test@test.com", "password", None).unwrap();
        db.with_conn(|conn| users::insert(conn, &new_user)).unwrap();

        assert!(authenticate(&db, "testuser", "wrongpassword").unwrap().is_none());
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{error, info};

use warbler_db::models::UserRow;
use warbler_db::{follows, likes, messages, users};
use warbler_types::api::{Claims, FollowToggleResponse, MessageResponse, UserProfile, UserSummary};

use crate::auth::AppStateInner;
use crate::messages::{message_response, parse_db_timestamp};

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub q: Option<String>,
}

/// `GET /users` and `GET /users?q=`: list everyone, or filter by username
/// substring.
pub async fn list_users(
    State(state): State<Arc<AppStateInner>>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Run blocking DB reads off the async runtime
    let db = state.clone();
    let rows = tokio::task::spawn_blocking(move || {
        db.db.with_conn(|conn| match query.q.as_deref() {
            Some(q) if !q.is_empty() => users::search(conn, q),
            _ => users::list(conn),
        })
    })
    .await
    .map_err(|e| { error!("spawn_blocking join error: {}", e); StatusCode::INTERNAL_SERVER_ERROR })?
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let out: Vec<UserSummary> = rows.into_iter().map(summary).collect();
    Ok(Json(out))
}

/// `GET /users/{id}`: profile page data. The user, their messages (newest
/// first) with like counts, and relationship counts.
pub async fn user_profile(
    State(state): State<Arc<AppStateInner>>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, StatusCode> {
    let db = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        db.db.with_conn(|conn| {
            let Some(user) = users::find_by_id(conn, user_id)? else {
                return Ok(None);
            };

            let msgs = messages::for_user(conn, user_id)?;
            let message_ids: Vec<i64> = msgs.iter().map(|m| m.id).collect();
            let counts = likes::counts_for_messages(conn, &message_ids)?;

            let following_count = follows::following_count(conn, user_id)?;
            let followers_count = follows::followers_count(conn, user_id)?;
            let likes_count = likes::count_for_user(conn, user_id)?;

            Ok(Some((user, msgs, counts, following_count, followers_count, likes_count)))
        })
    })
    .await
    .map_err(|e| { error!("spawn_blocking join error: {}", e); StatusCode::INTERNAL_SERVER_ERROR })?
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let Some((user, msgs, counts, following_count, followers_count, likes_count)) = result else {
        return Err(StatusCode::NOT_FOUND);
    };

    let count_map: HashMap<i64, i64> = counts.into_iter().collect();
    let messages_out: Vec<MessageResponse> = msgs
        .into_iter()
        .map(|m| {
            let like_count = count_map.get(&m.id).copied().unwrap_or(0);
            message_response(m, like_count)
        })
        .collect();

    Ok(Json(UserProfile {
        id: user.id,
        username: user.username,
        image_url: user.image_url,
        header_image_url: user.header_image_url,
        bio: user.bio,
        location: user.location,
        created_at: parse_db_timestamp(&user.created_at),
        following_count,
        followers_count,
        likes_count,
        messages: messages_out,
    }))
}

/// `GET /users/{id}/following`
pub async fn following(
    State(state): State<Arc<AppStateInner>>,
    Path(user_id): Path<i64>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let result = state
        .db
        .with_conn(|conn| {
            if users::find_by_id(conn, user_id)?.is_none() {
                return Ok(None);
            }
            Ok(Some(follows::following(conn, user_id)?))
        })
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let rows = result.ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(rows.into_iter().map(summary).collect::<Vec<_>>()))
}

/// `GET /users/{id}/followers`
pub async fn followers(
    State(state): State<Arc<AppStateInner>>,
    Path(user_id): Path<i64>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let result = state
        .db
        .with_conn(|conn| {
            if users::find_by_id(conn, user_id)?.is_none() {
                return Ok(None);
            }
            Ok(Some(follows::followers(conn, user_id)?))
        })
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let rows = result.ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(rows.into_iter().map(summary).collect::<Vec<_>>()))
}

/// `POST /users/{id}/follow` toggles: follows the user, or unfollows if the
/// edge already exists.
pub async fn toggle_follow(
    State(state): State<Arc<AppStateInner>>,
    Path(user_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    // Self-follow is rejected here; the schema does not forbid it
    if user_id == claims.sub {
        return Err(StatusCode::BAD_REQUEST);
    }

    let result = state
        .db
        .with_tx(|tx| {
            if users::find_by_id(tx, user_id)?.is_none() {
                return Ok(None);
            }

            let following = if follows::is_following(tx, claims.sub, user_id)? {
                follows::unfollow(tx, claims.sub, user_id)?;
                false
            } else {
                follows::follow(tx, claims.sub, user_id)?;
                true
            };

            Ok(Some(following))
        })
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let following = result.ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(FollowToggleResponse { following }))
}

/// `DELETE /users/me` deletes the logged-in account. Messages, likes, and
/// follow edges cascade.
pub async fn delete_me(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, StatusCode> {
    let deleted = state
        .db
        .with_tx(|tx| users::delete(tx, claims.sub))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if !deleted {
        return Err(StatusCode::NOT_FOUND);
    }

    info!("User {} deleted their account", claims.sub);
    Ok(StatusCode::NO_CONTENT)
}

fn summary(user: UserRow) -> UserSummary {
    UserSummary {
        id: user.id,
        username: user.username,
        image_url: user.image_url,
        bio: user.bio,
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{error, warn};

use warbler_db::models::{MessageRow, NewMessage};
use warbler_db::{likes, messages};
use warbler_types::api::{Claims, MessageResponse, NewMessageRequest};

use crate::auth::AppStateInner;

/// Longest allowed warble, matching the schema CHECK.
const MAX_MESSAGE_LEN: usize = 140;

/// `POST /messages`
pub async fn create_message(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<NewMessageRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if req.text.is_empty() || req.text.chars().count() > MAX_MESSAGE_LEN {
        return Err(StatusCode::BAD_REQUEST);
    }

    let message_id = state
        .db
        .with_conn(|conn| {
            messages::insert(conn, &NewMessage {
                text: req.text.clone(),
                user_id: claims.sub,
            })
        })
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let now = chrono::Utc::now();

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            id: message_id,
            text: req.text,
            user_id: claims.sub,
            author_username: claims.username.clone(),
            timestamp: now,
            like_count: 0,
        }),
    ))
}

/// `GET /messages/{id}`
pub async fn get_message(
    State(state): State<Arc<AppStateInner>>,
    Path(message_id): Path<i64>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let result = state
        .db
        .with_conn(|conn| {
            let Some(row) = messages::find_by_id(conn, message_id)? else {
                return Ok(None);
            };
            let like_count = likes::count_for_message(conn, message_id)?;
            Ok(Some((row, like_count)))
        })
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let (row, like_count) = result.ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(message_response(row, like_count)))
}

enum DeleteOutcome {
    Deleted,
    NotFound,
    NotOwner,
}

/// `DELETE /messages/{id}`. Author only.
pub async fn delete_message(
    State(state): State<Arc<AppStateInner>>,
    Path(message_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<StatusCode, StatusCode> {
    let outcome = state
        .db
        .with_tx(|tx| {
            let Some(row) = messages::find_by_id(tx, message_id)? else {
                return Ok(DeleteOutcome::NotFound);
            };
            if row.user_id != claims.sub {
                return Ok(DeleteOutcome::NotOwner);
            }
            messages::delete(tx, message_id)?;
            Ok(DeleteOutcome::Deleted)
        })
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    match outcome {
        DeleteOutcome::Deleted => Ok(StatusCode::NO_CONTENT),
        DeleteOutcome::NotFound => Err(StatusCode::NOT_FOUND),
        DeleteOutcome::NotOwner => Err(StatusCode::FORBIDDEN),
    }
}

/// `GET /timeline`: most recent messages from the logged-in user and the
/// users they follow.
pub async fn timeline(
    State(state): State<Arc<AppStateInner>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    // Run blocking DB reads off the async runtime
    let db = state.clone();
    let user_id = claims.sub;

    let (rows, counts) = tokio::task::spawn_blocking(move || {
        db.db.with_conn(|conn| {
            let rows = messages::timeline(conn, user_id, 100)?;
            let message_ids: Vec<i64> = rows.iter().map(|m| m.id).collect();
            let counts = likes::counts_for_messages(conn, &message_ids)?;
            Ok((rows, counts))
        })
    })
    .await
    .map_err(|e| { error!("spawn_blocking join error: {}", e); StatusCode::INTERNAL_SERVER_ERROR })?
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let count_map: HashMap<i64, i64> = counts.into_iter().collect();
    let out: Vec<MessageResponse> = rows
        .into_iter()
        .map(|m| {
            let like_count = count_map.get(&m.id).copied().unwrap_or(0);
            message_response(m, like_count)
        })
        .collect();

    Ok(Json(out))
}

pub(crate) fn message_response(row: MessageRow, like_count: i64) -> MessageResponse {
    let timestamp = parse_db_timestamp(&row.timestamp);
    MessageResponse {
        id: row.id,
        text: row.text,
        user_id: row.user_id,
        author_username: row.author_username,
        timestamp,
        like_count,
    }
}

pub(crate) fn parse_db_timestamp(raw: &str) -> chrono::DateTime<chrono::Utc> {
    raw.parse::<chrono::DateTime<chrono::Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            chrono::DateTime::default()
        })
}

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use warbler_db::{likes, messages};
use warbler_types::api::{Claims, LikeToggleResponse};

use crate::auth::AppStateInner;

/// `POST /messages/{id}/like` toggles: likes the message, or removes the
/// like if it already exists.
pub async fn toggle_like(
    State(state): State<Arc<AppStateInner>>,
    Path(message_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let result = state
        .db
        .with_tx(|tx| {
            if messages::find_by_id(tx, message_id)?.is_none() {
                return Ok(None);
            }

            let liked = if likes::is_liked(tx, claims.sub, message_id)? {
                likes::unlike(tx, claims.sub, message_id)?;
                false
            } else {
                likes::like(tx, claims.sub, message_id)?;
                true
            };

            let like_count = likes::count_for_message(tx, message_id)?;
            Ok(Some((liked, like_count)))
        })
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let (liked, like_count) = result.ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(LikeToggleResponse { liked, like_count }))
}

pub mod auth;
pub mod likes;
pub mod messages;
pub mod middleware;
pub mod users;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{delete, get, post},
};

pub use auth::{AppState, AppStateInner};

/// Assemble the application router. Layers (CORS, tracing) are added by the
/// server binary on top of this.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/users", get(users::list_users))
        .route("/users/{user_id}", get(users::user_profile))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/users/{user_id}/following", get(users::following))
        .route("/users/{user_id}/followers", get(users::followers))
        .route("/users/{user_id}/follow", post(users::toggle_follow))
        .route("/users/me", delete(users::delete_me))
        .route("/timeline", get(messages::timeline))
        .route("/messages", post(messages::create_message))
        .route("/messages/{message_id}", get(messages::get_message))
        .route("/messages/{message_id}", delete(messages::delete_message))
        .route("/messages/{message_id}/like", post(likes::toggle_like))
        .layer(axum_middleware::from_fn(middleware::require_auth))
        .with_state(state);

    Router::new().merge(public_routes).merge(protected_routes)
}

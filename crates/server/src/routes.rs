use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use common::types::Health;

use crate::state::AppState;

pub mod users;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the application router: user endpoints plus a liveness probe.
///
/// `max_body_bytes` caps request bodies; 0 lifts the cap entirely.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    // 显式设置请求体上限，替代 axum 默认的 2MB
    let body_limit = if max_body_bytes == 0 {
        DefaultBodyLimit::disable()
    } else {
        DefaultBodyLimit::max(max_body_bytes)
    };

    Router::new()
        .route("/health", get(health))
        .route("/users/", post(users::create_user))
        .route("/users/:userid", get(users::get_user))
        .with_state(state)
        .layer(body_limit)
        // 每个请求一个 INFO 级别 span，5xx 以 ERROR 记录
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}

pub mod handlers;

use crate::PropsData;
use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::services::ServeDir;

// Shared state to cache data
pub type SharedData = Arc<RwLock<Option<PropsData>>>;

pub struct HtmlTemplate<T>(pub T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

/// Build the router, serving static assets from `static_dir` at `/static`
pub fn build_router(data: SharedData, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .nest_service("/static", ServeDir::new(static_dir.as_ref()))
        .route("/", get(handlers::home))
        .route("/edges", get(handlers::edges))
        .route("/parlays", get(handlers::parlays))
        .route("/leaderboards", get(handlers::leaderboards))
        .route("/games", get(handlers::games))
        .route("/api/edges", get(handlers::api_edges))
        .route("/health", get(handlers::health))
        .with_state(data)
}

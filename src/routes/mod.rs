pub mod assets;
pub mod auth;
pub mod posts;

use askama::Template;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::extractors::{CurrentUser, MaybeUser};
use crate::state::AppState;

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

#[derive(Template)]
#[template(path = "core/404.html")]
pub struct NotFoundTemplate {
    pub actor: Option<CurrentUser>,
}

impl NotFoundTemplate {
    /// Rendered "page not found" with a 404 status.
    pub fn response(actor: Option<CurrentUser>) -> Response {
        let mut response = Html(NotFoundTemplate { actor }).into_response();
        if response.status().is_success() {
            *response.status_mut() = StatusCode::NOT_FOUND;
        }
        response
    }
}

async fn not_found(MaybeUser(actor): MaybeUser) -> Response {
    NotFoundTemplate::response(actor)
}

/// The complete application: every route, the 404 fallback and request tracing.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(posts::router())
        .merge(auth::router())
        .route("/static/{*path}", get(assets::serve))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};

use crate::auth::login_url;
use crate::extractors::CurrentUser;
use crate::routes::NotFoundTemplate;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing record; the actor keeps the 404 page's header signed in.
    #[error("Not found")]
    NotFound(Option<CurrentUser>),

    /// The route needs an actor; carries the path to come back to after login.
    #[error("Login required for {next}")]
    LoginRequired { next: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),
}

fn internal() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
        .into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(actor) => NotFoundTemplate::response(actor),
            AppError::LoginRequired { next } => Redirect::to(&login_url(&next)).into_response(),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                internal()
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                internal()
            }
            AppError::Password(e) => {
                tracing::error!("Password hashing error: {}", e);
                internal()
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("authentication required")]
    AuthRequired,
    #[error("permission denied")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("password handling failed: {0}")]
    Password(String),
    #[error("session token handling failed: {0}")]
    Session(String),
    #[error("media handling failed: {0}")]
    Media(String),
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // Unauthenticated access to a content page lands on the login page.
            AppError::AuthRequired => Redirect::to("/").into_response(),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                Html("<h1>403 Forbidden</h1>".to_string()),
            )
                .into_response(),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                Html("<h1>404 Not Found</h1>".to_string()),
            )
                .into_response(),
            AppError::InvalidInput(message) => (
                StatusCode::BAD_REQUEST,
                Html(format!("<h1>400 Bad Request</h1><p>{message}</p>")),
            )
                .into_response(),
            other => {
                // Details go to the log, never into the response body.
                error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html("<h1>500 Internal Server Error</h1>".to_string()),
                )
                    .into_response()
            }
        }
    }
}

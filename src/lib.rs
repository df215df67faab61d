//! Spendle is a web app for tracking your personal finances: income and
//! expense transactions, monthly recurring transactions and savings goals.
//!
//! This library provides a JSON REST API backed by a SQLite database. The
//! storage backend sits behind per-entity store traits, so the SQLite
//! implementation can be swapped out without touching the domain logic.

#![warn(missing_docs)]

use std::time::Duration;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

pub mod auth;
pub mod db;
pub mod endpoints;
pub mod goal_service;
pub mod materialize;
pub mod models;
pub mod routes;
mod routing;
mod state;
pub mod stores;

pub use routing::build_router;
pub use state::{AppState, create_cookie_key};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request did not carry a valid session for a route that requires
    /// an authenticated user.
    #[error("the request requires an authenticated user")]
    Unauthorized,

    /// The user provided an invalid email and password combination.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The email used to register already belongs to another user.
    #[error("the email is already in use")]
    DuplicateEmail,

    /// The requested resource does not exist, or belongs to another user.
    ///
    /// Rows owned by other users are reported as absent rather than
    /// forbidden so that IDs cannot be probed.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A zero or negative amount was used for a transaction, template or
    /// goal. All monetary amounts in the app must be positive.
    #[error("{0} is not a valid amount, amounts must be greater than zero")]
    InvalidAmount(f64),

    /// An expense was created without a category.
    #[error("expenses must have a category")]
    MissingCategory,

    /// An income row or template was given an expense category.
    #[error("income cannot have a category")]
    UnexpectedCategory,

    /// An empty string was used as a name.
    #[error("names cannot be empty")]
    EmptyName,

    /// The string could not be parsed as a spending category.
    #[error("\"{0}\" is not a valid category")]
    InvalidCategory(String),

    /// The string could not be parsed as a goal status.
    #[error("\"{0}\" is not a valid goal status")]
    InvalidStatus(String),

    /// The request named a calendar date or month that does not exist.
    #[error("not a valid date: {0}")]
    InvalidDate(String),

    /// The session cookie is missing from the request.
    #[error("no session cookie in the request")]
    CookieMissing,

    /// The session expiry could not be parsed or formatted.
    #[error("could not parse or format the session expiry: {0}")]
    DateError(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged on the server, never shown to
    /// the client.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthorized | Error::InvalidCredentials | Error::CookieMissing => {
                StatusCode::UNAUTHORIZED
            }
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::DuplicateEmail => StatusCode::CONFLICT,
            Error::InvalidAmount(_)
            | Error::MissingCategory
            | Error::UnexpectedCategory
            | Error::EmptyName
            | Error::InvalidCategory(_)
            | Error::InvalidStatus(_)
            | Error::InvalidDate(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::DateError(_) | Error::HashingError(_) | Error::SqlError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        // Internal details are logged, not shown to the client.
        let message = if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("an unexpected error occurred: {}", self);
            "an internal error occurred".to_owned()
        } else {
            self.to_string()
        };

        (status_code, Json(json!({ "error": message }))).into_response()
    }
}

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down
/// gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<std::net::SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

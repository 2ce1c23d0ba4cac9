//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application,
//! together with `AuthFailure`, the set of reasons a presented bearer token can be refused.
//!
//! `AppError` implements `actix_web::error::ResponseError` to convert application errors
//! into HTTP responses with a JSON body of the form `{"error": "<message>"}`.
//! Storage and hashing failures are logged with their original cause and shown to the
//! client only as a generic internal error.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

/// Why a presented token was refused.
///
/// The `Display` text of each variant is the exact message returned to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    /// The token is malformed, badly signed, expired, or names an unknown user.
    /// Both cases share one message so a caller cannot probe for registered logins.
    #[error("Could not validate credentials")]
    CouldNotValidate,
    /// The token's owner has logged out.
    #[error("Not logged in")]
    NotLoggedIn,
    /// The token is structurally valid but is not the owner's current access token,
    /// or a refresh request carried the wrong kind of token.
    #[error("Invalid token")]
    InvalidToken,
    /// A refresh token that passed decoding but whose expiry instant has passed.
    #[error("Token expired")]
    TokenExpired,
}

/// Represents all possible errors that can occur within the application.
#[derive(Debug, Error)]
pub enum AppError {
    /// Wrong login or password (HTTP 401).
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// A protected request or a refresh was refused (HTTP 401).
    #[error("{0}")]
    Unauthenticated(AuthFailure),
    /// Malformed request (HTTP 400).
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// Resource missing or not owned by the caller (HTTP 404).
    #[error("Not Found: {0}")]
    NotFound(String),
    /// Uniqueness violation, e.g. registering an existing login (HTTP 409).
    #[error("Conflict: {0}")]
    Conflict(String),
    /// Failed input validation (HTTP 422).
    #[error("Validation Error: {0}")]
    ValidationError(String),
    /// Storage failure on an otherwise valid request (HTTP 500).
    #[error("Database Error: {0}")]
    DatabaseError(String),
    /// Any other unexpected server-side failure (HTTP 500).
    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
}

impl From<AuthFailure> for AppError {
    fn from(failure: AuthFailure) -> AppError {
        AppError::Unauthenticated(failure)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials | AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::InvalidCredentials => self.to_string(),
            AppError::Unauthenticated(failure) => failure.to_string(),
            AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::ValidationError(msg) => msg.clone(),
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                log::error!("{}", self);
                "Internal server error".to_string()
            }
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

/// `RowNotFound` becomes `NotFound`; every other storage error is a `DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::InternalServerError(format!("Failed to sign token: {}", error))
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(format!("Password hashing failed: {}", error))
    }
}

/// True when a storage error is a primary-key or unique-constraint violation.
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .map(|db_error| db_error.is_unique_violation())
        .unwrap_or(false)
}

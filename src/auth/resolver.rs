//! Turns a presented bearer token into the authenticated user, or the reason it was refused.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use chrono::Utc;
use sqlx::SqlitePool;

use crate::auth::token::TokenCodec;
use crate::db::users;
use crate::error::{AppError, AuthFailure};
use crate::models::User;

/// Alternative header carrying the raw token, for clients that do not send `Authorization`.
pub const TOKEN_HEADER: &str = "x-token";

/// Reads the token from `Authorization: Bearer <token>`, falling back to `X-Token`.
pub fn presented_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    bearer
        .or_else(|| headers.get(TOKEN_HEADER).and_then(|value| value.to_str().ok()))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Resolves `presented` to its user. Checks run in this order and stop at the first failure:
///
/// 1. the token decodes with a valid signature and its expiry has not passed, whatever
///    leeway the codec allows;
/// 2. its subject names an existing user (same message as 1);
/// 3. that user has a live session;
/// 4. the token is exactly the user's stored access token.
///
/// Storage failures propagate as `DatabaseError`, never as an authentication failure.
pub async fn resolve_identity(
    pool: &SqlitePool,
    codec: &TokenCodec,
    presented: &str,
) -> Result<User, AppError> {
    let claims = codec
        .parse(presented)
        .ok_or(AuthFailure::CouldNotValidate)?;
    if claims.is_expired_at(Utc::now()) {
        return Err(AuthFailure::CouldNotValidate.into());
    }

    let user = users::find_user(pool, &claims.sub)
        .await?
        .ok_or(AuthFailure::CouldNotValidate)?;

    if !user.logged_in {
        return Err(AuthFailure::NotLoggedIn.into());
    }

    if !user.holds_session_token(presented) {
        return Err(AuthFailure::InvalidToken.into());
    }

    Ok(user)
}

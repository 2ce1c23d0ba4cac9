use chrono::Utc;
use sqlx::SqliteExecutor;

use crate::models::{NewUser, User};

/// A change to the session fields of a user record, applied as one statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionUpdate<'a> {
    /// Store a freshly issued access token and mark the session live.
    Open { access_token: &'a str },
    /// Replace the stored token of a session that is already live. Does nothing
    /// once the user has logged out.
    Rotate { access_token: &'a str },
    /// End the session and forget the stored token.
    Close,
}

pub async fn find_user<'e, E>(executor: E, login: &str) -> Result<Option<User>, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        "SELECT login, password_hash, access_token, logged_in, created_at
         FROM users WHERE login = ?",
    )
    .bind(login)
    .fetch_optional(executor)
    .await
}

/// Inserts a new user with a live session. A duplicate login surfaces as a
/// unique-violation database error.
pub async fn insert_user<'e, E>(executor: E, user: &NewUser<'_>) -> Result<User, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, User>(
        "INSERT INTO users (login, password_hash, access_token, logged_in, created_at)
         VALUES (?, ?, ?, 1, ?)
         RETURNING login, password_hash, access_token, logged_in, created_at",
    )
    .bind(user.login)
    .bind(user.password_hash)
    .bind(user.access_token)
    .bind(Utc::now())
    .fetch_one(executor)
    .await
}

/// Applies a session change. Returns `false` if no row matched: no user has this
/// login, or a `Rotate` found the session closed.
///
/// Token and flag are written by a single statement, so a reader never sees a live
/// session paired with a token from a different issuance.
pub async fn update_session<'e, E>(
    executor: E,
    login: &str,
    update: SessionUpdate<'_>,
) -> Result<bool, sqlx::Error>
where
    E: SqliteExecutor<'e>,
{
    let result = match update {
        SessionUpdate::Open { access_token } => {
            sqlx::query("UPDATE users SET access_token = ?, logged_in = 1 WHERE login = ?")
                .bind(access_token)
                .bind(login)
                .execute(executor)
                .await?
        }
        SessionUpdate::Rotate { access_token } => {
            sqlx::query("UPDATE users SET access_token = ? WHERE login = ? AND logged_in = 1")
                .bind(access_token)
                .bind(login)
                .execute(executor)
                .await?
        }
        SessionUpdate::Close => {
            sqlx::query("UPDATE users SET access_token = NULL, logged_in = 0 WHERE login = ?")
                .bind(login)
                .execute(executor)
                .await?
        }
    };
    Ok(result.rows_affected() > 0)
}
